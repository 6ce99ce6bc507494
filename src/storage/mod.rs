//! Whole-file persistence for the patient list.
//!
//! Every read loads the entire file and every write replaces it. Writes go to
//! a temporary sibling first and are renamed over the target, so an
//! interrupted write leaves the previous file intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::Patient;

mod csv;
mod json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    #[default]
    Csv,
    Json,
}

impl Backend {
    pub fn default_file_name(self) -> &'static str {
        match self {
            Backend::Csv => "patients.csv",
            Backend::Json => "patients.json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    backend: Backend,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>, backend: Backend) -> Self {
        Self {
            path: path.into(),
            backend,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every record. A missing, empty or unparseable file reads as an
    /// empty set; any other I/O failure is returned.
    pub async fn read_all(&self) -> Result<Vec<Patient>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} does not exist yet, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let decoded = match self.backend {
            Backend::Csv => csv::decode(&bytes).await,
            Backend::Json => json::decode(&bytes),
        };

        match decoded {
            Ok(patients) => {
                tracing::debug!(
                    "Loaded {} records from {}",
                    patients.len(),
                    self.path.display()
                );
                Ok(patients)
            }
            Err(reason) => {
                tracing::warn!(
                    "Could not parse {}, treating it as empty: {}",
                    self.path.display(),
                    reason
                );
                Ok(Vec::new())
            }
        }
    }

    /// Serializes the full set and replaces the file with it.
    pub async fn write_all(&self, patients: &[Patient]) -> Result<(), StoreError> {
        let encoded = match self.backend {
            Backend::Csv => csv::encode(patients).await,
            Backend::Json => json::encode(patients),
        };
        let bytes = encoded.map_err(|reason| StoreError::Serialize {
            path: self.path.clone(),
            reason,
        })?;

        replace_file(&self.path, &bytes).await?;

        tracing::debug!(
            "Wrote {} records to {}",
            patients.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Rewrites the file without the record carrying `id`. Returns whether
    /// such a record existed.
    pub async fn delete_by_id(&self, id: u32) -> Result<bool, StoreError> {
        let mut patients = self.read_all().await?;
        let before = patients.len();
        patients.retain(|patient| patient.id != id);
        let removed = patients.len() != before;

        self.write_all(&patients).await?;

        Ok(removed)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "patients".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, Uuid::now_v7()))
}

async fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp_path = temp_path_for(path);

    let written = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp_path).await {
            tracing::debug!(
                "Could not remove temporary file {}: {}",
                tmp_path.display(),
                cleanup
            );
        }
        return Err(StoreError::io(path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::models::tests::sample;

    fn patients() -> Vec<Patient> {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut quoted = sample("Efua");
        quoted.house_number = "Flat 3, \"Blue\" House".to_string();
        vec![
            Patient::new(1, sample("Ama"), today),
            Patient::new(2, sample("Kwame"), today),
            Patient::new(5, quoted, today),
        ]
    }

    fn store(dir: &TempDir, backend: Backend) -> Store {
        Store::new(dir.path().join(backend.default_file_name()), backend)
    }

    #[tokio::test]
    async fn round_trip_both_backends() {
        let dir = TempDir::new().unwrap();
        for backend in [Backend::Csv, Backend::Json] {
            let store = store(&dir, backend);
            store.write_all(&patients()).await.unwrap();

            assert_eq!(store.read_all().await.unwrap(), patients());
        }
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        for backend in [Backend::Csv, Backend::Json] {
            assert!(store(&dir, backend).read_all().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn corrupt_file_reads_empty() {
        let dir = TempDir::new().unwrap();

        let json = store(&dir, Backend::Json);
        std::fs::write(json.path(), "[{\"id\": 1,").unwrap();
        assert!(json.read_all().await.unwrap().is_empty());

        let csv = store(&dir, Backend::Csv);
        std::fs::write(csv.path(), "id,first_name\nnot-a-number,Ama\n").unwrap();
        assert!(csv.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn io_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path(), Backend::Json);

        assert!(matches!(
            store.read_all().await,
            Err(StoreError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn csv_has_fixed_header() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Backend::Csv);
        store.write_all(&patients()[..1]).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,first_name,last_name,date_of_birth,age,hometown,house_number,phone_number")
        );
        assert_eq!(
            lines.next(),
            Some("1,Ama,Mensah,15-06-1990,33,Accra,12 Ring Road,024-000-0000")
        );
    }

    #[tokio::test]
    async fn json_is_indented_array() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Backend::Json);
        store.write_all(&patients()[..1]).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n    {\n        \"id\": 1,"));
        assert!(text.contains("\"age\": 33"));
    }

    #[tokio::test]
    async fn write_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Backend::Csv);
        store.write_all(&patients()).await.unwrap();
        store.write_all(&patients()[..1]).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("patients.csv")]);
    }

    #[tokio::test]
    async fn write_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("nested/records.json"), Backend::Json);
        store.write_all(&patients()).await.unwrap();

        assert_eq!(store.read_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_by_id_rewrites_without_record() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Backend::Json);
        store.write_all(&patients()).await.unwrap();

        assert!(store.delete_by_id(2).await.unwrap());
        let ids: Vec<u32> = store.read_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 5]);

        assert!(!store.delete_by_id(42).await.unwrap());
        assert_eq!(store.read_all().await.unwrap().len(), 2);
    }
}
