use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::error::ManagerError;
use crate::manager::PatientManager;
use crate::models::{NewPatient, PatientUpdate};

const MENU: &str = "\n1. Add New Patient\n\
                    2. Get All Patients\n\
                    3. Search Patient by ID\n\
                    4. Update Patient by ID\n\
                    5. Delete Patient by ID\n\
                    6. Exit\n";

/// Menu driven session over any line source. Ends on "6" or end of input.
pub struct Shell<R, W> {
    lines: Lines<R>,
    output: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            lines: input.lines(),
            output,
        }
    }

    pub async fn run(&mut self, manager: &mut PatientManager) -> Result<()> {
        loop {
            self.write(MENU).await?;
            let Some(choice) = self.prompt("Enter choice: ").await? else {
                return Ok(());
            };

            let outcome = match choice.trim() {
                "1" => self.add(manager).await,
                "2" => self.list(manager).await,
                "3" => self.search(manager).await,
                "4" => self.update(manager).await,
                "5" => self.delete(manager).await,
                "6" => return Ok(()),
                _ => {
                    self.write("Invalid choice. Try again.\n").await?;
                    continue;
                }
            };

            match outcome {
                Ok(Step::Continue) => {}
                Ok(Step::EndOfInput) => return Ok(()),
                // Manager failures are reported and the session goes on;
                // anything else is a broken terminal.
                Err(e) => match e.downcast_ref::<ManagerError>() {
                    Some(ManagerError::Validation(invalid)) => {
                        self.write(&format!("Rejected: {}\n", invalid)).await?;
                    }
                    Some(failure) => {
                        tracing::error!("Operation failed: {}", failure);
                        self.write(&format!("Failed: {}\n", failure)).await?;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    async fn add(&mut self, manager: &mut PatientManager) -> Result<Step> {
        let mut values = Vec::with_capacity(6);
        for label in [
            "First Name: ",
            "Last Name: ",
            "Date of Birth (dd-mm-yyyy): ",
            "Hometown: ",
            "House Number: ",
            "Phone Number (024-000-0000): ",
        ] {
            let Some(value) = self.prompt(label).await? else {
                return Ok(Step::EndOfInput);
            };
            values.push(value.trim().to_string());
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        let fields = NewPatient {
            first_name: next(),
            last_name: next(),
            date_of_birth: next(),
            hometown: next(),
            house_number: next(),
            phone_number: next(),
        };

        let patient = manager.add_patient(fields).await?;
        self.write(&format!("Added patient {}\n", patient.id)).await?;
        Ok(Step::Continue)
    }

    async fn list(&mut self, manager: &PatientManager) -> Result<Step> {
        let text = serde_json::to_string_pretty(manager.get_all_patients())?;
        self.write(&format!("{}\n", text)).await?;
        Ok(Step::Continue)
    }

    async fn search(&mut self, manager: &PatientManager) -> Result<Step> {
        let Some(id) = self.prompt_id("Enter Patient ID: ").await? else {
            return Ok(Step::EndOfInput);
        };
        let Some(id) = id else {
            return Ok(Step::Continue);
        };

        match manager.search_by_id(id) {
            Some(patient) => {
                let text = serde_json::to_string_pretty(patient)?;
                self.write(&format!("{}\n", text)).await?;
            }
            None => self.write(&format!("Patient {} not found\n", id)).await?,
        }
        Ok(Step::Continue)
    }

    async fn update(&mut self, manager: &mut PatientManager) -> Result<Step> {
        let Some(id) = self.prompt_id("Enter Patient ID to update: ").await? else {
            return Ok(Step::EndOfInput);
        };
        let Some(id) = id else {
            return Ok(Step::Continue);
        };
        if manager.search_by_id(id).is_none() {
            self.write(&format!("Patient {} not found\n", id)).await?;
            return Ok(Step::Continue);
        }

        self.write("Leave a field blank to keep its current value.\n")
            .await?;
        let mut values = Vec::with_capacity(6);
        for label in [
            "First Name: ",
            "Last Name: ",
            "Date of Birth (dd-mm-yyyy): ",
            "Hometown: ",
            "House Number: ",
            "Phone Number (024-000-0000): ",
        ] {
            let Some(value) = self.prompt(label).await? else {
                return Ok(Step::EndOfInput);
            };
            let value = value.trim();
            values.push((!value.is_empty()).then(|| value.to_string()));
        }

        let mut values = values.into_iter();
        let mut next = || values.next().flatten();
        let update = PatientUpdate {
            first_name: next(),
            last_name: next(),
            date_of_birth: next(),
            hometown: next(),
            house_number: next(),
            phone_number: next(),
        };

        if update.is_empty() {
            self.write("Nothing to update\n").await?;
        } else if manager.update_patient_by_id(id, update).await? {
            self.write(&format!("Updated patient {}\n", id)).await?;
        } else {
            self.write(&format!("Patient {} not found\n", id)).await?;
        }
        Ok(Step::Continue)
    }

    async fn delete(&mut self, manager: &mut PatientManager) -> Result<Step> {
        let Some(id) = self.prompt_id("Enter Patient ID to delete: ").await? else {
            return Ok(Step::EndOfInput);
        };
        let Some(id) = id else {
            return Ok(Step::Continue);
        };

        if manager.delete_patient_by_id(id).await? {
            self.write(&format!("Deleted patient {}\n", id)).await?;
        } else {
            self.write(&format!("Patient {} not found\n", id)).await?;
        }
        Ok(Step::Continue)
    }

    /// Outer `None` is end of input, inner `None` an id that did not parse.
    async fn prompt_id(&mut self, label: &str) -> Result<Option<Option<u32>>> {
        let Some(text) = self.prompt(label).await? else {
            return Ok(None);
        };

        match text.trim().parse() {
            Ok(id) => Ok(Some(Some(id))),
            Err(_) => {
                self.write(&format!("'{}' is not a patient id\n", text.trim()))
                    .await?;
                Ok(Some(None))
            }
        }
    }

    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        self.write(label).await?;
        Ok(self.lines.next_line().await?)
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

enum Step {
    Continue,
    EndOfInput,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::config::Config;
    use crate::storage::Backend;
    use crate::validation::ValidationPolicy;

    async fn session(dir: &TempDir, script: &str) -> (PatientManager, String) {
        let config = Config::new(
            Some(dir.path().join("patients.json")),
            Backend::Json,
            ValidationPolicy::Enforce,
        );
        let mut manager = PatientManager::open(&config).await.unwrap();
        let mut output = Vec::new();

        Shell::new(script.as_bytes(), &mut output)
            .run(&mut manager)
            .await
            .unwrap();

        (manager, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn add_update_and_delete_through_menu() {
        let dir = TempDir::new().unwrap();
        let script = "1\nAma\nMensah\n15-06-1990\nAccra\n12\n024-000-0000\n\
                      4\n1\n\nAsante\n\n\n\n\n\
                      3\n1\n\
                      5\n1\n\
                      6\n";

        let (manager, output) = session(&dir, script).await;

        assert!(output.contains("Added patient 1"));
        assert!(output.contains("Updated patient 1"));
        assert!(output.contains("\"last_name\": \"Asante\""));
        assert!(output.contains("Deleted patient 1"));
        assert!(manager.get_all_patients().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(
            Some(dir.path().join("records/patients.json")),
            Backend::Json,
            ValidationPolicy::Enforce,
        );
        let mut manager = PatientManager::open(&config).await.unwrap();
        // A plain file where the records directory should be makes every write fail
        std::fs::write(dir.path().join("records"), "").unwrap();

        let script = "1\nAma\nMensah\n15-06-1990\nAccra\n12\n024-000-0000\n\
                      2\n\
                      6\n";
        let mut output = Vec::new();
        Shell::new(script.as_bytes(), &mut output)
            .run(&mut manager)
            .await
            .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("Failed: I/O error on"));
        assert!(output.contains("[]"));
        assert!(manager.get_all_patients().is_empty());
    }

    #[tokio::test]
    async fn invalid_input_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        let script = "9\n\
                      1\nAma\nMensah\n31-02-1990\nAccra\n12\n024-000-0000\n\
                      3\nabc\n\
                      3\n7\n";

        let (manager, output) = session(&dir, script).await;

        assert!(output.contains("Invalid choice. Try again."));
        assert!(output.contains("Rejected: invalid date of birth '31-02-1990'"));
        assert!(output.contains("'abc' is not a patient id"));
        assert!(output.contains("Patient 7 not found"));
        assert!(manager.get_all_patients().is_empty());
    }
}
