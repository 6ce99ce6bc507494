use std::path::PathBuf;

use crate::commands::Args;
use crate::storage::{Backend, Store};
use crate::validation::ValidationPolicy;

/// Where and how records are persisted. Built once in `main` and handed to
/// the manager.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub backend: Backend,
    pub validation: ValidationPolicy,
}

impl Config {
    pub fn new(path: Option<PathBuf>, backend: Backend, validation: ValidationPolicy) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(backend.default_file_name())),
            backend,
            validation,
        }
    }

    pub fn store(&self) -> Store {
        Store::new(self.path.clone(), self.backend)
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config::new(args.file.clone(), args.backend, args.validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_follows_backend() {
        let csv = Config::new(None, Backend::Csv, ValidationPolicy::Enforce);
        let json = Config::new(None, Backend::Json, ValidationPolicy::Enforce);

        assert_eq!(csv.path, PathBuf::from("patients.csv"));
        assert_eq!(json.path, PathBuf::from("patients.json"));
    }

    #[test]
    fn explicit_path_wins() {
        let config = Config::new(
            Some(PathBuf::from("/tmp/records.dat")),
            Backend::Json,
            ValidationPolicy::Advisory,
        );

        assert_eq!(config.path, PathBuf::from("/tmp/records.dat"));
        assert_eq!(config.store().path(), config.path.as_path());
    }
}
