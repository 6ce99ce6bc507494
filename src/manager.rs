use chrono::{Local, NaiveDate};

use crate::config::Config;
use crate::error::ManagerError;
use crate::models::{NewPatient, Patient, PatientUpdate};
use crate::storage::Store;
use crate::validation::{self, ValidationPolicy};

/// In-memory patient list mirrored to a single file. Every mutation rewrites
/// the whole file before returning.
pub struct PatientManager {
    store: Store,
    validation: ValidationPolicy,
    patients: Vec<Patient>,
}

impl PatientManager {
    pub async fn open(config: &Config) -> Result<Self, ManagerError> {
        let store = config.store();
        let patients = store.read_all().await?;

        tracing::info!(
            "Loaded {} patients from {}",
            patients.len(),
            store.path().display()
        );

        Ok(Self {
            store,
            validation: config.validation,
            patients,
        })
    }

    pub async fn add_patient(&mut self, fields: NewPatient) -> Result<Patient, ManagerError> {
        self.add_patient_on(fields, Local::now().date_naive()).await
    }

    /// Adds a patient whose age is computed as of `today`.
    pub async fn add_patient_on(
        &mut self,
        fields: NewPatient,
        today: NaiveDate,
    ) -> Result<Patient, ManagerError> {
        self.validation.enforce(validation::check_new(&fields))?;

        let patient = Patient::new(self.next_id()?, fields, today);
        self.patients.push(patient.clone());

        if let Err(e) = self.store.write_all(&self.patients).await {
            self.patients.pop();
            return Err(e.into());
        }

        tracing::info!("Added patient {}", patient.id);
        Ok(patient)
    }

    pub fn get_all_patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn search_by_id(&self, id: u32) -> Option<&Patient> {
        self.patients.iter().find(|patient| patient.id == id)
    }

    /// Overwrites the provided fields of patient `id`. Returns `false`, with
    /// the file untouched, when no such patient exists.
    pub async fn update_patient_by_id(
        &mut self,
        id: u32,
        update: PatientUpdate,
    ) -> Result<bool, ManagerError> {
        self.validation.enforce(validation::check_update(&update))?;

        let Some(index) = self.patients.iter().position(|patient| patient.id == id) else {
            tracing::info!("No patient with id {} to update", id);
            return Ok(false);
        };

        let previous = self.patients[index].clone();
        self.patients[index].apply(update);

        if let Err(e) = self.store.write_all(&self.patients).await {
            self.patients[index] = previous;
            return Err(e.into());
        }

        tracing::info!("Updated patient {}", id);
        Ok(true)
    }

    /// Removes patient `id` from the file and reloads the list from it.
    pub async fn delete_patient_by_id(&mut self, id: u32) -> Result<bool, ManagerError> {
        let removed = self.store.delete_by_id(id).await?;
        self.patients = self.store.read_all().await?;

        if removed {
            tracing::info!("Deleted patient {}", id);
        } else {
            tracing::info!("No patient with id {} to delete", id);
        }
        Ok(removed)
    }

    /// One past the highest id in use. Equal to `count + 1` until a record is
    /// deleted, and never hands out an id that is still live.
    fn next_id(&self) -> Result<u32, ManagerError> {
        match self.patients.iter().map(|patient| patient.id).max() {
            None => Ok(1),
            Some(id) => id.checked_add(1).ok_or(ManagerError::IdsExhausted),
        }
    }
}
