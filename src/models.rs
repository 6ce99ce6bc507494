use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validation::{calculate_age, parse_date_of_birth};

/// Column order shared by both backends.
pub const FIELD_NAMES: [&str; 8] = [
    "id",
    "first_name",
    "last_name",
    "date_of_birth",
    "age",
    "hometown",
    "house_number",
    "phone_number",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub age: u32,
    pub hometown: String,
    pub house_number: String,
    pub phone_number: String,
}

/// The user supplied part of a patient, before an id and age are assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub hometown: String,
    pub house_number: String,
    pub phone_number: String,
}

/// Partial overwrite of a stored patient. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub hometown: Option<String>,
    pub house_number: Option<String>,
    pub phone_number: Option<String>,
}

impl Patient {
    /// Builds a record with its age frozen as of `today`. An unparseable date
    /// of birth (only reachable with advisory validation) gets age 0.
    pub fn new(id: u32, fields: NewPatient, today: NaiveDate) -> Self {
        let age = parse_date_of_birth(&fields.date_of_birth)
            .map(|dob| calculate_age(dob, today))
            .unwrap_or(0);

        Self {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            date_of_birth: fields.date_of_birth,
            age,
            hometown: fields.hometown,
            house_number: fields.house_number,
            phone_number: fields.phone_number,
        }
    }

    /// Overwrites the fields present in `update`. The age is left as it was.
    pub fn apply(&mut self, update: PatientUpdate) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(date_of_birth) = update.date_of_birth {
            self.date_of_birth = date_of_birth;
        }
        if let Some(hometown) = update.hometown {
            self.hometown = hometown;
        }
        if let Some(house_number) = update.house_number {
            self.house_number = house_number;
        }
        if let Some(phone_number) = update.phone_number {
            self.phone_number = phone_number;
        }
    }
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.date_of_birth.is_none()
            && self.hometown.is_none()
            && self.house_number.is_none()
            && self.phone_number.is_none()
    }
}
