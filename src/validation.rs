use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use regex::Regex;

use std::sync::LazyLock;

use crate::error::ValidationError;
use crate::models::{NewPatient, PatientUpdate};

/// Whether failed format checks reject the write or only get logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ValidationPolicy {
    #[default]
    Enforce,
    Advisory,
}

static DATE_OF_BIRTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0[1-9]|[12][0-9]|3[01])-(0[1-9]|1[0-2])-([0-9]{4})$")
        .expect("date of birth pattern is valid")
});

static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{3}-[0-9]{3}-[0-9]{4}$").expect("phone number pattern is valid")
});

/// Parses a strict `DD-MM-YYYY` date of birth. Returns `None` for anything
/// that is not exactly that shape or is not a real calendar date.
pub fn parse_date_of_birth(text: &str) -> Option<NaiveDate> {
    let captures = DATE_OF_BIRTH.captures(text)?;
    let day: u32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let year: i32 = captures[3].parse().ok()?;

    if year == 0 {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn validate_date_of_birth(text: &str) -> bool {
    parse_date_of_birth(text).is_some()
}

/// Accepts exactly `DDD-DDD-DDDD`, ASCII digits only.
pub fn validate_phone_number(text: &str) -> bool {
    PHONE_NUMBER.is_match(text)
}

/// Full years between `date_of_birth` and `today`. A birth date in the future
/// yields 0.
pub fn calculate_age(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    if date_of_birth > today {
        return 0;
    }

    let birthday_pending =
        (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day());
    let years = today.year() - date_of_birth.year() - i32::from(birthday_pending);

    years.max(0) as u32
}

fn check_date_of_birth(text: &str) -> Result<(), ValidationError> {
    if validate_date_of_birth(text) {
        Ok(())
    } else {
        Err(ValidationError::InvalidDateOfBirth(text.to_string()))
    }
}

fn check_phone_number(text: &str) -> Result<(), ValidationError> {
    if validate_phone_number(text) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhoneNumber(text.to_string()))
    }
}

pub fn check_new(fields: &NewPatient) -> Result<(), ValidationError> {
    check_date_of_birth(&fields.date_of_birth)?;
    check_phone_number(&fields.phone_number)
}

pub fn check_update(update: &PatientUpdate) -> Result<(), ValidationError> {
    if let Some(date_of_birth) = &update.date_of_birth {
        check_date_of_birth(date_of_birth)?;
    }
    if let Some(phone_number) = &update.phone_number {
        check_phone_number(phone_number)?;
    }
    Ok(())
}

impl ValidationPolicy {
    /// Applies the policy to the outcome of a check. Advisory mode swallows
    /// the failure after logging it.
    pub fn enforce(self, outcome: Result<(), ValidationError>) -> Result<(), ValidationError> {
        match (self, outcome) {
            (_, Ok(())) => Ok(()),
            (ValidationPolicy::Enforce, Err(e)) => Err(e),
            (ValidationPolicy::Advisory, Err(e)) => {
                tracing::warn!("Accepting record despite failed validation: {}", e);
                Ok(())
            }
        }
    }
}
