use clap::{Parser, Subcommand, command};

use std::path::PathBuf;

use crate::models::{NewPatient, PatientUpdate};
use crate::storage::Backend;
use crate::validation::ValidationPolicy;

#[derive(Parser)]
#[command(version, about = "Manage patient records kept in a CSV or JSON file")]
pub struct Args {
    /// Storage format of the records file
    #[arg(long, value_enum, env = "PATIENTS_BACKEND", default_value_t = Backend::Csv, global = true)]
    pub backend: Backend,

    /// Records file, defaults to patients.csv or patients.json
    #[arg(long, env = "PATIENTS_FILE", global = true)]
    pub file: Option<PathBuf>,

    /// Reject records with a malformed date of birth or phone number, or only warn
    #[arg(long, value_enum, env = "PATIENTS_VALIDATION", default_value_t = ValidationPolicy::Enforce, global = true)]
    pub validation: ValidationPolicy,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new patient
    Add(AddArgs),
    /// Print all patients
    List,
    /// Print the patient with the given id
    Search { id: u32 },
    /// Overwrite selected fields of a patient
    Update {
        id: u32,
        #[command(flatten)]
        fields: UpdateArgs,
    },
    /// Delete the patient with the given id
    Delete { id: u32 },
    /// Start the interactive menu
    Shell,
    /// Append randomly generated patients
    Seed {
        /// The number of patients to generate
        count: u32,
    },
}

#[derive(clap::Args)]
pub struct AddArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    /// Date of birth as DD-MM-YYYY
    #[arg(long)]
    pub date_of_birth: String,
    #[arg(long)]
    pub hometown: String,
    #[arg(long)]
    pub house_number: String,
    /// Phone number as DDD-DDD-DDDD
    #[arg(long)]
    pub phone_number: String,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// Date of birth as DD-MM-YYYY
    #[arg(long)]
    pub date_of_birth: Option<String>,
    #[arg(long)]
    pub hometown: Option<String>,
    #[arg(long)]
    pub house_number: Option<String>,
    /// Phone number as DDD-DDD-DDDD
    #[arg(long)]
    pub phone_number: Option<String>,
}

impl From<AddArgs> for NewPatient {
    fn from(args: AddArgs) -> Self {
        NewPatient {
            first_name: args.first_name,
            last_name: args.last_name,
            date_of_birth: args.date_of_birth,
            hometown: args.hometown,
            house_number: args.house_number,
            phone_number: args.phone_number,
        }
    }
}

impl From<UpdateArgs> for PatientUpdate {
    fn from(args: UpdateArgs) -> Self {
        PatientUpdate {
            first_name: args.first_name,
            last_name: args.last_name,
            date_of_birth: args.date_of_birth,
            hometown: args.hometown,
            house_number: args.house_number,
            phone_number: args.phone_number,
        }
    }
}
