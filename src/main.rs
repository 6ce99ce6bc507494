use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use rand::Rng;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod manager;
mod models;
mod shell;
mod storage;
mod validation;

use commands::{Args, Commands};
use config::Config;
use manager::PatientManager;
use models::{NewPatient, PatientUpdate};
use shell::Shell;

const FIRST_NAMES: [&str; 10] = [
    "Ama", "Kwame", "Esi", "Kofi", "Abena", "Yaw", "Akosua", "Kojo", "Efua", "Kwabena",
];
const LAST_NAMES: [&str; 10] = [
    "Mensah", "Owusu", "Asante", "Boateng", "Appiah", "Osei", "Addo", "Darko", "Quaye", "Adjei",
];
const HOMETOWNS: [&str; 6] = ["Accra", "Kumasi", "Tamale", "Cape Coast", "Ho", "Takoradi"];

fn random_patient(rng: &mut impl Rng) -> NewPatient {
    let day = rng.random_range(1..=28);
    let month = rng.random_range(1..=12);
    let year = rng.random_range(1940..=2015);

    NewPatient {
        first_name: FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())].to_string(),
        last_name: LAST_NAMES[rng.random_range(0..LAST_NAMES.len())].to_string(),
        date_of_birth: format!("{:02}-{:02}-{:04}", day, month, year),
        hometown: HOMETOWNS[rng.random_range(0..HOMETOWNS.len())].to_string(),
        house_number: format!("{} Main Street", rng.random_range(1..=250)),
        phone_number: format!(
            "0{:02}-{:03}-{:04}",
            rng.random_range(20..=59),
            rng.random_range(0..1000),
            rng.random_range(0..10000)
        ),
    }
}

async fn seed_patients(manager: &mut PatientManager, count: u32) -> Result<()> {
    tracing::info!("Seeding {} patients", count);

    let start = std::time::Instant::now();

    let batch: Vec<NewPatient> = {
        let mut rng = rand::rng();
        (0..count).map(|_| random_patient(&mut rng)).collect()
    };

    // Every add is a whole-file rewrite, same as a manual add
    let progress = ProgressBar::new(u64::from(count));
    for fields in batch {
        manager.add_patient(fields).await?;
        progress.inc(1);
    }
    progress.finish_and_clear();

    tracing::info!("Seeded {} patients in {:?}", count, start.elapsed());

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(config: Config, command: Commands) -> Result<()> {
    let mut manager = PatientManager::open(&config)
        .await
        .with_context(|| format!("Could not load patients from {}", config.path.display()))?;

    match command {
        Commands::Add(fields) => {
            let patient = manager
                .add_patient(fields.into())
                .await
                .context("Could not add patient")?;
            print_json(&patient)?;
        }
        Commands::List => print_json(manager.get_all_patients())?,
        Commands::Search { id } => match manager.search_by_id(id) {
            Some(patient) => print_json(patient)?,
            None => println!("Patient {} not found", id),
        },
        Commands::Update { id, fields } => {
            let update = PatientUpdate::from(fields);
            if update.is_empty() {
                println!("Nothing to update, pass at least one field");
            } else if manager
                .update_patient_by_id(id, update)
                .await
                .with_context(|| format!("Could not update patient {}", id))?
            {
                print_json(&manager.search_by_id(id))?;
            } else {
                println!("Patient {} not found", id);
            }
        }
        Commands::Delete { id } => {
            let removed = manager
                .delete_patient_by_id(id)
                .await
                .with_context(|| format!("Could not delete patient {}", id))?;
            if removed {
                println!("Deleted patient {}", id);
            } else {
                println!("Patient {} not found", id);
            }
        }
        Commands::Shell => {
            Shell::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .run(&mut manager)
                .await?
        }
        Commands::Seed { count } => seed_patients(&mut manager, count).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the subscriber so RUST_LOG can come from it
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
        }
    }

    let cli = Args::parse();
    let config = Config::from(&cli);
    match cli.command {
        Some(command) => run(config, command).await?,
        None => {
            println!("Run with --help to see instructions");
        }
    }

    Ok(())
}
