use clap::{Parser, Subcommand};
use kindred_core::config::resolve_data_file;
use kindred_core::{
    AccessLevel, CoreConfig, FixedUserManager, PatientRepository, RecordId, RecordStore,
    ValidationService,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kindred")]
#[command(about = "Family-study permission checks")]
struct Cli {
    /// Record fixture to load (defaults to $KINDRED_DATA_FILE, then ./kindred.yaml)
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Act as this user instead of a guest
    #[arg(long, global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether patients may be added to a family
    CheckMembers {
        /// Family identifier
        family: String,
        /// Candidate patient identifiers
        members: Vec<String>,
    },
    /// Check whether the user may edit a family record
    FamilyAccess {
        /// Family identifier
        family: String,
    },
    /// Check whether the user holds an access tier over a patient
    PatientAccess {
        /// Patient identifier
        patient: String,
        /// Required tier (view or edit)
        #[arg(long, default_value = "edit")]
        level: String,
    },
    /// Check whether the user holds a named right on a document
    HasAccess {
        /// Document reference (name, space.name or wiki:space.name)
        document: String,
        /// Permission name, e.g. view or edit
        right: String,
    },
    /// List access tiers from least to most permissive
    Levels,
}

fn load_store(data: Option<PathBuf>) -> Result<Arc<RecordStore>, Box<dyn std::error::Error>> {
    let data = data.or_else(|| std::env::var("KINDRED_DATA_FILE").ok().map(PathBuf::from));
    let cfg = Arc::new(CoreConfig::with_data_file(resolve_data_file(data)?)?);
    Ok(Arc::new(RecordStore::load(cfg)?))
}

fn validation_as(
    store: &Arc<RecordStore>,
    user: Option<&str>,
) -> Result<ValidationService, Box<dyn std::error::Error>> {
    let user = user.map(|name| store.user_by_name(name)).transpose()?;
    Ok(ValidationService::from_store(
        store.clone(),
        Arc::new(FixedUserManager::new(user)),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Use 'kindred --help' for commands");
            return Ok(());
        }
    };

    let data = cli.data;
    let user = cli.user;
    let load = || -> Result<(Arc<RecordStore>, ValidationService), Box<dyn std::error::Error>> {
        let store = load_store(data.clone())?;
        let validation = validation_as(&store, user.as_deref())?;
        Ok((store, validation))
    };

    let output = match command {
        Commands::CheckMembers { family, members } => {
            let (store, validation) = load()?;
            let family = store.config().family_reference(&RecordId::parse(&family)?);
            let response = validation.can_add_every_member(&family, Some(members.as_slice()))?;
            serde_json::to_value(response)?
        }
        Commands::FamilyAccess { family } => {
            let (store, validation) = load()?;
            let family = store.config().family_reference(&RecordId::parse(&family)?);
            serde_json::to_value(validation.check_family_access(&family))?
        }
        Commands::PatientAccess { patient, level } => {
            let level = level.parse::<AccessLevel>()?;
            let (store, validation) = load()?;
            let granted = match level {
                AccessLevel::Edit => validation.has_patient_edit_access_by_id(&patient)?,
                AccessLevel::View => match store.patient_by_id(&RecordId::parse(&patient)?)? {
                    Some(patient) => validation.has_patient_view_access(&patient)?,
                    None => false,
                },
                other => return Err(format!("level must be view or edit, not {other}").into()),
            };
            json!({ "granted": granted })
        }
        Commands::HasAccess { document, right } => {
            let (store, validation) = load()?;
            let document = store.config().resolver().resolve(&document)?;
            json!({ "granted": validation.has_access(&document, &right)? })
        }
        Commands::Levels => {
            for level in AccessLevel::ALL {
                println!("{level}");
            }
            return Ok(());
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
