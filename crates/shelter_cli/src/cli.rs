//! Command-line surface definitions.

use clap::{Args, Parser, Subcommand};
use shelter_core::{AlertSeverity, AlertStatus, PersonRole};
use std::path::PathBuf;
use uuid::Uuid;

/// Shelter occupancy ledger for disaster response.
#[derive(Parser, Debug)]
#[command(name = "shelter", version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file; overrides `database_path` from the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Shelter directory
    #[command(subcommand)]
    Shelter(ShelterCommand),

    /// Person directory
    #[command(subcommand)]
    Person(PersonCommand),

    /// Check-ins, check-outs and stay history
    #[command(subcommand)]
    Ledger(LedgerCommand),

    /// Relief resource inventory
    #[command(subcommand)]
    Resource(ResourceCommand),

    /// Hazard alerts
    #[command(subcommand)]
    Alert(AlertCommand),
}

#[derive(Subcommand, Debug)]
pub enum ShelterCommand {
    /// Register a shelter
    Create(CreateShelterArgs),

    /// List shelters
    List {
        /// Include deactivated shelters
        #[arg(long)]
        all: bool,
    },

    /// Show one shelter
    Get {
        id: Uuid,

        /// Also return a deactivated shelter
        #[arg(long)]
        include_inactive: bool,
    },

    /// Soft-delete a shelter
    Deactivate { id: Uuid },
}

#[derive(Args, Debug)]
pub struct CreateShelterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub location: String,

    /// Number of beds; must be positive
    #[arg(long)]
    pub capacity: u32,

    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum PersonCommand {
    /// Register a person
    Create(CreatePersonArgs),

    /// Show one person
    Get { id: Uuid },

    /// List persons
    List {
        /// Only persons with this role
        #[arg(long)]
        role: Option<PersonRole>,
    },
}

#[derive(Args, Debug)]
pub struct CreatePersonArgs {
    #[arg(long)]
    pub name: String,

    /// Eleven-digit national registry number
    #[arg(long)]
    pub national_id: String,

    /// admin, manager, volunteer or affected
    #[arg(long, default_value = "affected")]
    pub role: PersonRole,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// House a person in a shelter
    CheckIn {
        #[arg(long)]
        shelter: Uuid,

        #[arg(long)]
        person: Uuid,
    },

    /// End an active stay
    CheckOut { record: Uuid },

    /// Show one stay record
    Get { record: Uuid },

    /// List every stay record
    List,

    /// Active stays at one shelter
    Active {
        #[arg(long)]
        shelter: Uuid,
    },

    /// Stay history of one person
    Person {
        #[arg(long)]
        person: Uuid,
    },

    /// Recompute a shelter's occupancy from its active stays
    Reconcile {
        #[arg(long)]
        shelter: Uuid,
    },

    /// Remove a stay record
    Delete { record: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    /// Register a resource
    Create(CreateResourceArgs),

    /// List resources
    List {
        #[arg(long)]
        category: Option<String>,
    },

    /// Add a signed delta to a resource quantity
    Adjust {
        id: Uuid,

        #[arg(long, allow_negative_numbers = true)]
        delta: i64,
    },

    /// Remove a resource
    Delete { id: Uuid },

    /// Resources past their expiry
    Expired,

    /// Resources at or below the low-stock threshold
    LowStock {
        /// Overrides `low_stock_threshold` from the config
        #[arg(long, allow_negative_numbers = true)]
        threshold: Option<i64>,
    },
}

#[derive(Args, Debug)]
pub struct CreateResourceArgs {
    #[arg(long)]
    pub category: String,

    #[arg(long, allow_negative_numbers = true)]
    pub quantity: i64,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub unit: Option<String>,

    /// Expiry as epoch milliseconds
    #[arg(long)]
    pub expires_at: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum AlertCommand {
    /// Issue an alert
    Create(CreateAlertArgs),

    /// List alerts
    List {
        #[arg(long)]
        severity: Option<AlertSeverity>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Alerts with status `active`
    Active,

    /// Overwrite an alert's status
    SetStatus { id: Uuid, status: AlertStatus },

    /// Remove an alert
    Delete { id: Uuid },

    /// Classify hazard risk with an external predictor
    Assess(AssessArgs),
}

#[derive(Args, Debug)]
pub struct AssessArgs {
    /// JSON file with `disaster_history`, `affected_population`,
    /// `critical_infrastructure` and `disaster_kind`
    #[arg(long)]
    pub features: PathBuf,

    /// Program that reads the features on stdin and prints a risk label
    #[arg(long)]
    pub predictor: PathBuf,

    /// Arguments passed to the predictor, after `--`
    #[arg(last = true)]
    pub predictor_args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CreateAlertArgs {
    /// Hazard kind, e.g. flood
    #[arg(long)]
    pub category: String,

    /// low, medium, high or critical
    #[arg(long)]
    pub severity: AlertSeverity,

    #[arg(long)]
    pub area: String,

    /// Issuing agency
    #[arg(long)]
    pub source: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    #[arg(long)]
    pub radius_km: Option<f64>,

    /// Start as epoch milliseconds; defaults to now
    #[arg(long)]
    pub starts_at: Option<i64>,

    /// Estimated end as epoch milliseconds
    #[arg(long)]
    pub estimated_end_at: Option<i64>,
}
