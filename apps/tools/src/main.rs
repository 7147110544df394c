use anyhow::Result;
use clap::{Parser, Subcommand};
use storage::Storage;

/// Maintains the reference collections the events app only reads.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/events.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the default themes, types, institutions, audiences and organisers.
    SeedDefaults,
    CreateTheme { name: String },
    CreateActivityType { name: String },
    CreateInstitution { name: String },
    CreateTargetAudience { description: String },
    CreateResponsibleParty { name: String },
    /// Print how many rows each reference collection holds.
    Counts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::SeedDefaults => {
            let counts = storage.seed_reference_defaults().await?;
            println!("seeded reference data: {counts:?}");
        }
        Command::CreateTheme { name } => {
            let id = storage.create_theme(&name).await?;
            println!("created theme id={id}");
        }
        Command::CreateActivityType { name } => {
            let id = storage.create_activity_type(&name).await?;
            println!("created activity type id={id}");
        }
        Command::CreateInstitution { name } => {
            let id = storage.create_institution(&name).await?;
            println!("created institution id={id}");
        }
        Command::CreateTargetAudience { description } => {
            let id = storage.create_target_audience(&description).await?;
            println!("created target audience id={id}");
        }
        Command::CreateResponsibleParty { name } => {
            let id = storage.create_responsible_party(&name).await?;
            println!("created responsible party id={id}");
        }
        Command::Counts => {
            let counts = storage.reference_counts().await?;
            println!("themes={}", counts.themes);
            println!("activity_types={}", counts.activity_types);
            println!("institutions={}", counts.institutions);
            println!("target_audiences={}", counts.target_audiences);
            println!("responsible_parties={}", counts.responsible_parties);
        }
    }

    Ok(())
}
