//! Recognize one photo and file its items into a room and location

use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

use inventory_ingest::config::{ACCESS_TOKEN_ENV, API_URL_ENV};
use inventory_ingest::prelude::*;

#[derive(Parser, Debug)]
#[clap(name = "inventory-ingest", version, about = "Add the items in a photo to your inventory")]
struct Args {
    /// Photo to recognize (jpg, png, webp, gif or heic)
    #[clap(value_name = "PHOTO")]
    photo: PathBuf,

    /// Room id every item is placed in
    #[clap(long, value_name = "ID")]
    room: String,

    /// Location id inside the room
    #[clap(long, value_name = "ID")]
    location: String,

    /// Print the recognized items without saving them
    #[clap(long)]
    dry_run: bool,

    /// Inventory API base URL
    #[clap(long, env = API_URL_ENV)]
    api_url: String,

    /// Bearer token of the signed-in user
    #[clap(long, env = ACCESS_TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Use English category labels
    #[clap(long)]
    english: bool,
}

async fn run(args: Args) -> Result<BatchOutcome> {
    let config = InventoryConfig::new(&args.api_url, args.token)?;
    let labels = if args.english { LabelSet::English } else { LabelSet::Chinese };
    let inventory = Inventory::new(config, ClientOptions::default().with_category_labels(labels));

    let mut session = inventory.ingest_file(&args.photo, PlacementMode::Shared).await?;
    for candidate in session.placement().candidates() {
        println!(
            "{} x{} [{}]",
            candidate.name(),
            candidate.fields.quantity,
            candidate.fields.category.as_deref().unwrap_or("-")
        );
    }

    session.select_room(Target::Shared, &args.room)?;
    session.select_location(Target::Shared, &args.location)?;
    if args.dry_run {
        session.placement().resolve()?;
        return Ok(BatchOutcome::default());
    }
    inventory.commit(&mut session).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let args = Args::parse();
    let dry_run = args.dry_run;
    match run(args).await {
        Ok(_) if dry_run => {
            println!("Dry run, nothing saved");
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            println!("{}", outcome.summary());
            if outcome.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
