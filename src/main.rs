mod admin;
mod aggregate;
mod error;
mod form;
mod model;
mod render;
mod settings;
mod sheets;
mod store;
mod util;
mod web;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::aggregate::csv::NO_QUESTIONS_MESSAGE;
use crate::aggregate::{export_csv, ResponseTable};
use crate::render::helpers::write_string;
use crate::render::templates::Pages;
use crate::settings::{resolve_settings, Settings};
use crate::sheets::{run_sync, SyncWorker};
use crate::store::Store;

#[derive(Parser)]
#[command(name = "survey")]
#[command(about = "Survey collection server with admin dashboard and sheet sync")]
#[command(version)]
struct Cli {
  /// Directory holding settings.json and the database
  #[arg(long, global = true, default_value = "survey-data")]
  data_dir: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the respondent form and admin dashboard
  Serve {
    /// Overrides bindAddr from settings
    #[arg(long)]
    bind: Option<String>,
  },
  /// Create an admin account, or reset its password
  AddAdmin {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  /// Write all responses as CSV
  ExportCsv {
    /// Output file (defaults to survey-responses-<date>.csv)
    #[arg(long)]
    out: Option<PathBuf>,
  },
  /// Write the default questions if none exist
  Seed,
  /// Mirror one stored response into the configured sheet
  Sync {
    response_id: String,
  },
}

fn open_store(settings: &Settings, data_dir: &Path) -> Result<Store, Box<dyn Error>> {
  Ok(Store::open(&settings.database_path(data_dir))?)
}

fn serve(settings: Settings, data_dir: &Path, bind: Option<String>) -> Result<(), Box<dyn Error>> {
  let database = settings.database_path(data_dir);
  let store = match Store::open(&database) {
    Ok(store) => Some(store),
    Err(err) => {
      tracing::error!(path = %database.display(), error = %err, "database unavailable; serving configuration notice");
      None
    }
  };
  let credentials = settings.sheets.credentials();
  if credentials.is_none() {
    tracing::warn!("sheet credentials incomplete; responses will not be mirrored");
  }
  let bind_addr = bind.unwrap_or_else(|| settings.bind_addr.clone());

  let worker = SyncWorker::for_sheets(database, credentials)?;
  let mut app = web::App::new(settings, store, Pages::load()?);
  app.attach_sync(worker.sender());

  let served = web::serve(&bind_addr, &mut app);
  drop(app);
  worker.shutdown();
  Ok(served?)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
  let settings = resolve_settings(&cli.data_dir)?;
  match cli.command {
    Commands::Serve { bind } => serve(settings, &cli.data_dir, bind),
    Commands::AddAdmin { email, password } => {
      let mut store = open_store(&settings, &cli.data_dir)?;
      admin::auth::register_account(&mut store, &email, &password)?;
      println!("Admin account saved: {}", email.trim().to_lowercase());
      Ok(())
    }
    Commands::ExportCsv { out } => {
      let store = open_store(&settings, &cli.data_dir)?;
      let questions = store.list_questions()?;
      if questions.is_empty() {
        return Err(NO_QUESTIONS_MESSAGE.into());
      }
      let responses = store.list_responses()?;
      let csv = export_csv(&ResponseTable::build(&questions, &responses));
      let path = out.unwrap_or_else(|| PathBuf::from(util::time::csv_filename(&Utc::now())));
      write_string(&path, &csv)?;
      println!("Wrote {} responses to {}", responses.len(), path.display());
      Ok(())
    }
    Commands::Seed => {
      let mut store = open_store(&settings, &cli.data_dir)?;
      if store.seed_defaults_if_empty()? {
        println!("Default questions written.");
      } else {
        println!("Questions already exist; nothing to do.");
      }
      Ok(())
    }
    Commands::Sync { response_id } => {
      let store = open_store(&settings, &cli.data_dir)?;
      let status = run_sync(&store, settings.sheets.credentials().as_ref(), &response_id)?;
      println!("{status:?}");
      Ok(())
    }
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_target(false)
    .init();

  let cli = Cli::parse();
  if let Err(err) = run(cli) {
    tracing::error!(error = %err, "command failed");
    eprintln!("{err}");
    std::process::exit(1);
  }
}
