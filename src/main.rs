//! Universal Storage - Entry Point
//!
//! Runs a single storage command against the configured root.

use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use universal_storage::cli::{Cli, Commands};
use universal_storage::error::handlers::{error_to_exit_code, handle_error};
use universal_storage::utils::logging::setup_logging;
use universal_storage::{
    AsyncStorage, FileStorage, LoggingListener, Settings, StorageError, StorageResult,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging();

    let settings = match cli.config {
        Some(path) => Settings::load(path),
        None => Settings::load_default(),
    };

    let result = match settings {
        Ok(settings) => run(settings, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handle_error(&e);
            eprintln!("{}", e);
            ExitCode::from(error_to_exit_code(&e) as u8)
        }
    }
}

async fn run(settings: Settings, command: Commands) -> StorageResult<()> {
    let storage = AsyncStorage::new(FileStorage::new(settings));
    storage.register_listener(Arc::new(LoggingListener));

    info!("Running {:?}", command);

    match command {
        Commands::Store { source, target } => {
            storage.store_file(PathBuf::from(source), target).await
        }
        Commands::RemoveFile { path } => storage.remove_file(path).await,
        Commands::CreateFolder { path } => storage.create_folder(path).await,
        Commands::RemoveFolder { path } => storage.remove_folder(path).await,
        Commands::Retrieve { path } => match storage.retrieve_file(path.clone()).await? {
            Some(staged) => {
                println!("{}", staged.path().display());
                Ok(())
            }
            None => Err(StorageError::NotFound(format!(
                "nothing to retrieve at '{}'",
                path
            ))),
        },
        Commands::Clean => storage.clean().await,
        Commands::Wipe => storage.wipe().await,
    }
}
