//! CLI command definitions and dispatch.

pub mod file;
pub mod folder;
pub mod migrate;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use clouddisk_core::config::AppConfig;
use clouddisk_core::error::AppError;
use clouddisk_core::types::OwnerId;
use clouddisk_database::migration::run_migrations;
use clouddisk_database::{DatabasePool, SqlNodeRepository};
use clouddisk_service::{FileService, run_cancellable};
use clouddisk_storage::open_blob_store;

use crate::output::OutputFormat;

/// CloudDisk: a per-user virtual file tree over content-addressed blobs
#[derive(Debug, Parser)]
#[command(name = "clouddisk", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from `config/<env>`
    #[arg(long, global = true, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Owner whose tree is operated on
    #[arg(long, global = true, default_value = "1")]
    pub owner: OwnerId,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate,
    /// Upload a single file
    Upload(file::UploadArgs),
    /// Upload a local directory tree
    UploadDir(file::UploadDirArgs),
    /// List a directory
    Ls(folder::LsArgs),
    /// Create a folder
    Mkdir(folder::MkdirArgs),
    /// Download a file
    Get(file::GetArgs),
    /// Show a node's metadata
    Info(file::NodeArgs),
    /// Delete a file or an empty folder
    Rm(file::NodeArgs),
}

impl Cli {
    /// Execute the CLI command. Ctrl-C cancels the command in flight.
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                trigger.cancel();
            }
        });

        run_cancellable(&cancel, self.dispatch(config)).await
    }

    async fn dispatch(&self, config: AppConfig) -> Result<(), AppError> {
        if let Commands::Migrate = self.command {
            return migrate::execute(&config).await;
        }

        let service = open_file_service(&config).await?;
        let owner = self.owner;
        let format = self.format;
        match &self.command {
            Commands::Migrate => Ok(()),
            Commands::Upload(args) => file::upload(&service, owner, args, format).await,
            Commands::UploadDir(args) => file::upload_dir(&service, owner, args, format).await,
            Commands::Ls(args) => folder::ls(&service, owner, args, format).await,
            Commands::Mkdir(args) => folder::mkdir(&service, owner, args, format).await,
            Commands::Get(args) => file::get(&service, owner, args).await,
            Commands::Info(args) => file::info(&service, owner, args, format).await,
            Commands::Rm(args) => file::rm(&service, owner, args).await,
        }
    }
}

/// Helper: connect to the database and apply pending migrations
pub async fn open_database(config: &AppConfig) -> Result<DatabasePool, AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;
    Ok(db)
}

/// Helper: build the file service from configuration
pub async fn open_file_service(config: &AppConfig) -> Result<FileService, AppError> {
    let db = open_database(config).await?;
    let blobs = open_blob_store(&config.storage).await?;
    Ok(FileService::new(
        Arc::new(SqlNodeRepository::new(db.into_pool())),
        blobs,
        config.storage.max_upload_size_bytes,
    ))
}
