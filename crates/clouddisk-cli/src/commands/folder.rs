//! Folder CLI commands: ls, mkdir.

use clap::Args;

use clouddisk_core::error::AppError;
use clouddisk_core::types::{NodeId, OwnerId, PageRequest};
use clouddisk_service::{FileService, ListTarget};

use crate::output::{self, OutputFormat};

/// Arguments for the ls command
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Folder path to list; missing paths list as empty
    #[arg(short, long, conflicts_with = "parent")]
    pub path: Option<String>,

    /// Folder ID to list (0 for the root)
    #[arg(long, default_value = "0")]
    pub parent: NodeId,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u64,

    /// Items per page (at most 100)
    #[arg(long, default_value = "20")]
    pub limit: u64,
}

/// Arguments for the mkdir command
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Folder name (a single path segment)
    pub name: String,

    /// Parent folder ID (0 for the root)
    #[arg(long, default_value = "0")]
    pub parent: NodeId,

    /// Intermediate path under the parent, created if missing
    #[arg(short, long)]
    pub path: Option<String>,
}

/// Execute the ls command
pub async fn ls(
    service: &FileService,
    owner: OwnerId,
    args: &LsArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let target = match &args.path {
        Some(path) => ListTarget::Path(path.clone()),
        None => ListTarget::Parent(args.parent),
    };
    let listing = service
        .list(owner, target, PageRequest::new(args.page, args.limit))
        .await?;
    output::print_listing(&listing, format);
    Ok(())
}

/// Execute the mkdir command
pub async fn mkdir(
    service: &FileService,
    owner: OwnerId,
    args: &MkdirArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let folder = service
        .create_folder(owner, &args.name, args.parent, args.path.as_deref())
        .await?;
    output::print_node(&folder, format);
    output::print_success(&format!("Folder '{}' ready (id: {})", folder.path, folder.id));
    Ok(())
}
