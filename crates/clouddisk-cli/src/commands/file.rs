//! File CLI commands: upload, upload-dir, get, info, rm.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::Args;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use clouddisk_core::error::{AppError, ErrorKind};
use clouddisk_core::types::{NodeId, OwnerId};
use clouddisk_service::{BatchItem, FileService, UploadRequest};

use crate::output::{self, OutputFormat};

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Path to the file to upload
    pub file: PathBuf,

    /// Target folder path, created if missing
    #[arg(short, long, conflicts_with = "parent")]
    pub path: Option<String>,

    /// Target folder ID (0 for the root)
    #[arg(long, default_value = "0")]
    pub parent: NodeId,

    /// Override file name
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Arguments for the upload-dir command
#[derive(Debug, Args)]
pub struct UploadDirArgs {
    /// Local directory whose files are uploaded
    pub dir: PathBuf,

    /// Folder ID the tree is recreated under (0 for the root)
    #[arg(long, default_value = "0")]
    pub parent: NodeId,
}

/// Arguments for the get command
#[derive(Debug, Args)]
pub struct GetArgs {
    /// File node ID
    pub id: NodeId,

    /// Write to this path instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for commands taking a single node ID
#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Node ID
    pub id: NodeId,
}

/// Execute the upload command
pub async fn upload(
    service: &FileService,
    owner: OwnerId,
    args: &UploadArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let data = read_local(&args.file).await?;
    let original_name = match &args.name {
        Some(name) => name.clone(),
        None => local_file_name(&args.file)?,
    };

    let parent_id = match &args.path {
        Some(path) => service.tree().resolve_or_create(owner, path).await?,
        None => args.parent,
    };

    let node = service
        .upload(
            owner,
            UploadRequest {
                data,
                original_name,
                mime_type: None,
                parent_id,
            },
        )
        .await?;

    output::print_node(&node, format);
    output::print_success(&format!("Uploaded '{}' (id: {})", node.path, node.id));
    Ok(())
}

/// Execute the upload-dir command
pub async fn upload_dir(
    service: &FileService,
    owner: OwnerId,
    args: &UploadDirArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let files = collect_files(&args.dir).await?;
    if files.is_empty() {
        output::print_success("Nothing to upload.");
        return Ok(());
    }

    let mut items = Vec::with_capacity(files.len());
    for (path, relative_path) in files {
        items.push(BatchItem {
            data: read_local(&path).await?,
            fallback_name: local_file_name(&path)?,
            relative_path,
            mime_type: None,
        });
    }

    let nodes = service.batch_upload(owner, items, args.parent).await?;
    output::print_nodes(&nodes, format);
    output::print_success(&format!("Uploaded {} files", nodes.len()));
    Ok(())
}

/// Execute the get command
pub async fn get(service: &FileService, owner: OwnerId, args: &GetArgs) -> Result<(), AppError> {
    let download = service.download(owner, args.id).await?;

    let written = match &args.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::InvalidInput,
                    format!("Failed to create {}", path.display()),
                    e,
                )
            })?;
            copy_stream(download.stream, &mut file).await?
        }
        None => copy_stream(download.stream, &mut tokio::io::stdout()).await?,
    };

    output::print_success(&format!("Downloaded '{}' ({written} bytes)", download.node.name));
    Ok(())
}

/// Execute the info command
pub async fn info(
    service: &FileService,
    owner: OwnerId,
    args: &NodeArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let node = service.get_node(owner, args.id).await?;
    output::print_node(&node, format);
    Ok(())
}

/// Execute the rm command
pub async fn rm(service: &FileService, owner: OwnerId, args: &NodeArgs) -> Result<(), AppError> {
    service.delete(owner, args.id).await?;
    output::print_success(&format!("Deleted node {}", args.id));
    Ok(())
}

async fn read_local(path: &Path) -> Result<Bytes, AppError> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::InvalidInput,
            format!("Failed to read {}", path.display()),
            e,
        )
    })?;
    Ok(Bytes::from(data))
}

fn local_file_name(path: &Path) -> Result<String, AppError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::invalid_input(format!("No file name in {}", path.display())))
}

/// Walk `root` and return every regular file with its `/`-joined path
/// relative to `root`, sorted by relative path.
async fn collect_files(root: &Path) -> Result<Vec<(PathBuf, String)>, AppError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| read_dir_error(&dir, e))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| read_dir_error(&dir, e))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| read_dir_error(&dir, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let relative = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((path, relative));
            }
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn read_dir_error(dir: &Path, e: std::io::Error) -> AppError {
    AppError::with_source(
        ErrorKind::InvalidInput,
        format!("Failed to read directory {}", dir.display()),
        e,
    )
}

async fn copy_stream<W>(
    mut stream: clouddisk_core::traits::blob::ByteStream,
    writer: &mut W,
) -> Result<u64, AppError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Stream read error", e)
        })?;
        writer.write_all(&chunk).await.map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to write output", e)
        })?;
        written += chunk.len() as u64;
    }
    writer
        .flush()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to flush output", e))?;
    Ok(written)
}
