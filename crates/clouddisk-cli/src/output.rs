//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use clouddisk_entity::node::{Node, NodeListing};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One node as a table row.
#[derive(Debug, Serialize, Tabled)]
pub struct NodeRow {
    /// Node ID
    id: i64,
    /// `dir` or `file`
    kind: &'static str,
    /// Name
    name: String,
    /// Size in bytes
    size: i64,
    /// MIME type
    mime: String,
    /// Last update
    updated_at: String,
}

impl From<&Node> for NodeRow {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.get(),
            kind: if node.is_dir { "dir" } else { "file" },
            name: node.name.clone(),
            size: node.size_bytes,
            mime: node.mime_type.clone().unwrap_or_default(),
            updated_at: node.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Print a list of nodes in the selected format
pub fn print_nodes(nodes: &[Node], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if nodes.is_empty() {
                println!("No results found.");
            } else {
                let rows: Vec<NodeRow> = nodes.iter().map(NodeRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json => print_json(&nodes, "[]"),
    }
}

/// Print one page of a directory listing
pub fn print_listing(listing: &NodeListing, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            print_nodes(&listing.items, format);
            println!(
                "Page {}/{} ({} items)",
                listing.page, listing.total_pages, listing.total_items
            );
        }
        OutputFormat::Json => print_json(listing, "{}"),
    }
}

/// Print a single node's metadata
pub fn print_node(node: &Node, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            print_kv("ID", &node.id.to_string());
            print_kv("Name", &node.name);
            print_kv("Path", &node.path);
            print_kv("Type", if node.is_dir { "directory" } else { "file" });
            print_kv("Parent", &node.parent_id.to_string());
            if !node.is_dir {
                print_kv("Size", &format!("{} bytes", node.size_bytes));
                print_kv("MIME type", node.mime_type.as_deref().unwrap_or("-"));
                print_kv("Content hash", node.content_hash.as_deref().unwrap_or("-"));
                print_kv("Storage key", node.storage_key.as_deref().unwrap_or("-"));
            }
            print_kv("Created", &node.created_at.to_rfc3339());
            print_kv("Updated", &node.updated_at.to_rfc3339());
        }
        OutputFormat::Json => print_json(node, "{}"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, fallback: &str) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string());
    println!("{json}");
}

/// Print a success message
pub fn print_success(msg: &str) {
    eprintln!("✓ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<16} {}", format!("{key}:"), value);
}
