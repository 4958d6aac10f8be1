//! Command-line arguments for the `ack-frontend` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::DocumentId;

#[derive(Parser, Debug)]
#[command(
    name = "ack-frontend",
    version,
    about = "Review and acknowledge shared documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show all documents and the ones awaiting your acknowledgment.
    List,

    /// Show a document's details and render its preview.
    Show(ShowArgs),

    /// Acknowledge a document after reviewing it.
    Ack(AckArgs),

    /// Upload a PDF, DOCX or XLSX document.
    Upload(UploadArgs),

    /// Save the stored document to a local file.
    Download(DownloadArgs),

    /// Delete a document you uploaded.
    Delete {
        #[arg(value_name = "ID")]
        id: DocumentId,
    },
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    #[arg(value_name = "ID")]
    pub id: DocumentId,

    /// Write rendered pages as PNG files into this directory.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct AckArgs {
    #[arg(value_name = "ID")]
    pub id: DocumentId,

    /// Confirm you have read and understood the document.
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    #[arg(value_name = "ID")]
    pub id: DocumentId,

    /// Destination file. Defaults to the document's name in the current directory.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct UploadArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Special requirements shown to everyone reviewing the document.
    #[arg(long = "requirements", value_name = "TEXT", default_value = "")]
    pub requirements: String,
}
