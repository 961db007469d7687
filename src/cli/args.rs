//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Ask questions about PDF documents
#[derive(Parser, Debug)]
#[command(
    name = "pdfrag",
    version = env!("CARGO_PKG_VERSION"),
    about = "Index PDFs and answer questions from their content",
    long_about = "Chunk, embed and store PDF documents, then retrieve the passages most relevant to a question. Also runs as an MCP server.",
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ pdfrag init                          # Create .pdfrag/settings.toml and documents/\n  $ cp report.pdf documents/\n  $ pdfrag index report.pdf              # Extract, chunk, embed, store\n  $ pdfrag ask report.pdf \"What changed?\"  # Top matching chunks\n  $ pdfrag serve                         # MCP server on stdio"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .pdfrag directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Index a document
    #[command(
        about = "Extract, chunk, embed and store a PDF",
        after_help = "Examples:\n  pdfrag index report.pdf\n  pdfrag index report          # .pdf is appended\n  pdfrag index report.pdf --force"
    )]
    Index {
        /// File name of the PDF in the documents directory
        name: String,

        /// Index again even if already indexed (appends duplicate chunks)
        #[arg(short, long)]
        force: bool,
    },

    /// Show whether a document is indexed
    #[command(about = "Print 'true' or 'false' and the stored chunk count")]
    Status {
        /// File name of the PDF
        name: String,
    },

    /// Ask a question about an indexed document
    #[command(
        about = "Retrieve the chunks most relevant to a question",
        after_help = "Examples:\n  pdfrag ask report.pdf \"What is the budget?\"\n  pdfrag ask report.pdf \"Who signed it?\" -k 5 --json"
    )]
    Ask {
        /// File name of an indexed PDF
        name: String,

        /// The question
        query: String,

        /// Number of chunks to return (overrides config)
        #[arg(short, long)]
        k: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List indexed documents
    #[command(about = "List collections and their chunk counts")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the extracted text of a document
    #[command(about = "Print the full text extracted from a PDF")]
    Text {
        /// File name of the PDF
        name: String,
    },

    /// Start MCP server
    #[command(about = "Start MCP server on stdio")]
    Serve,
}
