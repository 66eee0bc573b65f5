use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory holding config.yaml and the vector snapshot.
    /// Defaults to $SIGSEARCH_BASE_PATH or ~/.local/share/sigsearch
    #[clap(long, global = true)]
    pub base_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Index a text document
    Index {
        /// Document content
        #[clap(short, long)]
        content: String,

        /// Metadata as a JSON object
        #[clap(short, long)]
        metadata: Option<String>,
    },

    /// Search documents by text similarity
    Search {
        /// Query text
        #[clap(short, long)]
        text: String,

        /// Maximum results (defaults to config default_search_limit)
        #[clap(short, long)]
        limit: Option<usize>,

        /// Only match documents whose metadata equals this JSON object
        #[clap(short, long)]
        filter: Option<String>,
    },

    /// Index a JPEG or PNG image under a description
    IndexImage {
        /// Image file
        #[clap(long)]
        file: PathBuf,

        /// Image description
        #[clap(short, long)]
        description: String,

        /// Metadata as a JSON object
        #[clap(short, long)]
        metadata: Option<String>,
    },

    /// Find images similar to a JPEG or PNG file
    SearchImage {
        /// Query image file
        #[clap(long)]
        file: PathBuf,

        /// Optional description hint
        #[clap(short, long)]
        description: Option<String>,

        /// Maximum results (0 for default)
        #[clap(short, long, default_value = "0")]
        limit: usize,
    },

    /// Search with a raw query vector
    SearchVector {
        /// Comma-separated vector components
        #[clap(short, long)]
        vector: String,

        /// Maximum results
        #[clap(short, long, default_value = "10")]
        limit: usize,

        /// Candidate count for the nearest-neighbor index
        #[clap(long)]
        candidates: Option<usize>,
    },
}
