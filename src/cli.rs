use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pixelstore")]
#[command(author, version, about = "Local image storage with compression on upload")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server serving and accepting images
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compress and store an image, printing its public URL
    Save {
        /// Image file to store
        #[arg(required = true)]
        file: PathBuf,

        /// Directory under the storage root (default: YYYY/MM)
        #[arg(long)]
        target_dir: Option<PathBuf>,
    },

    /// Read a stored image
    Read {
        /// Path relative to the storage root
        #[arg(required = true)]
        path: String,

        /// Write the image here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check whether a stored image exists
    Exists {
        /// File name to look for
        #[arg(required = true)]
        name: String,

        /// Directory under the storage root (default: the root itself)
        #[arg(long)]
        target_dir: Option<PathBuf>,
    },

    /// Check that the external codec tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
