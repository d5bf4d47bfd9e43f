use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "modsynth",
    about = "modsynth: synthesize modules on demand from glob-matched generator rules",
    version
)]
pub struct Cli {
    /// Log dispatch decisions to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a glob and test names against it
    Match {
        /// Glob pattern (`*` = one segment, `**` = any number of segments)
        pattern: String,

        /// Names (or request paths) to test
        #[arg(required = true)]
        names: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a manifest and list its loaders and rules
    Check {
        /// Path to the TOML manifest
        #[arg(long, default_value = "modsynth.toml")]
        manifest: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve requests through every loader of a manifest and print the units
    Resolve {
        /// Path to the TOML manifest
        #[arg(long, default_value = "modsynth.toml")]
        manifest: String,

        /// Requested module names or paths
        #[arg(required = true)]
        requests: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve requests, then print which loader generated each name
    Provenance {
        /// Path to the TOML manifest
        #[arg(long, default_value = "modsynth.toml")]
        manifest: String,

        /// Requested module names or paths
        #[arg(required = true)]
        requests: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
