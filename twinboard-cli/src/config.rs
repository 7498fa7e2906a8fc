//! Command-line arguments
//!
//! Every flag falls back to a `TWINBOARD_*` environment variable, which may
//! in turn come from a `.env` file.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use simplelog::LevelFilter;
use uuid::Uuid;

use twinboard_lib::model::MachineStatus;

/// Machine digital-twin dashboard
#[derive(Parser, Debug)]
#[command(name = "twinboard", version, about = "Machine digital-twin dashboard")]
pub struct Cli {
    /// Log level for the log file and the serve console
    #[arg(long, env = "TWINBOARD_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: LevelFilter,

    /// Base URL of a running machines API
    #[arg(
        long,
        env = "TWINBOARD_API_URL",
        default_value = "http://127.0.0.1:3000",
        global = true
    )]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the machines API server
    Serve(ServeArgs),

    /// Print every machine as a table
    List,

    /// Browse machines page by page
    Browse(BrowseArgs),

    /// Show one machine with its model iterations
    Show {
        /// Machine id
        id: Uuid,
    },

    /// Upload a JSON dataset as a new machine
    Upload {
        /// Machine name
        #[arg(long)]
        name: String,

        /// Path to the JSON dataset
        #[arg(long)]
        file: PathBuf,
    },

    /// Update a machine's status or accuracy
    Patch {
        /// Machine id
        id: Uuid,

        #[arg(long)]
        status: Option<MachineStatus>,

        #[arg(long)]
        accuracy: Option<f64>,
    },
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "TWINBOARD_BIND", default_value = twinboard_lib::server::DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// SQLite database file (defaults to the platform data directory)
    #[arg(long, env = "TWINBOARD_DB")]
    pub db: Option<PathBuf>,

    /// Data-science service URL
    #[arg(
        long,
        env = "TWINBOARD_SCIENCE_URL",
        default_value = twinboard_lib::science::DEFAULT_SCIENCE_URL
    )]
    pub science_url: String,

    /// Data-science request timeout in seconds
    #[arg(long, env = "TWINBOARD_SCIENCE_TIMEOUT_SECS", default_value_t = 120)]
    pub science_timeout_secs: u64,
}

#[derive(clap::Args, Debug)]
pub struct BrowseArgs {
    /// Rows per page
    #[arg(long, default_value_t = twinboard_lib::table::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Status shown in the heading (active, inactive, error)
    #[arg(long, default_value = "")]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_patch() {
        let id = Uuid::new_v4();
        let cli = Cli::parse_from([
            "twinboard",
            "patch",
            &id.to_string(),
            "--status",
            "error",
        ]);
        match cli.command {
            Command::Patch { id: parsed, status, accuracy } => {
                assert_eq!(parsed, id);
                assert_eq!(status, Some(MachineStatus::Error));
                assert_eq!(accuracy, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_browse_defaults() {
        let cli = Cli::parse_from(["twinboard", "browse"]);
        match cli.command {
            Command::Browse(args) => {
                assert_eq!(args.page_size, 100);
                assert!(args.status.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
