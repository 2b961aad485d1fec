//! CLI module for the concierge.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// Campus Concierge - answers student questions about events, exams and placements
///
/// Routes each question to a data lookup tool chosen by an LLM, then has the
/// LLM phrase the answer from the rows it found.
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CONCIERGE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP chat API
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question from the terminal
    Ask {
        /// The question to ask
        query: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Recreate the demo dataset, dated from today
    Seed,

    /// Print every row of a table
    List {
        /// Table to list
        #[arg(value_enum)]
        table: Table,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Table {
    Events,
    Exams,
    Placements,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_table() {
        let cli = Cli::try_parse_from(["concierge", "-vv", "list", "placements"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::List {
                table: Table::Placements
            }
        ));
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["concierge", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
            }
            other => panic!("Expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_table_rejected() {
        assert!(Cli::try_parse_from(["concierge", "list", "hostels"]).is_err());
    }
}
