use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tix", about = "Event ticketing on a hash-chained ledger", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file (ledger settings and event catalog)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Journal file; overrides the configured journal path
    #[arg(long, global = true)]
    pub journal: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Issue tickets and seal them into a new block
    Buy(BuyArgs),
    /// Seal an empty block
    Commit(CommitArgs),
    /// Look up a ticket and report its status
    Verify(VerifyArgs),
    /// Admit a ticket at the venue (marks it scanned)
    Scan(ScanArgs),
    /// Check chain integrity
    Validate(ValidateArgs),
    /// Show ticket counts per event
    Stats(StatsArgs),
    /// List blocks, newest first
    Explorer(ExplorerArgs),
    /// List the event catalog
    Events,
}

#[derive(Args)]
pub struct BuyArgs {
    /// Event to buy for (must be in the catalog)
    #[arg(short, long)]
    pub event: String,
    /// Buyer name; repeat to buy several tickets in one block
    #[arg(short, long = "name", required = true)]
    pub names: Vec<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub uid: Option<String>,
}

#[derive(Args)]
pub struct CommitArgs {
    /// Proof placeholder to record; defaults to the configured value
    #[arg(long)]
    pub proof: Option<u64>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub ticket_id: String,
}

#[derive(Args)]
pub struct ScanArgs {
    pub ticket_id: String,
    /// Only admit the ticket if it was issued for this event
    #[arg(short, long)]
    pub event: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {}

#[derive(Args)]
pub struct StatsArgs {
    #[arg(short, long)]
    pub event: Option<String>,
}

#[derive(Args)]
pub struct ExplorerArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    /// Include each block's transactions
    #[arg(long)]
    pub full: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_buy_multiple_names() {
        let cli =
            Cli::try_parse_from(["tix", "buy", "--event", "Freshers", "-n", "Alice", "-n", "Bob"])
                .unwrap();
        if let Command::Buy(args) = cli.command {
            assert_eq!(args.event, "Freshers");
            assert_eq!(args.names, vec!["Alice", "Bob"]);
            assert!(args.phone.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn buy_requires_a_name() {
        assert!(Cli::try_parse_from(["tix", "buy", "--event", "Freshers"]).is_err());
    }

    #[test]
    fn parse_scan_with_event() {
        let cli = Cli::try_parse_from(["tix", "scan", "abc123", "-e", "Diwali Dance"]).unwrap();
        if let Command::Scan(args) = cli.command {
            assert_eq!(args.ticket_id, "abc123");
            assert_eq!(args.event.as_deref(), Some("Diwali Dance"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_commit_proof() {
        let cli = Cli::try_parse_from(["tix", "commit", "--proof", "7"]).unwrap();
        if let Command::Commit(args) = cli.command {
            assert_eq!(args.proof, Some(7));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_explorer_limit() {
        let cli = Cli::try_parse_from(["tix", "explorer", "-n", "5", "--full"]).unwrap();
        if let Command::Explorer(args) = cli.command {
            assert_eq!(args.limit, 5);
            assert!(args.full);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "tix",
            "validate",
            "--format",
            "json",
            "--journal",
            "/tmp/x.journal",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.journal, Some(PathBuf::from("/tmp/x.journal")));
        assert!(matches!(cli.command, Command::Validate(_)));
    }

    #[test]
    fn parse_events() {
        let cli = Cli::try_parse_from(["tix", "events"]).unwrap();
        assert!(matches!(cli.command, Command::Events));
    }
}
