use clap::{Args, Parser, Subcommand};
use portwait::Target;

#[derive(Parser)]
#[command(
    name = "portwait",
    about = "Wait for TCP ports to start or stop accepting connections",
    version
)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log every failed probe to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Timing flags shared by the waiting commands.
#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Targets as host:port
    #[arg(required = true, value_parser = parse_target)]
    pub targets: Vec<Target>,
    /// Seconds to keep polling (whole number; config default if omitted)
    #[arg(long, short)]
    pub timeout: Option<String>,
    /// Seconds between probes
    #[arg(long, short)]
    pub interval: Option<f64>,
}

fn parse_target(s: &str) -> Result<Target, String> {
    s.parse().map_err(|e: portwait::PollError| e.to_string())
}

#[derive(Subcommand)]
pub enum Command {
    /// Wait until every target accepts connections
    #[command(alias = "up")]
    Open(WaitArgs),
    /// Wait until every target stops accepting connections
    #[command(alias = "down")]
    Closed(WaitArgs),
    /// Probe each target once and show its status
    Check {
        /// Targets as host:port
        #[arg(required = true, value_parser = parse_target)]
        targets: Vec<Target>,
    },
    /// Initialize or edit ~/.portwait/config.toml
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (reads from config if omitted)
        shell: Option<clap_complete::Shell>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_with_flags() {
        let cli = Cli::try_parse_from([
            "portwait", "open", "localhost:4444", "127.0.0.1:9515", "-t", "20", "-i", "0.5",
        ])
        .unwrap();
        match cli.command {
            Command::Open(args) => {
                assert_eq!(args.targets.len(), 2);
                assert_eq!(args.targets[1], Target::new("127.0.0.1", 9515));
                assert_eq!(args.timeout.as_deref(), Some("20"));
                assert_eq!(args.interval, Some(0.5));
            }
            _ => panic!("expected open"),
        }
    }

    #[test]
    fn rejects_target_without_port() {
        assert!(Cli::try_parse_from(["portwait", "check", "localhost"]).is_err());
        assert!(Cli::try_parse_from(["portwait", "closed", "localhost:abc"]).is_err());
    }

    #[test]
    fn requires_a_target() {
        assert!(Cli::try_parse_from(["portwait", "open"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["portwait", "closed", "localhost:80", "--debug"]).unwrap();
        assert!(cli.debug);
        assert!(!cli.no_color);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
