mod cli;
mod config;
mod display;
mod logging;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::info;

use cli::{Cli, Command, WaitArgs};
use config::Config;
use portwait::{Desired, Platform, SocketPoller, probe_once, wait_for_all};

fn main() -> Result<()> {
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();
    let cfg = Config::load();

    if cli.no_color {
        colored::control::set_override(false);
    }
    logging::init(cli.debug || cfg.debug)?;

    let success = match cli.command {
        Command::Open(args) => cmd_wait(args, Desired::Open, cli.debug, &cfg)?,
        Command::Closed(args) => cmd_wait(args, Desired::Closed, cli.debug, &cfg)?,
        Command::Check { targets } => cmd_check(targets),
        Command::Config => cmd_config(&cfg)?,
        Command::Completions { shell } => cmd_completions(shell, &cfg)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_wait(args: WaitArgs, desired: Desired, debug: bool, cfg: &Config) -> Result<bool> {
    let poll = cfg.poll_config(args.timeout.as_deref(), args.interval, debug)?;
    info!(
        targets = args.targets.len(),
        ?desired,
        timeout = ?poll.timeout,
        interval = ?poll.interval,
        "waiting"
    );

    let reached = match args.targets.as_slice() {
        [single] => {
            let poller = SocketPoller::new(single.clone(), poll);
            let result = match desired {
                Desired::Open => poller.is_open(),
                Desired::Closed => poller.is_closed(),
            };
            result.with_context(|| format!("failed while waiting for {}", poller.target()))?
        }
        many => wait_for_all(many, poll, desired).context("failed while waiting for targets")?,
    };

    let verb = match desired {
        Desired::Open => "open",
        Desired::Closed => "closed",
    };
    display::print_wait_result(verb, &args.targets, reached);
    Ok(reached)
}

fn cmd_check(targets: Vec<portwait::Target>) -> bool {
    let platform = Platform::current();
    let rows: Vec<display::Row> = targets
        .into_iter()
        .map(|target| {
            let status = probe_once(&target, platform).map_err(|e| e.to_string());
            display::Row { target, status }
        })
        .collect();

    display::print_check_rows(&rows);
    rows.iter().all(|r| matches!(r.status, Ok(true)))
}

fn cmd_config(cfg: &Config) -> Result<bool> {
    let path = Config::init()?;
    let editor = cfg.resolve_editor();

    let status = std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("failed to launch editor '{}'", editor))?;

    if !status.success() {
        anyhow::bail!("editor exited with {}", status);
    }

    Ok(true)
}

fn cmd_completions(shell: Option<clap_complete::Shell>, cfg: &Config) -> Result<bool> {
    let shell = match shell {
        Some(s) => s,
        None => {
            let name = cfg.shell.as_deref().ok_or_else(|| {
                anyhow::anyhow!(
                    "no shell specified — use `portwait completions <shell>` or set `shell` in ~/.portwait/config.toml"
                )
            })?;
            name.parse::<clap_complete::Shell>()
                .map_err(|_| anyhow::anyhow!("unknown shell '{}' in config", name))?
        }
    };

    let shell_name = match shell {
        clap_complete::Shell::Bash => "bash",
        clap_complete::Shell::Zsh => "zsh",
        clap_complete::Shell::Fish => "fish",
        clap_complete::Shell::Elvish => "elvish",
        clap_complete::Shell::PowerShell => "powershell",
        _ => anyhow::bail!("unsupported shell"),
    };
    unsafe { std::env::set_var("COMPLETE", shell_name) };
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();
    Ok(true)
}
