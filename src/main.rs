mod bootstrap;
mod cli;
mod commands;
mod config;
mod join;
mod nsswitch;
mod passdb;
mod passwd;
mod paths;
mod registry;
mod textfile;
mod ui;

use anyhow::{Context as AnyhowContext, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use std::io;
use std::path::PathBuf;

use cli::{Cli, Command};
use paths::{DEFAULT_CONFIG, StorePaths};

/// Global context for the application
pub struct Context {
    pub sources: Vec<PathBuf>,
    pub identity: Option<String>,
    pub paths: StorePaths,
    pub quiet: bool,
}

impl Context {
    /// The selected identity; its absence is a fatal configuration error,
    /// raised before any store is touched.
    pub fn identity(&self) -> Result<&str> {
        self.identity
            .as_deref()
            .context("missing container identity (set --identity or SMBINIT_IDENTITY)")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let sources = if cli.config.is_empty() {
        vec![PathBuf::from(DEFAULT_CONFIG)]
    } else {
        cli.config.clone()
    };

    let ctx = Context {
        sources,
        identity: cli.identity.clone(),
        paths: StorePaths {
            passwd: cli.etc_passwd_path.clone(),
            group: cli.etc_group_path.clone(),
            nsswitch: cli.nsswitch_path.clone(),
        },
        quiet: cli.quiet,
    };

    match cli.command {
        None | Some(Command::PrintConfig) => commands::print_config::run(&ctx),
        Some(Command::Import) => commands::import::run(&ctx),
        Some(Command::ImportUsers) => commands::import_users::run(&ctx),
        Some(Command::Init) => commands::init::run(&ctx),
        Some(Command::Run(args)) => commands::run::run(&ctx, &args),
        Some(Command::InsecureJoin(args)) => commands::join::run(&ctx, &args),
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "smbinit", &mut io::stdout());
            Ok(())
        }
    }
}
