use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::bootstrap::{InvalidTarget, ServeTarget};

#[derive(Parser)]
#[command(name = "smbinit")]
#[command(version)]
#[command(about = "Declarative bootstrap for Samba container identities", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration source (repeatable; `:`-separated in the environment)
    #[arg(long, global = true, env = "SMBINIT_CONFIG", value_delimiter = ':')]
    pub config: Vec<PathBuf>,

    /// Identity this container runs as
    #[arg(long, global = true, env = "SMBINIT_IDENTITY")]
    pub identity: Option<String>,

    /// Path of the passwd file to reconcile
    #[arg(long, global = true, default_value = "/etc/passwd")]
    pub etc_passwd_path: PathBuf,

    /// Path of the group file to reconcile
    #[arg(long, global = true, default_value = "/etc/group")]
    pub etc_group_path: PathBuf,

    /// Path of the name-service switch file to reconcile
    #[arg(long, global = true, default_value = "/etc/nsswitch.conf")]
    pub nsswitch_path: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the rendered smb.conf for the selected identity
    PrintConfig,

    /// Import declared settings into the registry configuration
    Import,

    /// Import declared users and groups into the system files and passdb
    ImportUsers,

    /// Initialize the entire container environment
    Init,

    /// Initialize, then hand control to a server process
    Run(RunArgs),

    /// Join the domain with cleartext credentials (testing only)
    InsecureJoin(JoinArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Server process to hand off to
    #[arg(value_parser = parse_target)]
    pub target: ServeTarget,

    /// Skip environment initialization, only start the target process
    #[arg(long)]
    pub no_init: bool,

    /// Perform an insecure domain join before serving (winbindd only)
    #[arg(long)]
    pub insecure_auto_join: bool,

    #[command(flatten)]
    pub credentials: JoinArgs,
}

#[derive(Args)]
pub struct JoinArgs {
    /// User name for domain access
    #[arg(long, env = "SMBINIT_JOIN_USERNAME", default_value = "Administrator")]
    pub username: String,

    /// Password for domain access (cleartext, testing only)
    #[arg(long, env = "SMBINIT_JOIN_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,
}

fn parse_target(value: &str) -> Result<ServeTarget, InvalidTarget> {
    value.parse()
}
