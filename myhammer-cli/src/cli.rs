use clap::error::ErrorKind;
use clap::{ArgAction, Args, Parser, Subcommand};
use myhammer::hammer::worker_count;
use myhammer::mysql::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER};
use myhammer::prelude::*;
use myhammer::DEFAULT_WORKERS;
use std::ffi::OsString;
use std::time::Duration;

pub const USAGE: &str = "Syntax: myhammer (clean|run)";

/// Exit status for a command line the parser rejects.
pub const USAGE_EXIT_CODE: i32 = 1;

// Must agree with `DEFAULT_STAGGER`.
const DEFAULT_STAGGER_ARG: &str = "100ms";

#[derive(Parser, Debug)]
#[command(name = "myhammer", version, about = "Concurrent write load generator for MySQL")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drop the myhammer database
    #[command(disable_help_flag = true)]
    Clean(ConnectionArgs),

    /// Recreate the schema and hammer it with inserts until interrupted
    #[command(disable_help_flag = true)]
    Run(RunArgs),
}

/// `-h` is the host, as in the mysql client, so help is only available as `--help`.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Hostname
    #[arg(short = 'h', long, env = "MYHAMMER_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port
    #[arg(short = 'P', long, env = "MYHAMMER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// User
    #[arg(short = 'u', long, env = "MYHAMMER_USER", default_value = DEFAULT_USER)]
    pub user: String,

    /// Password
    #[arg(
        short = 'p',
        long,
        env = "MYHAMMER_PASSWORD",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub password: String,

    /// Query prefix, prepended to every statement
    #[arg(long, env = "MYHAMMER_PREFIX", default_value = "")]
    pub prefix: String,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of concurrent workers
    #[arg(
        long,
        env = "MYHAMMER_WORKERS",
        default_value_t = DEFAULT_WORKERS as i64,
        allow_negative_numbers = true
    )]
    pub workers: i64,

    /// Pause between two worker spawns
    #[arg(long, value_parser = humantime::parse_duration, default_value = DEFAULT_STAGGER_ARG)]
    pub stagger: Duration,

    /// What a worker does after a failed insert: `resilient` or `fail-fast`
    #[arg(long = "on-error", default_value_t = FailurePolicy::Resilient)]
    pub policy: FailurePolicy,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl Cli {
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, Rejection>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(Rejection::from)
    }

    /// Parse the process arguments, exiting on anything that is not a command to run.
    pub fn parse_or_exit() -> Self {
        Self::parse_from_args(std::env::args_os()).unwrap_or_else(|rejection| rejection.exit())
    }
}

/// Why the command line did not produce a [`Cli`]
#[derive(Debug)]
pub enum Rejection {
    /// Help or version output was requested.
    Informational(clap::Error),
    /// Anything else the parser refused; reported with the usage line.
    Usage(clap::Error),
}

impl From<clap::Error> for Rejection {
    fn from(err: clap::Error) -> Self {
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Self::Informational(err),
            _ => Self::Usage(err),
        }
    }
}

impl Rejection {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Informational(err) => err.exit_code(),
            Self::Usage(_) => USAGE_EXIT_CODE,
        }
    }

    /// The usage line printed after the parser's own message, if any.
    pub fn usage(&self) -> Option<&'static str> {
        match self {
            Self::Informational(_) => None,
            Self::Usage(_) => Some(USAGE),
        }
    }

    pub fn exit(self) -> ! {
        let code = self.exit_code();
        let usage = self.usage();
        match self {
            Self::Informational(err) => err.exit(),
            Self::Usage(err) => {
                let _ = err.print();
                if let Some(usage) = usage {
                    println!("{usage}");
                }
                std::process::exit(code);
            }
        }
    }
}

impl RunArgs {
    pub fn hammer_config(&self) -> Result<HammerConfig, HammerError> {
        Ok(HammerConfig {
            workers: worker_count(self.workers)?,
            stagger: self.stagger,
            policy: self.policy,
        })
    }
}

impl From<ConnectionArgs> for ConnectionConfig {
    fn from(args: ConnectionArgs) -> Self {
        ConnectionConfig {
            host: args.host,
            port: args.port,
            user: args.user,
            password: args.password,
            prefix: args.prefix,
        }
    }
}
