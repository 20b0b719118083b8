pub mod inspect;
pub mod run;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use raffle_common::config::{
    self, Config, DEFAULT_AUDIT_FILE, DEFAULT_MIN_PARTICIPANTS, DEFAULT_SNAPSHOT_FILE,
};

#[derive(Parser)]
#[command(name = "raffle")]
#[command(about = "A terminal lottery with a timed registration window.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print warnings, errors and the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// File holding the registry of an unfinished run
    #[arg(long, global = true, default_value = DEFAULT_SNAPSHOT_FILE)]
    pub snapshot_file: PathBuf,

    /// Append-only audit log
    #[arg(long, global = true, default_value = DEFAULT_AUDIT_FILE)]
    pub audit_file: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open registration and draw a winner when it closes
    #[command(alias = "r")]
    Run(RunArgs),
    /// List the participants saved by an interrupted run
    #[command(alias = "i")]
    Inspect,
}

#[derive(Args)]
pub struct RunArgs {
    /// Base registration period (e.g. 90s, 2m, 1h)
    #[arg(long, default_value = "2m", value_parser = config::parse_duration)]
    pub period: Duration,

    /// One-time extension granted when too few users registered
    #[arg(long, default_value = "30m", value_parser = config::parse_duration)]
    pub extension: Duration,

    /// Registrations needed to close without an extension
    #[arg(long, default_value_t = DEFAULT_MIN_PARTICIPANTS)]
    pub min_participants: usize,

    /// Minimum time between periodic backups
    #[arg(long, default_value = "5m", value_parser = config::parse_duration)]
    pub snapshot_every: Duration,

    /// Interval of the "time remaining" announcements
    #[arg(long, default_value = "10m", value_parser = config::parse_duration)]
    pub announce_every: Duration,

    /// Time to finish saving after Ctrl+C before forcing an exit
    #[arg(long, default_value = "3s", value_parser = config::parse_duration)]
    pub grace: Duration,

    /// Seed for a reproducible draw
    #[arg(long)]
    pub seed: Option<u64>,
}

impl RunArgs {
    pub fn into_config(self, snapshot_file: PathBuf, audit_file: PathBuf) -> Config {
        Config {
            registration_period: self.period,
            extension_period: self.extension,
            min_participants: self.min_participants,
            snapshot_interval: self.snapshot_every,
            announce_interval: self.announce_every,
            interrupt_grace: self.grace,
            snapshot_file,
            audit_file,
            seed: self.seed,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
