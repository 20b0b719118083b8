use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REGISTRATION_PERIOD: Duration = Duration::from_secs(2 * 60);
pub const DEFAULT_EXTENSION_PERIOD: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MIN_PARTICIPANTS: usize = 5;
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_INTERRUPT_GRACE: Duration = Duration::from_secs(3);
pub const DEFAULT_SNAPSHOT_FILE: &str = "backup_users.txt";
pub const DEFAULT_AUDIT_FILE: &str = "lottery_log.txt";

#[derive(Debug, Clone)]
pub struct Config {
    /// How long registration stays open before the first deadline check.
    pub registration_period: Duration,
    /// Length of the single extension granted to an undersubscribed window.
    pub extension_period: Duration,
    /// Below this many participants the window is extended once.
    pub min_participants: usize,
    /// Minimum time between two cadence-driven snapshots.
    pub snapshot_interval: Duration,
    /// How often the announcer reports remaining time.
    pub announce_interval: Duration,
    /// Time the supervisor gets to flush on its own after an interrupt
    /// before the interrupt path flushes and exits by itself.
    pub interrupt_grace: Duration,
    pub snapshot_file: PathBuf,
    pub audit_file: PathBuf,
    /// Fixed seed for the winner draw. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registration_period: DEFAULT_REGISTRATION_PERIOD,
            extension_period: DEFAULT_EXTENSION_PERIOD,
            min_participants: DEFAULT_MIN_PARTICIPANTS,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            announce_interval: DEFAULT_ANNOUNCE_INTERVAL,
            interrupt_grace: DEFAULT_INTERRUPT_GRACE,
            snapshot_file: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            audit_file: PathBuf::from(DEFAULT_AUDIT_FILE),
            seed: None,
        }
    }
}

/// Parses `90s`, `2m`, `1h` or a bare number of seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };

    anyhow::ensure!(!digits.is_empty(), "missing number in duration: {s}");
    let value: u64 = digits.parse()?;

    let secs = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 60 * 60,
        other => anyhow::bail!("unknown duration unit '{other}' in {s}"),
    };

    Ok(Duration::from_secs(secs))
}
