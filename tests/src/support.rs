use std::path::Path;

use async_trait::async_trait;
use raffle_common::config::Config;
use raffle_core::input::LineSource;
use raffle_core::registry::UserRegistry;
use tokio::sync::mpsc;

pub fn config_in(dir: &Path) -> Config {
    Config {
        snapshot_file: dir.join("backup_users.txt"),
        audit_file: dir.join("lottery_log.txt"),
        seed: Some(2024),
        ..Config::default()
    }
}

/// A line source fed from the test body.
pub struct ChannelSource(pub mpsc::UnboundedReceiver<String>);

pub fn channel_source() -> (mpsc::UnboundedSender<String>, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelSource(rx))
}

#[async_trait]
impl LineSource for ChannelSource {
    async fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.0.recv().await)
    }
}

pub async fn wait_for_len(registry: &UserRegistry, len: usize) {
    while registry.len() < len {
        tokio::task::yield_now().await;
    }
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}
