use std::io::{self, BufRead, Write};
use std::thread;

use async_trait::async_trait;
use raffle_core::input::LineSource;
use tokio::sync::mpsc;

/// Reads stdin on a dedicated thread and hands lines over a channel.
///
/// A plain thread never keeps the runtime alive on shutdown, and the
/// channel receive is cancel safe.
pub struct StdinSource {
    rx: mpsc::UnboundedReceiver<io::Result<String>>,
}

impl StdinSource {
    pub fn spawn(prompt: &'static str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        thread::spawn(move || {
            let stdin = io::stdin();
            let mut lines = stdin.lock().lines();
            loop {
                print!("{prompt}");
                let _ = io::stdout().flush();

                let Some(line) = lines.next() else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

#[async_trait]
impl LineSource for StdinSource {
    async fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        match self.rx.recv().await {
            Some(line) => Ok(Some(line?.trim().to_owned())),
            None => Ok(None),
        }
    }
}
