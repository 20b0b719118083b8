//! # Lottery Supervisor
//!
//! Drives one lottery run from recovery to the winner draw.
//!
//! The registration loop waits on three things at once: the interrupt token,
//! the current window deadline, and the next input line. Whichever fires
//! first decides the next step, so an idle terminal cannot hold the window
//! open past its deadline and an interrupt never waits on a pending read.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::debug;

use raffle_common::config::Config;
use raffle_common::identity::Identity;
use raffle_common::{error, info, success, warn};

use crate::announcer::{Announcement, Announcer};
use crate::draw;
use crate::input::LineSource;
use crate::interrupt::InterruptController;
use crate::registry::{Registration, UserRegistry};
use crate::store::PersistenceStore;
use crate::window::{Transition, WindowPolicy, WindowState};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Winner {
        winner: Identity,
        participants: usize,
    },
    ClosedEmpty,
    Interrupted {
        participants: usize,
        saved: bool,
    },
}

pub struct LotterySupervisor {
    registry: Arc<UserRegistry>,
    store: Arc<PersistenceStore>,
    window: Arc<WindowPolicy>,
    interrupt: Arc<InterruptController>,
    cfg: Config,
    rng: StdRng,
    on_announce: Option<Box<dyn Fn(&Announcement) + Send + Sync>>,
}

impl LotterySupervisor {
    /// Builds every component from `cfg`. The registration window starts now.
    pub fn new(cfg: Config) -> Self {
        let registry = Arc::new(UserRegistry::new());
        let store = Arc::new(PersistenceStore::from_config(&cfg));
        let window = Arc::new(WindowPolicy::from_config(Instant::now(), &cfg));
        let interrupt = Arc::new(InterruptController::new(
            registry.clone(),
            store.clone(),
            cfg.interrupt_grace,
        ));
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            registry,
            store,
            window,
            interrupt,
            cfg,
            rng,
            on_announce: None,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Forwards every periodic announcement to `observer`.
    pub fn on_announce(mut self, observer: impl Fn(&Announcement) + Send + Sync + 'static) -> Self {
        self.on_announce = Some(Box::new(observer));
        self
    }

    pub fn registry(&self) -> Arc<UserRegistry> {
        self.registry.clone()
    }

    pub fn window(&self) -> Arc<WindowPolicy> {
        self.window.clone()
    }

    pub fn store(&self) -> Arc<PersistenceStore> {
        self.store.clone()
    }

    pub fn interrupt(&self) -> Arc<InterruptController> {
        self.interrupt.clone()
    }

    /// Runs the lottery to completion or interruption.
    pub async fn run(mut self, input: &mut dyn LineSource) -> Outcome {
        self.recover();

        let mut announcer = Announcer::new(
            self.registry.clone(),
            self.window.clone(),
            self.cfg.announce_interval,
        );
        if let Some(observer) = self.on_announce.take() {
            announcer = announcer.with_observer(observer);
        }
        let announcer = announcer.spawn(self.interrupt.token().child_token());

        let outcome = self.registration_loop(input).await;

        announcer.stop().await;
        outcome
    }

    fn recover(&self) {
        let recovered = self.store.recover();
        if recovered.is_empty() {
            return;
        }

        let restored = self.registry.extend(recovered);
        info!(
            "Restored {restored} user(s) from {}",
            self.store.snapshot_path().display()
        );
        self.store
            .append(&format!("Recovered {restored} user(s) from backup"));
    }

    async fn registration_loop(&mut self, input: &mut dyn LineSource) -> Outcome {
        let token = self.interrupt.token();
        let mut input_open = true;

        loop {
            // A pending interrupt wins over an expired deadline.
            if self.interrupt.is_triggered() {
                return self.interrupted();
            }
            if let Some(closed) = self.advance_window() {
                return self.conclude(closed);
            }

            let deadline = self.window.deadline();

            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    return self.interrupted();
                }

                _ = tokio::time::sleep_until(deadline) => {}

                line = input.next_line(), if input_open => match line {
                    Ok(Some(line)) => self.handle_line(&line),
                    Ok(None) => {
                        input_open = false;
                        info!("Input closed. Waiting for the registration deadline.");
                    }
                    Err(e) => {
                        input_open = false;
                        warn!("Failed to read input: {e:#}");
                    }
                },
            }
        }
    }

    /// Re-evaluates the window. Returns the final state once it is closed.
    fn advance_window(&self) -> Option<WindowState> {
        match self.window.evaluate(Instant::now(), self.registry.len()) {
            Transition::Unchanged(state) if state.is_closed() => Some(state),
            Transition::Unchanged(_) => None,
            Transition::Extended { deadline } => {
                self.announce_extension(deadline);
                None
            }
            Transition::Closed(state) => {
                self.registry.seal();
                Some(state)
            }
        }
    }

    fn announce_extension(&self, deadline: Instant) {
        let minutes = deadline.saturating_duration_since(Instant::now()).as_secs() / 60;
        warn!(
            "Less than {} users registered. Extending registration by {minutes} minutes...",
            self.cfg.min_participants
        );
        self.store.append(&format!(
            "Registration extended by {minutes} minutes with {} user(s)",
            self.registry.len()
        ));
    }

    fn handle_line(&self, line: &str) {
        if self.interrupt.is_triggered() {
            warn!("Shutting down. {line:?} was not registered.");
            return;
        }
        if self.registry.is_sealed() || self.advance_window().is_some() {
            warn!("Registration has closed. {line:?} was not registered.");
            return;
        }

        match self.registry.try_register(line) {
            Registration::Accepted(identity) => {
                success!(
                    "{identity} registered successfully. Total users: {}",
                    self.registry.len()
                );
                self.store.append(&format!("User registered: {identity}"));
                if self.store.snapshot_if_due(&self.registry, Instant::now()) {
                    debug!("Periodic backup written");
                }
            }
            Registration::Duplicate(identity) => {
                error!("Username {identity} is already registered.");
            }
            Registration::Invalid(e) => {
                error!("Invalid username ({e}). Use letters, digits, and underscores only.");
            }
            Registration::Closed => {
                warn!("Registration has closed. {line:?} was not registered.");
            }
        }
    }

    fn conclude(&mut self, state: WindowState) -> Outcome {
        info!("Registration period ended.");

        if state == WindowState::ClosedEmpty {
            info!("No users registered. Exiting.");
            self.store
                .append("No users registered. Lottery ended with no participants.");
            return Outcome::ClosedEmpty;
        }

        let participants = self.registry.snapshot();
        let extended = if self.window.was_extended() {
            " after extension"
        } else {
            ""
        };
        self.store.append(&format!(
            "Registration closed{extended} with {} participant(s)",
            participants.len()
        ));

        let Some(winner) = draw::pick_winner(&participants, &mut self.rng).cloned() else {
            info!("No participants. Exiting.");
            return Outcome::ClosedEmpty;
        };

        success!("Winner: {winner}");
        self.store.append(&format!("Winner declared: {winner}"));
        self.store
            .append(&format!("Total Participants: {}", participants.len()));

        match self.store.discard() {
            Ok(true) => debug!("Backup removed"),
            Ok(false) => {}
            Err(e) => warn!("Could not remove backup: {e}"),
        }

        Outcome::Winner {
            winner,
            participants: participants.len(),
        }
    }

    fn interrupted(&self) -> Outcome {
        warn!("Program interrupted. Saving progress...");
        let saved = self.interrupt.force_flush();
        if saved {
            info!("Backup saved. Exiting.");
        }

        Outcome::Interrupted {
            participants: self.registry.len(),
            saved,
        }
    }
}
