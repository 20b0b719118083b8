//! Periodic "time remaining" reports.
//!
//! The announcer only reads the registry and the window. It runs until its
//! cancellation token fires and is joined by the supervisor on the way out.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use raffle_common::{info, warn};

use crate::registry::UserRegistry;
use crate::window::WindowPolicy;

type Observer = Box<dyn Fn(&Announcement) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement {
    pub remaining: Duration,
    pub participants: usize,
    pub closed: bool,
}

impl Announcement {
    pub fn capture(registry: &UserRegistry, window: &WindowPolicy, now: Instant) -> Self {
        Self {
            remaining: window.remaining(now),
            participants: registry.len(),
            closed: !window.is_accepting(),
        }
    }

    pub fn remaining_minutes(&self) -> u64 {
        self.remaining.as_secs() / 60
    }
}

pub struct Announcer {
    registry: Arc<UserRegistry>,
    window: Arc<WindowPolicy>,
    interval: Duration,
    on_tick: Option<Observer>,
}

impl Announcer {
    pub fn new(registry: Arc<UserRegistry>, window: Arc<WindowPolicy>, interval: Duration) -> Self {
        Self {
            registry,
            window,
            interval,
            on_tick: None,
        }
    }

    /// Registers a callback invoked after every report.
    pub fn with_observer(mut self, observer: impl Fn(&Announcement) + Send + Sync + 'static) -> Self {
        self.on_tick = Some(Box::new(observer));
        self
    }

    pub fn spawn(self, token: CancellationToken) -> AnnouncerHandle {
        let task_token = token.clone();
        let task = tokio::spawn(async move { self.run(task_token).await });
        AnnouncerHandle { token, task }
    }

    async fn run(self, token: CancellationToken) {
        let period = self.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => self.report(),
            }
        }
    }

    fn report(&self) {
        let announcement = Announcement::capture(&self.registry, &self.window, Instant::now());

        if announcement.closed {
            info!(
                "Registration is closed. Registered users: {}",
                announcement.participants
            );
        } else {
            info!(
                "Time remaining for registration: {} minute(s)",
                announcement.remaining_minutes()
            );
            info!("Registered users: {}", announcement.participants);
        }

        if let Some(observer) = &self.on_tick {
            observer(&announcement);
        }
    }
}

pub struct AnnouncerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl AnnouncerHandle {
    /// Cancels the task and waits for it to finish.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!("Announcer task ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn window_from(start: Instant) -> Arc<WindowPolicy> {
        Arc::new(WindowPolicy::new(start, 25 * MINUTE, 30 * MINUTE, 5))
    }

    #[tokio::test(start_paused = true)]
    async fn reports_on_every_interval() {
        let registry = Arc::new(UserRegistry::new());
        registry.try_register("alice");
        let window = window_from(Instant::now());
        let seen: Arc<Mutex<Vec<Announcement>>> = Arc::default();

        let sink = seen.clone();
        let handle = Announcer::new(registry.clone(), window, 10 * MINUTE)
            .with_observer(move |a| sink.lock().unwrap().push(*a))
            .spawn(CancellationToken::new());

        tokio::time::sleep(10 * MINUTE + Duration::from_secs(1)).await;
        registry.try_register("bob");
        tokio::time::sleep(10 * MINUTE).await;
        handle.stop().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].remaining_minutes(), 15);
        assert_eq!(seen[0].participants, 1);
        assert_eq!(seen[1].remaining_minutes(), 5);
        assert_eq!(seen[1].participants, 2);
        assert!(seen.iter().all(|a| !a.closed));
    }

    #[tokio::test(start_paused = true)]
    async fn reports_zero_once_closed() {
        let start = Instant::now();
        let registry = UserRegistry::new();
        let window = WindowPolicy::new(start, MINUTE, MINUTE, 5);
        window.evaluate(start + MINUTE, 0);

        let announcement = Announcement::capture(&registry, &window, start + 2 * MINUTE);
        assert_eq!(
            announcement,
            Announcement {
                remaining: Duration::ZERO,
                participants: 0,
                closed: true,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_returns_before_first_tick() {
        let registry = Arc::new(UserRegistry::new());
        let window = window_from(Instant::now());
        let handle = Announcer::new(registry, window, 10 * MINUTE).spawn(CancellationToken::new());

        let started = Instant::now();
        handle.stop().await;
        assert!(started.elapsed() < MINUTE);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_the_task() {
        let parent = CancellationToken::new();
        let registry = Arc::new(UserRegistry::new());
        let window = window_from(Instant::now());
        let handle = Announcer::new(registry, window, MINUTE).spawn(parent.child_token());

        parent.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle.task)
            .await
            .expect("announcer should exit after cancellation")
            .unwrap();
    }
}
