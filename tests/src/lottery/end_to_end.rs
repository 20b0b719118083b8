#![cfg(test)]
use std::time::Duration;

use raffle_common::config::Config;
use raffle_core::window::WindowState;
use raffle_core::{LotterySupervisor, Outcome};
use tokio::time::Instant;

use crate::support::{channel_source, config_in, read, wait_for_len};

const MINUTE: Duration = Duration::from_secs(60);

/// Two registrations are below the threshold, so the window is extended
/// once and the draw happens at the extended deadline.
#[tokio::test(start_paused = true)]
async fn undersubscribed_run_extends_then_draws() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        snapshot_interval: Duration::ZERO,
        ..config_in(dir.path())
    };
    let snapshot_file = cfg.snapshot_file.clone();
    let audit_file = cfg.audit_file.clone();

    let supervisor = LotterySupervisor::new(cfg);
    let start = Instant::now();
    let registry = supervisor.registry();
    let window = supervisor.window();

    let (tx, mut input) = channel_source();
    let run = tokio::spawn(async move { supervisor.run(&mut input).await });

    tx.send("alice".into()).unwrap();
    tx.send("bob".into()).unwrap();
    wait_for_len(&registry, 2).await;
    assert_eq!(read(&snapshot_file), "alice\nbob\n");

    tokio::time::sleep(2 * MINUTE + Duration::from_secs(1)).await;

    assert_eq!(window.state(), WindowState::Extended);
    let extended_to = window.deadline();
    assert!(extended_to >= start + 32 * MINUTE);
    assert!(extended_to < start + 32 * MINUTE + Duration::from_secs(1));
    assert!(!run.is_finished(), "no winner may be drawn before the extended deadline");
    assert!(snapshot_file.exists());

    let outcome = run.await.unwrap();

    assert!(Instant::now() >= start + 32 * MINUTE);
    match outcome {
        Outcome::Winner {
            winner,
            participants,
        } => {
            assert_eq!(participants, 2);
            assert!(["alice", "bob"].contains(&winner.as_str()), "unexpected winner {winner}");
        }
        other => panic!("expected a winner, got {other:?}"),
    }
    assert_eq!(window.state(), WindowState::ClosedWithParticipants);
    assert!(!snapshot_file.exists(), "backup must be removed after the winner is announced");

    let log = read(&audit_file);
    assert!(log.contains("User registered: alice"));
    assert!(log.contains("User registered: bob"));
    assert!(log.contains("Registration extended"));
    assert!(log.contains("Winner declared:"));
    assert!(log.contains("Total Participants: 2"));
}

#[tokio::test(start_paused = true)]
async fn registrations_during_extension_count() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = LotterySupervisor::new(config_in(dir.path()));
    let registry = supervisor.registry();
    let window = supervisor.window();

    let (tx, mut input) = channel_source();
    let run = tokio::spawn(async move { supervisor.run(&mut input).await });

    tx.send("first".into()).unwrap();
    wait_for_len(&registry, 1).await;

    tokio::time::sleep(3 * MINUTE).await;
    assert_eq!(window.state(), WindowState::Extended);

    for name in ["second", "third"] {
        tx.send(name.into()).unwrap();
    }
    wait_for_len(&registry, 3).await;
    drop(tx);

    let outcome = run.await.unwrap();
    assert!(matches!(outcome, Outcome::Winner { participants: 3, .. }));
}

#[tokio::test(start_paused = true)]
async fn same_seed_same_winner() {
    let mut winners = Vec::new();

    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = LotterySupervisor::new(config_in(dir.path()));
        let mut input = raffle_core::input::ScriptedSource::new(
            ["a1", "b2", "c3", "d4", "e5", "f6"],
            raffle_core::input::Exhausted::Eof,
        );
        match supervisor.run(&mut input).await {
            Outcome::Winner { winner, .. } => winners.push(winner),
            other => panic!("expected a winner, got {other:?}"),
        }
    }

    assert_eq!(winners[0], winners[1]);
}
