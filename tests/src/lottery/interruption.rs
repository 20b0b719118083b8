#![cfg(test)]
use raffle_core::input::{Exhausted, ScriptedSource};
use raffle_core::interrupt::INTERRUPT_AUDIT;
use raffle_core::{LotterySupervisor, Outcome};

use crate::support::{config_in, read, wait_for_len};

/// An interrupt while the loop waits for input saves the registry and ends
/// the run without a draw.
#[tokio::test]
async fn interrupt_saves_registry_without_drawing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path());
    let snapshot_file = cfg.snapshot_file.clone();
    let audit_file = cfg.audit_file.clone();

    let supervisor = LotterySupervisor::new(cfg);
    let registry = supervisor.registry();
    let interrupt = supervisor.interrupt();

    let mut input = ScriptedSource::new(["carol"], Exhausted::Hang);
    let run = tokio::spawn(async move { supervisor.run(&mut input).await });

    wait_for_len(&registry, 1).await;
    interrupt.trigger();

    let outcome = run.await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Interrupted {
            participants: 1,
            saved: true
        }
    );

    assert_eq!(read(&snapshot_file), "carol\n");
    let log = read(&audit_file);
    assert!(log.contains(INTERRUPT_AUDIT));
    assert!(!log.contains("Winner declared"));
}

/// The next run picks up where the interrupted one stopped.
#[tokio::test(start_paused = true)]
async fn interrupted_registry_is_recovered_on_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let supervisor = LotterySupervisor::new(config_in(dir.path()));
        let registry = supervisor.registry();
        let interrupt = supervisor.interrupt();
        let mut input = ScriptedSource::new(["carol", "dave", "erin"], Exhausted::Hang);
        let run = tokio::spawn(async move { supervisor.run(&mut input).await });

        wait_for_len(&registry, 3).await;
        interrupt.trigger();
        assert!(matches!(run.await.unwrap(), Outcome::Interrupted { .. }));
    }

    let cfg = config_in(dir.path());
    let snapshot_file = cfg.snapshot_file.clone();
    let audit_file = cfg.audit_file.clone();
    let supervisor = LotterySupervisor::new(cfg);
    let registry = supervisor.registry();
    let mut input = ScriptedSource::new(["carol", "frank", "gina"], Exhausted::Eof);

    let outcome = supervisor.run(&mut input).await;

    assert!(matches!(outcome, Outcome::Winner { participants: 5, .. }));
    let names: Vec<String> = registry
        .snapshot()
        .into_iter()
        .map(|identity| identity.into_inner())
        .collect();
    assert_eq!(names, ["carol", "dave", "erin", "frank", "gina"]);
    assert!(!snapshot_file.exists());
    assert!(read(&audit_file).contains("Recovered 3 user(s) from backup"));
}

#[tokio::test]
async fn interrupt_before_any_registration_saves_empty_backup() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path());
    let snapshot_file = cfg.snapshot_file.clone();

    let supervisor = LotterySupervisor::new(cfg);
    supervisor.interrupt().trigger();

    let mut input = ScriptedSource::new(Vec::<String>::new(), Exhausted::Hang);
    let outcome = supervisor.run(&mut input).await;

    assert_eq!(
        outcome,
        Outcome::Interrupted {
            participants: 0,
            saved: true
        }
    );
    assert_eq!(read(&snapshot_file), "");
    assert!(snapshot_file.exists());
}
