#![cfg(test)]
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use raffle_core::registry::{Registration, UserRegistry};
use raffle_core::store::PersistenceStore;

/// Snapshots taken while other tasks register never contain a torn line or
/// an identity that was not accepted.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn snapshots_during_concurrent_registration_are_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(UserRegistry::new());
    let store = Arc::new(PersistenceStore::new(
        dir.path().join("backup_users.txt"),
        dir.path().join("lottery_log.txt"),
        Duration::from_secs(300),
    ));

    let mut writers = Vec::new();
    for worker in 0..4 {
        let registry = registry.clone();
        writers.push(tokio::spawn(async move {
            let mut accepted = 0;
            for i in 0..250 {
                // every worker also tries a shared name
                let name = if i % 50 == 0 {
                    format!("shared_{i}")
                } else {
                    format!("w{worker}_{i}")
                };
                if matches!(registry.try_register(&name), Registration::Accepted(_)) {
                    accepted += 1;
                }
                if i % 10 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            accepted
        }));
    }

    let mut previous = 0;
    while writers.iter().any(|w| !w.is_finished()) {
        assert!(store.checkpoint(&registry));
        let recovered = store.recover();
        let unique: HashSet<_> = recovered.iter().collect();
        assert_eq!(unique.len(), recovered.len());
        assert!(recovered.len() >= previous, "registry never shrinks");
        previous = recovered.len();
        tokio::task::yield_now().await;
    }

    let mut accepted = 0;
    for writer in writers {
        accepted += writer.await.unwrap();
    }

    // 4 workers * 245 private names + 5 shared names
    assert_eq!(accepted, 4 * 245 + 5);
    assert_eq!(registry.len(), accepted);

    assert!(store.checkpoint(&registry));
    assert_eq!(store.recover().len(), accepted);
}
