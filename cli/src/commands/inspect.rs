use std::path::Path;

use raffle_core::store::PersistenceStore;
use raffle_common::config::DEFAULT_SNAPSHOT_INTERVAL;

use crate::rprint;
use crate::terminal::print;

pub fn inspect(snapshot_file: &Path, audit_file: &Path) -> anyhow::Result<()> {
    let store = PersistenceStore::new(snapshot_file, audit_file, DEFAULT_SNAPSHOT_INTERVAL);
    let identities = store.recover();

    if identities.is_empty() {
        print::print_status(format!(
            "No saved participants in {}",
            snapshot_file.display()
        ));
        return Ok(());
    }

    for (idx, identity) in identities.iter().enumerate() {
        print::tree_head(idx, identity.as_str());
    }

    rprint!();
    print::aligned_line("Saved users", identities.len().to_string());
    print::print_status("They rejoin automatically on the next run.");
    Ok(())
}
