//! The shared participant registry.
//!
//! All reads and writes go through a single mutex. Validation runs before
//! the lock is taken, so a burst of malformed input never contends with
//! real registrations.

use indexmap::IndexSet;
use parking_lot::Mutex;

use raffle_common::identity::{Identity, IdentityError};

/// Outcome of a single registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Accepted(Identity),
    Duplicate(Identity),
    Invalid(IdentityError),
    /// The window closed and the registry is read-only.
    Closed,
}

#[derive(Default)]
struct Inner {
    identities: IndexSet<Identity>,
    sealed: bool,
}

#[derive(Default)]
pub struct UserRegistry {
    inner: Mutex<Inner>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `raw` and inserts it if it is not already present.
    ///
    /// The membership check and the insert happen under one lock
    /// acquisition, so concurrent callers racing on the same name see
    /// exactly one `Accepted`.
    pub fn try_register(&self, raw: &str) -> Registration {
        let identity = match Identity::parse(raw) {
            Ok(identity) => identity,
            Err(e) => return Registration::Invalid(e),
        };

        let mut inner = self.inner.lock();
        if inner.sealed {
            return Registration::Closed;
        }
        if inner.identities.contains(&identity) {
            return Registration::Duplicate(identity);
        }
        inner.identities.insert(identity.clone());
        Registration::Accepted(identity)
    }

    /// Rehydrates the registry with previously persisted identities.
    ///
    /// Returns how many were actually inserted.
    pub fn extend<I>(&self, identities: I) -> usize
    where
        I: IntoIterator<Item = Identity>,
    {
        let mut inner = self.inner.lock();
        identities
            .into_iter()
            .filter(|identity| inner.identities.insert(identity.clone()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A stable, insertion-ordered copy of the current registry.
    pub fn snapshot(&self) -> Vec<Identity> {
        self.inner.lock().identities.iter().cloned().collect()
    }

    /// Runs `f` while holding the registry lock.
    ///
    /// Used for read-and-persist sections so a snapshot never interleaves
    /// with an insert. `f` must not block on anything but local I/O.
    pub fn with_identities<R>(&self, f: impl FnOnce(&IndexSet<Identity>) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.identities)
    }

    /// Makes the registry read-only. Irreversible.
    pub fn seal(&self) {
        self.inner.lock().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.lock().sealed
    }
}
