//! Session store holding the single live credential set
//!
//! Readers receive an `Arc` snapshot; [`SessionStore::replace`] swaps the whole
//! snapshot at once, so no reader can ever pair a new `SessionKey` with an old
//! `.AspNet.Cookies` value.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::CredentialSet;

#[derive(Debug)]
struct Slot {
    credentials: Arc<CredentialSet>,
    generation: u64,
}

/// Holder of the current [`CredentialSet`]
#[derive(Debug)]
pub struct SessionStore {
    slot: RwLock<Slot>,
}

impl SessionStore {
    /// Create a store seeded with the startup credentials
    pub fn new(initial: CredentialSet) -> Self {
        Self {
            slot: RwLock::new(Slot {
                credentials: Arc::new(initial),
                generation: 0,
            }),
        }
    }

    /// Snapshot of the current credentials
    pub fn read(&self) -> Arc<CredentialSet> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot.credentials)
    }

    /// Replace the credentials wholesale, returning the new generation
    pub fn replace(&self, credentials: CredentialSet) -> u64 {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.credentials = Arc::new(credentials);
        slot.generation += 1;

        tracing::debug!(generation = slot.generation, "Session credentials replaced");
        slot.generation
    }

    /// Number of replacements since startup
    pub fn generation(&self) -> u64 {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_returns_initial() {
        let store = SessionStore::new(CredentialSet::new("s0", "u0", "a0"));
        assert_eq!(store.read().session_key(), "s0");
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_replace_is_wholesale() {
        let store = SessionStore::new(CredentialSet::new("s0", "u0", "a0"));
        let before = store.read();

        let generation = store.replace(CredentialSet::new("s1", "u1", "a1"));
        assert_eq!(generation, 1);

        // Old snapshots stay intact, new reads see only new values
        assert_eq!(
            before.cookie_header(),
            "SessionKey=s0; UserSessionKey=u0; .AspNet.Cookies=a0"
        );
        assert_eq!(
            store.read().cookie_header(),
            "SessionKey=s1; UserSessionKey=u1; .AspNet.Cookies=a1"
        );
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_sets() {
        let store = Arc::new(SessionStore::new(CredentialSet::new("k0", "k0", "k0")));

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 1..=200 {
                    let k = format!("k{i}");
                    store.replace(CredentialSet::new(k.clone(), k.clone(), k));
                }
            })
        };

        for _ in 0..2_000 {
            let creds = store.read();
            assert_eq!(creds.session_key(), creds.user_session_key());
            assert_eq!(creds.session_key(), creds.aspnet_cookies());
        }

        writer.join().unwrap();
        assert_eq!(store.generation(), 200);
    }
}
