use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Keyed storage for live challenges. Expired entries must read as absent.
pub trait ChallengeStore: Send + Sync {
    fn get(&self, email: &str) -> Option<Challenge>;

    /// Replaces any challenge already stored for `email`.
    fn set(&self, email: &str, challenge: Challenge);

    fn delete(&self, email: &str) -> Option<Challenge>;

    /// Removes the challenge only if it is live and holds exactly `code`, as one step.
    /// Returns whether it was removed.
    fn take_if(&self, email: &str, code: &str) -> bool;
}

/// Process-local store. Lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Challenge>>,
}

impl MemoryStore {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Challenge>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChallengeStore for MemoryStore {
    fn get(&self, email: &str) -> Option<Challenge> {
        let mut entries = self.entries();

        match entries.get(email) {
            Some(challenge) if challenge.is_live(Utc::now()) => Some(challenge.clone()),
            Some(_) => {
                entries.remove(email);
                None
            }
            None => None,
        }
    }

    fn set(&self, email: &str, challenge: Challenge) {
        let now = Utc::now();
        let mut entries = self.entries();

        entries.retain(|_, existing| existing.is_live(now));
        entries.insert(email.to_string(), challenge);
    }

    fn delete(&self, email: &str) -> Option<Challenge> {
        self.entries()
            .remove(email)
            .filter(|challenge| challenge.is_live(Utc::now()))
    }

    fn take_if(&self, email: &str, code: &str) -> bool {
        let mut entries = self.entries();

        let matches = entries
            .get(email)
            .is_some_and(|challenge| challenge.is_live(Utc::now()) && challenge.code == code);
        if matches {
            entries.remove(email);
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn challenge(code: &str, ttl: TimeDelta) -> Challenge {
        Challenge {
            code: code.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    #[test]
    fn test_set_overwrites() {
        let store = MemoryStore::default();
        store.set("a@b.com", challenge("111111", TimeDelta::minutes(10)));
        store.set("a@b.com", challenge("222222", TimeDelta::minutes(10)));

        assert_eq!(store.get("a@b.com").unwrap().code, "222222");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let store = MemoryStore::default();
        store.set("a@b.com", challenge("111111", TimeDelta::minutes(10)));

        assert!(store.get("A@B.com").is_none());
        assert!(store.get("a@b.com").is_some());
    }

    #[test]
    fn test_expired_reads_as_absent() {
        let store = MemoryStore::default();
        store.set("a@b.com", challenge("111111", TimeDelta::seconds(-1)));

        assert!(store.get("a@b.com").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_prunes_expired_entries() {
        let store = MemoryStore::default();
        store.set("old@b.com", challenge("111111", TimeDelta::seconds(-1)));
        store.set("new@b.com", challenge("222222", TimeDelta::minutes(10)));

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::default();
        store.set("a@b.com", challenge("111111", TimeDelta::minutes(10)));

        assert_eq!(store.delete("a@b.com").unwrap().code, "111111");
        assert!(store.delete("a@b.com").is_none());
        assert!(store.get("a@b.com").is_none());
    }

    #[test]
    fn test_take_if_only_removes_matching_code() {
        let store = MemoryStore::default();
        store.set("a@b.com", challenge("111111", TimeDelta::minutes(10)));

        assert!(!store.take_if("a@b.com", "222222"));
        assert_eq!(store.get("a@b.com").unwrap().code, "111111");
        assert!(store.take_if("a@b.com", "111111"));
        assert!(store.get("a@b.com").is_none());
        assert!(!store.take_if("a@b.com", "111111"));
    }

    #[test]
    fn test_take_if_ignores_expired() {
        let store = MemoryStore::default();
        store.set("a@b.com", challenge("111111", TimeDelta::seconds(-1)));

        assert!(!store.take_if("a@b.com", "111111"));
    }
}
