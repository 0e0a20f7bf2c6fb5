//! Connection registry owned by the hub loop.
//!
//! Two indexes are kept and always mutated together:
//!
//! ```text
//! by_id:    conn-1 → handle     by_user:  user 7 → { conn-1, conn-3 }
//!           conn-2 → handle               user 9 → { conn-2 }
//!           conn-3 → handle
//! ```
//!
//! A connection id appears in `by_user[u]` exactly when `by_id` holds a
//! handle for it whose user is `u`. Users with no connections are pruned.
//!
//! The registry is not synchronized; only the hub loop touches it.

use std::collections::{HashMap, HashSet};

use crate::domain::foundation::{ConnectionId, UserId};

use super::connection::ConnectionHandle;

#[derive(Debug, Default)]
pub(crate) struct Registry {
    by_id: HashMap<ConnectionId, ConnectionHandle>,
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a connection under its user. Returns false if the id is
    /// already present, leaving the registry unchanged.
    pub(crate) fn insert(&mut self, handle: ConnectionHandle) -> bool {
        let id = handle.id();
        if self.by_id.contains_key(&id) {
            return false;
        }
        self.by_user.entry(handle.user_id()).or_default().insert(id);
        self.by_id.insert(id, handle);
        true
    }

    /// Removes a connection from both indexes. Unknown ids are a no-op.
    pub(crate) fn remove(&mut self, id: &ConnectionId) -> Option<ConnectionHandle> {
        let handle = self.by_id.remove(id)?;
        let user_id = handle.user_id();
        if let Some(ids) = self.by_user.get_mut(&user_id) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_user.remove(&user_id);
            }
        }
        Some(handle)
    }

    pub(crate) fn get(&self, id: &ConnectionId) -> Option<&ConnectionHandle> {
        self.by_id.get(id)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: &ConnectionId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Snapshot of every registered connection id.
    pub(crate) fn connection_ids(&self) -> Vec<ConnectionId> {
        self.by_id.keys().copied().collect()
    }

    /// Snapshot of a user's connection ids; empty if the user has none.
    pub(crate) fn user_connection_ids(&self, user_id: UserId) -> Vec<ConnectionId> {
        self.by_user
            .get(&user_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn user_connection_count(&self, user_id: UserId) -> usize {
        self.by_user.get(&user_id).map_or(0, HashSet::len)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Empties the registry, returning every handle it held.
    pub(crate) fn drain(&mut self) -> Vec<ConnectionHandle> {
        self.by_user.clear();
        self.by_id.drain().map(|(_, handle)| handle).collect()
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let indexed: usize = self.by_user.values().map(HashSet::len).sum();
        indexed == self.by_id.len()
            && self.by_user.iter().all(|(user_id, ids)| {
                !ids.is_empty()
                    && ids.iter().all(|id| {
                        self.by_id
                            .get(id)
                            .is_some_and(|handle| handle.user_id() == *user_id)
                    })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::connection::{Connection, PumpSettings};
    use crate::domain::foundation::Role;
    use proptest::prelude::*;
    use std::time::Duration;

    fn handle_for(user: i64) -> ConnectionHandle {
        let settings = PumpSettings {
            ping_interval: Duration::from_secs(54),
            pong_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
        };
        let (_conn, handle) =
            Connection::with_settings(UserId::new(user).unwrap(), Role::new("donor"), 4, settings);
        handle
    }

    #[test]
    fn insert_indexes_by_user() {
        let mut registry = Registry::new();
        let a = handle_for(1);
        let b = handle_for(1);
        let c = handle_for(2);

        assert!(registry.insert(a.clone()));
        assert!(registry.insert(b.clone()));
        assert!(registry.insert(c));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.user_count(), 2);
        assert_eq!(registry.user_connection_count(UserId::new(1).unwrap()), 2);

        let mut ids = registry.user_connection_ids(UserId::new(1).unwrap());
        ids.sort_by_key(|id| id.to_string());
        let mut expected = vec![a.id(), b.id()];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(ids, expected);
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut registry = Registry::new();
        let a = handle_for(1);

        assert!(registry.insert(a.clone()));
        assert!(!registry.insert(a));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.user_connection_count(UserId::new(1).unwrap()), 1);
    }

    #[test]
    fn removing_last_connection_prunes_user() {
        let mut registry = Registry::new();
        let a = handle_for(5);
        registry.insert(a.clone());

        assert!(registry.remove(&a.id()).is_some());
        assert_eq!(registry.user_count(), 0);
        assert!(registry.user_connection_ids(UserId::new(5).unwrap()).is_empty());
    }

    #[test]
    fn removing_unknown_id_is_noop() {
        let mut registry = Registry::new();
        registry.insert(handle_for(1));

        assert!(registry.remove(&ConnectionId::new()).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn drain_empties_both_indexes() {
        let mut registry = Registry::new();
        registry.insert(handle_for(1));
        registry.insert(handle_for(2));

        assert_eq!(registry.drain().len(), 2);
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.user_count(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(i64),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..6).prop_map(Op::Insert),
            (0usize..32).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn indexes_stay_consistent(ops in prop::collection::vec(op(), 0..64)) {
            let mut registry = Registry::new();
            let mut seen: Vec<ConnectionId> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(user) => {
                        let handle = handle_for(user);
                        seen.push(handle.id());
                        prop_assert!(registry.insert(handle));
                    }
                    Op::Remove(index) => {
                        if let Some(id) = seen.get(index % seen.len().max(1)) {
                            registry.remove(id);
                            prop_assert!(!registry.contains(id));
                        }
                    }
                }
                prop_assert!(registry.is_consistent());
            }
        }
    }
}
