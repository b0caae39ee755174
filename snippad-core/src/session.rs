//! Explicit session context: the single process-wide "who is signed in"
//! pointer, with defined restore (on open) and teardown (on logout) points.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{SharedStore, StoreError};

const SESSION_KEY: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    user_id: Uuid,
}

/// Holds the current user id, if any. Persisted by id, not by value, so the
/// user record in the store stays the single source of truth.
#[derive(Debug, Default)]
pub struct SessionContext {
    current: Option<Uuid>,
}

impl SessionContext {
    /// Restores the session saved by a previous "remember me" sign-in.
    pub fn restore(store: &SharedStore) -> Self {
        let current = store
            .lock()
            .ok()
            .and_then(|store| store.get_one::<SessionRecord>(SESSION_KEY))
            .map(|record| record.user_id);
        if let Some(user_id) = current {
            tracing::debug!(%user_id, "session restored");
        }
        Self { current }
    }

    pub fn current(&self) -> Option<Uuid> {
        self.current
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    /// Marks `user_id` as signed in. With `remember` the pointer survives a
    /// restart; without it the session is process-local only.
    pub fn sign_in(
        &mut self,
        store: &SharedStore,
        user_id: Uuid,
        remember: bool,
    ) -> Result<(), StoreError> {
        self.current = Some(user_id);
        let Ok(mut store) = store.lock() else {
            return Ok(());
        };
        if remember {
            store.put_one(SESSION_KEY, &SessionRecord { user_id })
        } else {
            store.remove(SESSION_KEY)
        }
    }

    /// Teardown point: forgets the current user and the persisted pointer.
    pub fn sign_out(&mut self, store: &SharedStore) -> Result<(), StoreError> {
        self.current = None;
        let Ok(mut store) = store.lock() else {
            return Ok(());
        };
        store.remove(SESSION_KEY)
    }
}
