//! Client-held copies of upstream lists.
//!
//! Refreshes may overlap (a poll firing while an explicit refresh is in
//! flight). Each refresh takes a ticket before it calls the upstream and its
//! response is only applied if no later ticket has been applied already.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug)]
pub struct SnapshotState<T> {
    pub items: Vec<T>,
    applied: u64,
    refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct Snapshot<T> {
    state: RwLock<SnapshotState<T>>,
    issued: AtomicU64,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Snapshot<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SnapshotState {
                items: Vec::new(),
                applied: 0,
                refreshed_at: None,
            }),
            issued: AtomicU64::new(0),
        }
    }

    pub fn ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replaces the contents unless a newer ticket already landed.
    pub async fn apply(&self, ticket: u64, items: Vec<T>) -> bool {
        let mut state = self.state.write().await;
        if ticket <= state.applied {
            tracing::debug!(ticket, applied = state.applied, "Discarding stale refresh");
            return false;
        }
        state.items = items;
        state.applied = ticket;
        state.refreshed_at = Some(Utc::now());
        true
    }

    /// Runs `fetch` under a fresh ticket. `Ok(false)` means the response was
    /// older than one already applied.
    pub async fn refresh<E, Fut>(&self, fetch: Fut) -> Result<bool, E>
    where
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let ticket = self.ticket();
        let items = fetch.await?;
        Ok(self.apply(ticket, items).await)
    }

    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.refreshed_at
    }

    /// The lock [`crate::tentative::apply_tentatively`] operates on.
    pub fn state(&self) -> &RwLock<SnapshotState<T>> {
        &self.state
    }
}

impl<T: Clone + Keyed> Snapshot<T> {
    pub async fn all(&self) -> Vec<T> {
        self.state.read().await.items.clone()
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        self.state.read().await.items.iter().find(|i| i.key() == key).cloned()
    }

    /// Reflects one record returned by a successful upstream call.
    ///
    /// Committing takes its own ticket, so a refresh issued before the call
    /// returned can no longer put the old record back.
    pub async fn upsert(&self, item: T) {
        let mut state = self.state.write().await;
        state.commit(self.ticket());
        state.upsert(item);
    }

    /// Edits one record in place and returns the edited copy.
    pub async fn update<F>(&self, key: &str, edit: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut state = self.state.write().await;
        let ticket = self.ticket();
        let item = state.get_mut(key)?;
        edit(item);
        let updated = item.clone();
        state.commit(ticket);
        Some(updated)
    }
}

impl<T: Keyed> SnapshotState<T> {
    pub fn upsert(&mut self, item: T) {
        match self.items.iter_mut().find(|i| i.key() == item.key()) {
            Some(existing) => *existing = item,
            None => self.items.insert(0, item),
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|i| i.key() == key)
    }
}

impl<T> SnapshotState<T> {
    fn commit(&mut self, ticket: u64) {
        self.applied = self.applied.max(ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, u32);

    impl Keyed for Row {
        fn key(&self) -> &str {
            self.0
        }
    }

    #[tokio::test]
    async fn stale_responses_are_discarded() {
        let snapshot = Snapshot::new();
        let older = snapshot.ticket();
        let newer = snapshot.ticket();

        assert!(snapshot.apply(newer, vec![Row("a", 2)]).await);
        assert!(!snapshot.apply(older, vec![Row("a", 1)]).await);
        assert_eq!(snapshot.all().await, vec![Row("a", 2)]);
        assert!(snapshot.refreshed_at().await.is_some());
    }

    #[tokio::test]
    async fn refresh_propagates_fetch_errors() {
        let snapshot: Snapshot<Row> = Snapshot::new();
        snapshot.upsert(Row("a", 1)).await;

        let result = snapshot.refresh(async { Err::<Vec<Row>, _>("offline") }).await;
        assert_eq!(result, Err("offline"));
        assert_eq!(snapshot.all().await, vec![Row("a", 1)]);

        assert_eq!(snapshot.refresh(async { Ok::<_, ()>(vec![Row("b", 1)]) }).await, Ok(true));
        assert_eq!(snapshot.get("b").await, Some(Row("b", 1)));
        assert_eq!(snapshot.get("a").await, None);
    }

    #[tokio::test]
    async fn upsert_replaces_by_key() {
        let snapshot = Snapshot::new();
        snapshot.upsert(Row("a", 1)).await;
        snapshot.upsert(Row("b", 1)).await;
        snapshot.upsert(Row("a", 5)).await;
        assert_eq!(snapshot.all().await, vec![Row("b", 1), Row("a", 5)]);
    }

    #[tokio::test]
    async fn committed_records_outlive_older_refreshes() {
        let snapshot = Snapshot::new();
        assert!(snapshot.apply(snapshot.ticket(), vec![Row("a", 1), Row("b", 1)]).await);

        let in_flight = snapshot.ticket();
        snapshot.upsert(Row("a", 2)).await;
        assert!(!snapshot.apply(in_flight, vec![Row("a", 1), Row("b", 1)]).await);
        assert_eq!(snapshot.get("a").await, Some(Row("a", 2)));

        let in_flight = snapshot.ticket();
        assert_eq!(snapshot.update("b", |row| row.1 = 9).await, Some(Row("b", 9)));
        assert!(!snapshot.apply(in_flight, vec![Row("b", 1)]).await);
        assert_eq!(snapshot.all().await, vec![Row("a", 2), Row("b", 9)]);

        assert_eq!(snapshot.update("missing", |row| row.1 = 0).await, None);
        assert!(snapshot.apply(snapshot.ticket(), vec![Row("c", 1)]).await);
    }
}
