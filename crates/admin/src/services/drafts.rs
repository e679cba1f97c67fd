//! In-memory store of open discount form drafts.
//!
//! Each page view owns one draft. Drafts are dropped after sitting idle for
//! the configured TTL, when the store is over its byte budget, or when a
//! submit takes them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use shpfy_core::DraftId;
use tokio::sync::Mutex;

use crate::models::{FormEvent, FormSnapshot, FormState};

/// Weight charged for a draft without a banner.
const BASE_DRAFT_WEIGHT: u32 = 4 * 1024;

/// One open draft.
///
/// `state` is `None` once a submit has taken the draft, so events racing the
/// submit see a missing draft instead of writing into a discarded one.
struct Draft {
    state: Mutex<Option<FormState>>,
    weight: AtomicU32,
}

impl Draft {
    fn new(state: FormState) -> Arc<Self> {
        Arc::new(Self {
            weight: AtomicU32::new(weight_of(&state)),
            state: Mutex::new(Some(state)),
        })
    }
}

fn weight_of(state: &FormState) -> u32 {
    let banner = state.banner_file.as_ref().map_or(0, |file| file.size());
    BASE_DRAFT_WEIGHT.saturating_add(u32::try_from(banner).unwrap_or(u32::MAX))
}

/// Store of open form drafts, keyed by [`DraftId`].
///
/// Cheap to clone; clones share the same cache. The cache is weighed in
/// bytes, so a few drafts with large banners evict idle ones.
#[derive(Clone)]
pub struct DraftStore {
    cache: Cache<DraftId, Arc<Draft>>,
}

impl DraftStore {
    /// Create a store whose drafts expire after `ttl` without activity and
    /// that holds at most `max_bytes` of drafts.
    #[must_use]
    pub fn new(ttl: Duration, max_bytes: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|_id: &DraftId, draft: &Arc<Draft>| draft.weight.load(Ordering::Relaxed))
            .time_to_idle(ttl)
            .build();

        Self { cache }
    }

    /// Open a new draft with default values.
    pub async fn create(&self) -> (DraftId, FormState) {
        let id = DraftId::new();
        let state = FormState::new(Utc::now());
        self.cache.insert(id, Draft::new(state.clone())).await;

        tracing::debug!(draft_id = %id, "Draft created");
        (id, state)
    }

    /// Current state of a draft.
    pub async fn get(&self, id: DraftId) -> Option<FormState> {
        let draft = self.cache.get(&id).await?;
        let state = draft.state.lock().await;
        state.clone()
    }

    /// Apply one change event to a draft and return the updated state.
    ///
    /// Returns `None` if the draft does not exist, has expired or is being
    /// submitted.
    pub async fn apply(&self, id: DraftId, event: FormEvent) -> Option<FormState> {
        self.apply_all(id, [event]).await
    }

    /// Apply events in order under one lock and return the updated state.
    ///
    /// Returns `None` if the draft does not exist, has expired or is being
    /// submitted.
    pub async fn apply_all(
        &self,
        id: DraftId,
        events: impl IntoIterator<Item = FormEvent>,
    ) -> Option<FormState> {
        let draft = self.cache.get(&id).await?;
        let mut guard = draft.state.lock().await;
        let state = guard.as_mut()?;

        for event in events {
            tracing::debug!(draft_id = %id, event = event.name(), "Applying form event");
            state.apply(event);
        }

        // moka weighs an entry on insert, so re-insert when the banner changed.
        let weight = weight_of(state);
        if draft.weight.swap(weight, Ordering::Relaxed) != weight {
            self.cache.insert(id, Arc::clone(&draft)).await;
        }

        Some(state.clone())
    }

    /// Read-only view of a draft.
    pub async fn snapshot(&self, id: DraftId) -> Option<FormSnapshot> {
        self.get(id).await.map(|state| FormSnapshot::from(&state))
    }

    /// Remove a draft for submitting and return its final state.
    ///
    /// Only one caller can take a given draft. Hand it back with
    /// [`restore`](Self::restore) if the submit fails.
    pub async fn take(&self, id: DraftId) -> Option<FormState> {
        let draft = self.cache.remove(&id).await?;
        let state = draft.state.lock().await.take();

        if state.is_some() {
            tracing::debug!(draft_id = %id, "Draft taken for submit");
        }
        state
    }

    /// Put a taken draft back so it can be edited and submitted again.
    pub async fn restore(&self, id: DraftId, state: FormState) {
        self.cache.insert(id, Draft::new(state)).await;
        tracing::debug!(draft_id = %id, "Draft restored");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::BannerFile;

    const TTL: Duration = Duration::from_secs(60);
    const MAX_BYTES: u64 = 16 * 1024 * 1024;

    fn banner(size: usize) -> FormEvent {
        FormEvent::BannerFile(BannerFile::new(
            "banner.png",
            "image/png",
            Bytes::from(vec![0_u8; size]),
        ))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = DraftStore::new(TTL, MAX_BYTES);
        let (id, state) = store.create().await;

        assert_eq!(store.get(id).await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_apply_updates_stored_state() {
        let store = DraftStore::new(TTL, MAX_BYTES);
        let (id, _) = store.create().await;

        let updated = store
            .apply(
                id,
                FormEvent::MinimumSubtotal {
                    value: Some(Decimal::new(50, 0)),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.min_value, Some(Decimal::new(50, 0)));

        let snapshot = store.snapshot(id).await.unwrap();
        assert_eq!(snapshot.min_value, Some(Decimal::new(50, 0)));
        assert_eq!(snapshot.min_qty, Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_unknown_draft() {
        let store = DraftStore::new(TTL, MAX_BYTES);
        assert!(store.apply(DraftId::new(), FormEvent::NoMinimum).await.is_none());
        assert!(store.snapshot(DraftId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_take_is_exclusive() {
        let store = DraftStore::new(TTL, MAX_BYTES);
        let (id, _) = store.create().await;
        store.apply(id, FormEvent::NoMinimum).await.unwrap();

        let (first, second) = tokio::join!(store.take(id), store.take(id));
        assert!(first.is_some() ^ second.is_some());
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_events_after_take_are_rejected() {
        let store = DraftStore::new(TTL, MAX_BYTES);
        let (id, _) = store.create().await;
        let draft = store.cache.get(&id).await.unwrap();

        store.take(id).await.unwrap();

        // A handle fetched before the take must not accept writes.
        assert!(draft.state.lock().await.is_none());
        assert!(store.apply(id, FormEvent::NoMinimum).await.is_none());
    }

    #[tokio::test]
    async fn test_restore_after_failed_submit() {
        let store = DraftStore::new(TTL, MAX_BYTES);
        let (id, _) = store.create().await;
        store
            .apply(
                id,
                FormEvent::UsageLimit {
                    once_per_customer: false,
                },
            )
            .await
            .unwrap();

        let state = store.take(id).await.unwrap();
        store.restore(id, state).await;

        assert!(!store.snapshot(id).await.unwrap().one_per_user);
        assert!(store.take(id).await.is_some());
    }

    #[tokio::test]
    async fn test_banner_counts_towards_weight() {
        let store = DraftStore::new(TTL, MAX_BYTES);
        let (id, _) = store.create().await;
        let draft = store.cache.get(&id).await.unwrap();
        assert_eq!(draft.weight.load(Ordering::Relaxed), BASE_DRAFT_WEIGHT);

        store.apply(id, banner(64 * 1024)).await.unwrap();
        assert_eq!(
            draft.weight.load(Ordering::Relaxed),
            BASE_DRAFT_WEIGHT + 64 * 1024
        );
    }

    #[tokio::test]
    async fn test_store_stays_within_byte_budget() {
        let max_bytes = 256 * 1024;
        let store = DraftStore::new(TTL, max_bytes);

        for _ in 0..8 {
            let (id, _) = store.create().await;
            store.apply(id, banner(100 * 1024)).await;
        }
        store.cache.run_pending_tasks().await;

        assert!(store.cache.weighted_size() <= max_bytes);
        assert!(store.cache.entry_count() < 8);
    }

    #[tokio::test]
    async fn test_drafts_are_independent() {
        let store = DraftStore::new(TTL, MAX_BYTES);
        let (first, _) = store.create().await;
        let (second, _) = store.create().await;

        store
            .apply(
                first,
                FormEvent::UsageLimit {
                    once_per_customer: false,
                },
            )
            .await
            .unwrap();

        assert!(!store.snapshot(first).await.unwrap().one_per_user);
        assert!(store.snapshot(second).await.unwrap().one_per_user);
    }
}
