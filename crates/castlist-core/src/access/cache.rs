use crate::{access::PlatformMember, model::GroupRef};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;

///
/// CachePolicy
///
/// When cached membership is trusted and how long a refresh may take.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CachePolicy {
    /// Minimum cached/known membership ratio that counts as warm.
    pub warm_ratio: f64,
    pub fetch_timeout: Duration,
}

impl CachePolicy {
    /// Warm when the cache covers at least `warm_ratio` of the known total.
    /// With no known total, any cached entry is warm; with none, cold.
    #[must_use]
    pub fn is_warm(&self, cached: Option<usize>, known_total: Option<usize>) -> bool {
        let Some(cached) = cached else {
            return false;
        };

        match known_total {
            None | Some(0) => true,
            Some(total) => {
                #[allow(clippy::cast_precision_loss)]
                let ratio = cached as f64 / total as f64;

                ratio >= self.warm_ratio
            }
        }
    }

    /// Timeout budget in whole milliseconds, for logs and errors.
    #[must_use]
    pub fn fetch_timeout_ms(&self) -> u64 {
        u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            warm_ratio: 0.8,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

///
/// CacheFreshness
///
/// How one group's member list was obtained for a request.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheFreshness {
    /// Cache met the warm ratio; no fetch was issued.
    Warm,

    /// Fetched from the platform during this request.
    Refreshed,

    /// Refresh failed or timed out; whatever was cached was used.
    Stale,
}

///
/// MembershipCache
///
/// Process-wide, read-mostly group membership cache. Entries are replaced
/// wholesale, so racing refreshes of the same group are harmless.
///

#[derive(Debug, Default)]
pub struct MembershipCache {
    groups: RwLock<HashMap<GroupRef, Arc<[PlatformMember]>>>,
}

impl MembershipCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, group: &GroupRef) -> Option<Arc<[PlatformMember]>> {
        self.groups.read().await.get(group).cloned()
    }

    pub async fn cached_count(&self, group: &GroupRef) -> Option<usize> {
        self.groups.read().await.get(group).map(|members| members.len())
    }

    /// Replace the cached membership of `group`.
    pub async fn store(&self, group: GroupRef, members: Vec<PlatformMember>) {
        self.groups.write().await.insert(group, members.into());
    }

    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.groups.read().await.is_empty()
    }
}
