//! Module: access
//! Responsibility: the two data entry points, cheap roster listing and
//! member-enriched roster fetches.
//! Does not own: sorting, pagination, or token handling.
//! Boundary: platform failures stop here; only store errors propagate.
//!
//! Invariants:
//! - Listing never calls the platform.
//! - Placement ranks come from the roster's own season namespace, or the
//!   global namespace only when no season is set.

mod cache;
mod enriched;
mod platform;


pub use cache::{CacheFreshness, CachePolicy, MembershipCache};
pub use enriched::{EnrichedGroup, EnrichedRoster};
pub use platform::{GroupDescriptor, PlatformClient, PlatformError, PlatformMember};

use crate::{
    DEFAULT_ROSTER_ID,
    config::CastlistConfig,
    model::{GroupRef, GroupRefs, RosterDefinition, RosterMember, TenantId, VirtualOrigin},
    resolve::resolve,
    store::{Clock, RosterStore, StoreBackend, StoreError, SystemClock, TenantSnapshot},
};
use futures_util::future::join_all;
use std::{collections::HashSet, sync::Arc};
use tokio::time::timeout;

///
/// DataAccess
///
/// Store, shared membership cache, and the policies that govern them.
///

pub struct DataAccess<B, C = SystemClock> {
    store: RosterStore<B, C>,
    cache: Arc<MembershipCache>,
    policy: CachePolicy,
    menu_max_entries: usize,
}

impl<B: StoreBackend, C: Clock> DataAccess<B, C> {
    #[must_use]
    pub fn new(store: RosterStore<B, C>, cache: Arc<MembershipCache>) -> Self {
        let defaults = CastlistConfig::default();

        Self::with_config(store, cache, &defaults)
    }

    #[must_use]
    pub fn with_config(
        store: RosterStore<B, C>,
        cache: Arc<MembershipCache>,
        config: &CastlistConfig,
    ) -> Self {
        Self {
            store,
            cache,
            policy: config.cache_policy(),
            menu_max_entries: config.menu.max_entries,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &RosterStore<B, C> {
        &self.store
    }

    #[must_use]
    pub fn cache(&self) -> &MembershipCache {
        &self.cache
    }

    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Every roster of the tenant, metadata only: the default first, then
    /// by `modifiedAt` descending.
    pub fn list_roster_summaries(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<RosterDefinition>, StoreError> {
        let snapshot = self.store.load(tenant)?;

        Ok(roster_summaries(&snapshot))
    }

    /// Summaries truncated to the menu limit, keeping the most recent.
    pub fn list_menu_entries(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<RosterDefinition>, StoreError> {
        let mut summaries = self.list_roster_summaries(tenant)?;
        summaries.truncate(self.menu_max_entries);

        Ok(summaries)
    }

    /// Resolve `identifier` and attach live members to each of its groups.
    /// Groups come back unsorted, in `groupRefs` order. Members of detached
    /// groups move to another roster group they hold, else to `ungrouped`.
    ///
    /// The store load runs inline on the calling task; see `FileBackend`.
    pub async fn get_enriched_roster<P: PlatformClient>(
        &self,
        tenant: &TenantId,
        identifier: &str,
        platform: &P,
    ) -> Result<EnrichedRoster, StoreError> {
        let snapshot = self.store.load(tenant)?;
        let definition = resolve(&snapshot, identifier);
        let detached = definition.body().detached_group_refs.clone();
        let group_refs: GroupRefs = definition
            .group_refs()
            .iter()
            .chain(&detached)
            .cloned()
            .collect();

        // Phase 1: decide which groups need a refresh.
        let mut cold = Vec::new();
        for group in &group_refs {
            let known_total = platform
                .group_descriptor(group)
                .and_then(|descriptor| descriptor.member_count);
            let cached = self.cache.cached_count(group).await;

            if !self.policy.is_warm(cached, known_total) {
                tracing::debug!(
                    tenant = %tenant,
                    group = %group,
                    cached = cached.unwrap_or(0),
                    known_total = known_total.unwrap_or(0),
                    "membership cache cold, refreshing"
                );
                cold.push(group.clone());
            }
        }

        // Phase 2: refresh cold groups concurrently, each time-boxed.
        let outcomes = join_all(cold.iter().map(|group| self.refresh(group, platform))).await;
        let freshness_of = |group: &GroupRef| {
            cold.iter()
                .zip(&outcomes)
                .find(|(cold_group, _)| *cold_group == group)
                .map_or(CacheFreshness::Warm, |(_, freshness)| *freshness)
        };

        if let Some(season) = definition.season_id()
            && !snapshot.has_placement_namespace(Some(season))
        {
            tracing::debug!(
                tenant = %tenant,
                roster = %definition.id(),
                season,
                "season has no placements"
            );
        }

        // Phase 3: assemble, listing each member once under its first group.
        let mut seen = HashSet::new();
        let mut groups = Vec::with_capacity(group_refs.len());
        for group in &group_refs {
            let label = group_label(&snapshot, platform, group);
            let cached = self.cache.get(group).await.unwrap_or_default();

            let members = cached
                .iter()
                .filter(|member| seen.insert(member.external_id.clone()))
                .map(|member| build_member(&snapshot, &definition, group, &label, member))
                .collect();

            groups.push(EnrichedGroup {
                group_ref: group.clone(),
                label,
                members,
                settings: definition.settings(),
                season_id: definition.season_id().map(str::to_string),
                freshness: freshness_of(group),
            });
        }

        // Phase 4: detached groups give up their members.
        let mut roster = EnrichedRoster::new(definition, groups);
        for group in &detached {
            roster.detach_group(group);
        }

        Ok(roster)
    }

    async fn refresh<P: PlatformClient>(&self, group: &GroupRef, platform: &P) -> CacheFreshness {
        let budget_ms = self.policy.fetch_timeout_ms();

        let fetch = platform.fetch_group_members(group);
        let outcome = timeout(self.policy.fetch_timeout, fetch)
            .await
            .unwrap_or(Err(PlatformError::Timeout { after_ms: budget_ms }));

        match outcome {
            Ok(members) => {
                self.cache.store(group.clone(), members).await;
                CacheFreshness::Refreshed
            }
            Err(error) => {
                tracing::warn!(
                    group = %group,
                    budget_ms,
                    %error,
                    "membership refresh failed, using cached members"
                );
                CacheFreshness::Stale
            }
        }
    }
}

/// Pure listing over one snapshot.
#[must_use]
pub fn roster_summaries(snapshot: &TenantSnapshot) -> Vec<RosterDefinition> {
    let default = resolve(snapshot, DEFAULT_ROSTER_ID);

    let mut rest: Vec<RosterDefinition> = snapshot
        .real_rosters()
        .iter()
        .filter(|body| body.id != DEFAULT_ROSTER_ID)
        .map(|body| RosterDefinition::Real(body.clone()))
        .chain(snapshot.legacy_rosters().iter().map(|legacy| {
            RosterDefinition::synthesize(
                VirtualOrigin::LegacyName {
                    name: legacy.name.clone(),
                },
                legacy.group_refs.clone(),
            )
        }))
        .collect();

    rest.sort_by(|left, right| {
        right
            .modified_at()
            .cmp(&left.modified_at())
            .then_with(|| left.name().to_lowercase().cmp(&right.name().to_lowercase()))
            .then_with(|| left.id().cmp(right.id()))
    });

    std::iter::once(default).chain(rest).collect()
}

// Descriptor label, else the stored group name, else the raw ref.
fn group_label<P: PlatformClient>(
    snapshot: &TenantSnapshot,
    platform: &P,
    group: &GroupRef,
) -> String {
    platform
        .group_descriptor(group)
        .map(|descriptor| descriptor.label)
        .or_else(|| snapshot.group_label(group).map(str::to_string))
        .unwrap_or_else(|| group.to_string())
}

fn build_member(
    snapshot: &TenantSnapshot,
    definition: &RosterDefinition,
    group: &GroupRef,
    label: &str,
    member: &PlatformMember,
) -> RosterMember {
    let mut row = RosterMember::new(&member.external_id, &member.display_name)
        .in_group(group.clone(), label)
        .with_tags(member.vanity_tags.iter().cloned());

    // Held roster groups in roster order, the listing group included.
    row.held_groups = definition
        .group_refs()
        .iter()
        .filter(|candidate| *candidate == group || member.group_refs.contains(candidate))
        .cloned()
        .collect();
    row.placement_rank = snapshot.placement(definition.season_id(), &member.external_id);

    row
}
