//! Module: resolve
//! Responsibility: map any identifier to exactly one roster definition.
//! Does not own: persistence, record normalization, or membership.
//! Boundary: pure over a `TenantSnapshot`; never fails.
//!
//! Resolution order, first match wins:
//! 1. the `default` sentinel (stored default, else synthesized)
//! 2. exact id of a readable real record
//! 3. case-normalized legacy name, or the virtual id of one
//! 4. synthesized virtual definition (a materialized one if stored)


use crate::{
    DEFAULT_ROSTER_ID,
    model::{
        GroupRefs, RosterDefinition, TenantId, VirtualOrigin, is_virtual_roster_id,
        normalize_roster_name, virtual_roster_id,
    },
    store::{Clock, RosterStore, StoreBackend, StoreError, TenantSnapshot},
};
use std::fmt::{self, Display};

///
/// ResolveStep
///
/// Which rule produced a resolution.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolveStep {
    DefaultSentinel,
    RealId,
    LegacyName,
    Synthesized,
}

impl Display for ResolveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DefaultSentinel => "default_sentinel",
            Self::RealId => "real_id",
            Self::LegacyName => "legacy_name",
            Self::Synthesized => "synthesized",
        };
        write!(f, "{label}")
    }
}

///
/// Resolution
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resolution {
    pub definition: RosterDefinition,
    pub step: ResolveStep,
}

/// Resolve `identifier` against one tenant snapshot.
#[must_use]
pub fn resolve(snapshot: &TenantSnapshot, identifier: &str) -> RosterDefinition {
    resolve_traced(snapshot, identifier).definition
}

/// Resolve and report the matching rule.
#[must_use]
pub fn resolve_traced(snapshot: &TenantSnapshot, identifier: &str) -> Resolution {
    let resolution = match_identifier(snapshot, identifier);

    tracing::debug!(
        tenant = %snapshot.tenant(),
        identifier,
        step = %resolution.step,
        roster = %resolution.definition.id(),
        kind = resolution.definition.kind().as_str(),
        "resolved roster"
    );

    resolution
}

/// Load `tenant` and resolve `identifier` within it. Only store I/O can
/// fail; resolution itself is total.
pub fn resolve_in<B: StoreBackend, C: Clock>(
    store: &RosterStore<B, C>,
    tenant: &TenantId,
    identifier: &str,
) -> Result<RosterDefinition, StoreError> {
    let snapshot = store.load(tenant)?;

    Ok(resolve(&snapshot, identifier))
}

fn match_identifier(snapshot: &TenantSnapshot, identifier: &str) -> Resolution {
    let found = |definition, step| Resolution { definition, step };

    // 1. sentinel
    if identifier == DEFAULT_ROSTER_ID {
        return found(default_roster(snapshot), ResolveStep::DefaultSentinel);
    }

    // 2. real id
    if let Some(body) = snapshot.find_real(identifier) {
        return found(RosterDefinition::Real(body.clone()), ResolveStep::RealId);
    }

    // 3. legacy name; legacy spellings of `default` were collected into the
    // default roster's groups
    if normalize_roster_name(identifier) == DEFAULT_ROSTER_ID
        || identifier == virtual_roster_id(DEFAULT_ROSTER_ID)
    {
        return found(default_roster(snapshot), ResolveStep::LegacyName);
    }
    if let Some(legacy) = snapshot.find_legacy(identifier) {
        let definition = RosterDefinition::synthesize(
            VirtualOrigin::LegacyName {
                name: legacy.name.clone(),
            },
            legacy.group_refs.clone(),
        );

        return found(definition, ResolveStep::LegacyName);
    }

    // 4. synthesize; a legacy name materialized earlier lives under its
    // virtual id
    let candidate = if is_virtual_roster_id(identifier) {
        identifier.to_string()
    } else {
        virtual_roster_id(identifier)
    };
    if let Some(body) = snapshot.find_real(&candidate) {
        return found(RosterDefinition::Real(body.clone()), ResolveStep::Synthesized);
    }

    let definition = RosterDefinition::synthesize(
        VirtualOrigin::Unregistered {
            identifier: identifier.to_string(),
        },
        GroupRefs::new(),
    );

    found(definition, ResolveStep::Synthesized)
}

// Stored default record, else the sentinel over the tenant's default groups.
fn default_roster(snapshot: &TenantSnapshot) -> RosterDefinition {
    snapshot.find_real(DEFAULT_ROSTER_ID).map_or_else(
        || {
            RosterDefinition::synthesize(
                VirtualOrigin::DefaultSentinel,
                snapshot.default_group_refs().clone(),
            )
        },
        |body| RosterDefinition::Real(body.clone()),
    )
}
