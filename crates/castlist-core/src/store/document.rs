//! Module: store::document
//! Responsibility: persisted tenant document shape and legacy-shape normalization.
//! Does not own: backend I/O, mutation sequencing, or resolution order.
//! Boundary: raw JSON in, `TenantSnapshot` of canonical roster bodies out.
//!
//! Three historical roster shapes are accepted:
//! - legacy name: a group record carrying only `"roster": "<free text>"`
//! - intermediate: a roster record with `settings.seasonId` nested, linked
//!   from group records through a single `"rosterId"`
//! - modern: flat `seasonId`, explicit `groupRefs`, group records linking
//!   through `"rosterIds"`

use crate::{
    DEFAULT_ROSTER_ID,
    model::{
        GroupRef, GroupRefs, RosterBody, RosterSettings, SortStrategy, TenantId,
        normalize_roster_name, virtual_roster_id,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// Placement namespace used only when a roster has no season.
pub const GLOBAL_PLACEMENT_NAMESPACE: &str = "global";

///
/// RecordError
///
/// Why one stored roster record could not be normalized. A rejected record
/// is skipped; it never fails the whole document.
///

#[derive(Debug, ThisError)]
pub enum RecordError {
    #[error("record shape is invalid: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("record id is empty")]
    EmptyId,

    #[error("record id '{id}' does not match its key '{key}'")]
    IdMismatch { key: String, id: String },

    #[error("unknown roster kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("virtual rosters are never persisted")]
    VirtualPersisted,

    #[error("unknown sort strategy '{value}'")]
    UnknownSortStrategy { value: String },
}

///
/// TenantDocument
///
/// One tenant's persisted state. Roster records stay as raw JSON so a single
/// corrupted record cannot poison the rest and unknown fields survive writes.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDocument {
    #[serde(default)]
    pub rosters: BTreeMap<String, Value>,

    #[serde(default)]
    pub groups: BTreeMap<String, GroupRecord>,

    /// namespace (season id or `global`) -> external member id -> rank
    #[serde(default)]
    pub placements: BTreeMap<String, BTreeMap<String, u32>>,
}

///
/// GroupRecord
///
/// External group as the host application stores it. Only the roster link
/// fields and the label are read here; everything else is carried through.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Legacy free-text roster name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster: Option<String>,

    /// Intermediate single-id link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster_id: Option<String>,

    /// Modern multi-id link.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roster_ids: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupRecord {
    /// Whether this group links to `id` through either id-based shape.
    #[must_use]
    pub fn links_to(&self, id: &str) -> bool {
        self.roster_id.as_deref() == Some(id) || self.roster_ids.iter().any(|r| r == id)
    }

    /// Legacy name, only when no id-based link exists.
    #[must_use]
    pub fn legacy_name(&self) -> Option<&str> {
        if self.roster_id.is_some() || !self.roster_ids.is_empty() {
            return None;
        }

        self.roster.as_deref().filter(|name| !name.trim().is_empty())
    }

    /// Whether this group belongs to roster `id` through any shape,
    /// including a legacy name equal to the id after normalization.
    #[must_use]
    pub fn belongs_to(&self, id: &str) -> bool {
        self.links_to(id)
            || self
                .legacy_name()
                .is_some_and(|name| normalize_roster_name(name) == normalize_roster_name(id))
    }

    /// Drop every link to `id`, legacy name included.
    pub fn unlink(&mut self, id: &str) {
        if self.roster_id.as_deref() == Some(id) {
            self.roster_id = None;
        }
        self.roster_ids.retain(|r| r != id);

        if self
            .roster
            .as_deref()
            .is_some_and(|name| normalize_roster_name(name) == normalize_roster_name(id))
        {
            self.roster = None;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRosterRecord {
    id: Option<String>,
    kind: Option<String>,
    name: Option<String>,
    season_id: Option<String>,
    #[serde(default)]
    settings: RawSettings,
    group_refs: Option<Vec<String>>,
    detached_group_refs: Option<Vec<String>>,
    modified_at: Option<u64>,
    created_at: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    sort_strategy: Option<String>,
    season_id: Option<String>,
}

///
/// LegacyRoster
///
/// A roster that exists only as a free-text name on group records.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LegacyRoster {
    /// First spelling seen, in group-key order.
    pub name: String,
    pub group_refs: GroupRefs,
}

impl LegacyRoster {
    #[must_use]
    pub fn virtual_id(&self) -> String {
        virtual_roster_id(&self.name)
    }
}

///
/// RejectedRecord
///

#[derive(Debug)]
pub struct RejectedRecord {
    pub key: String,
    pub error: RecordError,
}

///
/// TenantSnapshot
///
/// Normalized, read-only view of one tenant document.
///

#[derive(Debug)]
pub struct TenantSnapshot {
    tenant: TenantId,
    rosters: Vec<RosterBody>,
    rejected: Vec<RejectedRecord>,
    legacy: Vec<LegacyRoster>,
    default_groups: GroupRefs,
    group_labels: BTreeMap<GroupRef, String>,
    placements: BTreeMap<String, BTreeMap<String, u32>>,
}

impl TenantSnapshot {
    /// Normalize every record of `document`.
    #[must_use]
    pub fn from_document(tenant: TenantId, document: &TenantDocument) -> Self {
        let mut rosters = Vec::new();
        let mut rejected = Vec::new();

        // Phase 1: real records, each normalized independently.
        for (key, value) in &document.rosters {
            match normalize_record(key, value, &document.groups) {
                Ok(body) => rosters.push(body),
                Err(error) => {
                    tracing::warn!(
                        tenant = %tenant,
                        record = %key,
                        %error,
                        "skipping unreadable roster record"
                    );
                    rejected.push(RejectedRecord {
                        key: key.clone(),
                        error,
                    });
                }
            }
        }

        // Phase 2: legacy names. A name matching a real id was already folded
        // into that roster by `normalize_record`.
        let mut legacy: Vec<LegacyRoster> = Vec::new();
        let mut default_groups = GroupRefs::new();

        for (group_key, group) in &document.groups {
            let group_ref = GroupRef::new(group_key.as_str());

            if group.belongs_to(DEFAULT_ROSTER_ID) {
                default_groups.insert(group_ref);
                continue;
            }

            let Some(name) = group.legacy_name() else {
                continue;
            };
            let normalized = normalize_roster_name(name);
            if rosters
                .iter()
                .any(|body| normalize_roster_name(&body.id) == normalized)
            {
                continue;
            }

            if let Some(entry) = legacy
                .iter_mut()
                .find(|entry| normalize_roster_name(&entry.name) == normalized)
            {
                entry.group_refs.insert(group_ref);
            } else {
                legacy.push(LegacyRoster {
                    name: name.trim().to_string(),
                    group_refs: std::iter::once(group_ref).collect(),
                });
            }
        }

        let group_labels = document
            .groups
            .iter()
            .filter_map(|(key, group)| {
                group
                    .name
                    .clone()
                    .map(|name| (GroupRef::new(key.as_str()), name))
            })
            .collect();

        Self {
            tenant,
            rosters,
            rejected,
            legacy,
            default_groups,
            group_labels,
            placements: document.placements.clone(),
        }
    }

    #[must_use]
    pub const fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Normalized real rosters, in record-key order.
    #[must_use]
    pub fn real_rosters(&self) -> &[RosterBody] {
        &self.rosters
    }

    #[must_use]
    pub fn find_real(&self, id: &str) -> Option<&RosterBody> {
        self.rosters.iter().find(|body| body.id == id)
    }

    #[must_use]
    pub fn legacy_rosters(&self) -> &[LegacyRoster] {
        &self.legacy
    }

    /// Legacy roster whose name matches `identifier` after normalization,
    /// or whose virtual id equals `identifier`.
    #[must_use]
    pub fn find_legacy(&self, identifier: &str) -> Option<&LegacyRoster> {
        let normalized = normalize_roster_name(identifier);

        self.legacy.iter().find(|entry| {
            normalize_roster_name(&entry.name) == normalized || entry.virtual_id() == identifier
        })
    }

    /// Groups belonging to the default roster when no real default exists.
    #[must_use]
    pub const fn default_group_refs(&self) -> &GroupRefs {
        &self.default_groups
    }

    #[must_use]
    pub fn group_label(&self, group: &GroupRef) -> Option<&str> {
        self.group_labels.get(group).map(String::as_str)
    }

    #[must_use]
    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    /// Rank of `member` in one placement namespace. A season with no
    /// namespace yields `None`; it never falls back to `global`.
    #[must_use]
    pub fn placement(&self, season_id: Option<&str>, member: &str) -> Option<u32> {
        let namespace = season_id.unwrap_or(GLOBAL_PLACEMENT_NAMESPACE);

        self.placements.get(namespace)?.get(member).copied()
    }

    /// Whether a placement namespace exists at all.
    #[must_use]
    pub fn has_placement_namespace(&self, season_id: Option<&str>) -> bool {
        self.placements
            .contains_key(season_id.unwrap_or(GLOBAL_PLACEMENT_NAMESPACE))
    }
}

/// Normalize one stored record into a canonical body.
pub fn normalize_record(
    key: &str,
    value: &Value,
    groups: &BTreeMap<String, GroupRecord>,
) -> Result<RosterBody, RecordError> {
    let raw: RawRosterRecord = serde_json::from_value(value.clone())?;

    let id = match raw.id {
        Some(id) if id != key => {
            return Err(RecordError::IdMismatch {
                key: key.to_string(),
                id,
            });
        }
        Some(id) => id,
        None => key.to_string(),
    };
    if id.is_empty() {
        return Err(RecordError::EmptyId);
    }

    match raw.kind.as_deref() {
        None | Some("real") => {}
        Some("virtual") => return Err(RecordError::VirtualPersisted),
        Some(other) => {
            return Err(RecordError::UnknownKind {
                kind: other.to_string(),
            });
        }
    }

    let sort_strategy = match raw.settings.sort_strategy {
        None => SortStrategy::default(),
        Some(value) => {
            SortStrategy::parse(&value).ok_or(RecordError::UnknownSortStrategy { value })?
        }
    };

    // Top-level seasonId wins; the nested one is only a migration source.
    let season_id = match (raw.season_id, raw.settings.season_id) {
        (Some(top), Some(nested)) if top != nested => {
            tracing::warn!(
                record = %id,
                top_level = %top,
                nested = %nested,
                "ignoring nested seasonId that disagrees with top-level seasonId"
            );
            Some(top)
        }
        (Some(top), _) => Some(top),
        (None, nested) => nested,
    };

    let mut group_refs: GroupRefs = raw
        .group_refs
        .unwrap_or_default()
        .into_iter()
        .map(GroupRef::new)
        .collect();
    for (group_key, group) in groups {
        if group.belongs_to(&id) {
            group_refs.insert(GroupRef::new(group_key.as_str()));
        }
    }

    // A group linked again by any shape is no longer detached.
    let detached_group_refs: GroupRefs = raw
        .detached_group_refs
        .unwrap_or_default()
        .into_iter()
        .map(GroupRef::new)
        .filter(|group| group_refs.position(group).is_none())
        .collect();

    Ok(RosterBody {
        name: raw.name.unwrap_or_else(|| id.clone()),
        id,
        season_id,
        settings: RosterSettings { sort_strategy },
        group_refs,
        detached_group_refs,
        modified_at: raw.modified_at.or(raw.created_at).unwrap_or(0),
    })
}

/// Write `body` over `existing` in the modern shape, keeping unknown keys
/// and dropping the nested `settings.seasonId`.
pub fn merge_persisted(existing: Option<&Value>, persisted: &Value) -> Value {
    let mut merged = match existing {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    if let Value::Object(fields) = persisted {
        for (field, value) in fields {
            merged.insert(field.clone(), value.clone());
        }
    }

    if persisted.get("seasonId").is_none() {
        merged.remove("seasonId");
    }
    if persisted.get("name").is_none() {
        merged.remove("name");
    }
    if persisted.get("detachedGroupRefs").is_none() {
        merged.remove("detachedGroupRefs");
    }
    if let Some(Value::Object(settings)) = merged.get_mut("settings") {
        settings.remove("seasonId");
    }

    Value::Object(merged)
}
