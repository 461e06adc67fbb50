//! Module: store
//! Responsibility: tenant document persistence and every roster mutation.
//! Does not own: identifier resolution, membership fetches, or sorting.
//! Boundary: `RosterStore` is the only writer of roster records.
//!
//! Invariants:
//! - Writes always emit the modern record shape; legacy fields are migrated
//!   on the first mutation that touches a record.
//! - Virtual rosters are persisted only through `materialize`, keeping
//!   their synthesized id.

mod backend;
mod clock;
mod document;

#[cfg(test)]
mod tests;

pub use backend::{FileBackend, MemoryBackend, StoreBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{
    GLOBAL_PLACEMENT_NAMESPACE, GroupRecord, LegacyRoster, RecordError, RejectedRecord,
    TenantDocument, TenantSnapshot,
};

use crate::{
    error::ErrorClass,
    model::{
        GroupRef, GroupRefs, PersistedRoster, RosterBody, RosterDefinition, RosterSettings,
        TenantId, generated_roster_id, normalize_roster_name, virtual_roster_id,
    },
};
use document::{merge_persisted, normalize_record};
use std::sync::Mutex;
use thiserror::Error as ThisError;

/// Upper bound on one encoded tenant document.
pub const MAX_TENANT_DOCUMENT_BYTES: usize = 4 * 1024 * 1024;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("tenant document is corrupt: {message}")]
    Corrupt { message: String },

    #[error("tenant document is {len} bytes (limit {max})")]
    TooLarge { len: usize, max: usize },

    #[error("roster not found: {key}")]
    NotFound { key: String },

    #[error("roster conflict: {message}")]
    Conflict { message: String },

    #[error("invalid store request: {message}")]
    Invalid { message: String },

    #[error("store I/O failed for tenant '{tenant}': {source}")]
    Io {
        tenant: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Corrupt { .. } | Self::TooLarge { .. } => ErrorClass::Corruption,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Conflict { .. } => ErrorClass::Conflict,
            Self::Invalid { .. } => ErrorClass::Unsupported,
            Self::Io { .. } | Self::Poisoned => ErrorClass::Internal,
        }
    }

    fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

///
/// NewRoster
///
/// Input for `RosterStore::create_roster`. `kind_label` becomes the last
/// segment of the generated id.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NewRoster {
    pub name: String,
    pub kind_label: String,
    pub season_id: Option<String>,
    pub settings: RosterSettings,
    pub group_refs: GroupRefs,
}

impl NewRoster {
    #[must_use]
    pub fn new(name: impl Into<String>, kind_label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind_label: kind_label.into(),
            ..Self::default()
        }
    }
}

///
/// RosterStore
///
/// Read-normalize-write access to tenant documents. Mutations are
/// serialized per store instance; reads never block on each other beyond
/// what the backend does.
///

pub struct RosterStore<B, C = SystemClock> {
    backend: B,
    clock: C,
    write_lock: Mutex<()>,
}

impl<B: StoreBackend> RosterStore<B> {
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self::with_clock(backend, SystemClock)
    }
}

impl<B: StoreBackend, C: Clock> RosterStore<B, C> {
    #[must_use]
    pub const fn with_clock(backend: B, clock: C) -> Self {
        Self {
            backend,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Load and normalize one tenant. A tenant with no document is empty.
    pub fn load(&self, tenant: &TenantId) -> Result<TenantSnapshot, StoreError> {
        let document = self.read_document(tenant)?;

        Ok(TenantSnapshot::from_document(tenant.clone(), &document))
    }

    /// Persist a new real roster under a generated id.
    pub fn create_roster(
        &self,
        tenant: &TenantId,
        new: NewRoster,
    ) -> Result<RosterDefinition, StoreError> {
        if new.name.trim().is_empty() {
            return Err(StoreError::invalid("roster name is empty"));
        }
        let kind_ok = !new.kind_label.is_empty()
            && new
                .kind_label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !kind_ok {
            return Err(StoreError::invalid(format!(
                "roster kind label '{}' must be ascii alphanumeric",
                new.kind_label
            )));
        }

        let now = self.clock.now_millis();
        let body = RosterBody {
            id: generated_roster_id(now, &new.kind_label),
            name: new.name.trim().to_string(),
            season_id: new.season_id,
            settings: new.settings,
            group_refs: new.group_refs,
            detached_group_refs: GroupRefs::new(),
            modified_at: now,
        };

        self.mutate(tenant, |document| {
            if document.rosters.contains_key(&body.id) {
                return Err(StoreError::Conflict {
                    message: format!("roster '{}' already exists", body.id),
                });
            }
            write_record(document, &body)?;

            Ok(RosterDefinition::Real(body))
        })
    }

    pub fn update_settings(
        &self,
        tenant: &TenantId,
        id: &str,
        settings: RosterSettings,
    ) -> Result<RosterDefinition, StoreError> {
        self.update_real(tenant, id, |body, _| {
            body.settings = settings;
            Ok(())
        })
    }

    /// Set or clear the roster's top-level season.
    pub fn set_season(
        &self,
        tenant: &TenantId,
        id: &str,
        season_id: Option<String>,
    ) -> Result<RosterDefinition, StoreError> {
        if season_id.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(StoreError::invalid("season id is empty"));
        }

        self.update_real(tenant, id, |body, _| {
            body.season_id = season_id;
            Ok(())
        })
    }

    /// Append a group, re-attaching it if it was removed earlier. Adding a
    /// group already present is a no-op write.
    pub fn add_group_ref(
        &self,
        tenant: &TenantId,
        id: &str,
        group: GroupRef,
    ) -> Result<RosterDefinition, StoreError> {
        self.update_real(tenant, id, |body, _| {
            body.detached_group_refs.remove(&group);
            body.group_refs.insert(group);
            Ok(())
        })
    }

    /// Remove a group from the roster and drop every link to the roster
    /// from that group's record, legacy name included. The group is kept as
    /// detached so its members fall back to ungrouped instead of vanishing.
    pub fn remove_group_ref(
        &self,
        tenant: &TenantId,
        id: &str,
        group: &GroupRef,
    ) -> Result<RosterDefinition, StoreError> {
        self.update_real(tenant, id, |body, document| {
            if body.group_refs.remove(group) {
                body.detached_group_refs.insert(group.clone());
            }
            if let Some(record) = document.groups.get_mut(group.as_str()) {
                record.unlink(id);
            }

            Ok(())
        })
    }

    /// Persist a virtual roster as a real one under the same id. Legacy
    /// group records are migrated to the id-based link.
    pub fn materialize(
        &self,
        tenant: &TenantId,
        definition: &RosterDefinition,
    ) -> Result<RosterDefinition, StoreError> {
        let RosterDefinition::Virtual { body, .. } = definition else {
            return Err(StoreError::Conflict {
                message: format!("roster '{}' is already real", definition.id()),
            });
        };

        let now = self.clock.now_millis();
        let mut body = body.clone();
        body.modified_at = now;

        self.mutate(tenant, |document| {
            if document.rosters.contains_key(&body.id) {
                return Err(StoreError::Conflict {
                    message: format!("roster '{}' already exists", body.id),
                });
            }

            for group in &body.group_refs {
                if let Some(record) = document.groups.get_mut(group.as_str())
                    && record
                        .legacy_name()
                        .is_some_and(|name| names_roster(name, &body.id))
                {
                    record.roster = None;
                    record.roster_ids.push(body.id.clone());
                }
            }
            write_record(document, &body)?;

            Ok(RosterDefinition::Real(body))
        })
    }

    /// Set (`Some`) or clear (`None`) one member's rank. `season_id = None`
    /// targets the global namespace.
    pub fn set_placement(
        &self,
        tenant: &TenantId,
        season_id: Option<&str>,
        member: &str,
        rank: Option<u32>,
    ) -> Result<(), StoreError> {
        let namespace = season_id.unwrap_or(GLOBAL_PLACEMENT_NAMESPACE).to_string();

        self.mutate(tenant, |document| {
            match rank {
                Some(rank) => {
                    document
                        .placements
                        .entry(namespace)
                        .or_default()
                        .insert(member.to_string(), rank);
                }
                None => {
                    if let Some(ranks) = document.placements.get_mut(&namespace) {
                        ranks.remove(member);
                        if ranks.is_empty() {
                            document.placements.remove(&namespace);
                        }
                    }
                }
            }

            Ok(())
        })
    }

    fn read_document(&self, tenant: &TenantId) -> Result<TenantDocument, StoreError> {
        let Some(bytes) = self.backend.read(tenant)? else {
            return Ok(TenantDocument::default());
        };

        decode_document(&bytes)
    }

    fn write_document(&self, tenant: &TenantId, document: &TenantDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|err| StoreError::corrupt(format!("failed to encode document: {err}")))?;
        if bytes.len() > MAX_TENANT_DOCUMENT_BYTES {
            return Err(StoreError::TooLarge {
                len: bytes.len(),
                max: MAX_TENANT_DOCUMENT_BYTES,
            });
        }

        self.backend.write(tenant, &bytes)
    }

    // Phase 1: read under the write lock. Phase 2: apply. Phase 3: write
    // back only if the closure succeeded.
    fn mutate<T>(
        &self,
        tenant: &TenantId,
        apply: impl FnOnce(&mut TenantDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut document = self.read_document(tenant)?;
        let out = apply(&mut document)?;
        self.write_document(tenant, &document)?;

        Ok(out)
    }

    fn update_real(
        &self,
        tenant: &TenantId,
        id: &str,
        apply: impl FnOnce(&mut RosterBody, &mut TenantDocument) -> Result<(), StoreError>,
    ) -> Result<RosterDefinition, StoreError> {
        let now = self.clock.now_millis();

        self.mutate(tenant, |document| {
            let record = document
                .rosters
                .get(id)
                .ok_or_else(|| StoreError::NotFound { key: id.to_string() })?;
            let mut body = normalize_record(id, record, &document.groups)
                .map_err(|err| StoreError::corrupt(format!("roster '{id}': {err}")))?;

            apply(&mut body, document)?;
            body.modified_at = now;
            write_record(document, &body)?;

            Ok(RosterDefinition::Real(body))
        })
    }
}

/// Decode one tenant document, bounded by `MAX_TENANT_DOCUMENT_BYTES`.
pub fn decode_document(bytes: &[u8]) -> Result<TenantDocument, StoreError> {
    if bytes.len() > MAX_TENANT_DOCUMENT_BYTES {
        return Err(StoreError::TooLarge {
            len: bytes.len(),
            max: MAX_TENANT_DOCUMENT_BYTES,
        });
    }

    serde_json::from_slice(bytes).map_err(|err| StoreError::corrupt(err.to_string()))
}

// Whether a legacy name denotes the roster with `id`, either directly or
// through its virtual id.
fn names_roster(name: &str, id: &str) -> bool {
    normalize_roster_name(name) == id || virtual_roster_id(name) == id
}

fn write_record(document: &mut TenantDocument, body: &RosterBody) -> Result<(), StoreError> {
    let persisted = serde_json::to_value(PersistedRoster::from(body))
        .map_err(|err| StoreError::corrupt(format!("failed to encode roster: {err}")))?;
    let merged = merge_persisted(document.rosters.get(&body.id), &persisted);
    document.rosters.insert(body.id.clone(), merged);

    Ok(())
}
