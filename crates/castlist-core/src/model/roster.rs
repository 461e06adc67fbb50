use crate::{DEFAULT_ROSTER_ID, model::GroupRef};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display};

/// Prefix carried by every synthesized virtual roster id.
pub const VIRTUAL_ID_PREFIX: &str = "virtual_";

/// Prefix carried by every generated real roster id.
pub const GENERATED_ID_PREFIX: &str = "roster";

// Hex digits kept from the SHA-256 digest of a legacy name.
const VIRTUAL_ID_HEX_LEN: usize = 16;

///
/// RosterKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterKind {
    Real,
    Virtual,
}

impl RosterKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Virtual => "virtual",
        }
    }
}

///
/// SortStrategy
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    Placements,
    Alphabetical,
    Numeric,
    VanityGroup,
    #[default]
    Insertion,
}

impl SortStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placements => "placements",
            Self::Alphabetical => "alphabetical",
            Self::Numeric => "numeric",
            Self::VanityGroup => "vanity_group",
            Self::Insertion => "insertion",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "placements" => Some(Self::Placements),
            "alphabetical" => Some(Self::Alphabetical),
            "numeric" => Some(Self::Numeric),
            "vanity_group" => Some(Self::VanityGroup),
            "insertion" => Some(Self::Insertion),
            _ => None,
        }
    }
}

impl Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// RosterSettings
///
/// Display settings. `seasonId` deliberately lives on the roster body, not
/// in here.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSettings {
    pub sort_strategy: SortStrategy,
}

///
/// GroupRefs
///
/// Ordered, duplicate-free list of external groups contributing members.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, IntoIterator, PartialEq, Serialize)]
#[serde(from = "Vec<GroupRef>", into = "Vec<GroupRef>")]
pub struct GroupRefs(#[into_iterator(owned, ref)] Vec<GroupRef>);

impl GroupRefs {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append `group` unless already present. Returns whether it was added.
    pub fn insert(&mut self, group: GroupRef) -> bool {
        if self.0.contains(&group) {
            return false;
        }

        self.0.push(group);
        true
    }

    /// Remove `group`. Returns whether it was present.
    pub fn remove(&mut self, group: &GroupRef) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != group);

        self.0.len() != before
    }

    /// Position of `group`, used as the group tie-break key.
    #[must_use]
    pub fn position(&self, group: &GroupRef) -> Option<usize> {
        self.0.iter().position(|existing| existing == group)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[GroupRef] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<GroupRef>> for GroupRefs {
    fn from(groups: Vec<GroupRef>) -> Self {
        groups.into_iter().collect()
    }
}

impl From<GroupRefs> for Vec<GroupRef> {
    fn from(groups: GroupRefs) -> Self {
        groups.0
    }
}

impl FromIterator<GroupRef> for GroupRefs {
    fn from_iter<I: IntoIterator<Item = GroupRef>>(iter: I) -> Self {
        let mut out = Self::new();
        for group in iter {
            out.insert(group);
        }

        out
    }
}

///
/// RosterBody
///
/// Fields shared by real and virtual definitions.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RosterBody {
    pub id: String,
    pub name: String,
    pub season_id: Option<String>,
    pub settings: RosterSettings,
    pub group_refs: GroupRefs,

    /// Groups removed from `group_refs`. Their members stay on the roster
    /// as ungrouped until the group is added back.
    pub detached_group_refs: GroupRefs,
    pub modified_at: u64,
}

///
/// VirtualOrigin
///
/// Where a virtual definition was synthesized from.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VirtualOrigin {
    /// The `"default"` sentinel on a tenant with no stored default.
    DefaultSentinel,

    /// A free-text roster name still carried by legacy group records.
    LegacyName { name: String },

    /// An identifier nothing in the store knows about.
    Unregistered { identifier: String },
}

///
/// RosterDefinition
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RosterDefinition {
    Real(RosterBody),
    Virtual {
        body: RosterBody,
        origin: VirtualOrigin,
    },
}

impl RosterDefinition {
    /// Build a virtual definition. The id is derived from `origin` alone.
    #[must_use]
    pub fn synthesize(origin: VirtualOrigin, group_refs: GroupRefs) -> Self {
        let (id, name) = match &origin {
            VirtualOrigin::DefaultSentinel => {
                (DEFAULT_ROSTER_ID.to_string(), "Default".to_string())
            }
            VirtualOrigin::LegacyName { name } => (virtual_roster_id(name), name.clone()),
            VirtualOrigin::Unregistered { identifier } => {
                let id = if is_virtual_roster_id(identifier) {
                    identifier.clone()
                } else {
                    virtual_roster_id(identifier)
                };

                (id, identifier.clone())
            }
        };

        Self::Virtual {
            body: RosterBody {
                id,
                name,
                season_id: None,
                settings: RosterSettings {
                    sort_strategy: SortStrategy::Insertion,
                },
                group_refs,
                detached_group_refs: GroupRefs::new(),
                modified_at: 0,
            },
            origin,
        }
    }

    #[must_use]
    pub const fn body(&self) -> &RosterBody {
        match self {
            Self::Real(body) | Self::Virtual { body, .. } => body,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RosterKind {
        match self {
            Self::Real(_) => RosterKind::Real,
            Self::Virtual { .. } => RosterKind::Virtual,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.body().id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.body().name
    }

    #[must_use]
    pub fn season_id(&self) -> Option<&str> {
        self.body().season_id.as_deref()
    }

    #[must_use]
    pub const fn settings(&self) -> RosterSettings {
        self.body().settings
    }

    #[must_use]
    pub const fn group_refs(&self) -> &GroupRefs {
        &self.body().group_refs
    }

    #[must_use]
    pub const fn modified_at(&self) -> u64 {
        self.body().modified_at
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.id() == DEFAULT_ROSTER_ID
    }
}

///
/// PersistedRoster
///
/// On-disk shape of one real roster. `seasonId` is a top-level sibling of
/// `settings`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRoster {
    pub id: String,
    pub kind: RosterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_id: Option<String>,
    pub settings: RosterSettings,
    pub group_refs: GroupRefs,
    #[serde(default, skip_serializing_if = "GroupRefs::is_empty")]
    pub detached_group_refs: GroupRefs,
    pub modified_at: u64,
}

impl From<&RosterBody> for PersistedRoster {
    fn from(body: &RosterBody) -> Self {
        Self {
            id: body.id.clone(),
            kind: RosterKind::Real,
            name: (body.name != body.id).then(|| body.name.clone()),
            season_id: body.season_id.clone(),
            settings: body.settings,
            group_refs: body.group_refs.clone(),
            detached_group_refs: body.detached_group_refs.clone(),
            modified_at: body.modified_at,
        }
    }
}

/// Canonical comparison form of a free-text roster name.
#[must_use]
pub fn normalize_roster_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Deterministic virtual id for one free-text name. Names that differ only
/// in case or surrounding whitespace share an id.
#[must_use]
pub fn virtual_roster_id(name: &str) -> String {
    let digest = Sha256::digest(normalize_roster_name(name).as_bytes());

    let mut out = String::with_capacity(VIRTUAL_ID_PREFIX.len() + VIRTUAL_ID_HEX_LEN);
    out.push_str(VIRTUAL_ID_PREFIX);
    for byte in &digest[..VIRTUAL_ID_HEX_LEN / 2] {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
    }

    out
}

/// Whether `id` already has the synthesized virtual-id shape.
#[must_use]
pub fn is_virtual_roster_id(id: &str) -> bool {
    id.strip_prefix(VIRTUAL_ID_PREFIX).is_some_and(|hex| {
        hex.len() == VIRTUAL_ID_HEX_LEN
            && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    })
}

/// Generated real roster id: `roster_<unix-millis>_<kind>`.
#[must_use]
pub fn generated_roster_id(now_millis: u64, kind_label: &str) -> String {
    format!("{GENERATED_ID_PREFIX}_{now_millis}_{kind_label}")
}
