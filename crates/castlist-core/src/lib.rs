//! Core runtime for castlist: roster model, legacy-aware store adapter,
//! identifier resolution, sorting, the navigation token codec, pagination,
//! and the two-tier data access layer.

// public exports are one module level down
pub mod access;
pub mod config;
pub mod error;
pub mod model;
pub mod page;
pub mod resolve;
pub mod sort;
pub mod store;
pub mod token;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Hard cap on one encoded navigation token, in characters. The host
/// platform rejects longer control identifiers.
pub const MAX_TOKEN_CHARS: usize = 100;

/// Sentinel id of a tenant's designated default roster.
pub const DEFAULT_ROSTER_ID: &str = "default";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, caches, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        model::{
            GroupRef, GroupRefs, RosterDefinition, RosterKind, RosterMember, RosterSettings,
            SortStrategy, TenantId,
        },
        token::{DisplayMode, NavigationToken},
    };
}
