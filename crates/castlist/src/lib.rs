//! ## Crate layout
//! - `core`: roster model, store adapter, resolver, sort engine, token codec,
//!   pagination, and the data access layer.
//! - `error`: the public error taxonomy.
//!
//! `Castlist` is the session handle most callers need; the `prelude`
//! mirrors the vocabulary used around it.

pub use castlist_core as core;

pub mod error;
mod session;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::Error;
pub use session::{Castlist, RenderedPage};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{Castlist, Error, RenderedPage};
    pub use castlist_core::{
        access::{PlatformClient, PlatformMember},
        prelude::*,
    };
}
