use crate::model::GroupRef;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error as ThisError;

///
/// PlatformError
///
/// Failure of one external membership call. Always contained inside the
/// data access layer.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PlatformError {
    #[error("platform unavailable: {message}")]
    Unavailable { message: String },

    #[error("platform fetch timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

///
/// PlatformMember
///
/// One member as the host platform reports it.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMember {
    pub external_id: String,
    pub display_name: String,

    /// Every group the member holds on the platform, in platform order.
    #[serde(default)]
    pub group_refs: Vec<GroupRef>,

    /// Secondary free-text labels, in platform order.
    #[serde(default)]
    pub vanity_tags: Vec<String>,
}

impl PlatformMember {
    #[must_use]
    pub fn new(external_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            display_name: display_name.into(),
            group_refs: Vec::new(),
            vanity_tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn holding<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = GroupRef>,
    {
        self.group_refs = groups.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vanity_tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

///
/// GroupDescriptor
///
/// Cheap, locally known group metadata.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupDescriptor {
    pub label: String,

    /// Total membership as the platform last reported it, if known.
    pub member_count: Option<usize>,
}

///
/// PlatformClient
///
/// External collaborator that knows group metadata and can fetch full
/// membership lists. Fetches may be slow; the caller time-boxes them.
///

pub trait PlatformClient: Send + Sync {
    /// Locally known metadata. Never performs I/O.
    fn group_descriptor(&self, group: &GroupRef) -> Option<GroupDescriptor>;

    /// Fetch every member of `group`.
    fn fetch_group_members(
        &self,
        group: &GroupRef,
    ) -> impl Future<Output = Result<Vec<PlatformMember>, PlatformError>> + Send;
}
