use crate::model::GroupRef;
use serde::{Deserialize, Serialize};

///
/// RosterMember
///
/// Ephemeral member row built at enrichment time; never persisted.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    pub external_id: String,
    pub display_name: String,

    /// Roster group this member is listed under; `None` means ungrouped.
    pub group_membership: Option<GroupRef>,

    /// Display label of `group_membership`, used when no vanity tag exists.
    #[serde(default)]
    pub group_label: Option<String>,

    /// Every roster group the member holds, in roster order.
    #[serde(default)]
    pub held_groups: Vec<GroupRef>,

    #[serde(default)]
    pub placement_rank: Option<u32>,

    #[serde(default)]
    pub vanity_tags: Vec<String>,
}

impl RosterMember {
    #[must_use]
    pub fn new(external_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            display_name: display_name.into(),
            group_membership: None,
            group_label: None,
            held_groups: Vec::new(),
            placement_rank: None,
            vanity_tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: GroupRef, label: impl Into<String>) -> Self {
        if !self.held_groups.contains(&group) {
            self.held_groups.push(group.clone());
        }
        self.group_membership = Some(group);
        self.group_label = Some(label.into());
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

    #[must_use]
    pub const fn with_rank(mut self, rank: u32) -> Self {
        self.placement_rank = Some(rank);
        self
    }

    /// Label used to place this member in a sort bucket: the first
    /// non-blank vanity tag, else the group label.
    #[must_use]
    pub fn category_label(&self) -> Option<&str> {
        self.vanity_tags
            .iter()
            .map(String::as_str)
            .find(|tag| !tag.trim().is_empty())
            .or_else(|| {
                self.group_label
                    .as_deref()
                    .filter(|label| !label.trim().is_empty())
            })
    }

    /// Move this member off `removed`. Returns `false` when no other held
    /// group remains and the member is now ungrouped. The caller refreshes
    /// `group_label` for the new group.
    pub fn detach_group(&mut self, removed: &GroupRef, remaining: &[GroupRef]) -> bool {
        self.held_groups.retain(|group| group != removed);

        if self.group_membership.as_ref() != Some(removed) {
            return self.group_membership.is_some();
        }

        let fallback = remaining
            .iter()
            .find(|group| self.held_groups.contains(group))
            .cloned();

        let regrouped = fallback.is_some();
        self.group_membership = fallback;
        self.group_label = None;

        regrouped
    }
}
