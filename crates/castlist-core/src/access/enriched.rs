use crate::{
    access::CacheFreshness,
    model::{GroupRef, RosterDefinition, RosterMember, RosterSettings},
};
use derive_more::{Deref, IntoIterator};

///
/// EnrichedGroup
///
/// One roster group with live members and the roster settings attached.
/// Members are in platform order; sorting is the caller's job.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnrichedGroup {
    pub group_ref: GroupRef,
    pub label: String,
    pub members: Vec<RosterMember>,
    pub settings: RosterSettings,

    /// Copied from the roster's top-level `seasonId`.
    pub season_id: Option<String>,
    pub freshness: CacheFreshness,
}

///
/// EnrichedRoster
///
/// Resolved definition plus its enriched groups in `groupRefs` order.
/// Members left without any roster group collect in `ungrouped`.
///

#[derive(Clone, Debug, Deref, Eq, IntoIterator, PartialEq)]
pub struct EnrichedRoster {
    pub definition: RosterDefinition,

    #[deref]
    #[into_iterator(owned, ref)]
    pub groups: Vec<EnrichedGroup>,

    pub ungrouped: Vec<RosterMember>,
}

impl EnrichedRoster {
    #[must_use]
    pub const fn new(definition: RosterDefinition, groups: Vec<EnrichedGroup>) -> Self {
        Self {
            definition,
            groups,
            ungrouped: Vec::new(),
        }
    }

    /// Group refs in display order, used as the sort tie-break.
    #[must_use]
    pub fn tie_break_groups(&self) -> Vec<GroupRef> {
        self.groups.iter().map(|g| g.group_ref.clone()).collect()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum::<usize>() + self.ungrouped.len()
    }

    /// Drop `removed` from the roster. Its members move to the first other
    /// roster group they hold, else to `ungrouped`. Returns `false` when the
    /// group was not part of the roster.
    pub fn detach_group(&mut self, removed: &GroupRef) -> bool {
        let Some(position) = self.groups.iter().position(|g| &g.group_ref == removed) else {
            return false;
        };
        let detached = self.groups.remove(position);
        let remaining = self.tie_break_groups();

        for group in &mut self.groups {
            for member in &mut group.members {
                member.held_groups.retain(|held| held != removed);
            }
        }

        for mut member in detached.members {
            if member.detach_group(removed, &remaining)
                && let Some(target) = self
                    .groups
                    .iter_mut()
                    .find(|g| Some(&g.group_ref) == member.group_membership.as_ref())
            {
                member.group_label = Some(target.label.clone());
                target.members.push(member);
            } else {
                member.group_membership = None;
                self.ungrouped.push(member);
            }
        }

        true
    }
}
