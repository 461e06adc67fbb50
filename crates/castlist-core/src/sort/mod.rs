//! Module: sort
//! Responsibility: deterministic member ordering for every `SortStrategy`.
//! Does not own: fetching members, pagination, or strategy persistence.
//! Boundary: pure functions over already-enriched member lists.
//!
//! Tie-break chain for every strategy except `insertion`:
//! primary key, then position of the member's group in `tie_break_groups`
//! (unknown and ungrouped last), then original position.

mod category;


pub use category::{TagCategory, TagKey, sort_tags};

use crate::model::{GroupRef, RosterMember, SortStrategy};
use category::{compare_optional_keys, label_number};
use std::cmp::Ordering;

///
/// MemberSortKey
///
/// Primary ordering key computed once per member before sorting.
///

#[derive(Debug)]
enum MemberSortKey {
    Placement(Option<u32>),
    Tagged {
        tag: Option<TagKey>,
        secondary: Secondary,
    },
}

///
/// Secondary
/// In-bucket key that distinguishes the tag strategies.
///

#[derive(Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Secondary {
    None,
    Name(String),
    Number(Option<u64>, String),
}

impl MemberSortKey {
    fn build(member: &RosterMember, strategy: SortStrategy) -> Self {
        let tagged = |secondary| Self::Tagged {
            tag: member.category_label().and_then(TagKey::classify),
            secondary,
        };

        match strategy {
            SortStrategy::Placements => Self::Placement(member.placement_rank),
            SortStrategy::Alphabetical => {
                tagged(Secondary::Name(member.display_name.to_lowercase()))
            }
            SortStrategy::Numeric => tagged(Secondary::Number(
                label_number(&member.display_name),
                member.display_name.to_lowercase(),
            )),
            SortStrategy::VanityGroup | SortStrategy::Insertion => tagged(Secondary::None),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Placement(left), Self::Placement(right)) => compare_ranks(*left, *right),
            (
                Self::Tagged {
                    tag: left_tag,
                    secondary: left_secondary,
                },
                Self::Tagged {
                    tag: right_tag,
                    secondary: right_secondary,
                },
            ) => compare_optional_keys(left_tag.as_ref(), right_tag.as_ref())
                .then_with(|| left_secondary.cmp(right_secondary)),
            // One strategy per pass; mixed keys never meet.
            _ => Ordering::Equal,
        }
    }
}

// Ranked ascending, unranked after every ranked member. Numbers sort with
// `None` after `Some`, unlike the derived `Option` order.
fn compare_ranks(left: Option<u32>, right: Option<u32>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn group_position(member: &RosterMember, tie_break_groups: &[GroupRef]) -> usize {
    member
        .group_membership
        .as_ref()
        .and_then(|group| tie_break_groups.iter().position(|g| g == group))
        .unwrap_or(usize::MAX)
}

/// Order `members` by `strategy`. `insertion` returns the input unchanged.
#[must_use]
pub fn sort_members(
    members: Vec<RosterMember>,
    strategy: SortStrategy,
    tie_break_groups: &[GroupRef],
) -> Vec<RosterMember> {
    if strategy == SortStrategy::Insertion {
        return members;
    }

    let mut keyed: Vec<(MemberSortKey, usize, RosterMember)> = members
        .into_iter()
        .map(|member| {
            (
                MemberSortKey::build(&member, strategy),
                group_position(&member, tie_break_groups),
                member,
            )
        })
        .collect();

    // Stable sort: original position is the final tie-break.
    keyed.sort_by(|(left_key, left_group, _), (right_key, right_group, _)| {
        left_key
            .compare(right_key)
            .then(left_group.cmp(right_group))
    });

    keyed.into_iter().map(|(_, _, member)| member).collect()
}

/// Sort members, then order each member's own tags for display.
#[must_use]
pub fn sort_for_display(
    members: Vec<RosterMember>,
    strategy: SortStrategy,
    tie_break_groups: &[GroupRef],
) -> Vec<RosterMember> {
    let mut sorted = sort_members(members, strategy, tie_break_groups);
    for member in &mut sorted {
        member.vanity_tags = sort_tags(&member.vanity_tags);
    }

    sorted
}
