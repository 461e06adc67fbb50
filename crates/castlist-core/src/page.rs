//! Pagination over a sorted, enriched roster, and the navigation controls
//! that move between pages.
//!
//! Buttons carry the cursor they were rendered on plus an action; the
//! next request applies the action to that cursor. Cursors past the end
//! clamp to the last valid page.

use crate::{
    MAX_TOKEN_CHARS,
    access::EnrichedRoster,
    model::{GroupRef, RosterMember},
    sort::sort_for_display,
    token::{
        ACTION_EDIT_MODE, ACTION_EDIT_MODE_SHORT, ACTION_NEXT_PAGE, ACTION_NEXT_PAGE_SHORT,
        ACTION_PREV_PAGE, ACTION_PREV_PAGE_SHORT, ACTION_SHOW, DisplayMode, NavigationToken,
        TokenEncodeError, encode_or_shorten,
    },
};

/// Label of the trailing bucket for members left without a roster group.
pub const UNGROUPED_LABEL: &str = "Ungrouped";

///
/// Cursor
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Cursor {
    pub group_index: u32,
    pub page_index: u32,
}

impl Cursor {
    #[must_use]
    pub const fn new(group_index: u32, page_index: u32) -> Self {
        Self {
            group_index,
            page_index,
        }
    }
}

///
/// PageGroup
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageGroup {
    /// `None` for the ungrouped bucket.
    pub group_ref: Option<GroupRef>,
    pub label: String,
    pub members: Vec<RosterMember>,
}

///
/// PageView
///
/// One rendered page. `page_number` is 1-based for display.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageView<'a> {
    pub cursor: Cursor,
    pub group_label: &'a str,
    pub members: &'a [RosterMember],
    pub page_number: usize,
    pub page_count: usize,
    pub group_count: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

///
/// PageControls
///
/// Encoded tokens for the buttons of one rendered page.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageControls {
    pub previous: Option<String>,
    pub next: Option<String>,
    pub toggle_mode: String,
}

///
/// RosterPager
///

#[derive(Clone, Debug)]
pub struct RosterPager {
    roster_id: String,
    display_mode: DisplayMode,
    page_size: usize,
    max_token_chars: usize,
    groups: Vec<PageGroup>,
}

impl RosterPager {
    /// Sort every group by the roster's strategy and lay it out in pages.
    /// A zero page size is treated as one.
    #[must_use]
    pub fn new(roster: EnrichedRoster, page_size: usize, display_mode: DisplayMode) -> Self {
        let strategy = roster.definition.settings().sort_strategy;
        let tie_break = roster.tie_break_groups();
        let roster_id = roster.definition.id().to_string();

        let mut groups: Vec<PageGroup> = roster
            .groups
            .into_iter()
            .map(|group| PageGroup {
                group_ref: Some(group.group_ref),
                label: group.label,
                members: sort_for_display(group.members, strategy, &tie_break),
            })
            .collect();

        if !roster.ungrouped.is_empty() {
            groups.push(PageGroup {
                group_ref: None,
                label: UNGROUPED_LABEL.to_string(),
                members: sort_for_display(roster.ungrouped, strategy, &tie_break),
            });
        }

        Self {
            roster_id,
            display_mode,
            page_size: page_size.max(1),
            max_token_chars: MAX_TOKEN_CHARS,
            groups,
        }
    }

    #[must_use]
    pub const fn with_token_limit(mut self, max_token_chars: usize) -> Self {
        self.max_token_chars = max_token_chars;
        self
    }

    #[must_use]
    pub fn roster_id(&self) -> &str {
        &self.roster_id
    }

    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    #[must_use]
    pub fn groups(&self) -> &[PageGroup] {
        &self.groups
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Pages in one group; an empty group still renders one page.
    #[must_use]
    pub fn page_count(&self, group_index: usize) -> usize {
        self.groups
            .get(group_index)
            .map_or(1, |group| group.members.len().div_ceil(self.page_size).max(1))
    }

    /// Clamp an arbitrary cursor onto a page that exists.
    #[must_use]
    pub fn clamp(&self, cursor: Cursor) -> Cursor {
        if self.groups.is_empty() {
            return Cursor::default();
        }

        let last_group = self.groups.len() - 1;
        let group = (cursor.group_index as usize).min(last_group);
        let last_page = self.page_count(group) - 1;
        let page = (cursor.page_index as usize).min(last_page);

        cursor_at(group, page)
    }

    /// Following page, rolling into the next group.
    #[must_use]
    pub fn next(&self, cursor: Cursor) -> Option<Cursor> {
        let cursor = self.clamp(cursor);
        let group = cursor.group_index as usize;
        let page = cursor.page_index as usize;

        if page + 1 < self.page_count(group) {
            Some(cursor_at(group, page + 1))
        } else if group + 1 < self.groups.len() {
            Some(cursor_at(group + 1, 0))
        } else {
            None
        }
    }

    /// Preceding page, rolling back to the last page of the previous group.
    #[must_use]
    pub fn previous(&self, cursor: Cursor) -> Option<Cursor> {
        let cursor = self.clamp(cursor);
        let group = cursor.group_index as usize;
        let page = cursor.page_index as usize;

        if page > 0 {
            Some(cursor_at(group, page - 1))
        } else if group > 0 {
            Some(cursor_at(group - 1, self.page_count(group - 1) - 1))
        } else {
            None
        }
    }

    /// Apply a decoded token's action to the cursor it carries.
    #[must_use]
    pub fn navigate(&self, token: &NavigationToken) -> Cursor {
        let from = Cursor::new(token.group_index, token.page_index);

        match token.action.as_str() {
            ACTION_NEXT_PAGE | ACTION_NEXT_PAGE_SHORT => {
                self.next(from).unwrap_or_else(|| self.clamp(from))
            }
            ACTION_PREV_PAGE | ACTION_PREV_PAGE_SHORT => {
                self.previous(from).unwrap_or_else(|| self.clamp(from))
            }
            ACTION_SHOW | ACTION_EDIT_MODE | ACTION_EDIT_MODE_SHORT => self.clamp(from),
            other => {
                tracing::debug!(action = other, "unknown navigation action, showing page");
                self.clamp(from)
            }
        }
    }

    #[must_use]
    pub fn page(&self, cursor: Cursor) -> PageView<'_> {
        let cursor = self.clamp(cursor);
        let group_index = cursor.group_index as usize;
        let page_index = cursor.page_index as usize;

        let (group_label, members) = self.groups.get(group_index).map_or(("", &[][..]), |group| {
            let start = (page_index * self.page_size).min(group.members.len());
            let end = (start + self.page_size).min(group.members.len());

            (group.label.as_str(), &group.members[start..end])
        });

        PageView {
            cursor,
            group_label,
            members,
            page_number: page_index + 1,
            page_count: self.page_count(group_index),
            group_count: self.groups.len(),
            has_previous: self.previous(cursor).is_some(),
            has_next: self.next(cursor).is_some(),
        }
    }

    /// Tokens for the buttons of the page at `cursor`. Buttons carry the
    /// rendered cursor; the action is applied on the next request.
    pub fn controls(&self, cursor: Cursor) -> Result<PageControls, TokenEncodeError> {
        let cursor = self.clamp(cursor);
        let at = |action: &str, mode: DisplayMode| {
            NavigationToken::new(
                action,
                cursor.group_index,
                cursor.page_index,
                self.roster_id.as_str(),
                mode,
            )
        };

        let previous = match self.previous(cursor) {
            Some(_) => Some(encode_or_shorten(
                &at(ACTION_PREV_PAGE, self.display_mode),
                ACTION_PREV_PAGE_SHORT,
                self.max_token_chars,
            )?),
            None => None,
        };
        let next = match self.next(cursor) {
            Some(_) => Some(encode_or_shorten(
                &at(ACTION_NEXT_PAGE, self.display_mode),
                ACTION_NEXT_PAGE_SHORT,
                self.max_token_chars,
            )?),
            None => None,
        };
        let toggle_mode = encode_or_shorten(
            &at(ACTION_EDIT_MODE, self.display_mode.toggled()),
            ACTION_EDIT_MODE_SHORT,
            self.max_token_chars,
        )?;

        Ok(PageControls {
            previous,
            next,
            toggle_mode,
        })
    }
}

fn cursor_at(group: usize, page: usize) -> Cursor {
    Cursor::new(
        u32::try_from(group).unwrap_or(u32::MAX),
        u32::try_from(page).unwrap_or(u32::MAX),
    )
}

///
/// TESTS
///
