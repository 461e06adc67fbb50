use std::cmp::Ordering;

///
/// TagCategory
///
/// Fixed four-tier classification of one display label. Variant order is
/// the bucket order; symbol-led labels always sort last regardless of code
/// point.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum TagCategory {
    Season,
    Alpha,
    Numeric,
    Symbol,
}

///
/// TagKey
///
/// Comparable key for one label: category first, then the in-bucket rule.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagKey {
    category: TagCategory,
    ordinal: u64,
    folded: String,
    raw: String,
}

impl TagKey {
    /// Classify one label. Blank labels have no key.
    #[must_use]
    pub fn classify(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        let first = trimmed.chars().next()?;

        let (category, ordinal) = if let Some(season) = season_ordinal(trimmed) {
            (TagCategory::Season, season)
        } else if first.is_alphabetic() {
            (TagCategory::Alpha, 0)
        } else if first.is_ascii_digit() {
            (TagCategory::Numeric, leading_integer(trimmed))
        } else {
            (TagCategory::Symbol, 0)
        };

        Some(Self {
            category,
            ordinal,
            folded: trimmed.to_lowercase(),
            raw: trimmed.to_string(),
        })
    }

    #[must_use]
    pub const fn category(&self) -> TagCategory {
        self.category
    }

    #[must_use]
    pub const fn ordinal(&self) -> u64 {
        self.ordinal
    }
}

impl Ord for TagKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category.cmp(&other.category).then_with(|| {
            match self.category {
                TagCategory::Season | TagCategory::Numeric => self
                    .ordinal
                    .cmp(&other.ordinal)
                    .then_with(|| self.folded.cmp(&other.folded)),
                TagCategory::Alpha => self.folded.cmp(&other.folded),
                TagCategory::Symbol => self.raw.cmp(&other.raw),
            }
            .then_with(|| self.raw.cmp(&other.raw))
        })
    }
}

impl PartialOrd for TagKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Order one member's own tag list for presentation. Blank tags go last,
/// in their original order.
#[must_use]
pub fn sort_tags(tags: &[String]) -> Vec<String> {
    let mut keyed: Vec<(Option<TagKey>, usize, &String)> = tags
        .iter()
        .enumerate()
        .map(|(position, tag)| (TagKey::classify(tag), position, tag))
        .collect();

    keyed.sort_by(|(left, left_pos, _), (right, right_pos, _)| {
        compare_optional_keys(left.as_ref(), right.as_ref()).then(left_pos.cmp(right_pos))
    });

    keyed.into_iter().map(|(_, _, tag)| tag.clone()).collect()
}

// Present keys sort before absent ones.
pub(super) fn compare_optional_keys(left: Option<&TagKey>, right: Option<&TagKey>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// `S2`, `s 12 - Finals`, `Season 3`: an `s`/`season` prefix, optional
// spaces, digits, then end of label or a non-alphanumeric boundary.
fn season_ordinal(label: &str) -> Option<u64> {
    let lower = label.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("season")
        .or_else(|| lower.strip_prefix('s'))?;
    let rest = rest.trim_start_matches(' ');

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let boundary_ok = rest[digits_len..]
        .chars()
        .next()
        .is_none_or(|next| !next.is_alphanumeric());
    if !boundary_ok {
        return None;
    }

    Some(saturating_digits(&rest[..digits_len]))
}

fn leading_integer(label: &str) -> u64 {
    let digits_len = label.bytes().take_while(u8::is_ascii_digit).count();

    saturating_digits(&label[..digits_len])
}

fn saturating_digits(digits: &str) -> u64 {
    digits.bytes().fold(0u64, |acc, digit| {
        acc.saturating_mul(10)
            .saturating_add(u64::from(digit - b'0'))
    })
}

/// Leading integer of an arbitrary label, if it starts with a digit.
pub(super) fn label_number(label: &str) -> Option<u64> {
    let trimmed = label.trim();
    trimmed
        .starts_with(|c: char| c.is_ascii_digit())
        .then(|| leading_integer(trimmed))
}
