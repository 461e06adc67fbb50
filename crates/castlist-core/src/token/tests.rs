use super::*;
use proptest::prelude::*;

fn state(action: &str, group: u32, page: u32, roster: &str, mode: DisplayMode) -> NavigationToken {
    NavigationToken::new(action, group, page, roster, mode)
}

#[test]
fn decode_legacy_name_token() {
    let decoded =
        NavigationToken::decode("next_page_0_0_legacyName_view").expect("token should decode");

    assert_eq!(
        decoded,
        state("next_page", 0, 0, "legacyName", DisplayMode::View)
    );
}

#[test]
fn decode_generated_id_with_embedded_separators() {
    let decoded = NavigationToken::decode("next_page_0_0_roster_1700000000000_custom_edit")
        .expect("token should decode");

    assert_eq!(decoded.action, "next_page");
    assert_eq!(decoded.group_index, 0);
    assert_eq!(decoded.page_index, 0);
    assert_eq!(decoded.roster_id, "roster_1700000000000_custom");
    assert_eq!(decoded.display_mode, DisplayMode::Edit);
}

#[test]
fn roster_id_with_integer_segments_is_not_mistaken_for_indices() {
    let original = state("show", 3, 7, "a_1_2_b", DisplayMode::View);
    let encoded = original.encode().expect("token should encode");
    assert_eq!(encoded, "show_3_7_a_1_2_b_view");

    let decoded = NavigationToken::decode(&encoded).expect("token should decode");
    assert_eq!(decoded, original);
}

#[test]
fn roster_id_ending_in_a_display_mode_word_round_trips() {
    let original = state("prev_page", 1, 2, "season_edit", DisplayMode::View);
    let encoded = original.encode().expect("token should encode");

    let decoded = NavigationToken::decode(&encoded).expect("token should decode");
    assert_eq!(decoded.roster_id, "season_edit");
    assert_eq!(decoded.display_mode, DisplayMode::View);
}

#[test]
fn action_that_looks_like_a_display_mode_round_trips() {
    let original = state("view_edit", 0, 1, "default", DisplayMode::Edit);
    let decoded = NavigationToken::decode(&original.encode().expect("token should encode"))
        .expect("token should decode");

    assert_eq!(decoded, original);
}

#[test]
fn decode_rejects_empty_token() {
    assert_eq!(NavigationToken::decode(""), Err(MalformedToken::Empty));
}

#[test]
fn decode_rejects_non_integer_indices() {
    let err = NavigationToken::decode("next_page_x_0_legacyName_view")
        .expect_err("non-integer group index should be rejected");
    assert_eq!(err, MalformedToken::MissingIndexPair);

    let err = NavigationToken::decode("next_page_0_-1_legacyName_view")
        .expect_err("negative page index should be rejected");
    assert_eq!(err, MalformedToken::MissingIndexPair);
}

#[test]
fn decode_rejects_overflowing_indices() {
    let err = NavigationToken::decode("next_page_99999999999_0_legacyName_view")
        .expect_err("overflowing group index should be rejected");

    assert_eq!(
        err,
        MalformedToken::IndexOverflow {
            field: "group",
            raw: "99999999999".to_string(),
        }
    );
}

#[test]
fn decode_rejects_empty_roster_id() {
    let err =
        NavigationToken::decode("next_page_0_0__view").expect_err("empty roster should fail");
    assert_eq!(err, MalformedToken::EmptyRosterId);
}

#[test]
fn decode_rejects_empty_action() {
    let err = NavigationToken::decode("_0_0_roster_view").expect_err("empty action should fail");
    assert_eq!(err, MalformedToken::EmptyAction);
}

#[test]
fn decode_rejects_unknown_display_mode() {
    let err = NavigationToken::decode("next_page_0_0_legacyName_show")
        .expect_err("unknown display mode should fail");

    assert_eq!(
        err,
        MalformedToken::UnknownDisplayMode {
            mode: "show".to_string(),
        }
    );
}

#[test]
fn decode_rejects_token_without_separators() {
    let err = NavigationToken::decode("view").expect_err("bare mode should fail");
    assert_eq!(err, MalformedToken::MissingDisplayMode);
}

#[test]
fn decode_enforces_max_length() {
    let roster = "r".repeat(MAX_TOKEN_CHARS);
    let token = format!("show_0_0_{roster}_view");

    let err = NavigationToken::decode(&token).expect_err("oversized token should fail");
    assert_eq!(
        err,
        MalformedToken::TooLong {
            len: token.chars().count(),
            max: MAX_TOKEN_CHARS,
        }
    );
}

#[test]
fn length_limit_counts_characters_not_bytes() {
    // 4-byte emoji: 80 chars fits, 320 bytes would not.
    let roster = "🏆".repeat(80);
    let original = state("show", 0, 0, &roster, DisplayMode::View);

    let encoded = original.encode().expect("80-char roster should fit");
    assert_eq!(NavigationToken::decode(&encoded), Ok(original));
}

#[test]
fn encode_rejects_numeric_action_segments() {
    let err = state("page_2_next", 0, 0, "default", DisplayMode::View)
        .encode()
        .expect_err("numeric action segment should be rejected");

    assert_eq!(
        err,
        TokenEncodeError::NumericActionSegment {
            segment: "2".to_string(),
        }
    );
}

#[test]
fn encode_rejects_empty_fields() {
    assert_eq!(
        state("", 0, 0, "default", DisplayMode::View).encode(),
        Err(TokenEncodeError::EmptyAction)
    );
    assert_eq!(
        state("show", 0, 0, "", DisplayMode::View).encode(),
        Err(TokenEncodeError::EmptyRosterId)
    );
}

#[test]
fn encode_or_shorten_falls_back_to_short_action_without_touching_roster_id() {
    let roster = format!("roster_1700000000000_{}", "x".repeat(60));
    let original = state(
        "castlist_navigate_next_page_long",
        12,
        4,
        &roster,
        DisplayMode::View,
    );

    assert!(matches!(
        original.encode(),
        Err(TokenEncodeError::TooLong { .. })
    ));

    let encoded = encode_or_shorten(&original, "n", MAX_TOKEN_CHARS).expect("short action fits");
    let decoded = NavigationToken::decode(&encoded).expect("token should decode");

    assert_eq!(decoded.action, "n");
    assert_eq!(decoded.roster_id, roster);
    assert_eq!((decoded.group_index, decoded.page_index), (12, 4));
}

#[test]
fn encode_or_shorten_still_rejects_when_roster_id_alone_is_too_long() {
    let roster = "r".repeat(MAX_TOKEN_CHARS);
    let err = encode_or_shorten(
        &state("show", 0, 0, &roster, DisplayMode::View),
        "s",
        MAX_TOKEN_CHARS,
    )
    .expect_err("roster id must never be truncated");

    assert!(matches!(err, TokenEncodeError::TooLong { .. }));
}

///
/// PROPERTIES
///

fn arb_action() -> impl Strategy<Value = String> {
    // Segments always contain at least one non-digit.
    prop::collection::vec("[a-z][a-z0-9]{0,6}", 1..4).prop_map(|parts| parts.join("_"))
}

fn arb_roster_id() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9 _-]{1,30}",
        (1_600_000_000_000u64..1_800_000_000_000u64, "[a-z]{1,8}")
            .prop_map(|(ts, kind)| format!("roster_{ts}_{kind}")),
        Just("default".to_string()),
        Just("_".to_string()),
    ]
}

fn arb_mode() -> impl Strategy<Value = DisplayMode> {
    prop_oneof![Just(DisplayMode::View), Just(DisplayMode::Edit)]
}

proptest! {
    #[test]
    fn encode_decode_round_trips(
        action in arb_action(),
        group in 0u32..10_000,
        page in 0u32..10_000,
        roster in arb_roster_id(),
        mode in arb_mode(),
    ) {
        let original = state(&action, group, page, &roster, mode);
        let encoded = original.encode().expect("generated state fits the limit");

        prop_assert!(encoded.chars().count() <= MAX_TOKEN_CHARS);
        prop_assert_eq!(NavigationToken::decode(&encoded), Ok(original));
    }

    #[test]
    fn decode_never_panics(raw in "\\PC{0,120}") {
        let _ = NavigationToken::decode(&raw);
    }
}
