use super::*;
use crate::{
    model::{RosterKind, SortStrategy, VirtualOrigin, virtual_roster_id},
    test_support::{FINALS_ID, FIXTURE_NOW, JURY_ID, empty_store, mixed_shapes, seeded_store, tenant},
};
use serde_json::{Value, json};

fn groups(refs: &GroupRefs) -> Vec<&str> {
    refs.iter().map(GroupRef::as_str).collect()
}

fn stored_record(store: &crate::test_support::TestStore, id: &str) -> Value {
    let bytes = store
        .backend()
        .read(&tenant())
        .expect("backend read")
        .expect("document present");
    let document = decode_document(&bytes).expect("document decodes");

    document.rosters.get(id).cloned().expect("record present")
}

//
// Normalization
//

#[test]
fn modern_record_unions_own_and_linked_groups() {
    let snapshot = seeded_store(&mixed_shapes())
        .load(&tenant())
        .expect("load should succeed");
    let finals = snapshot.find_real(FINALS_ID).expect("finals roster");

    assert_eq!(finals.name, "Season Finals");
    assert_eq!(finals.season_id.as_deref(), Some("season_9"));
    assert_eq!(finals.settings.sort_strategy, SortStrategy::VanityGroup);
    assert_eq!(groups(&finals.group_refs), vec!["g-red", "g-blue"]);
}

#[test]
fn intermediate_record_lifts_nested_season() {
    let snapshot = seeded_store(&mixed_shapes())
        .load(&tenant())
        .expect("load should succeed");
    let jury = snapshot.find_real(JURY_ID).expect("jury roster");

    assert_eq!(jury.season_id.as_deref(), Some("season_8"));
    assert_eq!(jury.settings.sort_strategy, SortStrategy::Placements);
    assert_eq!(groups(&jury.group_refs), vec!["g-jury"]);
    assert_eq!(jury.modified_at, 1_690_000_000_000);
}

#[test]
fn top_level_season_wins_over_nested() {
    let store = seeded_store(&json!({
        "rosters": {
            "r": {
                "seasonId": "season_2",
                "settings": { "seasonId": "season_1" }
            }
        }
    }));

    let snapshot = store.load(&tenant()).expect("load should succeed");

    assert_eq!(
        snapshot.find_real("r").and_then(|r| r.season_id.as_deref()),
        Some("season_2")
    );
}

#[test]
fn missing_sort_strategy_defaults_to_insertion() {
    let snapshot = seeded_store(&mixed_shapes())
        .load(&tenant())
        .expect("load should succeed");
    let bare = snapshot.find_real("bare").expect("bare roster");

    assert_eq!(bare.settings.sort_strategy, SortStrategy::Insertion);
    assert_eq!(bare.name, "bare");
    assert!(bare.group_refs.is_empty());
}

#[test]
fn unreadable_records_are_rejected_without_failing_the_tenant() {
    let snapshot = seeded_store(&mixed_shapes())
        .load(&tenant())
        .expect("load should succeed");

    let rejected: Vec<&str> = snapshot.rejected().iter().map(|r| r.key.as_str()).collect();
    assert_eq!(rejected, vec!["broken", "ghost"]);
    assert!(matches!(
        snapshot.rejected()[0].error,
        RecordError::UnknownSortStrategy { .. }
    ));
    assert!(matches!(
        snapshot.rejected()[1].error,
        RecordError::VirtualPersisted
    ));
    assert!(snapshot.find_real("broken").is_none());
    assert_eq!(snapshot.real_rosters().len(), 3);
}

#[test]
fn id_field_must_match_record_key() {
    let store = seeded_store(&json!({
        "rosters": { "a": { "id": "b" } }
    }));

    let snapshot = store.load(&tenant()).expect("load should succeed");

    assert!(matches!(
        snapshot.rejected()[0].error,
        RecordError::IdMismatch { .. }
    ));
}

#[test]
fn legacy_names_merge_case_insensitively() {
    let snapshot = seeded_store(&mixed_shapes())
        .load(&tenant())
        .expect("load should succeed");

    let legacy = snapshot.legacy_rosters();
    assert_eq!(legacy.len(), 1);
    assert_eq!(legacy[0].name, "Alumni");
    assert_eq!(groups(&legacy[0].group_refs), vec!["g-old", "g-old2"]);

    assert!(snapshot.find_legacy("ALUMNI").is_some());
    assert!(snapshot.find_legacy(&virtual_roster_id("alumni")).is_some());
    assert_eq!(groups(snapshot.default_group_refs()), vec!["g-main"]);
}

#[test]
fn legacy_name_equal_to_real_id_folds_into_that_roster() {
    let store = seeded_store(&json!({
        "rosters": { "Spring": { "name": "Spring" } },
        "groups": { "g-1": { "roster": "spring" } }
    }));

    let snapshot = store.load(&tenant()).expect("load should succeed");

    assert!(snapshot.legacy_rosters().is_empty());
    assert_eq!(
        groups(&snapshot.find_real("Spring").expect("real").group_refs),
        vec!["g-1"]
    );
}

#[test]
fn placements_never_fall_back_to_global_when_season_is_set() {
    let snapshot = seeded_store(&mixed_shapes())
        .load(&tenant())
        .expect("load should succeed");

    assert_eq!(snapshot.placement(Some("season_9"), "u-red-1"), Some(1));
    assert_eq!(snapshot.placement(None, "u-red-1"), Some(40));
    assert_eq!(snapshot.placement(Some("season_8"), "u-red-1"), None);
    assert!(!snapshot.has_placement_namespace(Some("season_8")));
}

#[test]
fn group_labels_come_from_group_records() {
    let snapshot = seeded_store(&mixed_shapes())
        .load(&tenant())
        .expect("load should succeed");

    assert_eq!(snapshot.group_label(&GroupRef::from("g-red")), Some("Red Tribe"));
    assert_eq!(snapshot.group_label(&GroupRef::from("g-none")), None);
}

#[test]
fn tenant_without_document_is_empty() {
    let snapshot = empty_store().load(&tenant()).expect("load should succeed");

    assert!(snapshot.real_rosters().is_empty());
    assert!(snapshot.legacy_rosters().is_empty());
}

#[test]
fn corrupt_and_oversized_documents_are_rejected() {
    let store = empty_store();
    store
        .backend()
        .insert_raw(&tenant(), b"{ not json".to_vec())
        .expect("seed");
    let err = store.load(&tenant()).expect_err("corrupt document");
    assert!(matches!(err, StoreError::Corrupt { .. }));

    let err = decode_document(&vec![b' '; MAX_TENANT_DOCUMENT_BYTES + 1])
        .expect_err("oversized document");
    assert!(matches!(err, StoreError::TooLarge { .. }));
}

//
// Mutations
//

#[test]
fn create_roster_generates_id_from_clock_and_kind() {
    let store = empty_store();
    let mut new = NewRoster::new("Merge Watch", "custom");
    new.season_id = Some("season_3".to_string());

    let created = store
        .create_roster(&tenant(), new)
        .expect("create should succeed");

    assert_eq!(created.id(), format!("roster_{FIXTURE_NOW}_custom"));
    assert_eq!(created.kind(), RosterKind::Real);

    let record = stored_record(&store, created.id());
    assert_eq!(record["seasonId"], "season_3");
    assert_eq!(record["name"], "Merge Watch");
    assert!(record["settings"].get("seasonId").is_none());
}

#[test]
fn create_roster_in_the_same_millisecond_conflicts() {
    let store = empty_store();
    store
        .create_roster(&tenant(), NewRoster::new("One", "custom"))
        .expect("first create");

    let err = store
        .create_roster(&tenant(), NewRoster::new("Two", "custom"))
        .expect_err("same id should conflict");
    assert!(matches!(err, StoreError::Conflict { .. }));

    store.clock().advance(1);
    store
        .create_roster(&tenant(), NewRoster::new("Two", "custom"))
        .expect("next millisecond succeeds");
}

#[test]
fn create_roster_rejects_blank_name_and_bad_kind() {
    let store = empty_store();

    let err = store
        .create_roster(&tenant(), NewRoster::new("  ", "custom"))
        .expect_err("blank name");
    assert!(matches!(err, StoreError::Invalid { .. }));

    let err = store
        .create_roster(&tenant(), NewRoster::new("Name", "two words"))
        .expect_err("bad kind label");
    assert!(matches!(err, StoreError::Invalid { .. }));
}

#[test]
fn set_season_migrates_intermediate_record_to_flat_shape() {
    let store = seeded_store(&mixed_shapes());

    let updated = store
        .set_season(&tenant(), JURY_ID, Some("season_10".to_string()))
        .expect("set season");

    assert_eq!(updated.season_id(), Some("season_10"));
    assert_eq!(updated.modified_at(), FIXTURE_NOW);

    let record = stored_record(&store, JURY_ID);
    assert_eq!(record["seasonId"], "season_10");
    assert_eq!(record["settings"], json!({ "sortStrategy": "placements" }));
    assert_eq!(record["groupRefs"], json!(["g-jury"]));
}

#[test]
fn clearing_season_removes_the_field() {
    let store = seeded_store(&mixed_shapes());

    store
        .set_season(&tenant(), FINALS_ID, None)
        .expect("clear season");

    assert!(stored_record(&store, FINALS_ID).get("seasonId").is_none());
}

#[test]
fn update_settings_keeps_unknown_fields() {
    let store = seeded_store(&mixed_shapes());

    store
        .update_settings(
            &tenant(),
            FINALS_ID,
            RosterSettings {
                sort_strategy: SortStrategy::Alphabetical,
            },
        )
        .expect("update settings");

    let record = stored_record(&store, FINALS_ID);
    assert_eq!(record["settings"]["sortStrategy"], "alphabetical");
    assert_eq!(record["color"], "gold");
}

#[test]
fn mutating_unknown_or_unreadable_roster_fails() {
    let store = seeded_store(&mixed_shapes());

    let err = store
        .add_group_ref(&tenant(), "nope", GroupRef::from("g"))
        .expect_err("unknown id");
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = store
        .add_group_ref(&tenant(), "broken", GroupRef::from("g"))
        .expect_err("unreadable record");
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[test]
fn group_refs_stay_unique_across_add_and_remove() {
    let store = seeded_store(&mixed_shapes());

    store
        .add_group_ref(&tenant(), FINALS_ID, GroupRef::from("g-red"))
        .expect("duplicate add");
    let added = store
        .add_group_ref(&tenant(), FINALS_ID, GroupRef::from("g-green"))
        .expect("add");
    assert_eq!(groups(added.group_refs()), vec!["g-red", "g-blue", "g-green"]);

    let removed = store
        .remove_group_ref(&tenant(), FINALS_ID, &GroupRef::from("g-blue"))
        .expect("remove");
    assert_eq!(groups(removed.group_refs()), vec!["g-red", "g-green"]);

    // The group record link is gone too, so a reload does not re-add it.
    let snapshot = store.load(&tenant()).expect("reload");
    assert_eq!(
        groups(&snapshot.find_real(FINALS_ID).expect("finals").group_refs),
        vec!["g-red", "g-green"]
    );
}

#[test]
fn removed_group_is_kept_detached_until_added_back() {
    let store = seeded_store(&mixed_shapes());

    let removed = store
        .remove_group_ref(&tenant(), FINALS_ID, &GroupRef::from("g-blue"))
        .expect("remove");
    assert_eq!(groups(&removed.body().detached_group_refs), vec!["g-blue"]);

    let again = store
        .remove_group_ref(&tenant(), FINALS_ID, &GroupRef::from("g-blue"))
        .expect("repeat remove");
    assert_eq!(again.body().detached_group_refs, removed.body().detached_group_refs);

    let snapshot = store.load(&tenant()).expect("reload");
    let finals = snapshot.find_real(FINALS_ID).expect("finals");
    assert_eq!(groups(&finals.detached_group_refs), vec!["g-blue"]);
    assert_eq!(
        stored_record(&store, FINALS_ID)["detachedGroupRefs"],
        json!(["g-blue"])
    );

    let restored = store
        .add_group_ref(&tenant(), FINALS_ID, GroupRef::from("g-blue"))
        .expect("add back");
    assert_eq!(groups(restored.group_refs()), vec!["g-red", "g-blue"]);
    assert!(restored.body().detached_group_refs.is_empty());

    assert!(stored_record(&store, FINALS_ID).get("detachedGroupRefs").is_none());
}

#[test]
fn materialize_keeps_the_virtual_id_and_migrates_legacy_links() {
    let store = seeded_store(&mixed_shapes());
    let snapshot = store.load(&tenant()).expect("load");
    let alumni = &snapshot.legacy_rosters()[0];
    let virtual_def = RosterDefinition::synthesize(
        VirtualOrigin::LegacyName {
            name: alumni.name.clone(),
        },
        alumni.group_refs.clone(),
    );

    let real = store
        .materialize(&tenant(), &virtual_def)
        .expect("materialize");

    assert_eq!(real.id(), virtual_def.id());
    assert_eq!(real.kind(), RosterKind::Real);

    let reloaded = store.load(&tenant()).expect("reload");
    assert!(reloaded.legacy_rosters().is_empty());
    assert_eq!(
        groups(&reloaded.find_real(virtual_def.id()).expect("real").group_refs),
        vec!["g-old", "g-old2"]
    );

    let err = store
        .materialize(&tenant(), &virtual_def)
        .expect_err("second materialize conflicts");
    assert!(matches!(err, StoreError::Conflict { .. }));
    let err = store
        .materialize(&tenant(), &real)
        .expect_err("real definitions cannot be materialized");
    assert!(matches!(err, StoreError::Conflict { .. }));
}

#[test]
fn set_placement_writes_and_clears_namespaced_ranks() {
    let store = empty_store();

    store
        .set_placement(&tenant(), Some("season_1"), "u1", Some(3))
        .expect("set");
    store
        .set_placement(&tenant(), None, "u1", Some(9))
        .expect("set global");
    let snapshot = store.load(&tenant()).expect("load");
    assert_eq!(snapshot.placement(Some("season_1"), "u1"), Some(3));
    assert_eq!(snapshot.placement(None, "u1"), Some(9));

    store
        .set_placement(&tenant(), Some("season_1"), "u1", None)
        .expect("clear");
    let snapshot = store.load(&tenant()).expect("reload");
    assert!(!snapshot.has_placement_namespace(Some("season_1")));
}

//
// Backends
//

#[test]
fn file_backend_round_trips_and_treats_missing_file_as_empty() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = RosterStore::with_clock(FileBackend::new(dir.path()), ManualClock::new(5));

    assert!(store.load(&tenant()).expect("empty").real_rosters().is_empty());

    let created = store
        .create_roster(&tenant(), NewRoster::new("Cast", "custom"))
        .expect("create");

    assert!(dir.path().join("guild-1.json").exists());
    let snapshot = store.load(&tenant()).expect("reload");
    assert_eq!(
        snapshot.find_real(created.id()).map(|r| r.name.as_str()),
        Some("Cast")
    );
}

#[test]
fn file_backend_rejects_path_like_tenants() {
    let dir = tempfile::tempdir().expect("temp dir");
    let backend = FileBackend::new(dir.path());

    let err = backend
        .read(&TenantId::from("../escape"))
        .expect_err("path-like tenant");
    assert!(matches!(err, StoreError::Invalid { .. }));
}
