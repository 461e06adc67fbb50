//! Shared fixtures for unit tests.

use crate::{
    model::TenantId,
    store::{ManualClock, MemoryBackend, RosterStore},
};
use serde_json::{Value, json};

pub(crate) const FIXTURE_NOW: u64 = 1_700_000_100_000;
pub(crate) const FINALS_ID: &str = "roster_1700000000000_custom";
pub(crate) const JURY_ID: &str = "roster_1690000000000_custom";

pub(crate) type TestStore = RosterStore<MemoryBackend, ManualClock>;

pub(crate) fn tenant() -> TenantId {
    TenantId::from("guild-1")
}

pub(crate) fn empty_store() -> TestStore {
    RosterStore::with_clock(MemoryBackend::new(), ManualClock::new(FIXTURE_NOW))
}

pub(crate) fn seeded_store(document: &Value) -> TestStore {
    let store = empty_store();
    let bytes = serde_json::to_vec(document).expect("fixture should encode");
    store
        .backend()
        .insert_raw(&tenant(), bytes)
        .expect("fixture should seed");

    store
}

/// One tenant carrying every stored shape at once:
/// - modern `FINALS_ID` linked by `rosterIds` plus its own `groupRefs`
/// - intermediate `JURY_ID` with a nested season, linked by `rosterId`
/// - `bare`, a record with no settings at all
/// - legacy `Alumni` under two spellings, and a legacy `default`
/// - two unreadable records
pub(crate) fn mixed_shapes() -> Value {
    json!({
        "rosters": {
            FINALS_ID: {
                "id": FINALS_ID,
                "kind": "real",
                "name": "Season Finals",
                "seasonId": "season_9",
                "settings": { "sortStrategy": "vanity_group" },
                "groupRefs": ["g-red"],
                "modifiedAt": 1_700_000_000_500_u64,
                "color": "gold"
            },
            JURY_ID: {
                "name": "Jury",
                "settings": { "sortStrategy": "placements", "seasonId": "season_8" },
                "createdAt": 1_690_000_000_000_u64
            },
            "bare": {},
            "broken": { "settings": { "sortStrategy": "chaotic" } },
            "ghost": { "kind": "virtual" }
        },
        "groups": {
            "g-red": { "name": "Red Tribe", "rosterIds": [FINALS_ID] },
            "g-blue": { "name": "Blue Tribe", "rosterIds": [FINALS_ID] },
            "g-jury": { "name": "Jury Box", "rosterId": JURY_ID },
            "g-old": { "name": "Old Tribe", "roster": "Alumni" },
            "g-old2": { "name": "Older Tribe", "roster": " alumni " },
            "g-main": { "name": "Main Cast", "roster": "default" }
        },
        "placements": {
            "season_9": { "u-red-1": 1, "u-blue-1": 2 },
            "global": { "u-red-1": 40 }
        }
    })
}
