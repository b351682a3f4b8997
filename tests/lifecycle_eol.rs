use chrono::NaiveDate;
use osinfo_lookup::construct::{Database, short_id_of};
use osinfo_lookup::datatype::Record;
use osinfo_lookup::lifecycle::{DEFAULT_GRACE_DAYS, active_oses, is_active, is_active_default};
use osinfo_lookup::persist::convert;
use serde_json::json;

fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("date")
}

fn os(value: serde_json::Value) -> Record {
    convert(&value).as_record().cloned().expect("record")
}

fn setup() -> Database {
    Database::from_records([
        os(json!({"short_id": "centos6", "release_date": "2011-07-10", "eol_date": "2020-11-30"})),
        os(json!({"short_id": "fedora39", "release_date": "2023-11-07", "eol_date": "2024-11-26"})),
        os(json!({"short_id": "fedora-rawhide", "release_date": "2000-01-01"})),
        os(json!({"short_id": "rhel10", "release_date": null, "eol_date": "2035-05-31"})),
        os(json!({"short_id": "ubuntu24.04", "release_date": "2024-04-25", "eol_date": "2029-05-31"})),
    ])
    .expect("db")
}

#[test]
fn documented_examples() {
    let as_of = date("2024-01-01");
    assert!(is_active(&os(json!({"release_date": "2020-01-01", "eol_date": null})), as_of, DEFAULT_GRACE_DAYS));
    assert!(!is_active(&os(json!({"release_date": "2020-01-01", "eol_date": "2024-02-01"})), as_of, 180));
    assert!(!is_active(&os(json!({"release_date": null, "eol_date": "2030-01-01"})), as_of, DEFAULT_GRACE_DAYS));
}

#[test]
fn active_oses_in_database_order() {
    let db = setup();
    let active: Vec<&str> = active_oses(&db, date("2024-06-01"), DEFAULT_GRACE_DAYS)
        .iter()
        .filter_map(|n| short_id_of(n.record()))
        .collect();
    assert_eq!(active, ["fedora-rawhide", "ubuntu24.04"]);

    // without grace fedora39 is still supported on that day
    let active = active_oses(&db, date("2024-06-01"), 0);
    assert_eq!(active.len(), 3);
}

#[test]
fn lookups_answer_the_predicate() {
    let db = setup();
    let as_of = date("2024-06-01");
    assert!(db.lookup_by_short_id("ubuntu24.04").is_active(as_of, DEFAULT_GRACE_DAYS));
    assert!(!db.lookup_by_short_id("centos6").is_active(as_of, DEFAULT_GRACE_DAYS));
    assert!(!db.lookup_by_short_id("beos").is_active(as_of, DEFAULT_GRACE_DAYS));
}

#[test]
fn reference_date_is_explicit() {
    let fedora39 = os(json!({"release_date": "2023-11-07", "eol_date": "2024-11-26"}));
    assert!(is_active_default(&fedora39, date("2024-01-01")));
    assert!(!is_active_default(&fedora39, date("2024-06-01")));
}
