use std::collections::BTreeMap;
use std::fs;

use osinfo_lookup::OsinfoError;
use osinfo_lookup::check::{MemoryChecker, Outcome, Template, Violation};
use osinfo_lookup::construct::Database;
use osinfo_lookup::datatype::Record;
use osinfo_lookup::persist::convert;
use osinfo_lookup::template::load_templates;
use serde_json::json;

const GI: i64 = 1 << 30;

struct TestTemplate {
    name: String,
    labels: BTreeMap<String, String>,
    memory: Option<String>,
}

impl TestTemplate {
    fn new(name: &str, labels: &[&str], memory: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            labels: labels.iter().map(|l| (l.to_string(), "true".to_owned())).collect(),
            memory: memory.map(str::to_owned),
        }
    }
}

impl Template for TestTemplate {
    fn name(&self) -> &str {
        &self.name
    }
    fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }
    fn declared_min_memory(&self) -> Option<&str> {
        self.memory.as_deref()
    }
}

fn os(short_id: &str, min_ram: i64) -> Record {
    convert(&json!({
        "short_id": short_id,
        "resources": [
            {"architecture": "all", "scope": "recommended", "ram": min_ram * 2},
            {"architecture": "x86_64", "scope": "minimum", "ram": min_ram}
        ]
    }))
    .as_record()
    .cloned()
    .expect("record")
}

fn setup() -> Database {
    Database::from_records([
        os("fedora15", GI),
        os("fedora20", 2 * GI),
        os("rhel8.4", 1536 * (1 << 20)),
        convert(&json!({"short_id": "legacy", "resources": []})).as_record().cloned().expect("record"),
    ])
    .expect("db")
}

#[test]
fn newest_label_decides() {
    let db = setup();
    let checker = MemoryChecker::with_label_prefix(&db, "os.example");
    let template = TestTemplate::new("fedora-small", &["os.example/fedora15", "os.example/fedora20"], Some("1Gi"));
    let report = checker.check(&[template]);
    assert_eq!(report.violations, [Violation::new("os.example/fedora20", "fedora-small")]);
    assert!(report.failures.is_empty());
    assert!(!report.is_success());
    assert_eq!(
        report.to_string(),
        "Memory requirements for OS: os.example/fedora20 are not compatible with the requirements set in: fedora-small"
    );
}

#[test]
fn sufficient_memory_passes() {
    let db = setup();
    let checker = MemoryChecker::with_label_prefix(&db, "os.example");
    let exact = TestTemplate::new("exact", &["os.example/fedora20"], Some("2Gi"));
    let fraction = TestTemplate::new("fraction", &["os.example/rhel8.4"], Some("1.5Gi"));
    assert_eq!(checker.check_template(&exact).expect("ok"), Outcome::Passed);
    assert_eq!(checker.check_template(&fraction).expect("ok"), Outcome::Passed);
}

#[test]
fn unlabelled_templates_are_skipped() {
    let db = setup();
    let checker = MemoryChecker::new(&db);
    let template = TestTemplate::new("windows-ish", &["flavor.template.kubevirt.io/small"], Some("1Gi"));
    let report = checker.check(&[template]);
    assert_eq!(report.skipped, ["windows-ish"]);
    assert!(report.is_success());
}

#[test]
fn failures_do_not_hide_other_templates() {
    let db = setup();
    let checker = MemoryChecker::with_label_prefix(&db, "os.example");
    let templates = [
        TestTemplate::new("unknown-os", &["os.example/plan9"], Some("1Gi")),
        TestTemplate::new("no-minimum", &["os.example/legacy"], Some("1Gi")),
        TestTemplate::new("bad-unit", &["os.example/fedora15"], Some("1024Mi")),
        TestTemplate::new("no-memory", &["os.example/fedora15"], None),
        TestTemplate::new("too-small", &["os.example/fedora20"], Some("1.5Gi")),
        TestTemplate::new("fine", &["os.example/fedora15"], Some("1Gi")),
    ];
    let report = checker.check(&templates);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.template.as_str()).collect();
    assert_eq!(failed, ["unknown-os", "no-minimum", "bad-unit", "no-memory"]);
    assert!(matches!(report.failures[0].error, OsinfoError::NotFound { .. }));
    assert!(matches!(report.failures[1].error, OsinfoError::NotFound { .. }));
    assert!(matches!(report.failures[2].error, OsinfoError::Template { .. }));
    assert_eq!(report.violations, [Violation::new("os.example/fedora20", "too-small")]);
    assert_eq!(report.checked, 2);
}

#[test]
fn min_ram_through_the_path_resolver() {
    let db = setup();
    let checker = MemoryChecker::new(&db);
    assert_eq!(checker.min_ram("fedora20").expect("ram"), 2 * GI);
    assert!(checker.min_ram("legacy").is_err());
}

#[test]
fn templates_from_a_directory() {
    let db = setup();
    let dir = tempfile::tempdir().expect("temp dir");
    let template = |name: &str, label: &str, memory: &str| {
        json!({
            "metadata": {"name": name, "labels": {label: "true"}},
            "objects": [{"spec": {"template": {"spec": {"domain": {"resources": {"requests": {"memory": memory}}}}}}}]
        })
        .to_string()
    };
    fs::write(dir.path().join("a.json"), template("a", "os.template.kubevirt.io/fedora15", "1Gi")).expect("write");
    fs::write(dir.path().join("b.json"), template("b", "os.template.kubevirt.io/fedora20", "1Gi")).expect("write");
    fs::write(dir.path().join("c.json"), "").expect("write");
    fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

    let templates = load_templates(dir.path()).expect("templates");
    assert_eq!(templates.len(), 2);
    let report = MemoryChecker::new(&db).check(&templates);
    assert_eq!(report.violations, [Violation::new("os.template.kubevirt.io/fedora20", "b")]);
}
