use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use osinfo_lookup::construct::Database;
use osinfo_lookup::datatype::Record;
use osinfo_lookup::path::PathExpr;
use osinfo_lookup::persist::convert;
use serde_json::json;

const MIN_RAM: &str = "resources.architecture=x86_64|all,scope=minimum.ram";

fn os(n: usize) -> Record {
    let devices: Vec<serde_json::Value> = (0..50)
        .map(|d| json!({"name": format!("device{}", d), "class": if d % 2 == 0 { "net" } else { "block" }}))
        .collect();
    convert(&json!({
        "short_id": format!("os{}", n),
        "release_date": "2020-01-01",
        "devices": devices,
        "resources": [
            {"architecture": "aarch64", "scope": "minimum", "ram": 536870912},
            {"architecture": "all", "scope": "recommended", "ram": 2147483648u64},
            {"architecture": "all", "scope": "minimum", "ram": 1073741824}
        ]
    }))
    .as_record()
    .cloned()
    .unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let db = Database::from_records((0..1000).map(os)).unwrap();
    let expr = PathExpr::parse(MIN_RAM).unwrap();

    c.bench_function("parse min ram path", |b| b.iter(|| PathExpr::parse(black_box(MIN_RAM))));
    c.bench_function("resolve min ram", |b| {
        b.iter(|| db.lookup_by_short_id(black_box("os500")).get(MIN_RAM))
    });
    c.bench_function("resolve parsed min ram", |b| {
        let node = db.get("os500").unwrap();
        let root = osinfo_lookup::path::Node::Record(node);
        b.iter(|| root.resolve(black_box(&expr)))
    });
    c.bench_function("filter last device", |b| {
        let node = db.get("os999").unwrap();
        b.iter(|| node.get(black_box("devices.name=device49.class")))
    });
    c.bench_function("lookup by property", |b| {
        b.iter(|| db.lookup_by_property(black_box("release_date"), black_box("2020-01-01")).len())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
