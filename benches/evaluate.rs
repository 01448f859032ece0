use criterion::{black_box, criterion_group, criterion_main, Criterion};
use steer::{Attributes, Document, RuleDocument};

/// Build a select-server document with `n` equality rules and a two-group
/// distribution, plus attributes that only match the last rule.
fn build_document(n: usize) -> (RuleDocument, Attributes) {
    let mut text = String::from("selectServer {\n");
    for i in 0..n {
        text.push_str(&format!(
            "  if id=\"r{i}\" {{\n    equals param=\"f{i}\" {{ value \"hit\" }}\n    server name=\"s{i}\" url=\"http://s{i}\" path=\"P{i}\"\n  }}\n"
        ));
    }
    text.push_str(
        "  distribution {\n    percent value=25 { server name=\"c\" url=\"http://c\" }\n    default { server name=\"d\" url=\"http://d\" }\n  }\n}\n",
    );

    let doc = match Document::from_text(&text).unwrap() {
        Document::SelectServer(doc) => doc,
        Document::UrlRules(_) => unreachable!(),
    };
    let attrs = Attributes::new()
        .set(&format!("f{}", n - 1), "hit")
        .set("accountId", "bench-account");
    (doc, attrs)
}

fn bench_decide(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");

    for &n in &[5, 20, 50] {
        let (doc, attrs) = build_document(n);
        group.bench_function(&format!("{n}_rules_last_match"), |b| {
            b.iter(|| doc.decide(black_box(&attrs)));
        });

        let miss = Attributes::new().set("accountId", "bench-account");
        group.bench_function(&format!("{n}_rules_distribution"), |b| {
            b.iter(|| doc.decide(black_box(&miss)));
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for &n in &[20, 100] {
        let mut text = String::from("selectServer {\n");
        for i in 0..n {
            text.push_str(&format!(
                "  if id=\"r{i}\" {{\n    equals param=\"f{i}\" {{ value \"hit\" }}\n    server name=\"s{i}\" url=\"http://s{i}\"\n  }}\n"
            ));
        }
        text.push_str("}\n");

        group.bench_function(&format!("{n}_rules"), |b| {
            b.iter(|| Document::from_text(black_box(&text)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decide, bench_build);
criterion_main!(benches);
