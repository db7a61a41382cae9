//! Benchmarks for rule evaluation and suggestion passes.

#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dqscope_core::engine::{EvaluationOptions, evaluate};
use dqscope_core::rules::{ConditionType, Rule};
use dqscope_core::suggest::{ProfilingContext, SuggestionConfig, SuggestionEngine};
use dqscope_core::{Dataset, SemanticType};
use std::hint::black_box;

fn synthetic_dataset(rows: usize) -> Dataset {
    let headers = ["id", "amount", "status", "code", "created"]
        .iter()
        .map(ToString::to_string)
        .collect();
    let statuses = ["open", "closed", "pending"];
    let data = (0..rows)
        .map(|i| {
            vec![
                Some(format!("{}", i % (rows - rows / 50))),
                Some(if i % 97 == 0 {
                    "99999".to_string()
                } else {
                    format!("{}.{:02}", 10 + i % 90, i % 100)
                }),
                (i % 31 != 0).then(|| statuses[i % statuses.len()].to_string()),
                Some(format!("AB-{:04}", i % 10_000)),
                Some(format!(
                    "2024-{:02}-{:02} {:02}:00",
                    1 + (i / 672) % 12,
                    1 + (i / 24) % 28,
                    i % 24
                )),
            ]
        })
        .collect();
    Dataset::from_rows(headers, data).unwrap()
}

fn rules() -> Vec<Rule> {
    vec![
        Rule::new("id", ConditionType::Unique),
        Rule::new("amount", ConditionType::Range)
            .with_data_type(SemanticType::Numeric)
            .with_param("min", 0)
            .with_param("max", 1000),
        Rule::new("status", ConditionType::NotEmpty),
        Rule::new("status", ConditionType::ClassMatch)
            .with_param("values", vec!["open", "closed"]),
        Rule::new("code", ConditionType::RegexMatch).with_param("pattern", r"^[A-Z]{2}-\d{4}$"),
        Rule::new("created", ConditionType::CadenceWithin)
            .with_data_type(SemanticType::Datetime)
            .with_param("value", 1)
            .with_param("unit", "hour"),
    ]
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let rules = rules();
    let options = EvaluationOptions::default();

    for rows in [1_000, 10_000, 50_000] {
        let dataset = synthetic_dataset(rows);
        group.bench_with_input(BenchmarkId::new("rows", rows), &dataset, |b, dataset| {
            b.iter(|| evaluate(black_box(dataset), black_box(&rules), &options));
        });
    }

    group.finish();
}

fn bench_suggest(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggest");
    let rules = rules();
    let options = EvaluationOptions::default();
    let config = SuggestionConfig::default();
    let engine = SuggestionEngine::with_defaults();

    for rows in [1_000, 10_000] {
        let dataset = synthetic_dataset(rows);
        let report = evaluate(&dataset, &rules, &options).unwrap();
        group.bench_with_input(BenchmarkId::new("rows", rows), &dataset, |b, dataset| {
            b.iter(|| {
                let context = ProfilingContext::new(dataset, Some(&report), &config, &options);
                engine.run(black_box(&context))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_suggest);
criterion_main!(benches);
