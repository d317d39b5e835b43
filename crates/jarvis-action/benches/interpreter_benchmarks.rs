//! Benchmarks for directive interpretation on typical reply sizes.
//!
//! Every assistant reply passes through `CommandInterpreter::interpret`, so
//! the no-directive path matters as much as the resolved one.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use jarvis_action::{ActionRegistry, CommandInterpreter};

/// Generate a reply of a few sentences, optionally carrying a directive.
fn generate_reply(index: usize, tag: Option<&str>) -> String {
    let tag = tag.map(|name| format!(" [[OPEN:{}]]", name)).unwrap_or_default();
    format!(
        "Certainly, sir. I have reviewed your schedule for the afternoon and \
         there are two meetings left, the second of which overlaps with your \
         flight check-in window.{} I would suggest moving the design review to \
         tomorrow morning. Shall I draft a note to the team? Reference {}.",
        tag, index
    )
}

fn bench_interpret(c: &mut Criterion) {
    let interpreter = CommandInterpreter::new(ActionRegistry::with_defaults());

    // Pre-generate replies to exclude formatting time from measurements.
    let plain: Vec<String> = (0..1000).map(|i| generate_reply(i, None)).collect();
    let resolved: Vec<String> = (0..1000)
        .map(|i| generate_reply(i, Some("youtube")))
        .collect();
    let unresolved: Vec<String> = (0..1000)
        .map(|i| generate_reply(i, Some("fakeapp")))
        .collect();

    let mut group = c.benchmark_group("interpret");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(5));

    for (label, replies) in [
        ("no_directive", &plain),
        ("resolved_directive", &resolved),
        ("unresolved_directive", &unresolved),
    ] {
        group.bench_function(label, |b| {
            let mut idx = 0usize;
            b.iter(|| {
                let reply = &replies[idx % replies.len()];
                idx += 1;
                interpreter.interpret(reply)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_interpret);
criterion_main!(benches);
