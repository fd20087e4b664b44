// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt::Write as _;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use trellis_style::{ErrorStack, StyleServer};

/// A script with `classes` classes, each setting a handful of attributes
/// through shorthands and a hovered modifier.
fn script(classes: usize, prefix: &str) -> String {
    let mut out = String::from("$accent: #3366cc;\n");
    for i in 0..classes {
        let _ = writeln!(
            out,
            "{prefix}{i} {{ width: {}px; margin: 2px 4px; padding: 3px; border: 1px #3366cc; color: #202020; }}",
            10 + i % 90
        );
        let _ = writeln!(out, "{prefix}{i}:hovered {{ background-color: $accent; }}");
    }
    out
}

fn loaded(scripts: &[(&str, &str)]) -> StyleServer {
    let mut server = StyleServer::new();
    for (id, text) in scripts {
        server
            .load_script(id, text, "", &mut ErrorStack::new())
            .expect("benchmark scripts are valid");
    }
    server
}

fn bench_style(c: &mut Criterion) {
    let mut group = c.benchmark_group("trellis_style");
    group.sample_size(50);

    for &classes in &[64_usize, 1_024] {
        let base = script(classes, "c");
        let overlay = script(classes / 2, "c");

        group.bench_function(format!("load(classes={classes})"), |b| {
            b.iter_batched(
                StyleServer::new,
                |mut server| {
                    server
                        .load_script("base", &base, "", &mut ErrorStack::new())
                        .expect("benchmark scripts are valid");
                    black_box(server);
                },
                BatchSize::LargeInput,
            );
        });

        // Unloading the bottom layer has to recompute every slot the overlay
        // also touches.
        group.bench_function(format!("unload_bottom_layer(classes={classes})"), |b| {
            b.iter_batched(
                || loaded(&[("base", &base), ("overlay", &overlay)]),
                |mut server| {
                    black_box(server.unload_script("base"));
                    black_box(server.take_changes());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("set_attribute(classes={classes})"), |b| {
            b.iter_batched(
                || {
                    let server = loaded(&[("base", &base)]);
                    let class = server.class_id("c0").expect("class c0 is defined");
                    (server, class)
                },
                |(mut server, class)| {
                    for px in 0..64 {
                        server
                            .set_style_attribute(class, "width", &format!("{px}px"))
                            .expect("valid width");
                    }
                    black_box(server.take_changes());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_style);
criterion_main!(benches);
