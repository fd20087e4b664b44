// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Point;
use trellis_style::ErrorStack;
use trellis_ui::{Document, DocumentConfig, ElementId, InputEvent};

const SCRIPT: &str = "
    row { child-plane: horizontal; flex-child-width: true; height: 24px; padding: 2px; }
    cell { margin: 1px; padding: 2px; border: 1px #808080; }
    cell:hovered { background-color: #eeeeee; }
    label { font-size: 12px; }
    narrow { width: 40px; }
";

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive == 0 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }
}

/// A table of `rows` rows with `cols` labelled cells each, validated once.
fn table(rows: usize, cols: usize) -> (Document, Vec<ElementId>) {
    let mut doc = Document::new(DocumentConfig::new().with_viewport(1920.0, 1080.0));
    doc.styles_mut()
        .load_script("bench", SCRIPT, "", &mut ErrorStack::new())
        .expect("benchmark script is valid");
    let root = doc.root();
    let mut cells = Vec::with_capacity(rows * cols);
    for _ in 0..rows {
        let row = doc.create_element(None).expect("handle space");
        doc.append_child(root, row).expect("fresh element");
        doc.attach_class_name(row, "row").expect("live element");
        for c in 0..cols {
            let cell = doc.create_element(None).expect("handle space");
            doc.append_child(row, cell).expect("fresh element");
            doc.attach_class_name(cell, "cell").expect("live element");
            let label = doc.create_element(None).expect("handle space");
            doc.append_child(cell, label).expect("fresh element");
            doc.attach_class_name(label, "label").expect("live element");
            doc.set_text(label, Some(&format!("cell {c}")))
                .expect("live element");
            cells.push(cell);
        }
    }
    doc.validate();
    (doc, cells)
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("trellis_ui");
    group.sample_size(50);

    for &(rows, cols) in &[(16_usize, 8_usize), (128, 16)] {
        group.bench_function(format!("build_and_validate(rows={rows},cols={cols})"), |b| {
            b.iter(|| black_box(table(rows, cols)));
        });

        // A fixed width on random cells re-flows their rows only.
        group.bench_function(format!("resize_random_cells(rows={rows},cols={cols})"), |b| {
            b.iter_batched(
                || table(rows, cols),
                |(mut doc, cells)| {
                    let mut rng = Lcg::new(0x7E11_0000_0000_0003);
                    for _ in 0..16 {
                        let cell = cells[rng.gen_range_usize(cells.len())];
                        let _ = doc.attach_class_name(cell, "narrow");
                    }
                    black_box(doc.validate());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("hover_sweep(rows={rows},cols={cols})"), |b| {
            b.iter_batched(
                || table(rows, cols),
                |(mut doc, _)| {
                    for i in 0..32 {
                        let y = f64::from(i) * 24.0 + 4.0;
                        doc.event_queue()
                            .push(InputEvent::MouseMove(Point::new(40.0, y)));
                        black_box(doc.step());
                    }
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("restyle_all(rows={rows},cols={cols})"), |b| {
            b.iter_batched(
                || table(rows, cols),
                |(mut doc, _)| {
                    let class = doc.styles().class_id("cell").expect("class cell is defined");
                    doc.styles_mut()
                        .set_style_attribute(class, "padding", "4px")
                        .expect("valid padding");
                    black_box(doc.validate());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
