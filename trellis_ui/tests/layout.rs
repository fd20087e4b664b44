// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry produced by `Document::validate`.

use kurbo::{Point, Rect};
use trellis_style::ErrorStack;
use trellis_ui::{Document, DocumentConfig, ElementId};

fn document(script: &str) -> Document {
    let mut doc = Document::new(DocumentConfig::new().with_viewport(800.0, 600.0));
    let mut errors = ErrorStack::new();
    if let Err(e) = doc.styles_mut().load_script("test", script, "", &mut errors) {
        panic!("{e}: {:?}", errors.iter().collect::<Vec<_>>());
    }
    doc
}

fn add(doc: &mut Document, parent: ElementId, class: &str) -> ElementId {
    let e = doc.create_element(None).unwrap();
    doc.append_child(parent, e).unwrap();
    if !class.is_empty() {
        assert!(doc.attach_class_name(e, class).unwrap(), "class {class}");
    }
    e
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn horizontal_flow_places_children_side_by_side() {
    let mut doc = document(
        "row { width: 200px; child-plane: horizontal; }
         a { width: 50px; } b { width: 60px; } c { width: 70px; }",
    );
    let root = doc.root();
    let row = add(&mut doc, root, "row");
    let a = add(&mut doc, row, "a");
    let b = add(&mut doc, row, "b");
    let c = add(&mut doc, row, "c");
    doc.validate();

    let xs: Vec<f64> = [a, b, c].iter().map(|&e| doc.layout(e).unwrap().x()).collect();
    assert_eq!(xs, [0.0, 50.0, 110.0]);
    let row = doc.layout(row).unwrap();
    assert_eq!(row.width(), 200.0);
    assert_eq!(row.children_width(), 180.0);
}

#[test]
fn absolute_children_ignore_sibling_flow() {
    let mut doc = document(
        "box { positioning: absolute; left: 90px; top: 90px; width: 300px; height: 300px; padding: 10px; }
         filler { width: 100px; height: 100px; }
         pinned { positioning: absolute; left: 10px; top: 5px; width: 20px; height: 20px; }",
    );
    let root = doc.root();
    let container = add(&mut doc, root, "box");
    let filler = add(&mut doc, container, "filler");
    let pinned = add(&mut doc, container, "pinned");
    doc.validate();

    assert_eq!(
        doc.layout(container).unwrap().inner_rect().origin(),
        Point::new(100.0, 100.0)
    );
    assert_eq!(
        doc.layout(filler).unwrap().absolute_position(),
        Point::new(100.0, 100.0)
    );
    assert_eq!(
        doc.layout(pinned).unwrap().absolute_position(),
        Point::new(110.0, 105.0)
    );
}

#[test]
fn right_and_bottom_anchor_against_the_content_box() {
    let mut doc = document(
        "box { width: 200px; height: 100px; padding: 10px; }
         corner { positioning: absolute; right: 5px; bottom: 5px; width: 20px; height: 10px; }",
    );
    let root = doc.root();
    let container = add(&mut doc, root, "box");
    let corner = add(&mut doc, container, "corner");
    doc.validate();

    let l = doc.layout(corner).unwrap();
    assert_eq!(l.x(), 10.0 + 180.0 - 5.0 - 20.0);
    assert_eq!(l.y(), 10.0 + 80.0 - 5.0 - 10.0);
    assert!(l.right_has_priority());
    assert!(l.bottom_has_priority());
}

#[test]
fn a_second_validation_is_a_no_op() {
    let mut doc = document(
        "row { child-plane: horizontal; flex-child-width: true; width: 300px; }
         cell { margin: 4px; padding: 2px; } label { font-size: 12px; }",
    );
    let root = doc.root();
    let row = add(&mut doc, root, "row");
    for _ in 0..3 {
        let cell = add(&mut doc, row, "cell");
        let label = add(&mut doc, cell, "label");
        doc.set_text(label, Some("hello")).unwrap();
    }
    let first = doc.validate();
    assert!(!first.is_empty());
    assert!(doc.validate().is_empty());
    assert!(doc.layout_manager_mut().is_clean());
}

#[test]
fn size_changes_reflow_following_siblings() {
    let mut doc = document(
        "row { width: 400px; child-plane: horizontal; }
         a { width: 50px; } b { width: 60px; } c { width: 70px; }",
    );
    let root = doc.root();
    let row = add(&mut doc, root, "row");
    let a = add(&mut doc, row, "a");
    let b = add(&mut doc, row, "b");
    let c = add(&mut doc, row, "c");
    doc.validate();

    let class = doc.styles().class_id("a").unwrap();
    doc.styles_mut()
        .set_style_attribute(class, "width", "80px")
        .unwrap();
    let changed = doc.validate();
    assert_eq!(doc.layout(b).unwrap().x(), 80.0);
    assert_eq!(doc.layout(c).unwrap().x(), 140.0);
    assert!(changed.contains(&a) && changed.contains(&b) && changed.contains(&c));
    assert!(!changed.contains(&row));
}

#[test]
fn cross_axis_alignment_uses_the_childs_own_attribute() {
    let mut doc = document(
        "column { width: 200px; }
         right { width: 50px; horizontal-align: right; }
         center { width: 50px; horizontal-align: center; }
         row { height: 100px; child-plane: horizontal; }
         bottom { height: 30px; width: 10px; vertical-align: bottom; }",
    );
    let root = doc.root();
    let column = add(&mut doc, root, "column");
    let right = add(&mut doc, column, "right");
    let center = add(&mut doc, column, "center");
    let row = add(&mut doc, root, "row");
    let bottom = add(&mut doc, row, "bottom");
    doc.validate();

    assert_eq!(doc.layout(right).unwrap().x(), 150.0);
    assert_eq!(doc.layout(center).unwrap().x(), 75.0);
    assert_eq!(doc.layout(center).unwrap().y(), 0.0);
    assert_eq!(doc.layout(bottom).unwrap().y(), 70.0);
}

#[test]
fn flexible_children_share_the_remaining_space() {
    let mut doc = document(
        "row { width: 300px; height: 20px; child-plane: horizontal; flex-child-width: true; flex-child-height: true; }
         fixed { width: 100px; }",
    );
    let root = doc.root();
    let row = add(&mut doc, root, "row");
    let fixed = add(&mut doc, row, "fixed");
    let first = add(&mut doc, row, "");
    let second = add(&mut doc, row, "");
    doc.validate();

    assert_eq!(doc.layout(fixed).unwrap().width(), 100.0);
    for (e, x) in [(first, 100.0), (second, 200.0)] {
        let l = doc.layout(e).unwrap();
        assert!(approx(l.width(), 100.0), "width {}", l.width());
        assert!(approx(l.x(), x), "x {}", l.x());
        assert!(approx(l.height(), 20.0), "height {}", l.height());
    }
}

#[test]
fn percentages_resolve_against_inner_or_outer_size() {
    let mut doc = document(
        "parent { width: 200px; padding: 20px; }
         inner { width: 50%; }
         outer { width: 50%; relative-width-mode: outer; }
         capped { width: 50%; max-width: 60px; }
         floored { width: 10%; min-width: 30px; }",
    );
    let root = doc.root();
    let parent = add(&mut doc, root, "parent");
    let inner = add(&mut doc, parent, "inner");
    let outer = add(&mut doc, parent, "outer");
    let capped = add(&mut doc, parent, "capped");
    let floored = add(&mut doc, parent, "floored");
    doc.validate();

    assert_eq!(doc.layout(inner).unwrap().width(), 80.0);
    assert_eq!(doc.layout(outer).unwrap().width(), 100.0);
    assert_eq!(doc.layout(capped).unwrap().width(), 60.0);
    assert_eq!(doc.layout(floored).unwrap().width(), 30.0);
    // Percentage children do not count towards the parent's content size.
    assert_eq!(doc.layout(parent).unwrap().children_width(), 0.0);
}

#[test]
fn auto_size_wraps_children_and_margins() {
    let mut doc = document(
        "column { padding: 1px; }
         item { width: 30px; height: 10px; margin-bottom: 5px; }
         wide { width: 45px; height: 10px; }",
    );
    let root = doc.root();
    let column = add(&mut doc, root, "column");
    let items: Vec<_> = (0..3).map(|_| add(&mut doc, column, "item")).collect();
    add(&mut doc, column, "wide");
    doc.validate();

    let l = doc.layout(column).unwrap();
    assert_eq!(l.children_height(), 55.0);
    assert_eq!(l.height(), 57.0);
    assert_eq!(l.width(), 47.0);
    let ys: Vec<f64> = items.iter().map(|&e| doc.layout(e).unwrap().y()).collect();
    assert_eq!(ys, [1.0, 16.0, 31.0]);
}

#[test]
fn relative_offsets_move_from_the_flow_position() {
    let mut doc = document(
        "first { height: 10px; }
         shifted { height: 10px; positioning: relative; left: 5px; top: 2px; }
         after { height: 10px; }",
    );
    let root = doc.root();
    add(&mut doc, root, "first");
    let shifted = add(&mut doc, root, "shifted");
    let after = add(&mut doc, root, "after");
    doc.validate();

    let l = doc.layout(shifted).unwrap();
    assert_eq!((l.x(), l.y()), (5.0, 12.0));
    // Relative offsets leave the flow untouched.
    assert_eq!(doc.layout(after).unwrap().y(), 20.0);

    // The offset set last wins.
    let class = doc.styles().class_id("shifted").unwrap();
    doc.styles_mut()
        .set_style_attribute(class, "right", "7px")
        .unwrap();
    doc.validate();
    let l = doc.layout(shifted).unwrap();
    assert!(l.right_has_priority());
    assert_eq!(l.x(), -7.0);
}

#[test]
fn invisible_siblings_leave_the_flow() {
    let mut doc = document(
        "item { height: 10px; } hidden { height: 10px; visible: false; }",
    );
    let root = doc.root();
    let hidden = add(&mut doc, root, "hidden");
    let item = add(&mut doc, root, "item");
    doc.validate();
    assert_eq!(doc.layout(item).unwrap().y(), 0.0);

    doc.detach_class_name(hidden, "hidden").unwrap();
    doc.attach_class_name(hidden, "item").unwrap();
    doc.validate();
    assert_eq!(doc.layout(item).unwrap().y(), 10.0);
}

#[test]
fn text_is_measured_into_auto_sizes() {
    let mut doc = document("label { font-size: 10px; padding: 2px; }");
    let root = doc.root();
    let label = add(&mut doc, root, "label");
    doc.set_text(label, Some("abcd")).unwrap();
    doc.validate();

    let l = doc.layout(label).unwrap();
    assert!(approx(l.width(), 28.0), "width {}", l.width());
    assert!(approx(l.height(), 16.0), "height {}", l.height());

    doc.set_text(label, Some("ab")).unwrap();
    doc.validate();
    assert!(approx(doc.layout(label).unwrap().width(), 16.0));
}

#[test]
fn descendants_are_clipped_to_the_parent_content_box() {
    let mut doc = document(
        "frame { width: 100px; height: 100px; padding: 5px; }
         clip { overflow: hidden; }
         wide { width: 300px; height: 10px; }",
    );
    let root = doc.root();
    let open = add(&mut doc, root, "frame");
    let spill = add(&mut doc, open, "wide");
    let closed = add(&mut doc, root, "frame");
    doc.attach_class_name(closed, "clip").unwrap();
    let cut = add(&mut doc, closed, "wide");
    doc.validate();

    let frame = doc.layout(open).unwrap().clipping_rect_inner();
    assert_eq!(frame, Rect::new(5.0, 5.0, 95.0, 95.0));
    let spill = doc.layout(spill).unwrap();
    assert_eq!(spill.clipping_rect(), Rect::new(5.0, 5.0, 95.0, 15.0));
    assert!(spill.clipping_rect().x1 <= frame.x1);
    // Visible overflow still clips, but does not raise the flag.
    assert!(!spill.is_clipped());

    let cut = doc.layout(cut).unwrap();
    assert_eq!(cut.clipping_rect(), Rect::new(5.0, 105.0, 95.0, 115.0));
    assert!(cut.is_clipped());
}

#[test]
fn clips_narrow_through_every_ancestor() {
    let mut doc = document(
        "outer { width: 100px; height: 100px; }
         inner { width: 200px; height: 50px; padding-left: 80px; }
         leaf { width: 50px; height: 10px; }",
    );
    let root = doc.root();
    let outer = add(&mut doc, root, "outer");
    let inner = add(&mut doc, outer, "inner");
    let leaf = add(&mut doc, inner, "leaf");
    doc.validate();

    // The leaf starts inside its parent but past the grandparent's edge.
    let leaf = doc.layout(leaf).unwrap();
    assert_eq!(leaf.absolute_rect(), Rect::new(80.0, 0.0, 130.0, 10.0));
    assert_eq!(leaf.clipping_rect(), Rect::new(80.0, 0.0, 100.0, 10.0));
}

#[test]
fn removing_an_element_reflows_its_siblings() {
    let mut doc = document(
        "row { child-plane: horizontal; } a { width: 50px; } b { width: 60px; } c { width: 70px; }",
    );
    let root = doc.root();
    let row = add(&mut doc, root, "row");
    add(&mut doc, row, "a");
    let b = add(&mut doc, row, "b");
    let c = add(&mut doc, row, "c");
    doc.validate();
    assert_eq!(doc.layout(row).unwrap().width(), 180.0);

    doc.remove_element(b).unwrap();
    doc.validate();
    assert_eq!(doc.layout(c).unwrap().x(), 50.0);
    assert_eq!(doc.layout(row).unwrap().width(), 120.0);
}

#[test]
fn viewport_resizes_reach_percentage_children() {
    let mut doc = document("half { width: 50%; height: 50%; }");
    let root = doc.root();
    let half = add(&mut doc, root, "half");
    doc.validate();
    assert_eq!(doc.layout(half).unwrap().width(), 400.0);

    doc.set_viewport(1000.0, 100.0);
    doc.validate();
    let l = doc.layout(half).unwrap();
    assert_eq!((l.width(), l.height()), (500.0, 50.0));
}
