// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Load/unload composition across every attribute a script touches.

use trellis_style::{AttributeId, ClassKind, ErrorStack, StyleServer};

const BASE: &str = "
    $fg: #112233;
    card {
        width: 100px;
        height: 40px;
        margin: 1px 2px;
        border: 1px black;
        color: $fg;
        font-weight: bold;
    }
    card:focused { border-color: blue; }
";

const OVERLAY: &str = "
    card {
        width: 50%;
        margin: 3px;
        opacity: 0.5;
        font-style: italic;
    }
    card:focused { border-left-color: red; }
    badge { z-index: 5; }
";

fn load(server: &mut StyleServer, id: &str, text: &str) {
    let mut errors = ErrorStack::new();
    if let Err(e) = server.load_script(id, text, "", &mut errors) {
        panic!("{e}: {:?}", errors.iter().collect::<Vec<_>>());
    }
}

/// Serializes every slot of every named class (and its modifiers).
fn snapshot(server: &StyleServer) -> Vec<(String, String, Option<String>)> {
    let mut out = Vec::new();
    for (_, class) in server.classes() {
        if class.is_builtin() {
            continue;
        }
        let kind = match class.kind() {
            ClassKind::Normal => class.name().to_string(),
            ClassKind::Modifier { state, .. } => format!("{}:{}", class.name(), state.name()),
        };
        for id in AttributeId::all() {
            let slot = class.attribute(id);
            let text = slot.is_set().then(|| {
                if slot.is_inherit() {
                    "inherit".to_string()
                } else {
                    slot.value().to_string()
                }
            });
            out.push((kind.clone(), id.name().to_string(), text));
        }
    }
    out.sort();
    out
}

#[test]
fn unloading_the_top_layer_restores_the_base_exactly() {
    let mut server = StyleServer::new();
    load(&mut server, "base", BASE);
    let after_base = snapshot(&server);

    load(&mut server, "overlay", OVERLAY);
    assert_ne!(snapshot(&server), after_base);

    assert!(server.unload_script("overlay"));
    assert_eq!(snapshot(&server), after_base);
    assert!(server.class_id("badge").is_none());
}

#[test]
fn unloading_the_bottom_layer_keeps_the_overlay() {
    let mut server = StyleServer::new();
    load(&mut server, "base", BASE);
    load(&mut server, "overlay", OVERLAY);
    let card = server.class_id("card").unwrap();
    let get = |server: &StyleServer, name: &str| server.get_style_attribute(card, name).unwrap();

    assert!(server.unload_script("base"));
    // Touched by the overlay: unchanged.
    assert_eq!(get(&server, "width").as_deref(), Some("50%"));
    assert_eq!(get(&server, "margin").as_deref(), Some("3px"));
    assert_eq!(get(&server, "opacity").as_deref(), Some("0.5"));
    // Touched only by the base: unset.
    assert_eq!(get(&server, "height"), None);
    assert_eq!(get(&server, "color"), None);
    assert_eq!(get(&server, "border-top-width"), None);
    assert_eq!(server.variable("fg"), None);
    // The class survives because the overlay still defines it.
    assert_eq!(server.class_id("card"), Some(card));
}

#[test]
fn reloading_after_unload_matches_a_fresh_load() {
    let mut fresh = StyleServer::new();
    load(&mut fresh, "base", BASE);

    let mut cycled = StyleServer::new();
    load(&mut cycled, "base", BASE);
    load(&mut cycled, "overlay", OVERLAY);
    cycled.unload_script("overlay");
    cycled.unload_script("base");
    assert!(snapshot(&cycled).is_empty());
    load(&mut cycled, "base", BASE);

    assert_eq!(snapshot(&cycled), snapshot(&fresh));
}

#[test]
fn two_token_shorthands_pair_horizontal_and_vertical() {
    let mut server = StyleServer::new();
    load(&mut server, "base", BASE);
    let card = server.class_id("card").unwrap();
    let get = |name: &str| server.get_style_attribute(card, name).unwrap();
    assert_eq!(get("margin-left").as_deref(), Some("1px"));
    assert_eq!(get("margin-right").as_deref(), Some("1px"));
    assert_eq!(get("margin-top").as_deref(), Some("2px"));
    assert_eq!(get("margin-bottom").as_deref(), Some("2px"));
    assert_eq!(get("margin").as_deref(), Some("1px 2px"));
}

#[test]
fn variables_substitute_inside_compound_values() {
    let mut server = StyleServer::new();
    load(
        &mut server,
        "theme",
        "$c: red; $gap: 3px; a { border: 1px $c; padding: $gap 1px; }",
    );
    let a = server.class_id("a").unwrap();
    let get = |server: &StyleServer, name: &str| server.get_style_attribute(a, name).unwrap();
    assert_eq!(get(&server, "border-left-color").as_deref(), Some("#ff0000"));
    assert_eq!(get(&server, "border-bottom-width").as_deref(), Some("1px"));
    assert_eq!(get(&server, "padding-left").as_deref(), Some("3px"));
    assert_eq!(get(&server, "padding-top").as_deref(), Some("1px"));

    server.set_variable("w", "4px").unwrap();
    server.set_style_attribute(a, "margin", "$w $gap").unwrap();
    assert_eq!(get(&server, "margin-right").as_deref(), Some("4px"));
    assert_eq!(get(&server, "margin-bottom").as_deref(), Some("3px"));
    assert!(server.set_style_attribute(a, "margin", "$w $nope").is_err());
    assert_eq!(get(&server, "margin-top").as_deref(), Some("3px"));
}
