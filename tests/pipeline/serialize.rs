use grande::driver::DriverOptions;
use grande::lower::LowerOptions;
use serde_json::json;

use crate::fixture::demo;

#[test]
fn serializes_subtree() {
    let demo = demo();
    let value = serde_json::to_value(demo.tree.view(demo.write)).unwrap();

    assert_eq!(
        value,
        json!({
            "kind": "FieldAccess",
            "loc": {
                "Span": {
                    "begin": { "line": 19, "col": 9 },
                    "end": { "line": 19, "col": 22 },
                },
            },
            "label": "property",
            "children": [
                {
                    "kind": "Name",
                    "loc": {
                        "Span": {
                            "begin": { "line": 19, "col": 9 },
                            "end": { "line": 19, "col": 13 },
                        },
                    },
                    "label": "test",
                    "children": [],
                },
            ],
        })
    );
}

#[test]
fn serializes_synthetic_locations() {
    let mut demo = demo();
    demo.tree.erase_locs(demo.read);

    let value = serde_json::to_value(demo.tree.view(demo.read)).unwrap();

    assert_eq!(value["loc"], json!("Synthetic"));
    assert_eq!(value["children"][0]["loc"], json!("Synthetic"));
}

#[test]
fn deserializes_options() {
    let options: DriverOptions = serde_json::from_value(json!({
        "max_rounds": 3,
        "lower": { "observer_package": "com.example.beans", "indent": 2 },
    }))
    .unwrap();

    assert_eq!(options.max_rounds, 3);
    assert!(options.emit_observer);
    assert_eq!(
        options.lower,
        LowerOptions {
            observer_package: "com.example.beans".into(),
            indent: 2,
            ..Default::default()
        }
    );
    assert_eq!(
        grande::observer::unit_name(&options.lower),
        "com/example/beans/PropertyObserver.java"
    );
}
