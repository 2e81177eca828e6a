use grande::ast::{Modifiers, NodeKind, Primitive};
use grande::build::Builder;
use grande::lower::{LowerError, LowerOptions, lower};
use grande::print::{print, render};
use grande::{NodeId, Tree};

use crate::fixture::{self, demo, p, text};

fn count_properties(tree: &Tree) -> usize {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&id| matches!(tree[id].kind, NodeKind::Property(_)))
        .count()
}

/// `class A { <property> }` at line 3, followed by `class B { int y; }`, after `package p;`.
fn two_classes(modifiers: Modifiers, primitive: Primitive) -> Tree {
    let mut tree = Tree::new();
    let mut b = Builder::new(&mut tree);

    let package = b.package(p(1, 1), "p");

    let property = {
        let ty = b.primitive(p(4, 5), primitive);
        let name = b.ident(p(4, 9), "x");
        let get = b.getter(p(4, 13), None, None);
        let set = b.setter(p(4, 18), None, None);

        b.property(
            p(4, 5),
            modifiers,
            ty,
            name,
            p(4, 11),
            None,
            get,
            set,
            p(4, 23),
        )
    };
    let a = {
        let name = b.ident(p(3, 7), "A");

        b.class(
            p(3, 1),
            Modifiers::default(),
            name,
            p(3, 9),
            vec![property],
            p(5, 1),
        )
    };

    let field = {
        let ty = b.primitive(p(7, 5), Primitive::Int);
        let name = b.ident(p(7, 9), "y");
        let var = b.var(name, None);

        b.field(p(7, 5), Modifiers::default(), ty, vec![var])
    };
    let class_b = {
        let name = b.ident(p(6, 7), "B");

        b.class(
            p(6, 1),
            Modifiers::default(),
            name,
            p(6, 9),
            vec![field],
            p(8, 1),
        )
    };

    b.unit(Some(package), vec![], vec![a, class_b]);

    tree
}

#[test]
fn lowers_demo() {
    let mut demo = demo();
    let lowered = lower(&mut demo.tree, &LowerOptions::default()).unwrap();

    assert_eq!(lowered.properties, ["property", "count"]);
    assert_eq!(lowered.members.len(), 2);
    assert_eq!(lowered.accesses.len(), 4);
    assert!(lowered.import.is_some());

    assert_eq!(count_properties(&demo.tree), 0);
    assert!(!demo.tree.contains(demo.property));
    assert!(!demo.tree.contains(demo.count));
    assert!(demo.tree.check_parents().is_empty());

    assert_eq!(print(&demo.tree).text, fixture::lowered_text());
}

#[test]
fn appends_members_in_declaration_order() {
    let mut demo = demo();
    let lowered = lower(&mut demo.tree, &LowerOptions::default()).unwrap();

    let NodeKind::Class(class) = &demo.tree[demo.class].kind else {
        panic!("not a class");
    };

    let property = lowered.members[0];
    let count = lowered.members[1];
    let mut expected = vec![class.members[0], demo.main];
    expected.extend([property.backing, property.observer, property.setter, property.getter]);
    expected.extend([count.backing, count.observer, count.setter, count.getter]);

    assert_eq!(class.members, expected);
}

#[test]
fn keeps_explicit_accessor_bodies() {
    let mut demo = demo();
    let lowered = lower(&mut demo.tree, &LowerOptions::default()).unwrap();
    let members = lowered.members[0];

    let body = |id: NodeId| match &demo.tree[id].kind {
        NodeKind::Method(method) => method.body,
        _ => None,
    };

    assert_eq!(body(members.getter), Some(demo.get_body));
    assert_eq!(body(members.setter), Some(demo.set_body));

    insta::assert_snapshot!(
        render(&demo.tree, members.setter),
        @"private void setProperty(String value) { _property = value; }"
    );
    insta::assert_snapshot!(
        render(&demo.tree, members.getter),
        @"public String getProperty() { return _property; }"
    );
}

#[test]
fn synthesizes_default_accessors() {
    let mut demo = demo();
    let lowered = lower(&mut demo.tree, &LowerOptions::default()).unwrap();
    let members = lowered.members[1];

    insta::assert_snapshot!(render(&demo.tree, members.backing), @"private int _count = 0;");
    insta::assert_snapshot!(
        render(&demo.tree, members.observer),
        @"public PropertyObserver<Integer> countObserver;"
    );
    insta::assert_snapshot!(
        render(&demo.tree, members.setter),
        @"public void setCount(int value) { if (countObserver != null) countObserver.changed(_count, value); _count = value; }"
    );
    insta::assert_snapshot!(
        render(&demo.tree, members.getter),
        @"public int getCount() { return _count; }"
    );
}

#[test]
fn lowering_twice_changes_nothing() {
    let mut demo = demo();
    lower(&mut demo.tree, &LowerOptions::default()).unwrap();
    let once = print(&demo.tree).text;
    let nodes = demo.tree.len();

    let again = lower(&mut demo.tree, &LowerOptions::default()).unwrap();

    assert!(again.properties.is_empty());
    assert!(again.import.is_none());
    assert_eq!(again.accesses.len(), 4);
    assert_eq!(demo.tree.len(), nodes);
    assert_eq!(print(&demo.tree).text, once);
}

#[test]
fn shifts_following_code() {
    let mut tree = two_classes(Modifiers::default(), Primitive::Int);
    lower(&mut tree, &LowerOptions::default()).unwrap();

    let expected = text(&[
        (1, "package p;"),
        (2, "import grande.PropertyObserver;"),
        (3, "class A {"),
        (5, "    private int _x;"),
        (6, "    public PropertyObserver<Integer> xObserver;"),
        (7, "    public void setX(int value) {"),
        (8, "        if (xObserver != null) xObserver.changed(_x, value);"),
        (9, "        _x = value;"),
        (10, "    }"),
        (11, "    public int getX() {"),
        (12, "        return _x;"),
        (13, "    }"),
        (14, "}"),
        (15, "class B {"),
        (16, "    int y;"),
        (17, "}"),
    ]);

    assert_eq!(print(&tree).text, expected);
    assert!(tree.check_parents().is_empty());
}

#[test]
fn propagates_static() {
    let mut tree = two_classes(Modifiers::default().with_static(), Primitive::Long);
    let lowered = lower(&mut tree, &LowerOptions::default()).unwrap();
    let members = lowered.members[0];

    insta::assert_snapshot!(render(&tree, members.backing), @"private static long _x;");
    insta::assert_snapshot!(
        render(&tree, members.observer),
        @"public static PropertyObserver<Long> xObserver;"
    );
    insta::assert_snapshot!(
        render(&tree, members.getter),
        @"public static long getX() { return _x; }"
    );
}

#[test]
fn boxes_primitive_observer_types() {
    let cases = [
        (Primitive::Boolean, "Boolean"),
        (Primitive::Char, "Character"),
        (Primitive::Byte, "Byte"),
        (Primitive::Short, "Short"),
        (Primitive::Int, "Integer"),
        (Primitive::Long, "Long"),
        (Primitive::Float, "Float"),
        (Primitive::Double, "Double"),
    ];

    for (primitive, boxed) in cases {
        let mut tree = two_classes(Modifiers::default(), primitive);
        let lowered = lower(&mut tree, &LowerOptions::default()).unwrap();

        assert_eq!(
            render(&tree, lowered.members[0].observer),
            format!("public PropertyObserver<{boxed}> xObserver;"),
        );
        assert_eq!(
            render(&tree, lowered.members[0].backing),
            format!("private {primitive} _x;"),
        );
    }
}

#[test]
fn removes_annotations() {
    let mut tree = Tree::new();
    let mut b = Builder::new(&mut tree);

    let annotation = b.annotation(p(2, 5), "Deprecated");
    let property = {
        let ty = b.primitive(p(2, 17), Primitive::Int);
        let name = b.ident(p(2, 21), "x");
        let get = b.getter(p(2, 25), None, None);
        let set = b.setter(p(2, 30), None, None);
        let mut modifiers = Modifiers::default();
        modifiers.annotations.push(annotation);

        b.property(
            p(2, 5),
            modifiers,
            ty,
            name,
            p(2, 23),
            None,
            get,
            set,
            p(2, 35),
        )
    };
    let class = {
        let name = b.ident(p(1, 7), "A");

        b.class(
            p(1, 1),
            Modifiers::default(),
            name,
            p(1, 9),
            vec![property],
            p(3, 1),
        )
    };
    b.unit(None, vec![], vec![class]);

    lower(&mut tree, &LowerOptions::default()).unwrap();

    assert!(!tree.contains(annotation));
    assert!(tree.check_parents().is_empty());
}

#[test]
fn import_placement() {
    // no blank line to spare between the package and the type
    let mut tree = two_classes(Modifiers::default(), Primitive::Int);
    for id in tree.unit().unwrap().types.clone() {
        tree.shift(id, -1, 0);
    }

    let lowered = lower(&mut tree, &LowerOptions::default()).unwrap();
    let import = lowered.import.unwrap();

    assert_eq!(tree[import].loc.begin(), Some(p(1, 12)));
    assert!(
        print(&tree)
            .text
            .starts_with("package p; import grande.PropertyObserver;\nclass A {\n")
    );
}

#[test]
fn skips_visible_observer() {
    for (package, import) in [("grande", None), ("p", Some(("grande", true)))] {
        let mut tree = two_classes(Modifiers::default(), Primitive::Int);
        let root = tree.root();

        let mut b = Builder::new(&mut tree);
        let package = b.package(p(1, 1), package);
        let imports = match import {
            Some((path, is_asterisk)) => vec![b.import(p(2, 1), path, false, is_asterisk)],
            None => vec![],
        };

        let unit = tree.unit_mut().unwrap();
        unit.package = Some(package);
        unit.imports = imports;
        tree.adopt(root);

        let lowered = lower(&mut tree, &LowerOptions::default()).unwrap();

        assert!(lowered.import.is_none());
        assert!(tree.unit().unwrap().imports.len() <= 1);
    }
}

#[test]
fn rejects_misplaced_property() {
    let mut demo = demo();
    let before = print(&demo.tree).text;

    // move `count` out of the class into the method body
    let NodeKind::Class(class) = &mut demo.tree[demo.class].kind else {
        panic!("not a class");
    };
    class.members.retain(|&id| id != demo.count);

    let NodeKind::Method(main) = &demo.tree[demo.main].kind else {
        panic!("not a method");
    };
    let body = main.body.unwrap();
    let NodeKind::Block(block) = &mut demo.tree[body].kind else {
        panic!("not a block");
    };
    block.stmts.push(demo.count);
    demo.tree.adopt(body);

    let moved = print(&demo.tree).text;
    let nodes = demo.tree.len();
    let err = lower(&mut demo.tree, &LowerOptions::default()).unwrap_err();

    assert!(matches!(err, LowerError::OutsideType { ref name, .. } if name == "count"));
    assert_eq!(err.to_string(), "property `count` at L15:5-L15:36 is not a member of a type");
    assert_eq!(demo.tree.len(), nodes);
    assert!(demo.tree.contains(demo.property));
    assert_ne!(moved, before);
    assert_eq!(print(&demo.tree).text, moved);
}

#[test]
fn reports_missing_unit() {
    let mut demo = demo();
    let root = demo.tree.root();

    // the class takes the place of the compilation unit
    let class = demo.tree.take_kind(demo.class).unwrap();
    demo.tree[root].kind = class;
    demo.tree.adopt(root);

    let err = lower(&mut demo.tree, &LowerOptions::default()).unwrap_err();

    assert_eq!(err, LowerError::MissingUnit);
    assert_eq!(count_properties(&demo.tree), 2);
}
