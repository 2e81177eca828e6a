use grande::ast::{Modifiers, Primitive};
use grande::build::Builder;
use grande::loc::{Pos, Span};
use grande::lower::{LowerOptions, lower};
use grande::print::{print, render};
use grande::Tree;

use crate::fixture::{self, ALLMAN, ALLMAN_PROPERTY_LINES, allman, demo, p};

#[test]
fn reproduces_parsed_layout() {
    let demo = demo();
    let printed = print(&demo.tree);

    assert_eq!(printed.text, fixture::SOURCE);
    assert_eq!(demo.tree.display().to_string(), fixture::SOURCE);
}

#[test]
fn reproduces_unconventional_spacing() {
    let source = r#"class A {
    int x=1;
    void m() {
        f ("a");
        A a = new A ();
        g(x,y);
    }
}
"#;

    let mut tree = Tree::new();
    let mut b = Builder::new(&mut tree);

    let field = {
        let ty = b.primitive(p(2, 5), Primitive::Int);
        let name = b.ident(p(2, 9), "x");
        let init = b.int(p(2, 11), "1");
        let var = b.var(name, Some(init));

        b.field(p(2, 5), Modifiers::default(), ty, vec![var])
    };
    let call = {
        let arg = b.string(p(4, 12), "a");
        let call = b.call(p(4, 9), "f", vec![arg]);

        b.expr_stmt(call)
    };
    let local = {
        let ty = b.class_ty(p(5, 9), "A");
        let name = b.ident(p(5, 11), "a");
        let created = b.class_ty(p(5, 19), "A");
        let init = b.new_object(p(5, 15), created, vec![]);
        let init = b.close_at(init, p(5, 22));
        let var = b.var(name, Some(init));
        let decl = b.local_var(ty, vec![var]);

        b.expr_stmt(decl)
    };
    let pair = {
        let x = b.name(p(6, 11), "x");
        let y = b.name(p(6, 13), "y");
        let call = b.call(p(6, 9), "g", vec![x, y]);

        b.expr_stmt(call)
    };
    let method = {
        let ret_ty = b.void_ty(p(3, 5));
        let name = b.ident(p(3, 10), "m");
        let body = b.block(p(3, 14), vec![call, local, pair], p(7, 5));

        b.method(p(3, 5), Modifiers::default(), ret_ty, name, vec![], Some(body))
    };
    let class = {
        let name = b.ident(p(1, 7), "A");

        b.class(
            p(1, 1),
            Modifiers::default(),
            name,
            p(1, 9),
            vec![field, method],
            p(8, 1),
        )
    };
    b.unit(None, vec![], vec![class]);

    assert_eq!(print(&tree).text, source);
}

#[test]
fn reproduces_allman_layout() {
    let tree = allman();

    assert_eq!(print(&tree).text, ALLMAN);
    assert!(tree.check_parents().is_empty());
}

#[test]
fn lowering_keeps_leading_text() {
    let mut tree = allman();
    let options = LowerOptions {
        observer_package: "demo".into(),
        ..Default::default()
    };
    let lowered = lower(&mut tree, &options).unwrap();
    assert!(lowered.import.is_none());

    let printed = print(&tree);
    let first = printed.layout[lowered.members[0].backing].begin.line;
    assert_eq!(first, 33);

    let lines = printed.text.lines().zip(ALLMAN.lines()).take(first as usize - 1);

    for (nr, (line, original)) in (1..).zip(lines) {
        if ALLMAN_PROPERTY_LINES.iter().any(|range| range.contains(&nr)) {
            assert_eq!(line, "", "line {nr}");
        } else {
            assert_eq!(line, original, "line {nr}");
        }
    }

    insta::assert_snapshot!(render(&tree, lowered.members[1].backing), @"private int _defaultProp = 0;");
}

#[test]
fn records_layout() {
    let mut demo = demo();
    let lowered = lower(&mut demo.tree, &LowerOptions::default()).unwrap();
    let printed = print(&demo.tree);

    assert_eq!(
        printed.layout.get(demo.main),
        Some(&Span::new(p(17, 5), p(22, 6)))
    );
    assert_eq!(
        printed.layout.get(lowered.members[1].getter),
        Some(&Span::new(p(37, 5), p(39, 6)))
    );
    assert_eq!(
        printed.layout.get(demo.write),
        Some(&Span::new(p(19, 9), p(19, 22)))
    );

    // synthesized nodes are recorded where they ended up
    assert_eq!(
        printed.layout.get(lowered.import.unwrap()),
        Some(&Span::new(p(2, 1), p(2, 32)))
    );
}

#[test]
fn prints_passed_nodes_at_cursor() {
    let mut tree = Tree::new();
    let mut b = Builder::new(&mut tree);

    // both fields claim line 2; the second one has to follow the first
    let first = {
        let ty = b.primitive(p(2, 5), Primitive::Int);
        let name = b.ident(p(2, 9), "a");
        let var = b.var(name, None);

        b.field(p(2, 5), Modifiers::default(), ty, vec![var])
    };
    let second = {
        let ty = b.primitive(p(2, 5), Primitive::Int);
        let name = b.ident(p(2, 9), "b");
        let var = b.var(name, None);

        b.field(p(2, 5), Modifiers::default(), ty, vec![var])
    };
    let class = {
        let name = b.ident(p(1, 7), "A");

        b.class(
            p(1, 1),
            Modifiers::default(),
            name,
            p(1, 9),
            vec![first, second],
            p(3, 1),
        )
    };
    b.unit(None, vec![], vec![class]);

    let printed = print(&tree);

    assert_eq!(printed.text, "class A {\n    int a; int b;\n}\n");
    assert_eq!(
        printed.layout.get(second),
        Some(&Span::new(Pos::new(2, 12), Pos::new(2, 18)))
    );
}

#[test]
fn renders_synthesized_subtrees() {
    let mut tree = Tree::new();
    let mut b = Builder::new(&mut tree);

    let this = b.this(p(1, 1));
    let scope = b.field_access(this, "items");
    let index = b.int(p(1, 12), "0");
    let item = b.index(scope, index);
    let call = b.method_call(item, "size", vec![]);

    tree.erase_locs(call);

    insta::assert_snapshot!(render(&tree, call), @"this.items[0].size()");
}
