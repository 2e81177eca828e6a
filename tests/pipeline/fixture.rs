use grande::ast::{AssignOp, BinaryOp, Modifiers, Primitive, Visibility};
use grande::build::Builder;
use grande::loc::Pos;
use grande::{NodeId, Tree};

pub const SOURCE: &str = r#"package demo;

public class Test {
    public String field = "set";

    String property {
        public get {
            return _property;
        }
        private set {
            _property = value;
        }
    }

    int count { get; set; def = 0 }

    public static void main(String[] argv) {
        Test test = new Test();
        test.property = "test";
        System.out.println(test.count);
        test.count += 2;
    }
}
"#;

pub const UNIT: &str = "demo/Test.java";

pub fn p(line: u32, col: u32) -> Pos {
    Pos::new(line, col)
}

/// Assembles text from numbered lines, leaving the missing ones blank.
pub fn text(lines: &[(u32, &str)]) -> String {
    let count = lines.iter().map(|&(nr, _)| nr).max().unwrap_or(0) as usize;
    let mut result = vec![""; count];

    for &(nr, line) in lines {
        result[nr as usize - 1] = line;
    }

    result.join("\n") + "\n"
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The tree of [`SOURCE`], as the parser would hand it over.
pub struct Demo {
    pub tree: Tree,
    pub class: NodeId,
    pub property: NodeId,
    pub count: NodeId,
    pub main: NodeId,

    /// The explicit bodies of `property`'s accessors.
    pub get_body: NodeId,
    pub set_body: NodeId,

    /// `test.property` in `test.property = "test";`
    pub write: NodeId,

    /// `test.count` in `System.out.println(test.count);`
    pub read: NodeId,

    /// `test.count` in `test.count += 2;`
    pub compound: NodeId,
}

pub fn demo() -> Demo {
    let mut tree = Tree::new();
    let mut b = Builder::new(&mut tree);

    let package = b.package(p(1, 1), "demo");

    let field = {
        let ty = b.class_ty(p(4, 12), "String");
        let name = b.ident(p(4, 19), "field");
        let init = b.string(p(4, 27), "set");
        let var = b.var(name, Some(init));

        b.field(p(4, 5), Modifiers::public(), ty, vec![var])
    };

    let get_body = {
        let value = b.name(p(8, 20), "_property");
        let ret = b.ret(p(8, 13), Some(value));

        b.block(p(7, 20), vec![ret], p(9, 9))
    };

    let set_body = {
        let target = b.name(p(11, 13), "_property");
        let value = b.name(p(11, 25), "value");
        let assign = b.assign(target, AssignOp::Assign, value);
        let stmt = b.expr_stmt(assign);

        b.block(p(10, 21), vec![stmt], p(12, 9))
    };

    let property = {
        let ty = b.class_ty(p(6, 5), "String");
        let name = b.ident(p(6, 12), "property");
        let get = b.getter(p(7, 9), Some(Visibility::Public), Some(get_body));
        let set = b.setter(p(10, 9), Some(Visibility::Private), Some(set_body));

        b.property(
            p(6, 5),
            Modifiers::default(),
            ty,
            name,
            p(6, 21),
            None,
            get,
            set,
            p(13, 5),
        )
    };

    let count = {
        let ty = b.primitive(p(15, 5), Primitive::Int);
        let name = b.ident(p(15, 9), "count");
        let default = b.int(p(15, 33), "0");
        let get = b.getter(p(15, 17), None, None);
        let set = b.setter(p(15, 22), None, None);

        b.property(
            p(15, 5),
            Modifiers::default(),
            ty,
            name,
            p(15, 15),
            Some(default),
            get,
            set,
            p(15, 35),
        )
    };

    let local = {
        let ty = b.class_ty(p(18, 9), "Test");
        let name = b.ident(p(18, 14), "test");
        let created = b.class_ty(p(18, 25), "Test");
        let init = b.new_object(p(18, 21), created, vec![]);
        let var = b.var(name, Some(init));
        let decl = b.local_var(ty, vec![var]);

        b.expr_stmt(decl)
    };

    let (assign_stmt, write) = {
        let scope = b.name(p(19, 9), "test");
        let access = b.field_access(scope, "property");
        let value = b.string(p(19, 25), "test");
        let assign = b.assign(access, AssignOp::Assign, value);

        (b.expr_stmt(assign), access)
    };

    let (print_stmt, read) = {
        let system = b.name(p(20, 9), "System");
        let out = b.field_access(system, "out");
        let scope = b.name(p(20, 28), "test");
        let access = b.field_access(scope, "count");
        let call = b.method_call(out, "println", vec![access]);

        (b.expr_stmt(call), access)
    };

    let (compound_stmt, compound) = {
        let scope = b.name(p(21, 9), "test");
        let access = b.field_access(scope, "count");
        let value = b.int(p(21, 23), "2");
        let assign = b.assign(access, AssignOp::Add, value);

        (b.expr_stmt(assign), access)
    };

    let main = {
        let ret_ty = b.void_ty(p(17, 19));
        let name = b.ident(p(17, 24), "main");
        let elem = b.class_ty(p(17, 29), "String");
        let ty = b.array_ty(elem, 1);
        let argv = b.ident(p(17, 38), "argv");
        let param = b.param(ty, argv);
        let body = b.block(
            p(17, 44),
            vec![local, assign_stmt, print_stmt, compound_stmt],
            p(22, 5),
        );

        b.method(
            p(17, 5),
            Modifiers::public().with_static(),
            ret_ty,
            name,
            vec![param],
            Some(body),
        )
    };

    let class = {
        let name = b.ident(p(3, 14), "Test");

        b.class(
            p(3, 1),
            Modifiers::public(),
            name,
            p(3, 19),
            vec![field, property, count, main],
            p(23, 1),
        )
    };

    b.unit(Some(package), vec![], vec![class]);

    Demo {
        tree,
        class,
        property,
        count,
        main,
        get_body,
        set_body,
        write,
        read,
        compound,
    }
}

/// The expected text of [`SOURCE`] after lowering.
pub fn lowered_text() -> String {
    text(&[
        (1, "package demo;"),
        (2, "import grande.PropertyObserver;"),
        (3, "public class Test {"),
        (4, r#"    public String field = "set";"#),
        (17, "    public static void main(String[] argv) {"),
        (18, "        Test test = new Test();"),
        (19, r#"        test.property = "test";"#),
        (20, "        System.out.println(test.count);"),
        (21, "        test.count += 2;"),
        (22, "    }"),
        (23, "    private String _property;"),
        (24, "    public PropertyObserver<String> propertyObserver;"),
        (25, "    private void setProperty(String value) {"),
        (26, "        _property = value;"),
        (27, "    }"),
        (28, "    public String getProperty() {"),
        (29, "        return _property;"),
        (30, "    }"),
        (31, "    private int _count = 0;"),
        (32, "    public PropertyObserver<Integer> countObserver;"),
        (33, "    public void setCount(int value) {"),
        (
            34,
            "        if (countObserver != null) countObserver.changed(_count, value);",
        ),
        (35, "        _count = value;"),
        (36, "    }"),
        (37, "    public int getCount() {"),
        (38, "        return _count;"),
        (39, "    }"),
        (40, "}"),
    ])
}

/// The demo class laid out with braces on their own lines and a space before argument lists.
pub const ALLMAN: &str = r#"package demo;

public class Test
{
    public String field = "set";

    String property
    {
        public get
        {
            System.out.println ("getting property");
            return _property;
        }
        private set
        {
            System.out.println ("setting property");
            _property = value;
        }
    }

    int defaultProp { get; set; def = 0 }

    public static void main (String[] argv)
    {
        Test test = new Test ();
        test.property = "test";

        test.defaultPropObserver = (oldVal, newVal) ->
            System.out.println ("DefaultProp changed from "+oldVal+" to "+newVal);

        test.defaultProp = 1;
    }
}
"#;

/// The lines of [`ALLMAN`] taken up by property declarations.
pub const ALLMAN_PROPERTY_LINES: [std::ops::RangeInclusive<u32>; 2] = [7..=19, 21..=21];

/// `System.out.println ("<message>")` with `System` at `at`.
fn println(b: &mut Builder, at: Pos, message: &str) -> NodeId {
    let system = b.name(at, "System");
    let out = b.field_access(system, "out");
    let arg = b.string(at.right(20), message);

    b.method_call(out, "println", vec![arg])
}

/// The tree of [`ALLMAN`].
pub fn allman() -> Tree {
    let mut tree = Tree::new();
    let mut b = Builder::new(&mut tree);

    let package = b.package(p(1, 1), "demo");

    let field = {
        let ty = b.class_ty(p(5, 12), "String");
        let name = b.ident(p(5, 19), "field");
        let init = b.string(p(5, 27), "set");
        let var = b.var(name, Some(init));

        b.field(p(5, 5), Modifiers::public(), ty, vec![var])
    };

    let property = {
        let get_body = {
            let call = println(&mut b, p(11, 13), "getting property");
            let log = b.expr_stmt(call);
            let value = b.name(p(12, 20), "_property");
            let ret = b.ret(p(12, 13), Some(value));

            b.block(p(10, 9), vec![log, ret], p(13, 9))
        };
        let set_body = {
            let call = println(&mut b, p(16, 13), "setting property");
            let log = b.expr_stmt(call);
            let target = b.name(p(17, 13), "_property");
            let value = b.name(p(17, 25), "value");
            let assign = b.assign(target, AssignOp::Assign, value);
            let store = b.expr_stmt(assign);

            b.block(p(15, 9), vec![log, store], p(18, 9))
        };

        let ty = b.class_ty(p(7, 5), "String");
        let name = b.ident(p(7, 12), "property");
        let get = b.getter(p(9, 9), Some(Visibility::Public), Some(get_body));
        let set = b.setter(p(14, 9), Some(Visibility::Private), Some(set_body));

        b.property(
            p(7, 5),
            Modifiers::default(),
            ty,
            name,
            p(8, 5),
            None,
            get,
            set,
            p(19, 5),
        )
    };

    let default_prop = {
        let ty = b.primitive(p(21, 5), Primitive::Int);
        let name = b.ident(p(21, 9), "defaultProp");
        let default = b.int(p(21, 39), "0");
        let get = b.getter(p(21, 23), None, None);
        let set = b.setter(p(21, 28), None, None);

        b.property(
            p(21, 5),
            Modifiers::default(),
            ty,
            name,
            p(21, 21),
            Some(default),
            get,
            set,
            p(21, 41),
        )
    };

    let local = {
        let ty = b.class_ty(p(25, 9), "Test");
        let name = b.ident(p(25, 14), "test");
        let created = b.class_ty(p(25, 25), "Test");
        let init = b.new_object(p(25, 21), created, vec![]);
        let init = b.close_at(init, p(25, 31));
        let var = b.var(name, Some(init));
        let decl = b.local_var(ty, vec![var]);

        b.expr_stmt(decl)
    };

    let write = {
        let scope = b.name(p(26, 9), "test");
        let access = b.field_access(scope, "property");
        let value = b.string(p(26, 25), "test");
        let assign = b.assign(access, AssignOp::Assign, value);

        b.expr_stmt(assign)
    };

    let subscribe = {
        let scope = b.name(p(28, 9), "test");
        let access = b.field_access(scope, "defaultPropObserver");

        let old = b.ident(p(28, 37), "oldVal");
        let old = b.lambda_param(old);
        let new = b.ident(p(28, 45), "newVal");
        let new = b.lambda_param(new);

        let message = {
            let head = b.string(p(29, 33), "DefaultProp changed from ");
            let old = b.name(p(29, 61), "oldVal");
            let sum = b.binary(head, BinaryOp::Add, old);
            let to = b.string(p(29, 68), " to ");
            let sum = b.binary(sum, BinaryOp::Add, to);
            let new = b.name(p(29, 75), "newVal");

            b.binary(sum, BinaryOp::Add, new)
        };
        let system = b.name(p(29, 13), "System");
        let out = b.field_access(system, "out");
        let body = b.method_call(out, "println", vec![message]);

        let lambda = b.lambda(p(28, 36), vec![old, new], true, body);
        let assign = b.assign(access, AssignOp::Assign, lambda);

        b.expr_stmt(assign)
    };

    let update = {
        let scope = b.name(p(31, 9), "test");
        let access = b.field_access(scope, "defaultProp");
        let value = b.int(p(31, 28), "1");
        let assign = b.assign(access, AssignOp::Assign, value);

        b.expr_stmt(assign)
    };

    let main = {
        let ret_ty = b.void_ty(p(23, 19));
        let name = b.ident(p(23, 24), "main");
        let elem = b.class_ty(p(23, 30), "String");
        let ty = b.array_ty(elem, 1);
        let argv = b.ident(p(23, 39), "argv");
        let param = b.param(ty, argv);
        let body = b.block(
            p(24, 5),
            vec![local, write, subscribe, update],
            p(32, 5),
        );

        b.method(
            p(23, 5),
            Modifiers::public().with_static(),
            ret_ty,
            name,
            vec![param],
            Some(body),
        )
    };

    let class = {
        let name = b.ident(p(3, 14), "Test");

        b.class(
            p(3, 1),
            Modifiers::public(),
            name,
            p(4, 1),
            vec![field, property, default_prop, main],
            p(33, 1),
        )
    };

    b.unit(Some(package), vec![], vec![class]);

    tree
}
