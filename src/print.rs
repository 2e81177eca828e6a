//! Printing a tree back as source text.
//!
//! The printer keeps a cursor and moves it forward to the position of every node it prints,
//! emitting newlines and spaces as needed, so that untouched code lands on exactly the line and
//! column it was parsed from. The cursor never moves back: a node whose position has already been
//! passed (synthetic glue, or a node moved away from its original place) is printed right where
//! the cursor is.
//!
//! Tokens that don't correspond to a node of their own (keywords, operators, punctuation) are
//! written as glue. Between two positioned neighbours on one line, glue takes up exactly the
//! columns the neighbours leave between them, so `x=1` and `f ("a")` print back as they were.
//! Anywhere else it gets conventional spacing: `a = b`, `f(x, y)`, `if (c) s`.

use std::fmt::{self, Display};

use slotmap::SecondaryMap;

use crate::ast::{Accessor, Modifiers, Node, NodeKind};
use crate::loc::{Loc, Pos, Span};
use crate::naming::is_ident_char;
use crate::{NodeId, Tree};

/// Where each node's text actually ended up in the printed output.
pub type Layout = SecondaryMap<NodeId, Span>;

/// The result of printing a tree.
#[derive(Debug, Clone)]
pub struct Printed {
    pub text: String,
    pub layout: Layout,
}

/// Prints the whole tree, honoring node positions.
pub fn print(tree: &Tree) -> Printed {
    let mut printer = Printer::new(tree, true);
    printer.node(tree.root());

    if !printer.out.is_empty() && !printer.out.ends_with('\n') {
        printer.out.push('\n');
    }

    Printed {
        text: printer.out,
        layout: printer.layout,
    }
}

/// Prints a single subtree on one line, ignoring node positions.
pub fn render(tree: &Tree, id: NodeId) -> String {
    let mut printer = Printer::new(tree, false);
    printer.node(id);

    printer.out
}

impl Tree {
    /// Returns an object that implements [Display] to print the tree as source text.
    pub fn display(&self) -> TreeDisplay<'_> {
        TreeDisplay { tree: self }
    }
}

/// A helper struct that writes the [Tree] out as source text.
#[derive(Debug, Clone, Copy)]
pub struct TreeDisplay<'a> {
    tree: &'a Tree,
}

impl Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print(self.tree).text)
    }
}

struct Printer<'a> {
    tree: &'a Tree,
    positioned: bool,
    out: String,
    line: u32,
    col: u32,
    last: Option<char>,

    /// Nodes that were entered but haven't written anything yet.
    pending: Vec<NodeId>,
    starts: SecondaryMap<NodeId, Pos>,
    layout: Layout,
}

impl<'a> Printer<'a> {
    fn new(tree: &'a Tree, positioned: bool) -> Self {
        Self {
            tree,
            positioned,
            out: String::new(),
            line: 1,
            col: 1,
            last: None,
            pending: vec![],
            starts: SecondaryMap::new(),
            layout: SecondaryMap::new(),
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn begin(&self, id: NodeId) -> Option<Pos> {
        self.tree.get(id)?.loc.begin()
    }

    fn end(&self, id: NodeId) -> Option<Pos> {
        self.tree.get(id)?.loc.end()
    }

    /// Advances the cursor to `at` if it lies ahead.
    fn goto(&mut self, at: Option<Pos>) {
        let Some(at) = at.filter(|_| self.positioned) else {
            return;
        };

        if at.line > self.line {
            for _ in self.line..at.line {
                self.out.push('\n');
            }

            self.line = at.line;
            self.col = 1;
            self.last = Some('\n');
        }

        if at.line == self.line && at.col > self.col {
            for _ in self.col..at.col {
                self.out.push(' ');
            }

            self.col = at.col;
            self.last = Some(' ');
        }
    }

    fn write(&mut self, text: &str) {
        let Some(first) = text.chars().next() else {
            return;
        };

        if self.last.is_some_and(is_ident_char) && is_ident_char(first) {
            self.out.push(' ');
            self.col += 1;
        }

        let start = self.pos();

        for id in self.pending.drain(..) {
            self.starts.insert(id, start);
        }

        self.out.push_str(text);
        self.col += text.chars().count() as u32;
        self.last = text.chars().last();
    }

    fn space(&mut self) {
        self.out.push(' ');
        self.col += 1;
        self.last = Some(' ');
    }

    fn write_at(&mut self, text: &str, at: Option<Pos>) {
        self.goto(at);
        self.write(text);
    }

    /// Writes a separating space unless the next token is positioned ahead of the cursor.
    fn sep(&mut self, next: Option<Pos>) {
        if matches!(self.last, None | Some(' ' | '\n')) {
            return;
        }

        match next.filter(|_| self.positioned) {
            Some(next) if next >= self.pos() => {}
            _ => self.space(),
        }
    }

    /// Writes glue between a node ending at `prev` and one starting at `next`.
    ///
    /// `text` is the glue with its conventional padding, such as `" = "` or `", "`. When both
    /// neighbours are on one line with room for the token between them, the gap is reproduced
    /// column for column: one space goes before the token unless it is only padded on the right,
    /// and the rest follows it. A missing `prev` stands for the cursor.
    fn glue(&mut self, text: &str, prev: Option<Pos>, next: Option<Pos>) {
        let token = text.trim();
        let width = token.chars().count() as u32;
        let prev = prev.unwrap_or(self.pos());

        match next.filter(|_| self.positioned) {
            Some(next) if next.line == prev.line && next.col >= prev.col + width => {
                let gap = next.col - prev.col - width;
                let lead = gap > 0 && (text.starts_with(' ') || !text.ends_with(' '));

                if lead {
                    self.space();
                }

                self.write(token);

                for _ in 0..gap - u32::from(lead) {
                    self.space();
                }
            }

            Some(next) if next.line > prev.line && next > self.pos() => {
                self.write(text.trim_end())
            }

            _ => self.write(text),
        }
    }

    /// Writes `(`, the arguments and `)` of a call whose callee ends at `callee`.
    fn args(&mut self, args: &[NodeId], callee: Option<Pos>, end: Option<Pos>) {
        match args.first() {
            Some(&first) => {
                self.glue("(", callee, self.begin(first));
                self.list(args, ", ");
                self.closing(")", end);
            }

            None => self.closing("()", end),
        }
    }

    /// Writes `(` and the parameters of a declaration named `name`, followed by `)`.
    fn params(&mut self, params: &[NodeId], name: Loc) {
        if let Some(&first) = params.first() {
            self.glue("(", name.end(), self.begin(first));
        } else {
            self.write("(");
        }

        self.list(params, ", ");
        self.write(")");
    }

    /// Writes a closing token so that it ends at `end`.
    fn closing(&mut self, text: &str, end: Option<Pos>) {
        let width = text.chars().count() as u32;
        let at = end.map(|end| Pos::new(end.line, end.col.saturating_sub(width)));

        if text == "}" {
            self.sep(at);
        }

        self.write_at(text, at);
    }

    fn list(&mut self, ids: &[NodeId], separator: &str) {
        for (idx, &id) in ids.iter().enumerate() {
            if idx > 0 {
                self.glue(separator, self.end(ids[idx - 1]), self.begin(id));
            }

            self.node(id);
        }
    }

    fn node(&mut self, id: NodeId) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            return;
        };

        self.goto(node.loc.begin());
        self.pending.push(id);
        self.kind(node);
        self.pending.retain(|&pending| pending != id);

        if let Some(&start) = self.starts.get(id) {
            self.layout.insert(id, Span::new(start, self.pos()));
        }
    }

    /// Prints annotations and keyword modifiers. Returns `true` if anything was written.
    fn modifiers(&mut self, modifiers: &Modifiers) -> bool {
        for &annotation in &modifiers.annotations {
            self.node(annotation);
        }

        if !modifiers.annotations.is_empty() && !modifiers.is_empty() {
            self.sep(None);
        }

        if let Some(visibility) = modifiers.visibility {
            self.write(&visibility.to_string());
        }

        if modifiers.is_abstract {
            self.write("abstract");
        }

        if modifiers.is_static {
            self.write("static");
        }

        if modifiers.is_final {
            self.write("final");
        }

        !modifiers.annotations.is_empty() || !modifiers.is_empty()
    }

    fn name(&mut self, name: &str, loc: Loc) {
        self.write_at(name, loc.begin());
    }

    fn type_params(&mut self, params: &[String]) {
        if !params.is_empty() {
            self.write(&format!("<{}>", params.join(", ")));
        }
    }

    fn accessor(&mut self, accessor: &Accessor, keyword: &str) {
        self.sep(accessor.loc.begin());
        self.goto(accessor.loc.begin());

        if let Some(visibility) = accessor.visibility {
            self.write(&visibility.to_string());
        }

        self.write(keyword);

        match accessor.body {
            Some(body) => {
                self.sep(self.begin(body));
                self.node(body);
            }

            None => self.write(";"),
        }
    }

    fn kind(&mut self, node: &Node) {
        let end = node.loc.end();

        match &node.kind {
            NodeKind::Dummy => {}

            NodeKind::CompilationUnit(n) => {
                let items = n.package.iter().chain(&n.imports).chain(&n.types);

                for (idx, &item) in items.enumerate() {
                    if idx > 0 {
                        self.sep(self.begin(item));
                    }

                    self.node(item);
                }
            }

            NodeKind::Package(n) => {
                self.write(&format!("package {}", n.path));
                self.closing(";", end);
            }

            NodeKind::Import(n) => {
                self.write("import");

                if n.is_static {
                    self.write(" static");
                }

                self.write(&format!(" {}", n.path));

                if n.is_asterisk {
                    self.write(".*");
                }

                self.closing(";", end);
            }

            NodeKind::Annotation(n) => {
                self.write(&format!("@{}", n.name));

                if !n.args.is_empty() {
                    self.write("(");
                    self.list(&n.args, ", ");
                    self.write(")");
                }
            }

            NodeKind::Class(n) => {
                if self.modifiers(&n.modifiers) {
                    self.sep(None);
                }

                self.write(if n.is_interface { "interface" } else { "class" });
                self.sep(n.name.loc.begin());
                self.name(&n.name.name, n.name.loc);
                self.type_params(&n.type_params);

                if !n.extends.is_empty() {
                    self.write(" extends ");
                    self.list(&n.extends, ", ");
                }

                if !n.implements.is_empty() {
                    self.write(" implements ");
                    self.list(&n.implements, ", ");
                }

                self.sep(n.lbrace.begin());
                self.write_at("{", n.lbrace.begin());

                for &member in &n.members {
                    self.sep(self.begin(member));
                    self.node(member);
                }

                self.closing("}", end);
            }

            NodeKind::Field(n) => {
                if self.modifiers(&n.modifiers) {
                    self.sep(self.begin(n.ty));
                }

                self.node(n.ty);

                if let Some(&first) = n.vars.first() {
                    self.sep(self.begin(first));
                }

                self.list(&n.vars, ", ");
                self.closing(";", end);
            }

            NodeKind::Var(n) => {
                self.name(&n.name.name, n.name.loc);

                if let Some(init) = n.init {
                    self.glue(" = ", n.name.loc.end(), self.begin(init));
                    self.node(init);
                }
            }

            NodeKind::Method(n) => {
                let mut printed = self.modifiers(&n.modifiers);

                if !n.type_params.is_empty() {
                    if printed {
                        self.sep(None);
                    }

                    self.type_params(&n.type_params);
                    printed = true;
                }

                if printed {
                    self.sep(self.begin(n.ret_ty));
                }

                self.node(n.ret_ty);
                self.sep(n.name.loc.begin());
                self.name(&n.name.name, n.name.loc);
                self.params(&n.params, n.name.loc);

                if !n.throws.is_empty() {
                    self.write(" throws ");
                    self.list(&n.throws, ", ");
                }

                match n.body {
                    Some(body) => {
                        self.sep(self.begin(body));
                        self.node(body);
                    }

                    None => self.closing(";", end),
                }
            }

            NodeKind::Constructor(n) => {
                if self.modifiers(&n.modifiers) {
                    self.sep(n.name.loc.begin());
                }

                self.name(&n.name.name, n.name.loc);
                self.params(&n.params, n.name.loc);

                if !n.throws.is_empty() {
                    self.write(" throws ");
                    self.list(&n.throws, ", ");
                }

                self.sep(self.begin(n.body));
                self.node(n.body);
            }

            NodeKind::Param(n) => {
                if self.modifiers(&n.modifiers) {
                    self.sep(n.ty.and_then(|ty| self.begin(ty)));
                }

                if let Some(ty) = n.ty {
                    self.node(ty);

                    if n.is_var_args {
                        self.write("...");
                    }

                    self.sep(n.name.loc.begin());
                }

                self.name(&n.name.name, n.name.loc);
            }

            NodeKind::Initializer(n) => {
                if n.is_static {
                    self.write("static");
                    self.sep(self.begin(n.body));
                }

                self.node(n.body);
            }

            NodeKind::Property(n) => {
                if self.modifiers(&n.modifiers) {
                    self.sep(self.begin(n.ty));
                }

                self.node(n.ty);
                self.sep(n.name.loc.begin());
                self.name(&n.name.name, n.name.loc);
                self.sep(n.lbrace.begin());
                self.write_at("{", n.lbrace.begin());
                self.accessor(&n.get, "get");
                self.accessor(&n.set, "set");

                if let Some(default) = n.default {
                    self.sep(None);
                    self.write("def");
                    self.glue(" = ", None, self.begin(default));
                    self.node(default);
                }

                self.closing("}", end);
            }

            NodeKind::PrimitiveTy(primitive) => self.write(&primitive.to_string()),

            NodeKind::ClassTy(n) => {
                if let Some(scope) = n.scope {
                    self.node(scope);
                    self.write(".");
                }

                self.write(&n.name);

                if !n.type_args.is_empty() {
                    self.write("<");
                    self.list(&n.type_args, ", ");
                    self.write(">");
                }
            }

            NodeKind::ArrayTy(n) => {
                self.node(n.elem);
                self.write(&"[]".repeat(n.dims as usize));
            }

            NodeKind::VoidTy => self.write("void"),

            NodeKind::Block(n) => {
                self.write("{");

                for &stmt in &n.stmts {
                    self.sep(self.begin(stmt));
                    self.node(stmt);
                }

                self.closing("}", end);
            }

            NodeKind::ExprStmt(n) => {
                self.node(n.expr);
                self.closing(";", end);
            }

            NodeKind::LocalVar(n) => {
                if self.modifiers(&n.modifiers) {
                    self.sep(self.begin(n.ty));
                }

                self.node(n.ty);

                if let Some(&first) = n.vars.first() {
                    self.sep(self.begin(first));
                }

                self.list(&n.vars, ", ");
            }

            NodeKind::If(n) => {
                self.write("if");
                self.glue(" (", keyword_end(node, "if"), self.begin(n.cond));
                self.node(n.cond);
                self.write(")");
                self.sep(self.begin(n.then));
                self.node(n.then);

                if let Some(otherwise) = n.otherwise {
                    self.sep(None);
                    self.write("else");
                    self.sep(self.begin(otherwise));
                    self.node(otherwise);
                }
            }

            NodeKind::While(n) => {
                self.write("while");
                self.glue(" (", keyword_end(node, "while"), self.begin(n.cond));
                self.node(n.cond);
                self.write(")");
                self.sep(self.begin(n.body));
                self.node(n.body);
            }

            NodeKind::For(n) => {
                let first = n.init.first().copied().or(n.cond);
                let next = first.and_then(|id| self.begin(id));

                self.write("for");
                self.glue(" (", keyword_end(node, "for"), next);
                self.list(&n.init, ", ");
                self.write(";");

                if let Some(cond) = n.cond {
                    self.sep(self.begin(cond));
                    self.node(cond);
                }

                self.write(";");

                if let Some(&first) = n.update.first() {
                    self.sep(self.begin(first));
                    self.list(&n.update, ", ");
                }

                self.write(")");
                self.sep(self.begin(n.body));
                self.node(n.body);
            }

            NodeKind::Return(n) => {
                self.write("return");

                if let Some(expr) = n.expr {
                    self.sep(self.begin(expr));
                    self.node(expr);
                }

                self.closing(";", end);
            }

            NodeKind::Throw(n) => {
                self.write("throw");
                self.sep(self.begin(n.expr));
                self.node(n.expr);
                self.closing(";", end);
            }

            NodeKind::Empty => self.closing(";", end),

            NodeKind::Name(n) => self.write(&n.name),

            NodeKind::FieldAccess(n) => {
                self.node(n.scope);
                self.write_at(".", before(n.member.loc));
                self.name(&n.member.name, n.member.loc);
            }

            NodeKind::Call(n) => {
                if let Some(scope) = n.scope {
                    self.node(scope);
                    self.write_at(".", before(n.name.loc));
                }

                self.name(&n.name.name, n.name.loc);
                self.args(&n.args, n.name.loc.end(), end);
            }

            NodeKind::Assign(n) => {
                let op = format!(" {} ", n.op);

                self.node(n.target);
                self.glue(&op, self.end(n.target), self.begin(n.value));
                self.node(n.value);
            }

            NodeKind::Binary(n) => {
                let op = format!(" {} ", n.op);

                self.node(n.left);
                self.glue(&op, self.end(n.left), self.begin(n.right));
                self.node(n.right);
            }

            NodeKind::Unary(n) if n.op.is_postfix() => {
                self.node(n.expr);
                self.write(&n.op.to_string());
            }

            NodeKind::Unary(n) => {
                self.write(&n.op.to_string());
                self.node(n.expr);
            }

            NodeKind::Literal(literal) => self.write(&literal.text()),

            NodeKind::This => self.write("this"),

            NodeKind::New(n) => {
                self.write("new");
                self.sep(self.begin(n.ty));
                self.node(n.ty);
                self.args(&n.args, self.end(n.ty), end);
            }

            NodeKind::Paren(n) => {
                self.write("(");
                self.node(n.inner);
                self.closing(")", end);
            }

            NodeKind::Lambda(n) => {
                let mut params_end = n.params.last().and_then(|&last| self.end(last));

                if n.parenthesized {
                    self.write("(");
                    self.list(&n.params, ", ");
                    self.write(")");
                    params_end = params_end.map(|end| end.right(1));
                } else {
                    self.list(&n.params, ", ");
                }

                self.glue(" -> ", params_end, self.begin(n.body));
                self.node(n.body);
            }

            NodeKind::Conditional(n) => {
                self.node(n.cond);
                self.glue(" ? ", self.end(n.cond), self.begin(n.then));
                self.node(n.then);
                self.glue(" : ", self.end(n.then), self.begin(n.otherwise));
                self.node(n.otherwise);
            }

            NodeKind::Cast(n) => {
                self.write("(");
                self.node(n.ty);
                self.write(")");
                self.sep(self.begin(n.expr));
                self.node(n.expr);
            }

            NodeKind::Index(n) => {
                self.node(n.array);
                self.glue("[", self.end(n.array), self.begin(n.index));
                self.node(n.index);
                self.closing("]", end);
            }
        }
    }
}

/// The column right before `loc`, where a `.` in front of a member name goes.
fn before(loc: Loc) -> Option<Pos> {
    loc.begin()
        .filter(|begin| begin.col > 1)
        .map(|begin| Pos::new(begin.line, begin.col - 1))
}

fn keyword_end(node: &Node, keyword: &str) -> Option<Pos> {
    node.loc
        .begin()
        .map(|begin| begin.right(keyword.chars().count() as u32))
}
