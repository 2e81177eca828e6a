//! Constructing trees with source locations.
//!
//! The external parser hands over nodes with token positions. [`Builder`] takes the positions of
//! the leading tokens and derives every node's span from its children. Where a closing token
//! can't be derived that way, the span assumes it directly follows the last child (`f(x)`, `a()`);
//! [`Builder::close_at`] records it for layouts like `f (x )` or `new A ()`. A tree built this
//! way prints back to the exact text it describes.

use crate::ast::{
    Accessor, Annotation, ArrayTy, AssignExpr, AssignOp, BinaryExpr, BinaryOp, Block, CastExpr,
    ClassDecl, ClassTy, CompilationUnit, ConditionalExpr, ConstructorDecl, ExprStmt, FieldAccess,
    FieldDecl, ForStmt, Ident, IfStmt, ImportDecl, IndexExpr, InitializerDecl, LambdaExpr,
    Literal, LocalVar, MethodCall, MethodDecl, Modifiers, NameExpr, NewExpr, NodeKind,
    PackageDecl, Param, ParenExpr, Primitive, PropertyDecl, ReturnStmt, ThrowStmt, UnaryExpr,
    UnaryOp, VarDeclarator, Visibility, WhileStmt,
};
use crate::loc::{Loc, Pos, Span};
use crate::{NodeId, Tree};

fn len(text: &str) -> u32 {
    text.chars().count() as u32
}

/// A span from `begin` to `end` if both are known, a point at `begin` if only it is.
fn loc_between(begin: Option<Pos>, end: Option<Pos>) -> Loc {
    match (begin, end) {
        (Some(begin), Some(end)) => Span::new(begin, end).into(),
        (Some(begin), None) => begin.into(),
        _ => Loc::Synthetic,
    }
}

/// Allocates nodes in a [`Tree`], deriving their spans.
pub struct Builder<'a> {
    tree: &'a mut Tree,
}

impl<'a> Builder<'a> {
    pub fn new(tree: &'a mut Tree) -> Self {
        Self { tree }
    }

    pub fn tree(&mut self) -> &mut Tree {
        &mut *self.tree
    }

    /// Allocates a node with an explicit location.
    pub fn add(&mut self, loc: impl Into<Loc>, kind: impl Into<NodeKind>) -> NodeId {
        self.tree.add(loc, kind)
    }

    fn begin(&self, id: NodeId) -> Option<Pos> {
        self.tree.get(id)?.loc.begin()
    }

    fn end(&self, id: NodeId) -> Option<Pos> {
        self.tree.get(id)?.loc.end()
    }

    /// The end of the last node in `ids`, or `fallback` if there are none.
    fn end_of_list(&self, ids: &[NodeId], fallback: Option<Pos>) -> Option<Pos> {
        match ids.last() {
            Some(&last) => self.end(last),
            None => fallback,
        }
    }

    pub fn ident(&self, at: Pos, name: &str) -> Ident {
        Ident::new(Span::of_len(at, len(name)), name)
    }

    /// Sets the unit's header and top-level types.
    pub fn unit(&mut self, package: Option<NodeId>, imports: Vec<NodeId>, types: Vec<NodeId>) {
        let root = self.tree.root();
        let unit = CompilationUnit {
            package,
            imports,
            types,
        };

        if let Some(node) = self.tree.get_mut(root) {
            node.kind = unit.into();
        }

        self.tree.adopt(root);
    }

    /// `package a.b;`
    pub fn package(&mut self, at: Pos, path: &str) -> NodeId {
        let span = Span::of_len(at, len("package ") + len(path) + 1);

        self.add(span, PackageDecl { path: path.into() })
    }

    /// `import [static] a.b.C[.*];`
    pub fn import(&mut self, at: Pos, path: &str, is_static: bool, is_asterisk: bool) -> NodeId {
        let mut width = len("import ") + len(path) + 1;

        if is_static {
            width += len("static ");
        }

        if is_asterisk {
            width += len(".*");
        }

        let kind = ImportDecl {
            path: path.into(),
            is_static,
            is_asterisk,
        };

        self.add(Span::of_len(at, width), kind)
    }

    /// `@Name`
    pub fn annotation(&mut self, at: Pos, name: &str) -> NodeId {
        let kind = Annotation {
            name: name.into(),
            args: vec![],
        };

        self.add(Span::of_len(at, len(name) + 1), kind)
    }

    pub fn primitive(&mut self, at: Pos, primitive: Primitive) -> NodeId {
        self.add(Span::of_len(at, len(&primitive.to_string())), primitive)
    }

    pub fn class_ty(&mut self, at: Pos, name: &str) -> NodeId {
        let kind = ClassTy {
            scope: None,
            name: name.into(),
            type_args: vec![],
        };

        self.add(Span::of_len(at, len(name)), kind)
    }

    /// `Name<A, B>`
    pub fn generic_ty(&mut self, at: Pos, name: &str, type_args: Vec<NodeId>) -> NodeId {
        let open = at.right(len(name));
        let end = self
            .end_of_list(&type_args, Some(open.right(1)))
            .map(|end| end.right(1));
        let kind = ClassTy {
            scope: None,
            name: name.into(),
            type_args,
        };

        self.add(loc_between(Some(at), end), kind)
    }

    /// `elem[]...`
    pub fn array_ty(&mut self, elem: NodeId, dims: u32) -> NodeId {
        let loc = loc_between(
            self.begin(elem),
            self.end(elem).map(|end| end.right(2 * dims)),
        );

        self.add(loc, ArrayTy { elem, dims })
    }

    pub fn void_ty(&mut self, at: Pos) -> NodeId {
        self.add(Span::of_len(at, len("void")), NodeKind::VoidTy)
    }

    pub fn name(&mut self, at: Pos, name: &str) -> NodeId {
        self.add(Span::of_len(at, len(name)), NameExpr { name: name.into() })
    }

    pub fn this(&mut self, at: Pos) -> NodeId {
        self.add(Span::of_len(at, len("this")), NodeKind::This)
    }

    pub fn literal(&mut self, at: Pos, literal: Literal) -> NodeId {
        self.add(Span::of_len(at, len(&literal.text())), literal)
    }

    /// A string literal; `value` is the text between the quotes.
    pub fn string(&mut self, at: Pos, value: &str) -> NodeId {
        self.literal(at, Literal::Str(value.into()))
    }

    pub fn int(&mut self, at: Pos, value: &str) -> NodeId {
        self.literal(at, Literal::Int(value.into()))
    }

    /// `scope.member`, with the member right after the period.
    pub fn field_access(&mut self, scope: NodeId, member: &str) -> NodeId {
        let member = match self.end(scope) {
            Some(end) => self.ident(end.right(1), member),
            None => Ident::synthetic(member),
        };
        let loc = loc_between(self.begin(scope), member.loc.end());

        self.add(loc, FieldAccess { scope, member })
    }

    /// `scope.name(args)`
    pub fn method_call(&mut self, scope: NodeId, name: &str, args: Vec<NodeId>) -> NodeId {
        let name = match self.end(scope) {
            Some(end) => self.ident(end.right(1), name),
            None => Ident::synthetic(name),
        };
        let begin = self.begin(scope);

        self.finish_call(begin, Some(scope), name, args)
    }

    /// `name(args)`
    pub fn call(&mut self, at: Pos, name: &str, args: Vec<NodeId>) -> NodeId {
        let name = self.ident(at, name);

        self.finish_call(Some(at), None, name, args)
    }

    fn finish_call(
        &mut self,
        begin: Option<Pos>,
        scope: Option<NodeId>,
        name: Ident,
        args: Vec<NodeId>,
    ) -> NodeId {
        let open = name.loc.end();
        let end = self
            .end_of_list(&args, open.map(|open| open.right(1)))
            .map(|end| end.right(1));
        let kind = MethodCall { scope, name, args };

        self.add(loc_between(begin, end), kind)
    }

    pub fn assign(&mut self, target: NodeId, op: AssignOp, value: NodeId) -> NodeId {
        let loc = loc_between(self.begin(target), self.end(value));

        self.add(loc, AssignExpr { target, op, value })
    }

    pub fn binary(&mut self, left: NodeId, op: BinaryOp, right: NodeId) -> NodeId {
        let loc = loc_between(self.begin(left), self.end(right));

        self.add(loc, BinaryExpr { left, op, right })
    }

    /// A prefix operator at `at` applied to `expr`.
    pub fn prefix(&mut self, at: Pos, op: UnaryOp, expr: NodeId) -> NodeId {
        let loc = loc_between(Some(at), self.end(expr));

        self.add(loc, UnaryExpr { op, expr })
    }

    /// A postfix operator right after `expr`.
    pub fn postfix(&mut self, expr: NodeId, op: UnaryOp) -> NodeId {
        let end = self.end(expr).map(|end| end.right(len(&op.to_string())));
        let loc = loc_between(self.begin(expr), end);

        self.add(loc, UnaryExpr { op, expr })
    }

    /// `(inner)`, opening at `at`.
    pub fn paren(&mut self, at: Pos, inner: NodeId) -> NodeId {
        let loc = loc_between(Some(at), self.end(inner).map(|end| end.right(1)));

        self.add(loc, ParenExpr { inner })
    }

    /// `new Ty(args)`
    pub fn new_object(&mut self, at: Pos, ty: NodeId, args: Vec<NodeId>) -> NodeId {
        let open = self.end(ty);
        let end = self
            .end_of_list(&args, open.map(|open| open.right(1)))
            .map(|end| end.right(1));

        self.add(loc_between(Some(at), end), NewExpr { ty, args })
    }

    /// `(Ty) expr`, opening at `at`.
    pub fn cast(&mut self, at: Pos, ty: NodeId, expr: NodeId) -> NodeId {
        let loc = loc_between(Some(at), self.end(expr));

        self.add(loc, CastExpr { ty, expr })
    }

    pub fn conditional(&mut self, cond: NodeId, then: NodeId, otherwise: NodeId) -> NodeId {
        let loc = loc_between(self.begin(cond), self.end(otherwise));

        self.add(
            loc,
            ConditionalExpr {
                cond,
                then,
                otherwise,
            },
        )
    }

    /// `array[index]`
    pub fn index(&mut self, array: NodeId, index: NodeId) -> NodeId {
        let loc = loc_between(self.begin(array), self.end(index).map(|end| end.right(1)));

        self.add(loc, IndexExpr { array, index })
    }

    pub fn lambda(
        &mut self,
        at: Pos,
        params: Vec<NodeId>,
        parenthesized: bool,
        body: NodeId,
    ) -> NodeId {
        let loc = loc_between(Some(at), self.end(body));
        let kind = LambdaExpr {
            params,
            parenthesized,
            body,
        };

        self.add(loc, kind)
    }

    /// Moves the end of `id` past a closing token at `close`.
    ///
    /// Must be called before building any node that derives its span from `id`.
    pub fn close_at(&mut self, id: NodeId, close: Pos) -> NodeId {
        if let Some(node) = self.tree.get_mut(id) {
            let begin = node.loc.begin().unwrap_or(close);
            node.loc = Span::new(begin, close.right(1)).into();
        }

        id
    }

    /// `expr;`
    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        let loc = loc_between(self.begin(expr), self.end(expr).map(|end| end.right(1)));

        self.add(loc, ExprStmt { expr })
    }

    /// `Ty a = 1, b`, without the terminating semicolon.
    pub fn local_var(&mut self, ty: NodeId, vars: Vec<NodeId>) -> NodeId {
        let loc = loc_between(self.begin(ty), self.end_of_list(&vars, self.end(ty)));
        let kind = LocalVar {
            modifiers: Modifiers::default(),
            ty,
            vars,
        };

        self.add(loc, kind)
    }

    /// A variable declarator: `name` or `name = init`.
    pub fn var(&mut self, name: Ident, init: Option<NodeId>) -> NodeId {
        let end = match init {
            Some(init) => self.end(init),
            None => name.loc.end(),
        };
        let loc = loc_between(name.loc.begin(), end);

        self.add(loc, VarDeclarator { name, init })
    }

    /// A block from the opening brace at `open` to the closing brace at `close`.
    pub fn block(&mut self, open: Pos, stmts: Vec<NodeId>, close: Pos) -> NodeId {
        self.add(Span::new(open, close.right(1)), Block { stmts })
    }

    /// `return [expr];`
    pub fn ret(&mut self, at: Pos, expr: Option<NodeId>) -> NodeId {
        let end = match expr {
            Some(expr) => self.end(expr),
            None => Some(at.right(len("return"))),
        };
        let loc = loc_between(Some(at), end.map(|end| end.right(1)));

        self.add(loc, ReturnStmt { expr })
    }

    /// `throw expr;`
    pub fn throw(&mut self, at: Pos, expr: NodeId) -> NodeId {
        let loc = loc_between(Some(at), self.end(expr).map(|end| end.right(1)));

        self.add(loc, ThrowStmt { expr })
    }

    /// `if (cond) then [else otherwise]`
    pub fn if_stmt(
        &mut self,
        at: Pos,
        cond: NodeId,
        then: NodeId,
        otherwise: Option<NodeId>,
    ) -> NodeId {
        let loc = loc_between(Some(at), self.end(otherwise.unwrap_or(then)));
        let kind = IfStmt {
            cond,
            then,
            otherwise,
        };

        self.add(loc, kind)
    }

    /// `while (cond) body`
    pub fn while_stmt(&mut self, at: Pos, cond: NodeId, body: NodeId) -> NodeId {
        let loc = loc_between(Some(at), self.end(body));

        self.add(loc, WhileStmt { cond, body })
    }

    /// `for (init; cond; update) body`
    pub fn for_stmt(
        &mut self,
        at: Pos,
        init: Vec<NodeId>,
        cond: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let loc = loc_between(Some(at), self.end(body));
        let kind = ForStmt {
            init,
            cond,
            update,
            body,
        };

        self.add(loc, kind)
    }

    /// A lone `;`.
    pub fn empty(&mut self, at: Pos) -> NodeId {
        self.add(Span::of_len(at, 1), NodeKind::Empty)
    }

    /// `modifiers Ty a = 1, b;`, starting at `at`.
    pub fn field(
        &mut self,
        at: Pos,
        modifiers: Modifiers,
        ty: NodeId,
        vars: Vec<NodeId>,
    ) -> NodeId {
        let end = self
            .end_of_list(&vars, self.end(ty))
            .map(|end| end.right(1));
        let kind = FieldDecl {
            modifiers,
            ty,
            vars,
        };

        self.add(loc_between(Some(at), end), kind)
    }

    /// `Ty name`
    pub fn param(&mut self, ty: NodeId, name: Ident) -> NodeId {
        let loc = loc_between(self.begin(ty), name.loc.end());
        let kind = Param {
            modifiers: Modifiers::default(),
            ty: Some(ty),
            is_var_args: false,
            name,
        };

        self.add(loc, kind)
    }

    /// An implicitly typed lambda parameter.
    pub fn lambda_param(&mut self, name: Ident) -> NodeId {
        let kind = Param {
            modifiers: Modifiers::default(),
            ty: None,
            is_var_args: false,
            name,
        };

        self.add(kind.name.loc, kind)
    }

    /// `modifiers Ty name(params) body`, or `...(params);` without a body.
    pub fn method(
        &mut self,
        at: Pos,
        modifiers: Modifiers,
        ret_ty: NodeId,
        name: Ident,
        params: Vec<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        let end = match body {
            Some(body) => self.end(body),
            None => {
                let open = name.loc.end();
                self.end_of_list(&params, open.map(|open| open.right(1)))
                    .map(|end| end.right(2))
            }
        };
        let kind = MethodDecl {
            modifiers,
            type_params: vec![],
            ret_ty,
            name,
            params,
            throws: vec![],
            body,
        };

        self.add(loc_between(Some(at), end), kind)
    }

    /// `modifiers Name(params) body`
    pub fn constructor(
        &mut self,
        at: Pos,
        modifiers: Modifiers,
        name: Ident,
        params: Vec<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let loc = loc_between(Some(at), self.end(body));
        let kind = ConstructorDecl {
            modifiers,
            name,
            params,
            throws: vec![],
            body,
        };

        self.add(loc, kind)
    }

    /// `[static] { ... }`
    pub fn initializer(&mut self, at: Pos, is_static: bool, body: NodeId) -> NodeId {
        let loc = loc_between(Some(at), self.end(body));

        self.add(loc, InitializerDecl { is_static, body })
    }

    /// `modifiers class Name { members }`, from `at` to the closing brace at `close`.
    pub fn class(
        &mut self,
        at: Pos,
        modifiers: Modifiers,
        name: Ident,
        lbrace: Pos,
        members: Vec<NodeId>,
        close: Pos,
    ) -> NodeId {
        let kind = ClassDecl {
            modifiers,
            is_interface: false,
            name,
            type_params: vec![],
            extends: vec![],
            implements: vec![],
            lbrace: lbrace.into(),
            members,
        };

        self.add(Span::new(at, close.right(1)), kind)
    }

    fn accessor(
        at: Pos,
        visibility: Option<Visibility>,
        keyword: &str,
        body: Option<NodeId>,
    ) -> Accessor {
        let width = match visibility {
            Some(visibility) => len(&visibility.to_string()) + 1 + len(keyword),
            None => len(keyword),
        };

        Accessor {
            loc: Span::of_len(at, width).into(),
            visibility,
            body,
        }
    }

    /// `[visibility] get` followed by either a body or a semicolon.
    pub fn getter(
        &self,
        at: Pos,
        visibility: Option<Visibility>,
        body: Option<NodeId>,
    ) -> Accessor {
        Self::accessor(at, visibility, "get", body)
    }

    /// `[visibility] set` followed by either a body or a semicolon.
    pub fn setter(
        &self,
        at: Pos,
        visibility: Option<Visibility>,
        body: Option<NodeId>,
    ) -> Accessor {
        Self::accessor(at, visibility, "set", body)
    }

    /// `modifiers Ty name { get set def = default }`, from `at` to the closing brace at `close`.
    #[allow(clippy::too_many_arguments)]
    pub fn property(
        &mut self,
        at: Pos,
        modifiers: Modifiers,
        ty: NodeId,
        name: Ident,
        lbrace: Pos,
        default: Option<NodeId>,
        get: Accessor,
        set: Accessor,
        close: Pos,
    ) -> NodeId {
        let kind = PropertyDecl {
            modifiers,
            ty,
            name,
            lbrace: lbrace.into(),
            default,
            get,
            set,
        };

        self.add(Span::new(at, close.right(1)), kind)
    }
}
