//! Syntax tree node definitions.
//!
//! All nodes live in a [`Tree`](crate::Tree) and refer to each other by [`NodeId`]. The root is a
//! [`CompilationUnit`]; everything else hangs off it. A node's children are enumerated through
//! [`NodeKind::slots`] and [`NodeKind::slots_mut`], which is what generic tree surgery (see
//! [`subst`](crate::subst)) builds on.

use derive_more::{Display, From};

use crate::NodeId;
use crate::loc::Loc;

/// A tree node.
#[derive(Debug, Default, Clone)]
pub struct Node {
    /// A unique identifier for this node, usable as a (secondary) slotmap key.
    ///
    /// This allows to associate additional information with the node as well as refer to it
    /// without violating borrowing rules.
    pub id: NodeId,

    /// The node holding this one in one of its child slots.
    ///
    /// This is a back-link for navigation only: the parent owns the child, never the other way
    /// round. `None` for the root and for detached nodes.
    pub parent: Option<NodeId>,

    /// The node's location in the source text.
    pub loc: Loc,

    /// What kind of node this is.
    ///
    /// The variants hold data specific to each node kind.
    pub kind: NodeKind,
}

/// An enumeration of all possible node kinds.
#[derive(Debug, Default, Clone, From)]
pub enum NodeKind {
    /// A dummy node, the default value of `NodeKind`.
    ///
    /// Allows using `mem::take` to take ownership of the value.
    #[default]
    #[from(skip)]
    Dummy,

    /// The root of a source file.
    CompilationUnit(CompilationUnit),

    /// A package declaration.
    Package(PackageDecl),

    /// An import declaration.
    Import(ImportDecl),

    /// An annotation use, such as `@Override`.
    Annotation(Annotation),

    /// A class or interface declaration.
    Class(ClassDecl),

    /// A field declaration, possibly declaring several variables.
    Field(FieldDecl),

    /// A single variable declared by a field or a local variable declaration.
    Var(VarDeclarator),

    /// A method declaration.
    Method(MethodDecl),

    /// A constructor declaration.
    Constructor(ConstructorDecl),

    /// A formal parameter of a method, a constructor or a lambda.
    Param(Param),

    /// An instance or static initializer block.
    Initializer(InitializerDecl),

    /// A property declaration: a value with accessors, a default and a change observer.
    ///
    /// Property declarations only exist before lowering.
    Property(PropertyDecl),

    /// A primitive type.
    PrimitiveTy(Primitive),

    /// A class or interface type, possibly qualified and parameterized.
    ClassTy(ClassTy),

    /// An array type.
    ArrayTy(ArrayTy),

    /// The `void` return type.
    #[from(skip)]
    VoidTy,

    /// A block of statements.
    Block(Block),

    /// An expression used as a statement.
    ExprStmt(ExprStmt),

    /// A local variable declaration.
    ///
    /// Used both as a statement (wrapped in [`ExprStmt`]) and in `for` initializers.
    LocalVar(LocalVar),

    /// An `if` statement.
    If(IfStmt),

    /// A `while` loop.
    While(WhileStmt),

    /// A `for` loop.
    For(ForStmt),

    /// A `return` statement.
    Return(ReturnStmt),

    /// A `throw` statement.
    Throw(ThrowStmt),

    /// An empty statement: a lone `;`.
    #[from(skip)]
    Empty,

    /// A simple name.
    Name(NameExpr),

    /// A member access: `scope.member`.
    FieldAccess(FieldAccess),

    /// A method call.
    Call(MethodCall),

    /// An assignment, plain or compound.
    Assign(AssignExpr),

    /// A binary operator expression.
    Binary(BinaryExpr),

    /// A unary operator expression.
    Unary(UnaryExpr),

    /// A literal.
    Literal(Literal),

    /// The `this` expression.
    #[from(skip)]
    This,

    /// An instance creation expression: `new T(args)`.
    New(NewExpr),

    /// A parenthesized expression.
    Paren(ParenExpr),

    /// A lambda expression.
    Lambda(LambdaExpr),

    /// A conditional expression: `cond ? a : b`.
    Conditional(ConditionalExpr),

    /// A cast expression.
    Cast(CastExpr),

    /// An array element access: `array[index]`.
    Index(IndexExpr),
}

/// A name paired with its location in the source text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Ident {
    /// The name's location in the source text.
    pub loc: Loc,

    /// The name string.
    pub name: String,
}

impl Ident {
    pub fn new(loc: impl Into<Loc>, name: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            name: name.into(),
        }
    }

    /// An identifier with no location, printed wherever the printer's cursor is.
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::new(Loc::Synthetic, name)
    }
}

/// Member visibility.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    #[display("public")]
    Public,

    #[display("protected")]
    Protected,

    #[display("private")]
    Private,
}

/// Declaration modifiers, including the annotations preceding the declaration.
///
/// This is shared by every member-like node kind, so the annotation slot here is a child slot of
/// all of them.
#[derive(Debug, Default, Clone)]
pub struct Modifiers {
    /// Annotations attached to the declaration.
    pub annotations: Vec<NodeId>,

    /// An explicit visibility modifier, if any.
    pub visibility: Option<Visibility>,

    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

impl Modifiers {
    pub fn new(visibility: Option<Visibility>) -> Self {
        Self {
            visibility,
            ..Default::default()
        }
    }

    pub fn public() -> Self {
        Self::new(Some(Visibility::Public))
    }

    pub fn private() -> Self {
        Self::new(Some(Visibility::Private))
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;

        self
    }

    pub fn with_final(mut self) -> Self {
        self.is_final = true;

        self
    }

    /// Returns `true` if no keyword modifier is present. Annotations are not considered.
    pub fn is_empty(&self) -> bool {
        self.visibility.is_none() && !self.is_static && !self.is_final && !self.is_abstract
    }
}

/// The root of a source file.
#[derive(Debug, Default, Clone)]
pub struct CompilationUnit {
    pub package: Option<NodeId>,
    pub imports: Vec<NodeId>,
    pub types: Vec<NodeId>,
}

/// A package declaration.
#[derive(Debug, Clone)]
pub struct PackageDecl {
    /// The period-separated package name.
    pub path: String,
}

/// An import declaration.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// The period-separated name being imported, without the trailing `.*`.
    pub path: String,

    pub is_static: bool,
    pub is_asterisk: bool,
}

/// An annotation use.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: String,
    pub args: Vec<NodeId>,
}

/// A class or interface declaration.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub modifiers: Modifiers,
    pub is_interface: bool,
    pub name: Ident,

    /// Type parameter names, printed verbatim between angle brackets.
    pub type_params: Vec<String>,

    pub extends: Vec<NodeId>,
    pub implements: Vec<NodeId>,

    /// The location of the opening brace.
    pub lbrace: Loc,

    /// Member declarations, in source order.
    pub members: Vec<NodeId>,
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: NodeId,

    /// The declared variables: `a` and `b = 1` in `int a, b = 1;`.
    pub vars: Vec<NodeId>,
}

/// A variable declared by a field or a local variable declaration.
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub name: Ident,
    pub init: Option<NodeId>,
}

/// A method declaration.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    pub type_params: Vec<String>,
    pub ret_ty: NodeId,
    pub name: Ident,
    pub params: Vec<NodeId>,
    pub throws: Vec<NodeId>,

    /// The method body; `None` for abstract and interface methods.
    pub body: Option<NodeId>,
}

/// A constructor declaration.
#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub params: Vec<NodeId>,
    pub throws: Vec<NodeId>,
    pub body: NodeId,
}

/// A formal parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub modifiers: Modifiers,

    /// The parameter type; `None` for implicitly typed lambda parameters.
    pub ty: Option<NodeId>,

    pub is_var_args: bool,
    pub name: Ident,
}

/// An initializer block.
#[derive(Debug, Clone)]
pub struct InitializerDecl {
    pub is_static: bool,
    pub body: NodeId,
}

/// A property declaration.
///
/// ```text
/// String name { public get; private set; def = "none" }
/// ```
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub modifiers: Modifiers,

    /// The property's value type.
    pub ty: NodeId,

    pub name: Ident,
    pub lbrace: Loc,

    /// The default value the backing field is initialized with.
    pub default: Option<NodeId>,

    pub get: Accessor,
    pub set: Accessor,
}

/// The `get` or `set` part of a property declaration.
#[derive(Debug, Default, Clone)]
pub struct Accessor {
    /// The location of the accessor keyword, including its visibility modifier.
    pub loc: Loc,

    /// An explicit visibility; the property's own visibility applies otherwise.
    pub visibility: Option<Visibility>,

    /// An explicit body block. A default body is synthesized when absent.
    pub body: Option<NodeId>,
}

/// A primitive type.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    #[display("boolean")]
    Boolean,

    #[display("char")]
    Char,

    #[display("byte")]
    Byte,

    #[display("short")]
    Short,

    #[display("int")]
    Int,

    #[display("long")]
    Long,

    #[display("float")]
    Float,

    #[display("double")]
    Double,
}

impl Primitive {
    /// The name of the reference type a value of this primitive type boxes to.
    pub const fn boxed(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Char => "Character",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
        }
    }
}

/// A class or interface type.
#[derive(Debug, Clone)]
pub struct ClassTy {
    /// The qualifying type: `Map` in `Map.Entry`.
    pub scope: Option<NodeId>,

    pub name: String,
    pub type_args: Vec<NodeId>,
}

/// An array type.
#[derive(Debug, Clone)]
pub struct ArrayTy {
    pub elem: NodeId,

    /// The number of `[]` pairs.
    pub dims: u32,
}

/// A block of statements.
#[derive(Debug, Default, Clone)]
pub struct Block {
    pub stmts: Vec<NodeId>,
}

/// An expression statement.
#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: NodeId,
}

/// A local variable declaration.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub modifiers: Modifiers,
    pub ty: NodeId,
    pub vars: Vec<NodeId>,
}

/// An `if` statement.
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub cond: NodeId,
    pub then: NodeId,
    pub otherwise: Option<NodeId>,
}

/// A `while` loop.
#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: NodeId,
    pub body: NodeId,
}

/// A `for` loop.
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Vec<NodeId>,
    pub cond: Option<NodeId>,
    pub update: Vec<NodeId>,
    pub body: NodeId,
}

/// A `return` statement.
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub expr: Option<NodeId>,
}

/// A `throw` statement.
#[derive(Debug, Clone)]
pub struct ThrowStmt {
    pub expr: NodeId,
}

/// A simple name.
#[derive(Debug, Clone)]
pub struct NameExpr {
    pub name: String,
}

/// A member access expression.
///
/// Before lowering, `scope.member` may denote a property. After lowering the member no longer
/// exists, and only the external compiler's complaint tells which occurrences need rewriting into
/// accessor calls.
#[derive(Debug, Clone)]
pub struct FieldAccess {
    /// The expression preceding the period.
    pub scope: NodeId,

    /// The member name following the period.
    pub member: Ident,
}

/// A method call expression.
#[derive(Debug, Clone)]
pub struct MethodCall {
    /// The receiver, if any.
    pub scope: Option<NodeId>,

    pub name: Ident,
    pub args: Vec<NodeId>,
}

/// Assignment operators.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    #[display("=")]
    Assign,

    #[display("+=")]
    Add,

    #[display("-=")]
    Sub,

    #[display("*=")]
    Mul,

    #[display("/=")]
    Div,

    #[display("%=")]
    Rem,

    #[display("&=")]
    BitAnd,

    #[display("|=")]
    BitOr,

    #[display("^=")]
    BitXor,

    #[display("<<=")]
    Shl,

    #[display(">>=")]
    Shr,

    #[display(">>>=")]
    UShr,
}

impl AssignOp {
    /// The binary operator a compound assignment applies; `None` for a plain assignment.
    pub const fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            Self::Assign => return None,
            Self::Add => BinaryOp::Add,
            Self::Sub => BinaryOp::Sub,
            Self::Mul => BinaryOp::Mul,
            Self::Div => BinaryOp::Div,
            Self::Rem => BinaryOp::Rem,
            Self::BitAnd => BinaryOp::BitAnd,
            Self::BitOr => BinaryOp::BitOr,
            Self::BitXor => BinaryOp::BitXor,
            Self::Shl => BinaryOp::Shl,
            Self::Shr => BinaryOp::Shr,
            Self::UShr => BinaryOp::UShr,
        })
    }
}

/// An assignment expression.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub target: NodeId,
    pub op: AssignOp,
    pub value: NodeId,
}

/// Binary operators.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    #[display("||")]
    Or,

    #[display("&&")]
    And,

    #[display("|")]
    BitOr,

    #[display("^")]
    BitXor,

    #[display("&")]
    BitAnd,

    #[display("==")]
    Eq,

    #[display("!=")]
    Ne,

    #[display("<")]
    Lt,

    #[display(">")]
    Gt,

    #[display("<=")]
    Le,

    #[display(">=")]
    Ge,

    #[display("<<")]
    Shl,

    #[display(">>")]
    Shr,

    #[display(">>>")]
    UShr,

    #[display("+")]
    Add,

    #[display("-")]
    Sub,

    #[display("*")]
    Mul,

    #[display("/")]
    Div,

    #[display("%")]
    Rem,
}

/// A binary operator expression.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub left: NodeId,
    pub op: BinaryOp,
    pub right: NodeId,
}

/// Unary operators.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    #[display("+")]
    Plus,

    #[display("-")]
    Neg,

    #[display("~")]
    BitNot,

    #[display("!")]
    Not,

    #[display("++")]
    PreInc,

    #[display("--")]
    PreDec,

    #[display("++")]
    PostInc,

    #[display("--")]
    PostDec,
}

impl UnaryOp {
    pub const fn is_postfix(self) -> bool {
        matches!(self, Self::PostInc | Self::PostDec)
    }
}

/// A unary operator expression.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: NodeId,
}

/// A literal.
///
/// Numeric and character literals keep their source spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(String),
    Long(String),
    Double(String),

    /// A character literal, without the surrounding quotes.
    Char(String),

    /// A string literal's contents, escape sequences kept verbatim.
    Str(String),

    Bool(bool),
    Null,
}

impl Literal {
    /// The literal as it appears in source text.
    pub fn text(&self) -> String {
        match self {
            Self::Int(s) | Self::Long(s) | Self::Double(s) => s.clone(),
            Self::Char(s) => format!("'{s}'"),
            Self::Str(s) => format!("\"{s}\""),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".into(),
        }
    }
}

/// An instance creation expression.
#[derive(Debug, Clone)]
pub struct NewExpr {
    pub ty: NodeId,
    pub args: Vec<NodeId>,
}

/// A parenthesized expression.
#[derive(Debug, Clone)]
pub struct ParenExpr {
    pub inner: NodeId,
}

/// A lambda expression.
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub params: Vec<NodeId>,

    /// Whether the parameter list is enclosed in parentheses.
    pub parenthesized: bool,

    /// Either an expression or a block.
    pub body: NodeId,
}

/// A conditional expression.
#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub cond: NodeId,
    pub then: NodeId,
    pub otherwise: NodeId,
}

/// A cast expression.
#[derive(Debug, Clone)]
pub struct CastExpr {
    pub ty: NodeId,
    pub expr: NodeId,
}

/// An array element access.
#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub array: NodeId,
    pub index: NodeId,
}

/// A child slot of a node, as seen through a shared reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    /// A slot holding exactly one child.
    One(NodeId),

    /// A slot holding an ordered sequence of children.
    Many(&'a [NodeId]),
}

/// A child slot of a node, as seen through a mutable reference.
#[derive(Debug, PartialEq, Eq)]
pub enum SlotMut<'a> {
    /// A slot holding exactly one child.
    One(&'a mut NodeId),

    /// A slot holding an ordered sequence of children.
    Many(&'a mut Vec<NodeId>),
}

trait IntoSlot {
    type Slot;

    fn into_slot(self) -> Option<Self::Slot>;
}

impl<'a> IntoSlot for &'a NodeId {
    type Slot = Slot<'a>;

    fn into_slot(self) -> Option<Slot<'a>> {
        Some(Slot::One(*self))
    }
}

impl<'a> IntoSlot for &'a Option<NodeId> {
    type Slot = Slot<'a>;

    fn into_slot(self) -> Option<Slot<'a>> {
        self.map(Slot::One)
    }
}

impl<'a> IntoSlot for &'a Vec<NodeId> {
    type Slot = Slot<'a>;

    fn into_slot(self) -> Option<Slot<'a>> {
        Some(Slot::Many(self))
    }
}

impl<'a> IntoSlot for &'a mut NodeId {
    type Slot = SlotMut<'a>;

    fn into_slot(self) -> Option<SlotMut<'a>> {
        Some(SlotMut::One(self))
    }
}

impl<'a> IntoSlot for &'a mut Option<NodeId> {
    type Slot = SlotMut<'a>;

    fn into_slot(self) -> Option<SlotMut<'a>> {
        self.as_mut().map(SlotMut::One)
    }
}

impl<'a> IntoSlot for &'a mut Vec<NodeId> {
    type Slot = SlotMut<'a>;

    fn into_slot(self) -> Option<SlotMut<'a>> {
        Some(SlotMut::Many(self))
    }
}

struct SlotSink<T>(Vec<T>);

impl<T> SlotSink<T> {
    fn push(&mut self, slot: impl IntoSlot<Slot = T>) {
        self.0.extend(slot.into_slot());
    }
}

// lists every child slot of every node kind, in source order. `$($m)?` is either empty or `mut`,
// so the same table serves both `slots` and `slots_mut`.
macro_rules! collect_slots {
    ($kind:expr, $sink:ident $(, $m:tt)?) => {
        match $kind {
            NodeKind::Dummy
            | NodeKind::Package(_)
            | NodeKind::Import(_)
            | NodeKind::PrimitiveTy(_)
            | NodeKind::VoidTy
            | NodeKind::Empty
            | NodeKind::Name(_)
            | NodeKind::Literal(_)
            | NodeKind::This => {}

            NodeKind::CompilationUnit(n) => {
                $sink.push(&$($m)? n.package);
                $sink.push(&$($m)? n.imports);
                $sink.push(&$($m)? n.types);
            }

            NodeKind::Annotation(n) => $sink.push(&$($m)? n.args),

            NodeKind::Class(n) => {
                $sink.push(&$($m)? n.modifiers.annotations);
                $sink.push(&$($m)? n.extends);
                $sink.push(&$($m)? n.implements);
                $sink.push(&$($m)? n.members);
            }

            NodeKind::Field(n) => {
                $sink.push(&$($m)? n.modifiers.annotations);
                $sink.push(&$($m)? n.ty);
                $sink.push(&$($m)? n.vars);
            }

            NodeKind::Var(n) => $sink.push(&$($m)? n.init),

            NodeKind::Method(n) => {
                $sink.push(&$($m)? n.modifiers.annotations);
                $sink.push(&$($m)? n.ret_ty);
                $sink.push(&$($m)? n.params);
                $sink.push(&$($m)? n.throws);
                $sink.push(&$($m)? n.body);
            }

            NodeKind::Constructor(n) => {
                $sink.push(&$($m)? n.modifiers.annotations);
                $sink.push(&$($m)? n.params);
                $sink.push(&$($m)? n.throws);
                $sink.push(&$($m)? n.body);
            }

            NodeKind::Param(n) => {
                $sink.push(&$($m)? n.modifiers.annotations);
                $sink.push(&$($m)? n.ty);
            }

            NodeKind::Initializer(n) => $sink.push(&$($m)? n.body),

            NodeKind::Property(n) => {
                $sink.push(&$($m)? n.modifiers.annotations);
                $sink.push(&$($m)? n.ty);
                $sink.push(&$($m)? n.default);
                $sink.push(&$($m)? n.get.body);
                $sink.push(&$($m)? n.set.body);
            }

            NodeKind::ClassTy(n) => {
                $sink.push(&$($m)? n.scope);
                $sink.push(&$($m)? n.type_args);
            }

            NodeKind::ArrayTy(n) => $sink.push(&$($m)? n.elem),
            NodeKind::Block(n) => $sink.push(&$($m)? n.stmts),
            NodeKind::ExprStmt(n) => $sink.push(&$($m)? n.expr),

            NodeKind::LocalVar(n) => {
                $sink.push(&$($m)? n.modifiers.annotations);
                $sink.push(&$($m)? n.ty);
                $sink.push(&$($m)? n.vars);
            }

            NodeKind::If(n) => {
                $sink.push(&$($m)? n.cond);
                $sink.push(&$($m)? n.then);
                $sink.push(&$($m)? n.otherwise);
            }

            NodeKind::While(n) => {
                $sink.push(&$($m)? n.cond);
                $sink.push(&$($m)? n.body);
            }

            NodeKind::For(n) => {
                $sink.push(&$($m)? n.init);
                $sink.push(&$($m)? n.cond);
                $sink.push(&$($m)? n.update);
                $sink.push(&$($m)? n.body);
            }

            NodeKind::Return(n) => $sink.push(&$($m)? n.expr),
            NodeKind::Throw(n) => $sink.push(&$($m)? n.expr),
            NodeKind::FieldAccess(n) => $sink.push(&$($m)? n.scope),

            NodeKind::Call(n) => {
                $sink.push(&$($m)? n.scope);
                $sink.push(&$($m)? n.args);
            }

            NodeKind::Assign(n) => {
                $sink.push(&$($m)? n.target);
                $sink.push(&$($m)? n.value);
            }

            NodeKind::Binary(n) => {
                $sink.push(&$($m)? n.left);
                $sink.push(&$($m)? n.right);
            }

            NodeKind::Unary(n) => $sink.push(&$($m)? n.expr),

            NodeKind::New(n) => {
                $sink.push(&$($m)? n.ty);
                $sink.push(&$($m)? n.args);
            }

            NodeKind::Paren(n) => $sink.push(&$($m)? n.inner),

            NodeKind::Lambda(n) => {
                $sink.push(&$($m)? n.params);
                $sink.push(&$($m)? n.body);
            }

            NodeKind::Conditional(n) => {
                $sink.push(&$($m)? n.cond);
                $sink.push(&$($m)? n.then);
                $sink.push(&$($m)? n.otherwise);
            }

            NodeKind::Cast(n) => {
                $sink.push(&$($m)? n.ty);
                $sink.push(&$($m)? n.expr);
            }

            NodeKind::Index(n) => {
                $sink.push(&$($m)? n.array);
                $sink.push(&$($m)? n.index);
            }
        }
    };
}

impl NodeKind {
    /// Returns the node's occupied child slots in source order.
    ///
    /// Optional slots that are empty are omitted; sequence slots are always present, even when
    /// empty.
    pub fn slots(&self) -> Vec<Slot<'_>> {
        let mut sink = SlotSink(Vec::new());
        collect_slots!(self, sink);

        sink.0
    }

    /// Like [`slots`](Self::slots), but allows replacing children in place.
    pub fn slots_mut(&mut self) -> Vec<SlotMut<'_>> {
        let mut sink = SlotSink(Vec::new());
        collect_slots!(self, sink, mut);

        sink.0
    }

    /// Returns all direct children in source order, regardless of slot shape.
    pub fn children(&self) -> Vec<NodeId> {
        let mut children = vec![];

        for slot in self.slots() {
            match slot {
                Slot::One(id) => children.push(id),
                Slot::Many(ids) => children.extend_from_slice(ids),
            }
        }

        children
    }

    /// Returns the locations stored inside the kind itself: names, braces and accessor keywords.
    pub fn inner_locs_mut(&mut self) -> Vec<&mut Loc> {
        match self {
            Self::Class(n) => vec![&mut n.name.loc, &mut n.lbrace],
            Self::Var(n) => vec![&mut n.name.loc],
            Self::Method(n) => vec![&mut n.name.loc],
            Self::Constructor(n) => vec![&mut n.name.loc],
            Self::Param(n) => vec![&mut n.name.loc],
            Self::Property(n) => vec![
                &mut n.name.loc,
                &mut n.lbrace,
                &mut n.get.loc,
                &mut n.set.loc,
            ],
            Self::FieldAccess(n) => vec![&mut n.member.loc],
            Self::Call(n) => vec![&mut n.name.loc],
            _ => vec![],
        }
    }

    /// A short name of the node kind, for diagnostics and dumps.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dummy => "Dummy",
            Self::CompilationUnit(_) => "CompilationUnit",
            Self::Package(_) => "Package",
            Self::Import(_) => "Import",
            Self::Annotation(_) => "Annotation",
            Self::Class(_) => "Class",
            Self::Field(_) => "Field",
            Self::Var(_) => "Var",
            Self::Method(_) => "Method",
            Self::Constructor(_) => "Constructor",
            Self::Param(_) => "Param",
            Self::Initializer(_) => "Initializer",
            Self::Property(_) => "Property",
            Self::PrimitiveTy(_) => "PrimitiveTy",
            Self::ClassTy(_) => "ClassTy",
            Self::ArrayTy(_) => "ArrayTy",
            Self::VoidTy => "VoidTy",
            Self::Block(_) => "Block",
            Self::ExprStmt(_) => "ExprStmt",
            Self::LocalVar(_) => "LocalVar",
            Self::If(_) => "If",
            Self::While(_) => "While",
            Self::For(_) => "For",
            Self::Return(_) => "Return",
            Self::Throw(_) => "Throw",
            Self::Empty => "Empty",
            Self::Name(_) => "Name",
            Self::FieldAccess(_) => "FieldAccess",
            Self::Call(_) => "Call",
            Self::Assign(_) => "Assign",
            Self::Binary(_) => "Binary",
            Self::Unary(_) => "Unary",
            Self::Literal(_) => "Literal",
            Self::This => "This",
            Self::New(_) => "New",
            Self::Paren(_) => "Paren",
            Self::Lambda(_) => "Lambda",
            Self::Conditional(_) => "Conditional",
            Self::Cast(_) => "Cast",
            Self::Index(_) => "Index",
        }
    }

    /// The node's own text that is not a child node: a name, an operator or a literal.
    pub fn label(&self) -> Option<String> {
        Some(match self {
            Self::Package(n) => n.path.clone(),
            Self::Import(n) => n.path.clone(),
            Self::Annotation(n) => n.name.clone(),
            Self::Class(n) => n.name.name.clone(),
            Self::Var(n) => n.name.name.clone(),
            Self::Method(n) => n.name.name.clone(),
            Self::Constructor(n) => n.name.name.clone(),
            Self::Param(n) => n.name.name.clone(),
            Self::Property(n) => n.name.name.clone(),
            Self::PrimitiveTy(p) => p.to_string(),
            Self::ClassTy(n) => n.name.clone(),
            Self::Name(n) => n.name.clone(),
            Self::FieldAccess(n) => n.member.name.clone(),
            Self::Call(n) => n.name.name.clone(),
            Self::Assign(n) => n.op.to_string(),
            Self::Binary(n) => n.op.to_string(),
            Self::Unary(n) => n.op.to_string(),
            Self::Literal(lit) => lit.text(),
            _ => return None,
        })
    }

    /// Returns `true` for expressions whose operand must be parenthesized when placed under a
    /// binary operator.
    pub fn needs_parens_as_operand(&self) -> bool {
        matches!(
            self,
            Self::Binary(_)
                | Self::Assign(_)
                | Self::Conditional(_)
                | Self::Lambda(_)
                | Self::Cast(_)
        )
    }
}
