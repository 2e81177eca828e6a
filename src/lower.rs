//! Lowering property declarations into plain members.
//!
//! A property
//!
//! ```text
//! int count { get; set; def = 0 }
//! ```
//!
//! becomes four members appended to the enclosing type:
//!
//! ```text
//! private int _count = 0;
//! public PropertyObserver<Integer> countObserver;
//! public void setCount(int value) {
//!     if (countObserver != null) countObserver.changed(_count, value);
//!     _count = value;
//! }
//! public int getCount() {
//!     return _count;
//! }
//! ```
//!
//! The new members are placed on fresh lines after the type's last original member, so the
//! printer can emit them without disturbing the layout of any original code. Each compilation
//! unit that had at least one property also gets an import of the observer interface.

use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{
    Accessor, AssignExpr, AssignOp, BinaryExpr, BinaryOp, Block, ClassTy, ExprStmt, FieldDecl,
    Ident, IfStmt, ImportDecl, Literal, MethodCall, MethodDecl, Modifiers, NameExpr, NodeKind,
    Param, PropertyDecl, ReturnStmt, VarDeclarator, Visibility,
};
use crate::build::Builder;
use crate::loc::{Loc, Pos, Span};
use crate::naming::{getter_name, setter_name};
use crate::{NodeId, Tree};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
    #[error("property `{name}` at {loc} is not a member of a type")]
    OutsideType { name: String, loc: Loc },

    #[error("node {0:?} is not in the tree")]
    Dangling(NodeId),

    #[error("the root of the tree is not a compilation unit")]
    MissingUnit,
}

type Result<T, E = LowerError> = std::result::Result<T, E>;

/// Naming and layout settings for the synthesized members.
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerOptions {
    /// The package declaring the observer interface. Empty for the default package.
    pub observer_package: String,

    /// The simple name of the observer interface.
    pub observer_name: String,

    /// Prepended to the property name to form the backing field name.
    pub field_prefix: String,

    /// Appended to the property name to form the observer field name.
    pub observer_suffix: String,

    /// The name of the setter's parameter.
    pub param_name: String,

    /// Indentation of statements in synthesized bodies, relative to the member.
    pub indent: u32,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            observer_package: "grande".into(),
            observer_name: "PropertyObserver".into(),
            field_prefix: "_".into(),
            observer_suffix: "Observer".into(),
            param_name: "value".into(),
            indent: 4,
        }
    }
}

impl LowerOptions {
    pub fn backing_name(&self, property: &str) -> String {
        format!("{}{property}", self.field_prefix)
    }

    pub fn observer_field_name(&self, property: &str) -> String {
        format!("{property}{}", self.observer_suffix)
    }

    /// The fully qualified name of the observer interface.
    pub fn observer_path(&self) -> String {
        if self.observer_package.is_empty() {
            self.observer_name.clone()
        } else {
            format!("{}.{}", self.observer_package, self.observer_name)
        }
    }
}

/// The members a single property was lowered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Synthesized {
    pub backing: NodeId,
    pub observer: NodeId,
    pub setter: NodeId,
    pub getter: NodeId,
}

/// What [`lower`] did to a tree.
#[derive(Debug, Default, Clone)]
pub struct Lowered {
    /// Names of the lowered properties, in declaration order.
    pub properties: Vec<String>,

    /// The members synthesized for each property, in the same order.
    pub members: Vec<Synthesized>,

    /// Every member access expression in the tree, in preorder.
    ///
    /// After lowering, the ones naming a property no longer resolve; only the external compiler
    /// can tell which, so all of them are kept as candidates.
    pub accesses: Vec<NodeId>,

    /// The import of the observer interface, if one was added.
    pub import: Option<NodeId>,
}

/// Rewrites every property declaration in the tree into plain members.
///
/// Either all properties are lowered or, if any of them is misplaced, the tree is left untouched.
/// Lowering a tree without properties changes nothing.
pub fn lower(tree: &mut Tree, options: &LowerOptions) -> Result<Lowered> {
    let mut properties = vec![];
    let mut accesses = vec![];

    for id in tree.descendants(tree.root()) {
        match &tree[id].kind {
            NodeKind::Property(_) => properties.push(id),

            NodeKind::FieldAccess(access) => {
                trace!(member = %access.member.name, loc = %tree[id].loc, "recorded member access");
                accesses.push(id);
            }

            _ => {}
        }
    }

    let mut groups: Vec<(NodeId, Vec<NodeId>)> = vec![];

    for &property in &properties {
        let class = owning_class(tree, property)?;

        match groups.iter_mut().find(|(id, _)| *id == class) {
            Some((_, group)) => group.push(property),
            None => groups.push((class, vec![property])),
        }
    }

    let mut lowered = Lowered {
        accesses,
        ..Default::default()
    };

    if properties.is_empty() {
        return Ok(lowered);
    }

    lowered.import = add_import(tree, options)?;

    for (class, group) in groups {
        lower_class(tree, class, &group, options, &mut lowered)?;
    }

    Ok(lowered)
}

fn owning_class(tree: &Tree, property: NodeId) -> Result<NodeId> {
    let node = tree.get(property).ok_or(LowerError::Dangling(property))?;
    let NodeKind::Property(decl) = &node.kind else {
        return Err(LowerError::Dangling(property));
    };

    if !tree.contains(decl.ty) {
        return Err(LowerError::Dangling(decl.ty));
    }

    let owner = node.parent.and_then(|parent| tree.get(parent)).filter(|parent| {
        matches!(&parent.kind, NodeKind::Class(class) if class.members.contains(&property))
    });

    match owner {
        Some(parent) => Ok(parent.id),

        None => Err(LowerError::OutsideType {
            name: decl.name.name.clone(),
            loc: node.loc,
        }),
    }
}

/// Adds `import <observer>;` unless the unit already sees the observer interface.
fn add_import(tree: &mut Tree, options: &LowerOptions) -> Result<Option<NodeId>> {
    let unit = tree.unit().ok_or(LowerError::MissingUnit)?;

    if options.observer_package.is_empty() {
        return Ok(None);
    }

    let path = options.observer_path();

    let same_package = unit.package.is_some_and(|package| {
        matches!(&tree[package].kind, NodeKind::Package(p) if p.path == options.observer_package)
    });
    let imported = unit.imports.iter().any(|&import| match &tree[import].kind {
        NodeKind::Import(ImportDecl {
            path: p,
            is_static: false,
            is_asterisk,
        }) => {
            if *is_asterisk {
                *p == options.observer_package
            } else {
                *p == path
            }
        }

        _ => false,
    });

    if same_package || imported {
        return Ok(None);
    }

    let header_end = unit
        .package
        .iter()
        .chain(&unit.imports)
        .filter_map(|&id| tree[id].loc.end())
        .max();
    let first_type_line = unit
        .types
        .iter()
        .filter_map(|&id| tree[id].loc.begin())
        .map(|begin| begin.line)
        .min();

    let at = match header_end {
        Some(end) if first_type_line.is_none_or(|line| line > end.line + 1) => {
            Pos::new(end.line + 1, 1)
        }

        Some(end) => end.right(1),
        None => Pos::new(1, 1),
    };

    let import = Builder::new(tree).import(at, &path, false, false);
    let root = tree.root();
    tree.unit_mut()
        .ok_or(LowerError::MissingUnit)?
        .imports
        .push(import);
    tree[import].parent = Some(root);

    debug!(%path, %at, "added observer import");

    Ok(Some(import))
}

fn lower_class(
    tree: &mut Tree,
    class: NodeId,
    properties: &[NodeId],
    options: &LowerOptions,
    lowered: &mut Lowered,
) -> Result<()> {
    let NodeKind::Class(decl) = &tree[class].kind else {
        return Err(LowerError::Dangling(class));
    };

    let class_loc = tree[class].loc;
    let class_name = decl.name.name.clone();
    let last_line = decl
        .members
        .iter()
        .filter_map(|&member| tree.get(member)?.loc.end())
        .map(|end| end.line)
        .max()
        .or(decl.lbrace.begin().map(|lbrace| lbrace.line))
        .or(class_loc.begin().map(|begin| begin.line))
        .unwrap_or(1);
    let col = decl
        .members
        .iter()
        .find_map(|&member| tree.get(member)?.loc.begin())
        .map(|begin| begin.col)
        .or(class_loc.begin().map(|begin| begin.col + options.indent))
        .unwrap_or(1 + options.indent);

    let mut line = last_line + 1;

    for &property in properties {
        let first_line = line;
        let Some(NodeKind::Property(decl)) = tree.take_kind(property) else {
            return Err(LowerError::Dangling(property));
        };
        let name = decl.name.name.clone();
        let members = lower_property(tree, decl, &mut line, col, options)?;

        let NodeKind::Class(class_decl) = &mut tree[class].kind else {
            return Err(LowerError::Dangling(class));
        };
        class_decl.members.retain(|&member| member != property);
        class_decl.members.extend([
            members.backing,
            members.observer,
            members.setter,
            members.getter,
        ]);
        tree.adopt(class);
        tree.discard(property);

        debug!(
            property = %name,
            class = %class_name,
            lines = ?(first_line..line),
            "lowered property"
        );

        lowered.properties.push(name);
        lowered.members.push(members);
    }

    if let Loc::Span(span) = class_loc {
        let end = Pos::new(line.max(span.end.line), span.end.col);
        tree[class].loc = Span::new(span.begin, end).into();
        tree.shift_lines_after(span.end, end.line as i64 - span.end.line as i64, class);
    }

    Ok(())
}

/// Builds the members for one property, advancing `line` past the lines they occupy.
fn lower_property(
    tree: &mut Tree,
    decl: PropertyDecl,
    line: &mut u32,
    col: u32,
    options: &LowerOptions,
) -> Result<Synthesized> {
    let name = &decl.name.name;
    let backing_name = options.backing_name(name);
    let observer_name = options.observer_field_name(name);
    let is_static = decl.modifiers.is_static;
    let modifiers = |accessor: Option<&Accessor>| {
        let visibility = accessor
            .and_then(|accessor| accessor.visibility)
            .or(decl.modifiers.visibility)
            .unwrap_or(Visibility::Public);

        Modifiers {
            visibility: Some(visibility),
            is_static,
            ..Default::default()
        }
    };

    let backing = {
        let at = Pos::new(*line, col);
        *line += 1;

        let ty = clone_erased(tree, decl.ty)?;

        // printed inside the backing field, away from where it was written
        if let Some(default) = decl.default {
            tree.erase_locs(default);
        }

        let var = tree.add(
            Loc::Synthetic,
            VarDeclarator {
                name: Ident::synthetic(&backing_name),
                init: decl.default,
            },
        );

        let modifiers = Modifiers {
            is_static,
            ..Modifiers::private()
        };

        tree.add(
            at,
            FieldDecl {
                modifiers,
                ty,
                vars: vec![var],
            },
        )
    };

    let observer = {
        let at = Pos::new(*line, col);
        *line += 1;

        let ty = observer_ty(tree, decl.ty, options)?;
        let var = tree.add(
            Loc::Synthetic,
            VarDeclarator {
                name: Ident::synthetic(&observer_name),
                init: None,
            },
        );

        tree.add(
            at,
            FieldDecl {
                modifiers: modifiers(None),
                ty,
                vars: vec![var],
            },
        )
    };

    let setter = {
        let at = Pos::new(*line, col);
        let body = match decl.set.body {
            Some(body) => relocate(tree, body, at, decl.set.loc),
            None => default_setter(tree, at, &backing_name, &observer_name, options),
        };
        *line = end_line(tree, body, at) + 1;

        let param_ty = clone_erased(tree, decl.ty)?;
        let param = tree.add(
            Loc::Synthetic,
            Param {
                modifiers: Modifiers::default(),
                ty: Some(param_ty),
                is_var_args: false,
                name: Ident::synthetic(&options.param_name),
            },
        );
        let ret_ty = tree.add(Loc::Synthetic, NodeKind::VoidTy);

        let method = MethodDecl {
            modifiers: modifiers(Some(&decl.set)),
            type_params: vec![],
            ret_ty,
            name: Ident::synthetic(setter_name(name)),
            params: vec![param],
            throws: vec![],
            body: Some(body),
        };

        add_method(tree, at, body, method)
    };

    let getter = {
        let at = Pos::new(*line, col);
        let body = match decl.get.body {
            Some(body) => relocate(tree, body, at, decl.get.loc),
            None => default_getter(tree, at, &backing_name, options),
        };
        *line = end_line(tree, body, at) + 1;

        let ret_ty = clone_erased(tree, decl.ty)?;
        let method = MethodDecl {
            modifiers: modifiers(Some(&decl.get)),
            type_params: vec![],
            ret_ty,
            name: Ident::synthetic(getter_name(name)),
            params: vec![],
            throws: vec![],
            body: Some(body),
        };

        add_method(tree, at, body, method)
    };

    tree.remove(decl.ty);

    for &annotation in &decl.modifiers.annotations {
        tree.remove(annotation);
    }

    Ok(Synthesized {
        backing,
        observer,
        setter,
        getter,
    })
}

fn add_method(tree: &mut Tree, at: Pos, body: NodeId, method: MethodDecl) -> NodeId {
    let loc = match tree[body].loc.end() {
        Some(end) if end > at => Span::new(at, end),
        _ => Span::point(at),
    };

    tree.add(loc, method)
}

fn end_line(tree: &Tree, body: NodeId, at: Pos) -> u32 {
    tree[body]
        .loc
        .end()
        .map_or(at.line, |end| end.line.max(at.line))
}

/// Copies a type for use in a synthesized member, dropping its positions.
fn clone_erased(tree: &mut Tree, ty: NodeId) -> Result<NodeId> {
    let copy = tree.deep_clone(ty).ok_or(LowerError::Dangling(ty))?;
    tree.erase_locs(copy);

    Ok(copy)
}

/// `Observer<T>`, with primitive `T` boxed.
fn observer_ty(tree: &mut Tree, ty: NodeId, options: &LowerOptions) -> Result<NodeId> {
    let arg = match tree.get(ty).map(|node| &node.kind) {
        Some(NodeKind::PrimitiveTy(primitive)) => {
            let boxed = ClassTy {
                scope: None,
                name: primitive.boxed().into(),
                type_args: vec![],
            };

            tree.add(Loc::Synthetic, boxed)
        }

        _ => clone_erased(tree, ty)?,
    };

    let observer = ClassTy {
        scope: None,
        name: options.observer_name.clone(),
        type_args: vec![arg],
    };

    Ok(tree.add(Loc::Synthetic, observer))
}

/// Moves an explicit accessor body onto the lines starting at `at`.
///
/// The body keeps its internal layout: statements stay where they were relative to the accessor
/// keyword, which is mapped onto the member column.
fn relocate(tree: &mut Tree, body: NodeId, at: Pos, accessor: Loc) -> NodeId {
    if let Some(begin) = tree[body].loc.begin() {
        let keyword_col = accessor.begin().map_or(begin.col, |keyword| keyword.col);
        let lines = at.line as i64 - begin.line as i64;
        let cols = at.col as i64 - keyword_col as i64;

        tree.shift(body, lines, cols);
    }

    body
}

fn name(tree: &mut Tree, name: &str) -> NodeId {
    tree.add(Loc::Synthetic, NameExpr { name: name.into() })
}

/// `{ if (observer != null) observer.changed(backing, value); backing = value; }`
fn default_setter(
    tree: &mut Tree,
    at: Pos,
    backing: &str,
    observer: &str,
    options: &LowerOptions,
) -> NodeId {
    let stmt_col = at.col + options.indent;

    let notify = {
        let left = name(tree, observer);
        let right = tree.add(Loc::Synthetic, Literal::Null);
        let cond = tree.add(
            Loc::Synthetic,
            BinaryExpr {
                left,
                op: BinaryOp::Ne,
                right,
            },
        );

        let receiver = name(tree, observer);
        let old = name(tree, backing);
        let new = name(tree, &options.param_name);
        let call = tree.add(
            Loc::Synthetic,
            MethodCall {
                scope: Some(receiver),
                name: Ident::synthetic("changed"),
                args: vec![old, new],
            },
        );
        let then = tree.add(Loc::Synthetic, ExprStmt { expr: call });

        tree.add(
            Pos::new(at.line + 1, stmt_col),
            IfStmt {
                cond,
                then,
                otherwise: None,
            },
        )
    };

    let store = {
        let target = name(tree, backing);
        let value = name(tree, &options.param_name);
        let assign = tree.add(
            Loc::Synthetic,
            AssignExpr {
                target,
                op: AssignOp::Assign,
                value,
            },
        );

        tree.add(Pos::new(at.line + 2, stmt_col), ExprStmt { expr: assign })
    };

    let end = Pos::new(at.line + 3, at.col + 1);

    tree.add(
        Span::new(at, end),
        Block {
            stmts: vec![notify, store],
        },
    )
}

/// `{ return backing; }`
fn default_getter(tree: &mut Tree, at: Pos, backing: &str, options: &LowerOptions) -> NodeId {
    let value = name(tree, backing);
    let ret = tree.add(
        Pos::new(at.line + 1, at.col + options.indent),
        ReturnStmt { expr: Some(value) },
    );
    let end = Pos::new(at.line + 2, at.col + 1);

    tree.add(Span::new(at, end), Block { stmts: vec![ret] })
}
