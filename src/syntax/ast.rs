//! Owned declaration model of one Go file.
//!
//! The parser lowers the tree-sitter concrete syntax tree into these types so
//! that nothing above the syntax layer holds a borrow of the parse tree. Only
//! the parts the package model needs are kept: imports, type declarations,
//! method declarations and comments. Every type expression keeps its byte
//! range, which together with the file id is its identity in the type map.

use smol_str::SmolStr;

use crate::base::TextRange;

/// A `//` or `/* */` comment, text included verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub text: SmolStr,
    pub range: TextRange,
    /// 0-indexed line of the comment start.
    pub line: u32,
}

impl Comment {
    /// Body of a line comment with the `//` stripped, `None` for block comments.
    pub fn line_body(&self) -> Option<&str> {
        self.text.strip_prefix("//")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name, including `.` and `_`.
    pub name: Option<SmolStr>,
    /// Unquoted import path.
    pub path: SmolStr,
    pub range: TextRange,
}

/// A `type` declaration; grouped declarations carry several specs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub doc: Vec<Comment>,
    pub specs: Vec<TypeSpec>,
    pub range: TextRange,
}

impl TypeDecl {
    /// True when a doc comment line reads exactly `//go:<marker>`.
    pub fn has_marker(&self, marker: &str) -> bool {
        self.doc.iter().any(|comment| {
            comment
                .line_body()
                .and_then(|body| body.strip_prefix("go:"))
                .is_some_and(|rest| rest == marker)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: SmolStr,
    pub name_range: TextRange,
    pub type_params: Vec<SmolStr>,
    /// `type A = B`
    pub is_alias: bool,
    pub ty: TypeExpr,
    pub range: TextRange,
}

impl TypeSpec {
    /// The struct body, for non-alias specs declaring a struct type.
    pub fn struct_type(&self) -> Option<&StructType> {
        match &self.ty.kind {
            TypeExprKind::Struct(st) if !self.is_alias => Some(st),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeExpr {
    pub range: TextRange,
    pub kind: TypeExprKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeExprKind {
    Name(SmolStr),
    Qualified { package: SmolStr, name: SmolStr },
    Generic { base: Box<TypeExpr>, args: Vec<TypeExpr> },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    /// `len` is the source text of the length expression, `None` for `[...]T`.
    Array { len: Option<SmolStr>, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Struct(StructType),
    Interface(SmolStr),
    Func(SmolStr),
    Paren(Box<TypeExpr>),
    /// Constraint-only syntax such as unions and `~T`.
    Unsupported(SmolStr),
}

impl TypeExpr {
    /// Calls `f` on this expression and every nested type expression, outermost first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TypeExpr)) {
        f(self);
        match &self.kind {
            TypeExprKind::Generic { base, args } => {
                base.walk(f);
                args.iter().for_each(|arg| arg.walk(f));
            }
            TypeExprKind::Pointer(inner)
            | TypeExprKind::Slice(inner)
            | TypeExprKind::Paren(inner)
            | TypeExprKind::Array { elem: inner, .. }
            | TypeExprKind::Chan { elem: inner, .. } => inner.walk(f),
            TypeExprKind::Map { key, value } => {
                key.walk(f);
                value.walk(f);
            }
            TypeExprKind::Struct(st) => st.fields.iter().for_each(|field| field.ty.walk(f)),
            TypeExprKind::Name(_)
            | TypeExprKind::Qualified { .. }
            | TypeExprKind::Interface(_)
            | TypeExprKind::Func(_)
            | TypeExprKind::Unsupported(_) => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct StructType {
    pub fields: Vec<FieldDecl>,
}

/// One line of a struct body: `A, B int "tag"` or an embedded `*pkg.T`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    /// Empty for embedded fields.
    pub names: Vec<SmolStr>,
    /// For embedded `*T` this is a pointer expression spanning `*T`.
    pub ty: TypeExpr,
    /// Tag literal with its quotes removed, escapes already decoded.
    pub tag: Option<String>,
    pub range: TextRange,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiverParam {
    pub name: Option<SmolStr>,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: SmolStr,
    pub receivers: Vec<ReceiverParam>,
    pub doc: Vec<Comment>,
    pub range: TextRange,
}

impl MethodDecl {
    /// Name of the receiver's base type: one pointer layer and a generic
    /// instantiation are unwrapped (`*Box[T]` → `Box`).
    ///
    /// `None` unless there is exactly one receiver parameter naming a local type.
    pub fn receiver_type_name(&self) -> Option<&str> {
        let [receiver] = self.receivers.as_slice() else {
            return None;
        };
        let mut ty = &receiver.ty;
        if let TypeExprKind::Paren(inner) = &ty.kind {
            ty = inner;
        }
        if let TypeExprKind::Pointer(inner) = &ty.kind {
            ty = inner;
        }
        if let TypeExprKind::Generic { base, .. } = &ty.kind {
            ty = base;
        }
        match &ty.kind {
            TypeExprKind::Name(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn has_pointer_receiver(&self) -> bool {
        matches!(
            self.receivers.as_slice(),
            [ReceiverParam { ty: TypeExpr { kind: TypeExprKind::Pointer(_), .. }, .. }]
        )
    }
}
