//! Resolved Go types.
//!
//! [`Type`] is what the type checker records for every type expression. Named
//! types are kept by name; their underlying structure lives in the declaring
//! package's [`PackageTypes`](super::PackageTypes) so that recursive types stay
//! finite.

use std::fmt;

use smol_str::SmolStr;

use crate::syntax::ast::ChanDir;

/// Predeclared non-composite types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
}

impl BasicKind {
    /// The predeclared type called `name`; `byte` and `rune` are the aliases
    /// they are in Go.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" | "rune" => Self::Int32,
            "int64" => Self::Int64,
            "uint" => Self::Uint,
            "uint8" | "byte" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "uintptr" => Self::Uintptr,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "complex64" => Self::Complex64,
            "complex128" => Self::Complex128,
            "string" => Self::String,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uintptr => "uintptr",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::String => "string",
            Self::UnsafePointer => "unsafe.Pointer",
        }
    }
}

/// A package-qualified type name. `path` is empty for universe types
/// (`error`, `any`, `comparable`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    pub path: SmolStr,
    pub name: SmolStr,
}

impl TypeName {
    pub fn new(path: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.path, self.name)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: SmolStr,
    pub ty: Type,
    pub embedded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicKind),
    Named { name: TypeName, args: Vec<Type> },
    TypeParam(SmolStr),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    /// `len` is `None` when the length is not a literal (`[N]T`, `[...]T`).
    Array { len: Option<u64>, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Chan { dir: ChanDir, elem: Box<Type> },
    Struct(Vec<StructField>),
    /// Method sets are not modelled; the source text is kept for display.
    Interface(SmolStr),
    Func(SmolStr),
}

/// How a type wraps another, as far as field classification cares.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape<'t> {
    Plain,
    Pointer(&'t Type),
    /// Slices, arrays and channels wrap their element, maps their value.
    Container(&'t Type),
}

impl Type {
    pub fn named(path: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self::Named {
            name: TypeName::new(path, name),
            args: Vec::new(),
        }
    }

    pub fn shape(&self) -> Shape<'_> {
        match self {
            Self::Pointer(elem) => Shape::Pointer(elem),
            Self::Slice(elem) | Self::Array { elem, .. } | Self::Chan { elem, .. } => {
                Shape::Container(elem)
            }
            Self::Map { value, .. } => Shape::Container(value),
            _ => Shape::Plain,
        }
    }

    /// Strips pointer and container layers until a plain type is reached.
    pub fn leaf(&self) -> &Type {
        let mut ty = self;
        loop {
            match ty.shape() {
                Shape::Pointer(elem) | Shape::Container(elem) => ty = elem,
                Shape::Plain => return ty,
            }
        }
    }

    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            Self::Named { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(kind) => f.write_str(kind.name()),
            Self::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    f.write_str("[")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
            Self::TypeParam(name) => f.write_str(name),
            Self::Pointer(elem) => write!(f, "*{elem}"),
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Array { len: Some(len), elem } => write!(f, "[{len}]{elem}"),
            Self::Array { len: None, elem } => write!(f, "[?]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
            Self::Chan { dir: ChanDir::Both, elem } => write!(f, "chan {elem}"),
            Self::Chan { dir: ChanDir::Send, elem } => write!(f, "chan<- {elem}"),
            Self::Chan { dir: ChanDir::Recv, elem } => write!(f, "<-chan {elem}"),
            Self::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                }
                f.write_str("}")
            }
            Self::Interface(text) | Self::Func(text) => f.write_str(text),
        }
    }
}

/// Name and import path of the type at the bottom of a field's type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemTypeName {
    pub name: String,
    /// Import path of the declaring package, empty for unnamed and universe types.
    pub path: String,
}

impl ItemTypeName {
    pub fn of(ty: &Type) -> Self {
        match ty.leaf() {
            Type::Named { name, .. } => Self {
                name: name.name.to_string(),
                path: name.path.to_string(),
            },
            leaf => Self {
                name: leaf.to_string(),
                path: String::new(),
            },
        }
    }
}
