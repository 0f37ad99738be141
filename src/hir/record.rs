//! Reflection-style views over struct declarations and their methods.
//!
//! Every view borrows the [`Package`] it came from. Records are identified by
//! [`RecordId`] and looked up through the package, so a record never owns or
//! points back into anything on its own.

use std::fmt;

use smol_str::SmolStr;

use super::check::TypeInfo;
use super::ids::RecordId;
use super::package::Package;
use super::sizes::StdSizes;
use super::tag::StructTag;
use super::types::{ItemTypeName, Shape, Type};
use crate::base::{FileId, Position};
use crate::error::{Error, Result};
use crate::syntax::SourceFile;
use crate::syntax::ast::{Comment, FieldDecl, MethodDecl, StructType, TypeDecl, TypeSpec};

/// A struct type declared at package level.
#[derive(Copy, Clone)]
pub struct Record<'p> {
    package: &'p Package,
    id: RecordId,
    file: &'p SourceFile,
    decl: &'p TypeDecl,
    spec: &'p TypeSpec,
    body: &'p StructType,
}

impl<'p> Record<'p> {
    pub(crate) fn new(
        package: &'p Package,
        id: RecordId,
        file: &'p SourceFile,
        decl: &'p TypeDecl,
        spec: &'p TypeSpec,
        body: &'p StructType,
    ) -> Self {
        Self {
            package,
            id,
            file,
            decl,
            spec,
            body,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn name(&self) -> &'p str {
        &self.spec.name
    }

    pub fn package(&self) -> &'p Package {
        self.package
    }

    pub fn file(&self) -> &'p SourceFile {
        self.file
    }

    pub fn spec(&self) -> &'p TypeSpec {
        self.spec
    }

    /// Doc comments of the enclosing `type` declaration.
    pub fn doc(&self) -> &'p [Comment] {
        &self.decl.doc
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.decl.has_marker(marker)
    }

    pub fn type_params(&self) -> &'p [SmolStr] {
        &self.spec.type_params
    }

    pub fn position(&self) -> Option<Position> {
        self.package
            .position(self.file.id(), self.spec.name_range.start())
    }

    /// Fields in declaration order, one per declared name.
    ///
    /// Needs type information: fails with [`Error::MissingTypeInfo`] on a
    /// files-only package and with [`Error::TypeLookup`] when a field's type
    /// was not resolved.
    pub fn fields(&self) -> Result<Vec<Field<'p>>> {
        let info = self.package.type_info()?;
        let mut fields = Vec::with_capacity(self.body.fields.len());
        for decl in &self.body.fields {
            let ty = info
                .type_of(self.file.id(), &decl.ty)
                .ok_or_else(|| Error::TypeLookup {
                    record: self.name().to_string(),
                    field: self.field_label(decl),
                })?;
            if decl.is_embedded() {
                fields.push(Field::new(*self, fields.len(), leaf_name(ty), decl, ty, info));
                continue;
            }
            for name in &decl.names {
                fields.push(Field::new(*self, fields.len(), name, decl, ty, info));
            }
        }
        Ok(fields)
    }

    pub fn field_by_name(&self, name: &str) -> Result<Option<Field<'p>>> {
        Ok(self.fields()?.into_iter().find(|field| field.name() == name))
    }

    fn field_label(&self, decl: &FieldDecl) -> String {
        if !decl.is_embedded() {
            return decl.names.join(", ");
        }
        self.package
            .file_set()
            .contents(self.file.id())
            .and_then(|text| text.get(std::ops::Range::<usize>::from(decl.ty.range)).map(String::from))
            .unwrap_or_else(|| "embedded field".to_string())
    }

    /// Methods declared anywhere in the package with this record as receiver.
    pub fn methods(&self) -> Vec<Method<'p>> {
        self.package.methods_of(self.name()).collect()
    }

    /// The single method called `name`, if any.
    pub fn method_by_name(&self, name: &str) -> Result<Option<Method<'p>>> {
        let mut found: Vec<_> = self
            .methods()
            .into_iter()
            .filter(|method| method.name() == name)
            .collect();
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            count => Err(Error::AmbiguousMethod {
                record: self.name().to_string(),
                method: name.to_string(),
                count,
            }),
        }
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package.path(), self.name())
    }
}

/// One named field of a record; `A, B int` yields two.
#[derive(Copy, Clone)]
pub struct Field<'p> {
    record: Record<'p>,
    index: usize,
    name: &'p str,
    decl: &'p FieldDecl,
    ty: &'p Type,
    info: &'p TypeInfo,
}

impl<'p> Field<'p> {
    fn new(
        record: Record<'p>,
        index: usize,
        name: &'p str,
        decl: &'p FieldDecl,
        ty: &'p Type,
        info: &'p TypeInfo,
    ) -> Self {
        Self {
            record,
            index,
            name,
            decl,
            ty,
            info,
        }
    }

    pub fn name(&self) -> &'p str {
        self.name
    }

    /// Zero-based declaration order within the record.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn record(&self) -> Record<'p> {
        self.record
    }

    pub fn decl(&self) -> &'p FieldDecl {
        self.decl
    }

    pub fn is_embedded(&self) -> bool {
        self.decl.is_embedded()
    }

    /// The declared type, as written (named types stay named).
    pub fn ty(&self) -> &'p Type {
        self.ty
    }

    pub fn shape(&self) -> Shape<'p> {
        self.ty.shape()
    }

    /// Underlying type, or the declared one when its layout is unknown.
    pub fn underlying(&self) -> &'p Type {
        self.info.underlying(self.ty).unwrap_or(self.ty)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.underlying(), Type::Pointer(_))
    }

    pub fn is_slice(&self) -> bool {
        matches!(self.underlying(), Type::Slice(_))
    }

    /// Pointee of a pointer-typed field.
    pub fn elem(&self) -> Option<&'p Type> {
        match self.underlying() {
            Type::Pointer(elem) => Some(elem),
            _ => None,
        }
    }

    /// Name and package of the type under all pointer and container layers.
    pub fn item_type_name(&self) -> ItemTypeName {
        ItemTypeName::of(self.ty)
    }

    /// Raw tag text, without quotes.
    pub fn raw_tag(&self) -> Option<&'p str> {
        self.decl.tag.as_deref()
    }

    pub fn tag(&self, key: &str) -> Option<String> {
        StructTag(self.raw_tag()?).lookup(key)
    }

    /// Size in bytes under the given target layout.
    pub fn std_size(&self, word_size: i64, max_align: i64) -> Option<i64> {
        StdSizes::new(word_size, max_align).size_of(&self.info.package, self.ty)
    }
}

/// Embedded fields are named after the type under their pointer layer.
fn leaf_name(ty: &Type) -> &str {
    match ty.leaf() {
        Type::Named { name, .. } => name.name.as_str(),
        Type::Basic(kind) => kind.name(),
        Type::TypeParam(name) => name.as_str(),
        _ => "",
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("record", &self.record.name())
            .field("index", &self.index)
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

/// A method declaration with a single receiver parameter.
#[derive(Copy, Clone)]
pub struct Method<'p> {
    package: &'p Package,
    file: &'p SourceFile,
    decl: &'p MethodDecl,
}

impl<'p> Method<'p> {
    pub(crate) fn new(package: &'p Package, file: &'p SourceFile, decl: &'p MethodDecl) -> Self {
        Self {
            package,
            file,
            decl,
        }
    }

    pub fn name(&self) -> &'p str {
        &self.decl.name
    }

    pub fn package(&self) -> &'p Package {
        self.package
    }

    pub fn file(&self) -> &'p SourceFile {
        self.file
    }

    pub fn file_id(&self) -> FileId {
        self.file.id()
    }

    pub fn decl(&self) -> &'p MethodDecl {
        self.decl
    }

    pub fn doc(&self) -> &'p [Comment] {
        &self.decl.doc
    }

    pub fn receiver_name(&self) -> Option<&'p str> {
        self.decl.receivers.first()?.name.as_deref()
    }

    /// Base type name of the receiver, `*Box[T]` giving `Box`.
    pub fn receiver_type_name(&self) -> Option<&'p str> {
        self.decl.receiver_type_name()
    }

    pub fn has_pointer_receiver(&self) -> bool {
        self.decl.has_pointer_receiver()
    }

    pub fn position(&self) -> Option<Position> {
        self.package.position(self.file.id(), self.decl.range.start())
    }
}

impl fmt::Debug for Method<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("receiver", &self.receiver_type_name())
            .field("name", &self.name())
            .finish()
    }
}
