//! Size and alignment of resolved types, following `go/types.StdSizes`.

use super::check::PackageTypes;
use super::types::{BasicKind, Type};

/// Nesting bound for layout computation; deeper types have no size.
const MAX_DEPTH: usize = 64;

/// Word size and maximum alignment of a target, e.g. `StdSizes::new(8, 8)`
/// for amd64.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StdSizes {
    pub word_size: i64,
    pub max_align: i64,
}

impl StdSizes {
    pub const fn new(word_size: i64, max_align: i64) -> Self {
        Self {
            word_size,
            max_align,
        }
    }

    /// Size in bytes of `ty`, with named types looked up through `types`.
    /// `None` when some part of the type has no known layout, when the size
    /// overflows `i64`, or when word size or alignment is not positive.
    pub fn size_of(&self, types: &PackageTypes, ty: &Type) -> Option<i64> {
        self.is_valid().then(|| self.size(types, ty, 0)).flatten()
    }

    pub fn align_of(&self, types: &PackageTypes, ty: &Type) -> Option<i64> {
        self.is_valid().then(|| self.align(types, ty, 0)).flatten()
    }

    fn is_valid(&self) -> bool {
        self.word_size > 0 && self.max_align > 0
    }

    fn size(&self, types: &PackageTypes, ty: &Type, depth: usize) -> Option<i64> {
        if depth > MAX_DEPTH {
            return None;
        }
        let depth = depth + 1;
        let word = self.word_size;
        match types.underlying(ty)? {
            Type::Basic(kind) => self.basic_size(*kind),
            Type::Array { len, elem } => {
                let n = i64::try_from((*len)?).ok()?;
                if n == 0 {
                    return Some(0);
                }
                let elem_align = self.align(types, elem, depth)?;
                let elem_size = self.size(types, elem, depth)?;
                round_up(elem_size, elem_align)?
                    .checked_mul(n - 1)?
                    .checked_add(elem_size)
            }
            Type::Slice(_) => word.checked_mul(3),
            Type::Struct(fields) => {
                if fields.is_empty() {
                    return Some(0);
                }
                let mut offset = 0;
                let mut max_align = 1;
                for field in fields {
                    let align = self.align(types, &field.ty, depth)?;
                    let size = self.size(types, &field.ty, depth)?;
                    offset = round_up(offset, align)?.checked_add(size)?;
                    max_align = max_align.max(align);
                }
                round_up(offset, max_align)
            }
            Type::Interface(_) => word.checked_mul(2),
            Type::Pointer(_) | Type::Map { .. } | Type::Chan { .. } | Type::Func(_) => Some(word),
            Type::Named { .. } | Type::TypeParam(_) => None,
        }
    }

    fn align(&self, types: &PackageTypes, ty: &Type, depth: usize) -> Option<i64> {
        if depth > MAX_DEPTH {
            return None;
        }
        let depth = depth + 1;
        match types.underlying(ty)? {
            Type::Array { elem, .. } => self.align(types, elem, depth),
            Type::Struct(fields) => fields
                .iter()
                .try_fold(1, |max, field| Some(max.max(self.align(types, &field.ty, depth)?))),
            Type::Slice(_) | Type::Interface(_) => Some(self.word_size),
            Type::Basic(kind) => {
                let mut align = self.basic_size(*kind)?;
                if matches!(kind, BasicKind::Complex64 | BasicKind::Complex128) {
                    align /= 2;
                }
                Some(align.clamp(1, self.max_align))
            }
            other => Some(self.size(types, other, depth)?.clamp(1, self.max_align)),
        }
    }

    fn basic_size(&self, kind: BasicKind) -> Option<i64> {
        let size = match kind {
            BasicKind::Bool | BasicKind::Int8 | BasicKind::Uint8 => 1,
            BasicKind::Int16 | BasicKind::Uint16 => 2,
            BasicKind::Int32 | BasicKind::Uint32 | BasicKind::Float32 => 4,
            BasicKind::Int64 | BasicKind::Uint64 | BasicKind::Float64 | BasicKind::Complex64 => 8,
            BasicKind::Complex128 => 16,
            BasicKind::Int | BasicKind::Uint | BasicKind::Uintptr | BasicKind::UnsafePointer => {
                self.word_size
            }
            BasicKind::String => return self.word_size.checked_mul(2),
        };
        Some(size)
    }
}

fn round_up(value: i64, align: i64) -> Option<i64> {
    if align <= 0 {
        return None;
    }
    Some(value.checked_add(align - 1)? / align * align)
}
