use std::fmt;

use crate::semantic::symbol::SymbolId;

/// The static type lattice. `Struct`/`StructDef` carry the `SymbolId` of the
/// declaring `struct` so equality is by declaration identity, not textual
/// name, per spec §3.1.
#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Bool,
    Void,
    String,

    /// An instance of a named struct.
    Struct(SymbolId),

    /// The type of the struct name itself (a type constructor).
    StructDef(SymbolId),

    Fn {
        params: Vec<Type>,
        ret: Box<Type>,
    },

    /// Sentinel that suppresses cascading diagnostics once a site has already
    /// been reported as ill-typed. Compares unequal to everything, including
    /// itself, except through the explicit propagation rule call sites use
    /// (`Type::is_error`) rather than `==`.
    Error,
}

impl Type {
    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::String)
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    pub fn is_struct_def(&self) -> bool {
        matches!(self, Type::StructDef(_))
    }

    pub fn is_fn(&self) -> bool {
        matches!(self, Type::Fn { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// One word (4 bytes) for every representable value, per spec §4.3:
    /// "All values (int, bool, string address) occupy one word."
    pub fn is_word_sized(&self) -> bool {
        matches!(self, Type::Int | Type::Bool | Type::String | Type::Struct(_))
    }
}

/// Structural equality that respects the `Error` sentinel: `Error` is never
/// `==` to anything, including another `Error` (spec §3.1). Intentionally not
/// `Eq` since this relation isn't reflexive.
impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Error, _) | (_, Type::Error) => false,
            (Type::Int, Type::Int) => true,
            (Type::Bool, Type::Bool) => true,
            (Type::Void, Type::Void) => true,
            (Type::String, Type::String) => true,
            (Type::Struct(a), Type::Struct(b)) => a == b,
            (Type::StructDef(a), Type::StructDef(b)) => a == b,
            (Type::Fn { params: pa, ret: ra }, Type::Fn { params: pb, ret: rb }) => {
                pa == pb && ra == rb
            }
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Void => write!(f, "void"),
            Type::String => write!(f, "string"),
            Type::Struct(id) => write!(f, "struct#{:?}", id),
            Type::StructDef(id) => write!(f, "structdef#{:?}", id),
            Type::Fn { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Error => write!(f, "<error>"),
        }
    }
}
