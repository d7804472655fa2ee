//! Value types and call signatures.
//!
//! The type system is deliberately flat: three value types and no implicit
//! widening between them. Type equality is the only compatibility test the
//! checker uses.

use std::fmt;

/// The type of an expression after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I32,
    F32,
    /// Produced by `return` and by calls to functions without a result.
    Void,
}

impl ValueType {
    pub fn is_void(self) -> bool {
        matches!(self, ValueType::Void)
    }

    /// Parse the source spelling of a type.
    pub fn from_name(name: &str) -> Option<ValueType> {
        match name {
            "i32" => Some(ValueType::I32),
            "f32" => Some(ValueType::F32),
            "void" => Some(ValueType::Void),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::I32 => "i32",
            ValueType::F32 => "f32",
            ValueType::Void => "void",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameter and result types of a callable (function or extern).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ValueType>,
    pub result: ValueType,
}

impl Signature {
    pub fn new(params: Vec<ValueType>, result: ValueType) -> Self {
        Signature { params, result }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> {}", self.result)
    }
}
