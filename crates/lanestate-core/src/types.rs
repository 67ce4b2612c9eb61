use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Bool,
    Int(u16),
    Float(u16),
    Ptr,
}

impl Type {
    pub fn i32() -> Self {
        Type::Int(32)
    }

    pub fn i64() -> Self {
        Type::Int(64)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Ptr)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            Type::Void => 0,
            Type::Bool => 1,
            Type::Int(bits) | Type::Float(bits) => (*bits as usize + 7) / 8,
            Type::Ptr => 8,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int(bits) => write!(f, "i{}", bits),
            Type::Float(bits) => write!(f, "f{}", bits),
            Type::Ptr => write!(f, "ptr"),
        }
    }
}
