use crate::block::BlockId;
use crate::types::Type;
use crate::values::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstId(pub u32);

impl InstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for InstId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Alloca {
        ty: Type,
        count: u32,
    },
    Load {
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    MemTransfer {
        kind: MemTransferKind,
        dst: Value,
        src: Value,
        len: Value,
    },
    PtrOffset {
        base: Value,
        offset: Value,
    },
    Cast {
        op: CastOp,
        value: Value,
    },
    Binary {
        op: BinaryOp,
        left: Value,
        right: Value,
    },
    Compare {
        pred: CmpPredicate,
        left: Value,
        right: Value,
    },
    Select {
        condition: Value,
        then_val: Value,
        else_val: Value,
    },
    Phi {
        incoming: Vec<(BlockId, Value)>,
    },
    Call {
        callee: Callee,
        args: Vec<Value>,
    },
    WorkItemId {
        dim: u8,
    },
    Barrier,
}

impl Instruction {
    pub fn operands(&self) -> Vec<Value> {
        match self {
            Instruction::Alloca { .. } | Instruction::WorkItemId { .. } | Instruction::Barrier => {
                Vec::new()
            }
            Instruction::Load { ptr } => vec![*ptr],
            Instruction::Store { value, ptr } => vec![*value, *ptr],
            Instruction::MemTransfer { dst, src, len, .. } => vec![*dst, *src, *len],
            Instruction::PtrOffset { base, offset } => vec![*base, *offset],
            Instruction::Cast { value, .. } => vec![*value],
            Instruction::Binary { left, right, .. } | Instruction::Compare { left, right, .. } => {
                vec![*left, *right]
            }
            Instruction::Select {
                condition,
                then_val,
                else_val,
            } => vec![*condition, *then_val, *else_val],
            Instruction::Phi { incoming } => incoming.iter().map(|(_, v)| *v).collect(),
            Instruction::Call { callee, args } => {
                let mut values = Vec::with_capacity(args.len() + 1);
                if let Callee::Indirect(target) = callee {
                    values.push(*target);
                }
                values.extend(args.iter().copied());
                values
            }
        }
    }

    pub fn is_alloca(&self) -> bool {
        matches!(self, Instruction::Alloca { .. })
    }

    pub fn is_load(&self) -> bool {
        matches!(self, Instruction::Load { .. })
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Instruction::Call { .. })
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Alloca { .. } => "alloca",
            Instruction::Load { .. } => "load",
            Instruction::Store { .. } => "store",
            Instruction::MemTransfer { kind, .. } => kind.mnemonic(),
            Instruction::PtrOffset { .. } => "gep",
            Instruction::Cast { op, .. } => op.mnemonic(),
            Instruction::Binary { op, .. } => op.mnemonic(),
            Instruction::Compare { .. } => "icmp",
            Instruction::Select { .. } => "select",
            Instruction::Phi { .. } => "phi",
            Instruction::Call { .. } => "call",
            Instruction::WorkItemId { .. } => "local_id",
            Instruction::Barrier => "barrier",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstData {
    pub kind: Instruction,
    pub ty: Type,
    pub name: Option<String>,
    pub block: BlockId,
}

impl InstData {
    pub fn has_result(&self) -> bool {
        !self.ty.is_void()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Callee {
    Direct(String),
    Indirect(Value),
}

impl Callee {
    pub fn name(&self) -> Option<&str> {
        match self {
            Callee::Direct(name) => Some(name),
            Callee::Indirect(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemTransferKind {
    Copy,
    Move,
}

impl MemTransferKind {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            MemTransferKind::Copy => "memcpy",
            MemTransferKind::Move => "memmove",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastOp {
    Bitcast,
    PtrToInt,
    IntToPtr,
    ZExt,
    SExt,
    Trunc,
}

impl CastOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CastOp::Bitcast => "bitcast",
            CastOp::PtrToInt => "ptrtoint",
            CastOp::IntToPtr => "inttoptr",
            CastOp::ZExt => "zext",
            CastOp::SExt => "sext",
            CastOp::Trunc => "trunc",
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Some(match s {
            "bitcast" => CastOp::Bitcast,
            "ptrtoint" => CastOp::PtrToInt,
            "inttoptr" => CastOp::IntToPtr,
            "zext" => CastOp::ZExt,
            "sext" => CastOp::SExt,
            "trunc" => CastOp::Trunc,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Rem => "rem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "shr",
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Some(match s {
            "add" => BinaryOp::Add,
            "sub" => BinaryOp::Sub,
            "mul" => BinaryOp::Mul,
            "div" => BinaryOp::Div,
            "rem" => BinaryOp::Rem,
            "and" => BinaryOp::And,
            "or" => BinaryOp::Or,
            "xor" => BinaryOp::Xor,
            "shl" => BinaryOp::Shl,
            "shr" => BinaryOp::Shr,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl CmpPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CmpPredicate::Eq => "eq",
            CmpPredicate::Ne => "ne",
            CmpPredicate::Slt => "slt",
            CmpPredicate::Sle => "sle",
            CmpPredicate::Sgt => "sgt",
            CmpPredicate::Sge => "sge",
            CmpPredicate::Ult => "ult",
            CmpPredicate::Ule => "ule",
            CmpPredicate::Ugt => "ugt",
            CmpPredicate::Uge => "uge",
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Some(match s {
            "eq" => CmpPredicate::Eq,
            "ne" => CmpPredicate::Ne,
            "slt" => CmpPredicate::Slt,
            "sle" => CmpPredicate::Sle,
            "sgt" => CmpPredicate::Sgt,
            "sge" => CmpPredicate::Sge,
            "ult" => CmpPredicate::Ult,
            "ule" => CmpPredicate::Ule,
            "ugt" => CmpPredicate::Ugt,
            "uge" => CmpPredicate::Uge,
            _ => return None,
        })
    }
}
