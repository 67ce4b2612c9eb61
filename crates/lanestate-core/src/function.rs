use crate::block::{BasicBlock, BlockId};
use crate::instructions::{InstData, InstId, Instruction};
use crate::types::Type;
use crate::values::{ParamId, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub signature: FunctionSignature,
    pub attributes: FunctionAttributes,
    pub body: FunctionBody,
}

impl Function {
    pub fn new(signature: FunctionSignature) -> Self {
        Self {
            signature,
            attributes: FunctionAttributes::default(),
            body: FunctionBody::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn is_kernel(&self) -> bool {
        self.attributes.kernel
    }

    pub fn entry_block(&self) -> BlockId {
        self.body.entry_block
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.body.blocks.get(&id)
    }

    pub fn block_name(&self, id: BlockId) -> String {
        self.block(id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.body
            .blocks
            .values()
            .find(|b| b.name == name)
            .map(|b| b.id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.body.blocks.values()
    }

    pub fn inst(&self, id: InstId) -> &InstData {
        &self.body.insts[id.index()]
    }

    pub fn inst_by_name(&self, name: &str) -> Option<InstId> {
        self.body
            .insts
            .iter()
            .position(|data| data.name.as_deref() == Some(name))
            .map(|idx| InstId(idx as u32))
    }

    pub fn block_insts(&self, block: BlockId) -> impl Iterator<Item = (InstId, &InstData)> {
        self.block(block)
            .map(|b| b.instructions.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&id| (id, self.inst(id)))
    }

    pub fn param(&self, id: ParamId) -> Option<&Parameter> {
        self.signature.params.get(id.0 as usize)
    }

    pub fn value_type(&self, value: &Value) -> Type {
        match value {
            Value::Inst(id) => self.inst(*id).ty,
            Value::Param(id) => self.param(*id).map(|p| p.param_type).unwrap_or(Type::Void),
            Value::Constant(c) => c.ty(),
        }
    }

    pub fn is_pointer(&self, value: &Value) -> bool {
        self.value_type(value).is_pointer()
    }

    pub fn allocas_in(&self, block: BlockId) -> Vec<InstId> {
        self.block_insts(block)
            .filter(|(_, data)| data.kind.is_alloca())
            .map(|(id, _)| id)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub returns: Type,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: Type::Void,
        }
    }

    pub fn param_is_readonly(&self, index: usize) -> bool {
        self.params.get(index).map(|p| p.readonly).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Option<String>,
    pub param_type: Type,
    pub readonly: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: Type) -> Self {
        Self {
            name: Some(name.into()),
            param_type,
            readonly: false,
        }
    }

    pub fn unnamed(param_type: Type) -> Self {
        Self {
            name: None,
            param_type,
            readonly: false,
        }
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryEffects {
    #[default]
    ReadWrite,
    ReadOnly,
    ReadNone,
}

impl MemoryEffects {
    pub fn only_reads_memory(&self) -> bool {
        matches!(self, MemoryEffects::ReadOnly | MemoryEffects::ReadNone)
    }

    pub fn may_read_memory(&self) -> bool {
        !matches!(self, MemoryEffects::ReadNone)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionAttributes {
    pub kernel: bool,
    pub memory: MemoryEffects,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub signature: FunctionSignature,
    pub attributes: FunctionAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionBody {
    pub entry_block: BlockId,
    pub blocks: IndexMap<BlockId, BasicBlock>,
    pub insts: Vec<InstData>,
    next_block_id: u32,
}

impl FunctionBody {
    pub fn new() -> Self {
        let entry_block = BlockId(0);
        let mut blocks = IndexMap::new();
        blocks.insert(entry_block, BasicBlock::new(entry_block, "entry"));

        Self {
            entry_block,
            blocks,
            insts: Vec::new(),
            next_block_id: 1,
        }
    }

    pub fn create_block(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id, name));
        id
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn push_inst(
        &mut self,
        block: BlockId,
        kind: Instruction,
        ty: Type,
        name: Option<String>,
    ) -> InstId {
        let id = InstId(self.insts.len() as u32);
        self.insts.push(InstData {
            kind,
            ty,
            name,
            block,
        });
        if let Some(b) = self.blocks.get_mut(&block) {
            b.instructions.push(id);
        }
        id
    }

    pub fn next_inst_id(&self) -> InstId {
        InstId(self.insts.len() as u32)
    }
}

impl Default for FunctionBody {
    fn default() -> Self {
        Self::new()
    }
}
