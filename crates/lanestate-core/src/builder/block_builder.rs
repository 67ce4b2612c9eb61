use crate::{
    block::{BlockId, Terminator},
    function::Function,
    instructions::{
        BinaryOp, Callee, CastOp, CmpPredicate, InstId, Instruction, MemTransferKind,
    },
    types::Type,
    values::Value,
    IrError, Result,
};

pub struct BlockBuilder<'a> {
    pub block_id: BlockId,
    function: &'a mut Function,
    pending_name: Option<String>,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(block_id: BlockId, function: &'a mut Function) -> Self {
        Self {
            block_id,
            function,
            pending_name: None,
        }
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn named(&mut self, name: &str) -> &mut Self {
        self.pending_name = Some(name.to_string());
        self
    }

    fn push_instruction(&mut self, kind: Instruction, ty: Type) -> InstId {
        let name = self.pending_name.take();
        self.function.body.push_inst(self.block_id, kind, ty, name)
    }

    fn push_value(&mut self, kind: Instruction, ty: Type) -> Value {
        Value::Inst(self.push_instruction(kind, ty))
    }

    pub fn alloca(&mut self, ty: Type) -> Value {
        self.alloca_array(ty, 1)
    }

    pub fn alloca_array(&mut self, ty: Type, count: u32) -> Value {
        self.push_value(Instruction::Alloca { ty, count }, Type::Ptr)
    }

    pub fn load(&mut self, ty: Type, ptr: Value) -> Value {
        self.push_value(Instruction::Load { ptr }, ty)
    }

    pub fn store(&mut self, value: Value, ptr: Value) -> InstId {
        self.push_instruction(Instruction::Store { value, ptr }, Type::Void)
    }

    pub fn memcpy(&mut self, dst: Value, src: Value, len: Value) -> InstId {
        self.push_instruction(
            Instruction::MemTransfer {
                kind: MemTransferKind::Copy,
                dst,
                src,
                len,
            },
            Type::Void,
        )
    }

    pub fn memmove(&mut self, dst: Value, src: Value, len: Value) -> InstId {
        self.push_instruction(
            Instruction::MemTransfer {
                kind: MemTransferKind::Move,
                dst,
                src,
                len,
            },
            Type::Void,
        )
    }

    pub fn gep(&mut self, base: Value, offset: Value) -> Value {
        self.push_value(Instruction::PtrOffset { base, offset }, Type::Ptr)
    }

    pub fn cast(&mut self, op: CastOp, value: Value, ty: Type) -> Value {
        self.push_value(Instruction::Cast { op, value }, ty)
    }

    pub fn bitcast(&mut self, value: Value) -> Value {
        self.cast(CastOp::Bitcast, value, Type::Ptr)
    }

    pub fn binary(&mut self, op: BinaryOp, left: Value, right: Value, ty: Type) -> Value {
        self.push_value(Instruction::Binary { op, left, right }, ty)
    }

    pub fn add(&mut self, left: Value, right: Value, ty: Type) -> Value {
        self.binary(BinaryOp::Add, left, right, ty)
    }

    pub fn mul(&mut self, left: Value, right: Value, ty: Type) -> Value {
        self.binary(BinaryOp::Mul, left, right, ty)
    }

    pub fn icmp(&mut self, pred: CmpPredicate, left: Value, right: Value) -> Value {
        self.push_value(Instruction::Compare { pred, left, right }, Type::Bool)
    }

    pub fn select(&mut self, condition: Value, then_val: Value, else_val: Value) -> Value {
        let ty = self.function.value_type(&then_val);
        self.push_value(
            Instruction::Select {
                condition,
                then_val,
                else_val,
            },
            ty,
        )
    }

    pub fn phi(&mut self, ty: Type, incoming: Vec<(BlockId, Value)>) -> Value {
        self.push_value(Instruction::Phi { incoming }, ty)
    }

    pub fn call(&mut self, callee: &str, args: Vec<Value>, returns: Type) -> Value {
        self.push_value(
            Instruction::Call {
                callee: Callee::Direct(callee.to_string()),
                args,
            },
            returns,
        )
    }

    pub fn call_indirect(&mut self, target: Value, args: Vec<Value>, returns: Type) -> Value {
        self.push_value(
            Instruction::Call {
                callee: Callee::Indirect(target),
                args,
            },
            returns,
        )
    }

    pub fn local_id(&mut self, dim: u8) -> Value {
        self.push_value(Instruction::WorkItemId { dim }, Type::i32())
    }

    pub fn barrier(&mut self) -> InstId {
        self.push_instruction(Instruction::Barrier, Type::Void)
    }

    pub fn jump(&mut self, target: BlockId) -> Result<()> {
        self.seal_with_terminator(Terminator::Jump(target))
    }

    pub fn branch(
        &mut self,
        condition: Value,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<()> {
        self.seal_with_terminator(Terminator::Branch {
            condition,
            then_block,
            else_block,
        })
    }

    pub fn return_value(&mut self, value: Value) -> Result<()> {
        self.seal_with_terminator(Terminator::Return(Some(value)))
    }

    pub fn return_void(&mut self) -> Result<()> {
        self.seal_with_terminator(Terminator::Return(None))
    }

    pub fn unreachable(&mut self) -> Result<()> {
        self.seal_with_terminator(Terminator::Unreachable)
    }

    pub fn is_sealed(&self) -> bool {
        self.function
            .block(self.block_id)
            .map(|b| b.is_terminated())
            .unwrap_or(false)
    }

    pub fn seal_with_terminator(&mut self, terminator: Terminator) -> Result<()> {
        let function_name = self.function.name().to_string();
        let block = self
            .function
            .body
            .get_block_mut(self.block_id)
            .ok_or(IrError::UnknownBlock {
                function: function_name,
                block: self.block_id,
            })?;

        if block.is_terminated() {
            return Err(IrError::BuilderError(format!(
                "Block {} already sealed",
                block.name
            )));
        }

        block.set_terminator(terminator);
        Ok(())
    }
}
