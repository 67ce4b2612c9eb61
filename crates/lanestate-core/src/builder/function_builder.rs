use super::{BlockBuilder, ModuleBuilder};
use crate::{
    block::BlockId,
    function::{Function, FunctionSignature, MemoryEffects, Parameter},
    types::Type,
    values::{ParamId, Value},
    IrError, Result,
};

pub struct FunctionBuilder<'a> {
    function: Function,
    module: &'a mut ModuleBuilder,
    current_block: Option<BlockId>,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(name: &str, module: &'a mut ModuleBuilder) -> Self {
        Self {
            function: Function::new(FunctionSignature::new(name)),
            module,
            current_block: None,
        }
    }

    pub fn param(&mut self, name: &str, ty: Type) -> &mut Self {
        self.function
            .signature
            .params
            .push(Parameter::new(name, ty));
        self
    }

    pub fn readonly_param(&mut self, name: &str, ty: Type) -> &mut Self {
        self.function
            .signature
            .params
            .push(Parameter::new(name, ty).readonly());
        self
    }

    pub fn returns(&mut self, ty: Type) -> &mut Self {
        self.function.signature.returns = ty;
        self
    }

    pub fn kernel(&mut self) -> &mut Self {
        self.function.attributes.kernel = true;
        self
    }

    pub fn memory(&mut self, memory: MemoryEffects) -> &mut Self {
        self.function.attributes.memory = memory;
        self
    }

    pub fn get_param(&self, index: usize) -> Value {
        Value::Param(ParamId(index as u32))
    }

    pub fn create_block(&mut self, name: &str) -> BlockId {
        self.function.body.create_block(name)
    }

    pub fn set_block_name(&mut self, block_id: BlockId, name: &str) -> Result<()> {
        let function_name = self.function.name().to_string();
        let block = self
            .function
            .body
            .get_block_mut(block_id)
            .ok_or(IrError::UnknownBlock {
                function: function_name,
                block: block_id,
            })?;
        block.name = name.to_string();
        Ok(())
    }

    pub fn entry_block(&mut self) -> BlockBuilder<'_> {
        let block_id = self.function.body.entry_block;
        self.current_block = Some(block_id);
        BlockBuilder::new(block_id, &mut self.function)
    }

    pub fn block(&mut self, name: &str) -> BlockBuilder<'_> {
        let block_id = self.function.body.create_block(name);
        self.current_block = Some(block_id);
        BlockBuilder::new(block_id, &mut self.function)
    }

    pub fn switch_to_block(&mut self, block_id: BlockId) -> Result<BlockBuilder<'_>> {
        if self.function.body.get_block(block_id).is_none() {
            return Err(IrError::UnknownBlock {
                function: self.function.name().to_string(),
                block: block_id,
            });
        }

        self.current_block = Some(block_id);
        Ok(BlockBuilder::new(block_id, &mut self.function))
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    pub fn current_function(&self) -> &Function {
        &self.function
    }

    pub fn build(self) -> Result<&'a Function> {
        let name = self.function.name().to_string();

        if let Some(block) = self.function.blocks().find(|b| !b.is_terminated()) {
            return Err(IrError::UnterminatedBlock {
                function: name,
                block: block.name.clone(),
            });
        }

        let module = self.module;
        module.add_function(self.function)?;

        let module: &'a ModuleBuilder = module;
        module.module().function(&name).ok_or_else(|| {
            IrError::BuilderError(format!(
                "Function {} not found after registration",
                name
            ))
        })
    }
}
