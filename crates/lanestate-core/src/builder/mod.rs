/*! Fluent API for constructing kernel IR programmatically.
 *
 * Tests and the text parser both need to assemble functions block by block. These builders keep
 * instruction numbering, block creation and terminator validation in one place so callers only
 * describe the program.
 */

pub mod block_builder;
pub mod function_builder;

pub use block_builder::BlockBuilder;
pub use function_builder::FunctionBuilder;

use crate::{
    function::{FunctionAttributes, FunctionDecl, FunctionSignature, MemoryEffects, Parameter},
    module::Module,
    types::Type,
    Function, IrError, Result,
};

pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            module: Module::new(name),
        }
    }

    pub fn function(&mut self, name: &str) -> FunctionBuilder<'_> {
        FunctionBuilder::new(name, self)
    }

    pub fn declare(
        &mut self,
        name: &str,
        params: Vec<Parameter>,
        returns: Type,
        memory: MemoryEffects,
    ) -> Result<()> {
        if self.module.is_defined(name) {
            return Err(IrError::DuplicateFunction(name.to_string()));
        }

        let signature = FunctionSignature {
            name: name.to_string(),
            params,
            returns,
        };
        self.module.declarations.insert(
            name.to_string(),
            FunctionDecl {
                signature,
                attributes: FunctionAttributes {
                    kernel: false,
                    memory,
                },
            },
        );
        Ok(())
    }

    pub fn add_function(&mut self, function: Function) -> Result<()> {
        let name = function.name().to_string();
        if self.module.is_defined(&name) {
            return Err(IrError::DuplicateFunction(name));
        }
        self.module.functions.insert(name, function);
        Ok(())
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn build(self) -> Module {
        self.module
    }
}
