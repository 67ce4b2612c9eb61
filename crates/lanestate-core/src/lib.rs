/*! Core kernel IR and the alloca provenance analysis built on top of it.
 *
 * Collapsing barriers into structured control flow needs to know which stack objects every
 * pointer may reach and where divergent paths merge different memory states. This crate provides
 * a small SSA kernel IR, CFG regions over it, and the fixpoint analysis that answers those
 * questions for a function body or a single loop.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod format;
pub mod function;
pub mod instructions;
pub mod module;
pub mod types;
pub mod values;

pub use analysis::{
    AllocaSet, AllocaSsa, ControlFlowGraph, DescId, Descriptor, DominatorTree, FunctionRegion,
    JoinDescriptor, Loop, LoopAnalysis, LoopRegion, Provenance, ProvenanceKind, Region,
    RegionImpl,
};
pub use block::{BasicBlock, BlockId, Terminator};
pub use builder::{BlockBuilder, FunctionBuilder, ModuleBuilder};
pub use function::{
    Function, FunctionAttributes, FunctionBody, FunctionDecl, FunctionSignature, MemoryEffects,
    Parameter,
};
pub use instructions::{InstData, InstId, Instruction};
pub use module::Module;
pub use types::Type;
pub use values::{Constant, ParamId, Value};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Unknown block {block} in function {function}")]
    UnknownBlock { function: String, block: BlockId },
    #[error("Block {block} in function {function} has no terminator")]
    UnterminatedBlock { function: String, block: String },
    #[error("Function already defined: {0}")]
    DuplicateFunction(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
