/*! Stack allocation analysis for work-item kernels.
 *
 * One import for the whole pipeline: build or parse a kernel, carve out a region, run
 * [`AllocaSsa`] to learn which allocations each pointer may reach and where divergent memory
 * states meet, then render the results with [`AnalysisEmitter`].
 */

pub use lanestate_core as core;
pub use lanestate_emit as emit;
pub use lanestate_parser as parser;

pub use lanestate_core::{
    AllocaSsa, BasicBlock, BlockId, DescId, Descriptor, Function, InstId, Instruction,
    JoinDescriptor, LoopAnalysis, Module, ModuleBuilder, Provenance, Region, Terminator, Type,
    Value,
};

pub use lanestate_emit::{AnalysisEmitter, Emitter, EmitterConfig, RegionReport};

pub use lanestate_parser::{parse_module, parse_module_file};
