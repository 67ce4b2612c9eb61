/*! Analyze control flow and the memory states of stack allocations.
 *
 * Collapsing barriers into work-item loops needs to know which stack slots each lane touches and
 * where divergent paths merge their per-lane copies. These passes provide CFG construction,
 * dominance and loop discovery, the region abstraction the analyses run over, the pointer
 * provenance lattice, and the AllocaSSA analysis built on top of them.
 */

pub mod alloca_ssa;
pub mod cfg;
pub mod provenance;
pub mod region;

pub use alloca_ssa::{
    AllocaSsa, BlockSummary, DefMap, DescId, Descriptor, EffectDescriptor, JoinDescriptor,
};
pub use cfg::{ControlFlowGraph, DominatorTree, Loop, LoopAnalysis};
pub use provenance::{AllocaSet, Provenance, ProvenanceDisplay, ProvenanceKind};
pub use region::{FunctionRegion, LoopRegion, Region, RegionImpl};
