//! Serializable snapshots of an [`AllocaSsa`] result.

use lanestate_core::{
    format::{format_inst_ref, format_instruction},
    AllocaSsa, DescId, Descriptor, Function, InstId, ProvenanceKind, Value,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionReport {
    pub function: String,
    pub region: String,
    pub is_loop: bool,
    pub allocas: Vec<String>,
    pub blocks: Vec<BlockReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReport {
    pub name: String,
    pub join: Vec<String>,
    pub live: Vec<String>,
    pub definitions: Vec<DefinitionReport>,
    pub instructions: Vec<InstProvenance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionReport {
    pub alloca: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstProvenance {
    pub instruction: String,
    pub kind: ProvenanceKind,
    pub provenance: String,
}

impl RegionReport {
    pub fn from_analysis(ssa: &AllocaSsa<'_>) -> Self {
        let function = ssa.function();
        let blocks = ssa
            .blocks_rpo()
            .iter()
            .map(|&block| {
                let join = ssa
                    .join_descriptor_of(block)
                    .map(|join| names(function, join.allocas.allocas().iter().copied()))
                    .unwrap_or_default();
                let live = names(function, ssa.live_allocas(block));
                let definitions = ssa
                    .summary(block)
                    .map(|summary| {
                        summary
                            .last_defs
                            .iter()
                            .map(|(&alloca, &desc)| DefinitionReport {
                                alloca: format_inst_ref(function, alloca),
                                descriptor: describe_descriptor(ssa, desc),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let instructions = function
                    .block_insts(block)
                    .filter_map(|(id, _)| {
                        let prov = ssa.provenance_of(&Value::Inst(id));
                        if prov.is_bottom() {
                            return None;
                        }
                        Some(InstProvenance {
                            instruction: format_instruction(function, id),
                            kind: prov.kind(),
                            provenance: prov.display(function).to_string(),
                        })
                    })
                    .collect();

                BlockReport {
                    name: function.block_name(block),
                    join,
                    live,
                    definitions,
                    instructions,
                }
            })
            .collect();

        Self {
            function: function.name().to_string(),
            region: ssa.region().describe(),
            is_loop: ssa.region().is_loop_region(),
            allocas: names(function, ssa.allocas().iter().copied()),
            blocks,
        }
    }

    pub fn block(&self, name: &str) -> Option<&BlockReport> {
        self.blocks.iter().find(|block| block.name == name)
    }

    pub fn join_blocks(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|block| !block.join.is_empty())
            .map(|block| block.name.as_str())
            .collect()
    }
}

fn names(function: &Function, ids: impl IntoIterator<Item = InstId>) -> Vec<String> {
    ids.into_iter()
        .map(|id| format_inst_ref(function, id))
        .collect()
}

fn describe_descriptor(ssa: &AllocaSsa<'_>, id: DescId) -> String {
    let function = ssa.function();
    match ssa.descriptor(id) {
        Descriptor::Join(join) => format!("{} join {}", id, function.block_name(join.block)),
        Descriptor::Effect(effect) => {
            format!("{} {}", id, format_instruction(function, effect.inst))
        }
    }
}
