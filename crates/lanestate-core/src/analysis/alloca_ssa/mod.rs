/*! Memory-state SSA for stack allocations over a region.
 *
 * Work-item loop transforms need to know, for every stack allocation, which instructions may
 * touch it and where divergent definitions of its memory meet. [`AllocaSsa`] answers that with
 * three fixpoints over a [`Region`]: pointer provenance, allocation liveness, and definition/join
 * tracking. Writes become effect descriptors and merge points become join descriptors, both
 * owned by the analysis and referenced through [`DescId`].
 */

mod descriptor;
mod effects;

pub use descriptor::{DescId, Descriptor, EffectDescriptor, JoinDescriptor};

use super::cfg::ControlFlowGraph;
use super::provenance::{format_alloca_list, AllocaSet, Provenance};
use super::region::Region;
use crate::block::BlockId;
use crate::format::{format_inst_ref, format_instruction};
use crate::function::Function;
use crate::instructions::{InstId, Instruction};
use crate::module::Module;
use crate::values::Value;
use descriptor::DescriptorArena;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, trace};

pub type DefMap = BTreeMap<InstId, DescId>;

#[derive(Debug, Clone)]
pub struct BlockSummary {
    pub block: BlockId,
    pub live: AllocaSet,
    pub join: DescId,
    pub last_defs: DefMap,
}

#[derive(Debug)]
pub struct AllocaSsa<'a> {
    module: &'a Module,
    region: &'a Region<'a>,
    function: &'a Function,
    cfg: ControlFlowGraph,
    rpo: Vec<BlockId>,
    allocas: Vec<InstId>,
    inst_provenance: BTreeMap<InstId, Provenance>,
    summaries: BTreeMap<BlockId, BlockSummary>,
    descriptors: DescriptorArena,
    effects: BTreeMap<InstId, DescId>,
}

impl<'a> AllocaSsa<'a> {
    pub fn new(module: &'a Module, region: &'a Region<'a>) -> Self {
        let function = region.function();
        let cfg = ControlFlowGraph::from_function(function);
        let rpo = region_rpo(&cfg, region);
        Self {
            module,
            region,
            function,
            cfg,
            rpo,
            allocas: Vec::new(),
            inst_provenance: BTreeMap::new(),
            summaries: BTreeMap::new(),
            descriptors: DescriptorArena::default(),
            effects: BTreeMap::new(),
        }
    }

    /// Runs all three passes. Previous results are discarded first.
    ///
    /// Panics if the region entry is unreachable from the function entry.
    pub fn compute(&mut self) {
        self.reset();
        assert!(
            self.rpo.contains(&self.region.entry()),
            "region entry must be reachable from the function entry"
        );

        debug!(
            region = %self.region,
            blocks = self.rpo.len(),
            "computing alloca ssa"
        );

        self.collect_allocas();
        self.compute_pointer_provenance();
        self.compute_liveness();
        self.compute_definitions();

        debug!(
            region = %self.region,
            descriptors = self.descriptors.len(),
            effects = self.effects.len(),
            "alloca ssa converged"
        );
    }

    fn reset(&mut self) {
        self.cfg = ControlFlowGraph::from_function(self.function);
        self.rpo = region_rpo(&self.cfg, self.region);
        self.allocas.clear();
        self.inst_provenance.clear();
        self.summaries.clear();
        self.descriptors.clear();
        self.effects.clear();
    }

    fn collect_allocas(&mut self) {
        let mut allocas = BTreeSet::new();
        allocas.extend(self.function.allocas_in(self.region.entry()));
        allocas.extend(self.function.allocas_in(self.function.entry_block()));

        for &alloca in &allocas {
            self.inst_provenance
                .insert(alloca, Provenance::from_alloca(alloca));
        }
        self.allocas = allocas.into_iter().collect();
    }

    fn request_summary(&mut self, block: BlockId) -> &mut BlockSummary {
        let descriptors = &mut self.descriptors;
        self.summaries.entry(block).or_insert_with(|| BlockSummary {
            block,
            live: AllocaSet::new(),
            join: descriptors.alloc(Descriptor::Join(JoinDescriptor {
                block,
                allocas: Provenance::default(),
            })),
            last_defs: DefMap::new(),
        })
    }

    fn inst_provenance(&self, inst: InstId) -> Provenance {
        self.inst_provenance.get(&inst).cloned().unwrap_or_default()
    }

    fn compute_pointer_provenance(&mut self) {
        let function = self.function;
        // Pointers derived above a loop region still carry provenance into it.
        let mut worklist = vec![function.entry_block()];
        let mut seen = HashSet::new();
        let mut visits = 0usize;

        while let Some(block) = worklist.pop() {
            visits += 1;
            let mut changed = seen.insert(block);

            for (id, data) in function.block_insts(block) {
                if !data.ty.is_pointer() {
                    continue;
                }

                match &data.kind {
                    Instruction::Alloca { .. } => {
                        if self.inst_provenance.contains_key(&id) {
                            continue;
                        }
                        self.inst_provenance.insert(id, Provenance::from_alloca(id));
                        changed = true;
                    }
                    Instruction::Load { .. } | Instruction::Call { .. } => {
                        if self.inst_provenance.contains_key(&id) {
                            continue;
                        }
                        self.inst_provenance.insert(id, Provenance::Wildcard);
                        changed = true;
                    }
                    kind => {
                        let mut prov = self.inst_provenance(id);
                        let mut inst_changed = false;
                        for operand in kind.operands() {
                            let Some(op) = operand.as_inst() else {
                                continue;
                            };
                            if let Some(op_prov) = self.inst_provenance.get(&op) {
                                inst_changed |= prov.merge(op_prov);
                            }
                        }

                        if inst_changed {
                            self.inst_provenance.insert(id, prov);
                            changed = true;
                        }
                    }
                }
            }

            if changed {
                worklist.extend(self.cfg.successors(block).iter().copied());
            }
        }

        debug!(
            visits,
            pointers = self.inst_provenance.len(),
            "pointer provenance converged"
        );
    }

    fn read_allocas(&self, block: BlockId) -> AllocaSet {
        let mut read = AllocaSet::new();
        for (_, data) in self.function.block_insts(block) {
            for ptr in effects::read_pointers(self.module, self.function, data) {
                let Some(inst) = ptr.as_inst() else {
                    continue;
                };
                // Wildcard reads carry no allocation set.
                read.extend(self.inst_provenance(inst).allocas().iter().copied());
            }
        }
        read
    }

    fn compute_liveness(&mut self) {
        let mut stack: Vec<BlockId> = self.region.ending_blocks().into_iter().collect();
        let mut visited = HashSet::new();
        let mut visits = 0usize;

        while let Some(block) = stack.pop() {
            visits += 1;
            let mut changed = visited.insert(block);

            let read = self.read_allocas(block);
            let summary = self.request_summary(block);
            for alloca in read {
                changed |= summary.live.insert(alloca);
            }
            let live = summary.live.clone();

            let preds = self.cfg.predecessors(block).to_vec();
            for pred in preds {
                if pred == block || !self.region.contains(pred) {
                    continue;
                }

                let mut pred_changed = changed;
                let pred_summary = self.request_summary(pred);
                for &alloca in &live {
                    pred_changed |= pred_summary.live.insert(alloca);
                }

                if pred_changed {
                    stack.push(pred);
                }
            }
        }

        debug!(visits, "liveness converged");
    }

    /// Definition arriving from `pred` for each of `live`. `None` stands for the state on region
    /// entry.
    fn incoming_definitions(&self, pred: BlockId, live: &AllocaSet) -> Vec<(InstId, Option<DescId>)> {
        let defs = self
            .summaries
            .get(&pred)
            .filter(|_| self.region.contains(pred))
            .map(|summary| &summary.last_defs);

        live.iter()
            .map(|&alloca| (alloca, defs.and_then(|d| d.get(&alloca).copied())))
            .collect()
    }

    fn compute_definitions(&mut self) {
        let rpo = self.rpo.clone();
        let mut worklist = BTreeSet::from([self.region.entry()]);
        let mut visited: HashSet<BlockId> = HashSet::new();
        let mut sweeps = 0usize;

        while !worklist.is_empty() {
            sweeps += 1;

            for &block in &rpo {
                if !worklist.remove(&block) {
                    continue;
                }
                let first_visit = visited.insert(block);
                let live = self.request_summary(block).live.clone();

                // Predecessor definitions of live allocations; disagreement means a join.
                let mut incoming: BTreeMap<InstId, Option<DescId>> = BTreeMap::new();
                let mut join_set = AllocaSet::new();
                for &pred in self.cfg.predecessors(block) {
                    if self.region.contains(pred) && !visited.contains(&pred) {
                        continue;
                    }

                    for (alloca, def) in self.incoming_definitions(pred, &live) {
                        match incoming.get(&alloca) {
                            None => {
                                incoming.insert(alloca, def);
                            }
                            Some(&seen) if seen != def => {
                                trace!(
                                    block = %self.function.block_name(block),
                                    alloca = %format_inst_ref(self.function, alloca),
                                    "divergent definitions"
                                );
                                join_set.insert(alloca);
                            }
                            Some(_) => {}
                        }
                    }
                }

                let join_id = self.request_summary(block).join;
                let mut block_changed = first_visit;
                let accumulated = match self.descriptors.join_mut(join_id) {
                    Some(join) => {
                        block_changed |= join.allocas.merge(&Provenance::Tracked(join_set));
                        join.allocas.allocas().clone()
                    }
                    None => AllocaSet::new(),
                };

                let mut defs: DefMap = incoming
                    .into_iter()
                    .filter_map(|(alloca, def)| def.map(|d| (alloca, d)))
                    .collect();
                for &alloca in accumulated.intersection(&live) {
                    defs.insert(alloca, join_id);
                }

                block_changed |= self.apply_block_effects(block, &mut defs);

                let summary = self.request_summary(block);
                if summary.last_defs != defs {
                    summary.last_defs = defs;
                    block_changed = true;
                }

                if !block_changed {
                    continue;
                }

                for &succ in self.cfg.successors(block) {
                    if self.region.contains(succ) {
                        worklist.insert(succ);
                    }
                }
            }
        }

        debug!(sweeps, joins = self.join_blocks().len(), "definitions converged");
    }

    fn apply_block_effects(&mut self, block: BlockId, defs: &mut DefMap) -> bool {
        let function = self.function;
        let mut created = false;

        for (id, data) in function.block_insts(block) {
            let Some(written) = effects::written_pointers(self.module, function, data) else {
                continue;
            };

            let mut joined = Provenance::default();
            for ptr in written {
                // Non-instruction pointers do not alias allocations.
                if let Some(inst) = ptr.as_inst() {
                    joined.merge(&self.inst_provenance(inst));
                }
            }

            let effect = match self.effects.get(&id) {
                Some(&effect) => effect,
                None => {
                    let effect = self.descriptors.alloc(Descriptor::Effect(EffectDescriptor {
                        block,
                        inst: id,
                    }));
                    self.effects.insert(id, effect);
                    created = true;
                    effect
                }
            };

            if joined.is_top() {
                for &alloca in &self.allocas {
                    defs.insert(alloca, effect);
                }
            } else {
                for &alloca in joined.allocas() {
                    defs.insert(alloca, effect);
                }
            }
        }

        created
    }

    pub fn module(&self) -> &Module {
        self.module
    }

    pub fn region(&self) -> &Region<'a> {
        self.region
    }

    pub fn function(&self) -> &Function {
        self.function
    }

    pub fn allocas(&self) -> &[InstId] {
        &self.allocas
    }

    pub fn blocks_rpo(&self) -> &[BlockId] {
        &self.rpo
    }

    pub fn provenance_of(&self, value: &Value) -> Provenance {
        match value {
            Value::Inst(inst) => self.inst_provenance(*inst),
            _ => Provenance::external(),
        }
    }

    pub fn summary(&self, block: BlockId) -> Option<&BlockSummary> {
        self.summaries.get(&block)
    }

    pub fn join_descriptor_of(&self, block: BlockId) -> Option<&JoinDescriptor> {
        self.summaries
            .get(&block)
            .and_then(|summary| self.descriptors.join(summary.join))
    }

    pub fn join_blocks(&self) -> Vec<BlockId> {
        self.rpo
            .iter()
            .copied()
            .filter(|&block| {
                self.join_descriptor_of(block)
                    .map(|join| !join.allocas.is_bottom())
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn is_live(&self, alloca: InstId, block: BlockId) -> bool {
        self.summaries
            .get(&block)
            .map(|summary| summary.live.contains(&alloca))
            .unwrap_or(false)
    }

    pub fn live_allocas(&self, block: BlockId) -> AllocaSet {
        self.summaries
            .get(&block)
            .map(|summary| summary.live.clone())
            .unwrap_or_default()
    }

    pub fn effect_of(&self, inst: InstId) -> Option<DescId> {
        self.effects.get(&inst).copied()
    }

    pub fn last_definition(&self, block: BlockId, alloca: InstId) -> Option<DescId> {
        self.summaries
            .get(&block)
            .and_then(|summary| summary.last_defs.get(&alloca).copied())
    }

    pub fn descriptor(&self, id: DescId) -> &Descriptor {
        self.descriptors.get(id)
    }

    pub fn print<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "Pointer Provenance {{")?;

        for &block in &self.rpo {
            let mut block_printed = false;

            if let Some(summary) = self.summaries.get(&block) {
                writeln!(out, "Block {}", self.function.block_name(block))?;
                if let Some(join) = self.descriptors.join(summary.join) {
                    if !join.allocas.is_bottom() {
                        let names: Vec<String> = join
                            .allocas
                            .allocas()
                            .iter()
                            .map(|&a| format_inst_ref(self.function, a))
                            .collect();
                        writeln!(out, "\tjoin {{{}}}", names.join(", "))?;
                    }
                }
                if !summary.live.is_empty() {
                    writeln!(
                        out,
                        "\tlive {}",
                        format_alloca_list(self.function, &summary.live)
                    )?;
                }
                block_printed = true;
            }

            for (id, _) in self.function.block_insts(block) {
                let prov = self.inst_provenance(id);
                if prov.is_bottom() {
                    continue;
                }
                if !block_printed {
                    writeln!(out, "Block {}", self.function.block_name(block))?;
                    block_printed = true;
                }
                writeln!(
                    out,
                    "    {} : {}",
                    format_instruction(self.function, id),
                    prov.display(self.function)
                )?;
            }

            if block_printed {
                writeln!(out)?;
            }
        }

        writeln!(out, "}}")
    }
}

impl fmt::Display for AllocaSsa<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f)
    }
}

fn region_rpo(cfg: &ControlFlowGraph, region: &Region<'_>) -> Vec<BlockId> {
    cfg.reverse_post_order()
        .into_iter()
        .filter(|&block| region.contains(block))
        .collect()
}
