use super::cfg::{ControlFlowGraph, Loop};
use crate::block::BlockId;
use crate::function::Function;
use std::collections::BTreeSet;
use std::fmt;

pub trait RegionImpl: fmt::Debug {
    fn function(&self) -> &Function;

    fn contains(&self, block: BlockId) -> bool;

    fn entry(&self) -> BlockId;

    fn describe(&self) -> String;

    fn is_loop_region(&self) -> bool {
        false
    }

    fn for_each_block(&self, visitor: &mut dyn FnMut(BlockId) -> bool) {
        for block in self.function().blocks() {
            if !self.contains(block.id) {
                continue;
            }
            if !visitor(block.id) {
                break;
            }
        }
    }

    /// Collects the blocks outside the region that are reached from inside it.
    ///
    /// Panics if `ending` is not empty.
    fn collect_ending_blocks(&self, ending: &mut BTreeSet<BlockId>) {
        assert!(
            ending.is_empty(),
            "ending block set must be empty before collection"
        );

        let function = self.function();
        let mut stack = vec![self.entry()];
        let mut visited = BTreeSet::new();

        while let Some(block) = stack.pop() {
            if !visited.insert(block) {
                continue;
            }

            let successors = function
                .block(block)
                .map(|b| b.successors())
                .unwrap_or_default();
            for succ in successors {
                if self.contains(succ) {
                    stack.push(succ);
                } else {
                    ending.insert(succ);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionRegion<'a> {
    function: &'a Function,
    blocks: BTreeSet<BlockId>,
}

impl<'a> FunctionRegion<'a> {
    pub fn new(function: &'a Function) -> Self {
        Self {
            function,
            blocks: function.blocks().map(|b| b.id).collect(),
        }
    }

    pub fn with_blocks(function: &'a Function, blocks: impl IntoIterator<Item = BlockId>) -> Self {
        let mut blocks: BTreeSet<BlockId> = blocks.into_iter().collect();
        blocks.insert(function.entry_block());
        Self { function, blocks }
    }
}

impl RegionImpl for FunctionRegion<'_> {
    fn function(&self) -> &Function {
        self.function
    }

    fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }

    fn entry(&self) -> BlockId {
        self.function.entry_block()
    }

    fn describe(&self) -> String {
        format!("FunctionRegion ({})", self.function.name())
    }

    fn collect_ending_blocks(&self, ending: &mut BTreeSet<BlockId>) {
        assert!(
            ending.is_empty(),
            "ending block set must be empty before collection"
        );

        for &id in &self.blocks {
            if let Some(block) = self.function.block(id) {
                if block.successors().is_empty() {
                    ending.insert(id);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopRegion<'a> {
    function: &'a Function,
    header: BlockId,
    blocks: BTreeSet<BlockId>,
}

impl<'a> LoopRegion<'a> {
    pub fn new(function: &'a Function, loop_info: &Loop) -> Self {
        Self {
            function,
            header: loop_info.header,
            blocks: loop_info.blocks.clone(),
        }
    }

    pub fn header(&self) -> BlockId {
        self.header
    }
}

impl RegionImpl for LoopRegion<'_> {
    fn function(&self) -> &Function {
        self.function
    }

    fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }

    fn entry(&self) -> BlockId {
        self.header
    }

    fn describe(&self) -> String {
        format!("LoopRegion (header {})", self.function.block_name(self.header))
    }

    fn is_loop_region(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct Region<'a> {
    inner: Box<dyn RegionImpl + 'a>,
    extra_blocks: BTreeSet<BlockId>,
}

impl<'a> Region<'a> {
    pub fn new(inner: impl RegionImpl + 'a) -> Self {
        Self {
            inner: Box::new(inner),
            extra_blocks: BTreeSet::new(),
        }
    }

    pub fn function_region(function: &'a Function) -> Self {
        Self::new(FunctionRegion::new(function))
    }

    pub fn loop_region(function: &'a Function, loop_info: &Loop) -> Self {
        Self::new(LoopRegion::new(function, loop_info))
    }

    pub fn add(&mut self, block: BlockId) {
        self.extra_blocks.insert(block);
    }

    pub fn extra_blocks(&self) -> &BTreeSet<BlockId> {
        &self.extra_blocks
    }

    pub fn contains(&self, block: BlockId) -> bool {
        self.extra_blocks.contains(&block) || self.inner.contains(block)
    }

    pub fn entry(&self) -> BlockId {
        self.inner.entry()
    }

    pub fn function(&self) -> &Function {
        self.inner.function()
    }

    pub fn is_loop_region(&self) -> bool {
        self.inner.is_loop_region()
    }

    pub fn describe(&self) -> String {
        self.inner.describe()
    }

    pub fn for_each_block(&self, mut visitor: impl FnMut(BlockId) -> bool) {
        let mut keep_going = true;
        self.inner.for_each_block(&mut |block| {
            keep_going = visitor(block);
            keep_going
        });
        if !keep_going {
            return;
        }

        for &block in &self.extra_blocks {
            if self.inner.contains(block) {
                continue;
            }
            if !visitor(block) {
                break;
            }
        }
    }

    pub fn for_blocks_rpo(&self, mut visitor: impl FnMut(BlockId) -> bool) {
        let cfg = ControlFlowGraph::from_function(self.function());
        for block in cfg.reverse_post_order() {
            if !self.contains(block) {
                continue;
            }
            if !visitor(block) {
                break;
            }
        }
    }

    pub fn blocks_rpo(&self) -> Vec<BlockId> {
        let mut blocks = Vec::new();
        self.for_blocks_rpo(|block| {
            blocks.push(block);
            true
        });
        blocks
    }

    pub fn ending_blocks(&self) -> BTreeSet<BlockId> {
        let mut ending = BTreeSet::new();
        self.inner.collect_ending_blocks(&mut ending);
        ending
    }
}

impl fmt::Display for Region<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
