use crate::block::BlockId;
use crate::function::Function;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    pub blocks: Vec<BlockId>,
    pub edges: IndexMap<BlockId, Vec<BlockId>>,
    pub reverse_edges: IndexMap<BlockId, Vec<BlockId>>,
    pub entry: BlockId,
}

impl ControlFlowGraph {
    pub fn from_function(function: &Function) -> Self {
        let mut edges = IndexMap::new();
        let mut reverse_edges: IndexMap<BlockId, Vec<BlockId>> = IndexMap::new();

        for block in function.blocks() {
            reverse_edges.entry(block.id).or_default();
        }

        for block in function.blocks() {
            let successors = block.successors();
            for &succ in &successors {
                reverse_edges.entry(succ).or_default().push(block.id);
            }
            edges.insert(block.id, successors);
        }

        Self {
            blocks: function.blocks().map(|b| b.id).collect(),
            edges,
            reverse_edges,
            entry: function.entry_block(),
        }
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.reverse_edges
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, block: BlockId) -> &[BlockId] {
        self.edges.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.reachable_blocks().contains(&block)
    }

    pub fn reachable_blocks(&self) -> HashSet<BlockId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(self.entry);

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                for &succ in self.successors(current) {
                    queue.push_back(succ);
                }
            }
        }

        visited
    }

    pub fn reverse_post_order(&self) -> Vec<BlockId> {
        let mut visited = HashSet::new();
        let mut post_order = Vec::with_capacity(self.blocks.len());
        let mut stack: Vec<(BlockId, usize)> = vec![(self.entry, 0)];
        visited.insert(self.entry);

        while let Some((block, next)) = stack.pop() {
            let successors = self.successors(block);
            if next < successors.len() {
                stack.push((block, next + 1));
                let succ = successors[next];
                if visited.insert(succ) {
                    stack.push((succ, 0));
                }
            } else {
                post_order.push(block);
            }
        }

        post_order.reverse();
        post_order
    }
}

#[derive(Debug, Clone)]
pub struct DominatorTree {
    dominators: HashMap<BlockId, HashSet<BlockId>>,
    immediate_dominators: HashMap<BlockId, BlockId>,
}

impl DominatorTree {
    pub fn from_cfg(cfg: &ControlFlowGraph) -> Self {
        let mut dominators = HashMap::new();
        let reachable = cfg.reachable_blocks();
        let order = cfg.reverse_post_order();

        dominators.insert(cfg.entry, HashSet::from([cfg.entry]));
        for &block in &order {
            if block != cfg.entry {
                dominators.insert(block, reachable.clone());
            }
        }

        let mut changed = true;
        while changed {
            changed = false;

            for &block in &order {
                if block == cfg.entry {
                    continue;
                }

                let mut new_doms = HashSet::from([block]);

                let mut preds = cfg
                    .predecessors(block)
                    .iter()
                    .filter(|p| reachable.contains(p));
                if let Some(first) = preds.next() {
                    let mut intersection = dominators.get(first).cloned().unwrap_or_default();

                    for pred in preds {
                        if let Some(pred_doms) = dominators.get(pred) {
                            intersection = intersection.intersection(pred_doms).cloned().collect();
                        }
                    }

                    new_doms.extend(intersection);
                }

                if dominators.get(&block) != Some(&new_doms) {
                    dominators.insert(block, new_doms);
                    changed = true;
                }
            }
        }

        let immediate_dominators = Self::compute_immediate_dominators(&dominators, cfg.entry);

        Self {
            dominators,
            immediate_dominators,
        }
    }

    fn compute_immediate_dominators(
        dominators: &HashMap<BlockId, HashSet<BlockId>>,
        entry: BlockId,
    ) -> HashMap<BlockId, BlockId> {
        let mut idoms = HashMap::new();

        for (&block, doms) in dominators {
            if block == entry {
                continue;
            }

            // The strict dominator with the most dominators of its own is the closest one.
            let idom = doms
                .iter()
                .filter(|&&d| d != block)
                .max_by_key(|&&d| dominators.get(&d).map(|s| s.len()).unwrap_or(0));

            if let Some(&idom) = idom {
                idoms.insert(block, idom);
            }
        }

        idoms
    }

    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.dominators
            .get(&b)
            .map(|doms| doms.contains(&a))
            .unwrap_or(false)
    }

    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.immediate_dominators.get(&block).cloned()
    }
}

#[derive(Debug, Clone)]
pub struct Loop {
    pub header: BlockId,
    pub blocks: BTreeSet<BlockId>,
    pub back_edges: Vec<(BlockId, BlockId)>,
    pub exiting: BTreeSet<BlockId>,
    pub exits: BTreeSet<BlockId>,
    pub depth: usize,
}

impl Loop {
    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }
}

#[derive(Debug, Clone)]
pub struct LoopAnalysis {
    pub loops: Vec<Loop>,
    pub loop_headers: HashSet<BlockId>,
    pub loop_depth: HashMap<BlockId, usize>,
}

impl LoopAnalysis {
    pub fn from_function(function: &Function) -> Self {
        let cfg = ControlFlowGraph::from_function(function);
        let dom_tree = DominatorTree::from_cfg(&cfg);
        Self::from_cfg(&cfg, &dom_tree)
    }

    pub fn from_cfg(cfg: &ControlFlowGraph, dom_tree: &DominatorTree) -> Self {
        let mut back_edges: IndexMap<BlockId, Vec<BlockId>> = IndexMap::new();
        let reachable = cfg.reachable_blocks();

        for &block in &cfg.blocks {
            if !reachable.contains(&block) {
                continue;
            }
            for &succ in cfg.successors(block) {
                if dom_tree.dominates(succ, block) {
                    back_edges.entry(succ).or_default().push(block);
                }
            }
        }

        let mut loops = Vec::new();
        for (header, tails) in back_edges {
            let mut loop_blocks = BTreeSet::from([header]);
            let mut queue: VecDeque<BlockId> = tails.iter().copied().collect();

            while let Some(block) = queue.pop_front() {
                if loop_blocks.insert(block) {
                    for &pred in cfg.predecessors(block) {
                        if reachable.contains(&pred) {
                            queue.push_back(pred);
                        }
                    }
                }
            }

            let mut exiting = BTreeSet::new();
            let mut exits = BTreeSet::new();
            for &block in &loop_blocks {
                for &succ in cfg.successors(block) {
                    if !loop_blocks.contains(&succ) {
                        exiting.insert(block);
                        exits.insert(succ);
                    }
                }
            }

            loops.push(Loop {
                header,
                blocks: loop_blocks,
                back_edges: tails.into_iter().map(|tail| (tail, header)).collect(),
                exiting,
                exits,
                depth: 0,
            });
        }

        let loop_depth = Self::compute_loop_depth(&loops);
        for l in &mut loops {
            l.depth = loop_depth.get(&l.header).cloned().unwrap_or(1);
        }
        let loop_headers = loops.iter().map(|l| l.header).collect();

        Self {
            loops,
            loop_headers,
            loop_depth,
        }
    }

    fn compute_loop_depth(loops: &[Loop]) -> HashMap<BlockId, usize> {
        let mut depth_map = HashMap::new();

        for loop_info in loops {
            for &block in &loop_info.blocks {
                *depth_map.entry(block).or_insert(0) += 1;
            }
        }

        depth_map
    }

    pub fn is_in_loop(&self, block: BlockId) -> bool {
        self.loop_depth.contains_key(&block)
    }

    pub fn get_loop_depth(&self, block: BlockId) -> usize {
        self.loop_depth.get(&block).cloned().unwrap_or(0)
    }

    pub fn loop_with_header(&self, header: BlockId) -> Option<&Loop> {
        self.loops.iter().find(|l| l.header == header)
    }
}
