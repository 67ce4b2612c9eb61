use super::fixtures::{counted_loop, diamond};
use crate::analysis::{FunctionRegion, LoopAnalysis, LoopRegion, Region, RegionImpl};
use crate::block::BlockId;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

#[test]
fn test_function_region_basics() {
    let module = diamond();
    let function = module.function("diamond").unwrap();
    let region = Region::function_region(function);

    assert_eq!(region.describe(), "FunctionRegion (diamond)");
    assert_eq!(region.to_string(), "FunctionRegion (diamond)");
    assert!(!region.is_loop_region());
    assert_eq!(region.entry(), function.entry_block());
    for block in function.blocks() {
        assert!(region.contains(block.id));
    }

    let merge = function.block_by_name("merge").unwrap();
    assert_eq!(region.ending_blocks(), BTreeSet::from([merge]));
}

#[test]
fn test_loop_region_basics() {
    let module = counted_loop();
    let function = module.function("counted").unwrap();
    let loops = LoopAnalysis::from_function(function);
    let region = Region::loop_region(function, &loops.loops[0]);

    let entry = function.block_by_name("entry").unwrap();
    let header = function.block_by_name("header").unwrap();
    let body = function.block_by_name("body").unwrap();
    let exit = function.block_by_name("exit").unwrap();

    assert_eq!(region.describe(), "LoopRegion (header header)");
    assert!(region.is_loop_region());
    assert_eq!(region.entry(), header);
    assert!(region.contains(body));
    assert!(!region.contains(entry));
    assert!(!region.contains(exit));
    assert_eq!(region.ending_blocks(), BTreeSet::from([exit]));
    assert_eq!(region.blocks_rpo(), vec![header, body]);
}

#[test]
fn test_each_call_to_ending_blocks_returns_a_fresh_set() {
    let module = counted_loop();
    let function = module.function("counted").unwrap();
    let region = Region::function_region(function);

    let first = region.ending_blocks();
    let second = region.ending_blocks();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[test]
#[should_panic(expected = "must be empty")]
fn test_collecting_into_non_empty_set_panics() {
    let module = diamond();
    let function = module.function("diamond").unwrap();
    let region = FunctionRegion::new(function);

    let mut ending = BTreeSet::from([BlockId(7)]);
    region.collect_ending_blocks(&mut ending);
}

#[test]
#[should_panic(expected = "must be empty")]
fn test_loop_region_collection_checks_contract() {
    let module = counted_loop();
    let function = module.function("counted").unwrap();
    let loops = LoopAnalysis::from_function(function);
    let region = LoopRegion::new(function, &loops.loops[0]);

    let mut ending = BTreeSet::from([BlockId(0)]);
    region.collect_ending_blocks(&mut ending);
}

#[test]
fn test_for_each_block_stops_early() {
    let module = diamond();
    let function = module.function("diamond").unwrap();
    let region = Region::function_region(function);

    let mut seen = Vec::new();
    region.for_each_block(|block| {
        seen.push(block);
        seen.len() < 2
    });
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], function.entry_block());
}

#[test]
fn test_rpo_visit_follows_whole_function_order() {
    let module = diamond();
    let function = module.function("diamond").unwrap();
    let region = Region::function_region(function);

    let names: Vec<String> = region
        .blocks_rpo()
        .into_iter()
        .map(|b| function.block_name(b))
        .collect();
    assert_eq!(names, vec!["entry", "else", "then", "merge"]);
}

#[test]
fn test_extra_blocks_join_the_region() {
    let module = counted_loop();
    let function = module.function("counted").unwrap();
    let loops = LoopAnalysis::from_function(function);
    let mut region = Region::loop_region(function, &loops.loops[0]);

    let header = function.block_by_name("header").unwrap();
    let body = function.block_by_name("body").unwrap();
    let exit = function.block_by_name("exit").unwrap();

    region.add(exit);
    assert!(region.contains(exit));
    assert_eq!(region.blocks_rpo(), vec![header, exit, body]);

    let mut visited = Vec::new();
    region.for_each_block(|block| {
        visited.push(block);
        true
    });
    assert_eq!(visited, vec![header, body, exit]);

    // Ending blocks come from the region shape alone.
    assert_eq!(region.ending_blocks(), BTreeSet::from([exit]));
}

#[test]
fn test_function_region_over_block_subset() {
    let module = diamond();
    let function = module.function("diamond").unwrap();
    let then_id = function.block_by_name("then").unwrap();

    let region = Region::new(FunctionRegion::with_blocks(function, [then_id]));
    assert!(region.contains(function.entry_block()));
    assert!(region.contains(then_id));
    assert!(!region.contains(function.block_by_name("merge").unwrap()));
    assert!(region.ending_blocks().is_empty());
}
