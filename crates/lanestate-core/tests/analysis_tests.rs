#![allow(unused_variables)]

use lanestate_core::{
    analysis::AllocaSet,
    builder::ModuleBuilder,
    instructions::CmpPredicate,
    types::Type,
    values::Value,
    AllocaSsa, LoopAnalysis, Module, Provenance, Region,
};
use pretty_assertions::assert_eq;

// Each lane writes its slot of a scratch buffer, then lane 0 reads the first slot.
fn reduce_kernel() -> Module {
    let mut builder = ModuleBuilder::new("reduce");
    let mut func = builder.function("reduce");
    func.param("out", Type::Ptr).kernel();

    let leader = func.create_block("leader");
    let done = func.create_block("done");

    let scratch = {
        let mut entry = func.entry_block();
        let scratch = entry.named("scratch").alloca_array(Type::i32(), 64);
        let lid = entry.named("lid").local_id(0);
        let slot = entry.named("slot").gep(scratch, lid);
        entry.store(lid, slot);
        entry.barrier();
        let c = entry
            .named("c")
            .icmp(CmpPredicate::Eq, lid, Value::int(0));
        entry.branch(c, leader, done).unwrap();
        scratch
    };

    {
        let mut b = func.switch_to_block(leader).unwrap();
        let first = b.named("first").load(Type::i32(), scratch);
        b.store(first, Value::param(0));
        b.jump(done).unwrap();
    }

    func.switch_to_block(done).unwrap().return_void().unwrap();
    func.build().unwrap();
    builder.build()
}

#[test]
fn test_lane_slots_point_into_scratch() {
    let module = reduce_kernel();
    let function = module.function("reduce").unwrap();
    let region = Region::function_region(function);
    let mut ssa = AllocaSsa::new(&module, &region);
    ssa.compute();

    let scratch = function.inst_by_name("scratch").unwrap();
    let slot = function.inst_by_name("slot").unwrap();
    let lid = function.inst_by_name("lid").unwrap();

    assert_eq!(
        ssa.provenance_of(&Value::Inst(slot)),
        Provenance::from_alloca(scratch)
    );
    assert!(ssa.provenance_of(&Value::Inst(lid)).is_bottom());
    assert_eq!(ssa.provenance_of(&Value::param(0)), Provenance::external());
}

#[test]
fn test_scratch_is_live_until_the_leader_reads_it() {
    let module = reduce_kernel();
    let function = module.function("reduce").unwrap();
    let region = Region::function_region(function);
    let mut ssa = AllocaSsa::new(&module, &region);
    ssa.compute();

    let scratch = function.inst_by_name("scratch").unwrap();
    let entry = function.entry_block();
    let leader = function.block_by_name("leader").unwrap();
    let done = function.block_by_name("done").unwrap();

    assert!(ssa.is_live(scratch, entry));
    assert!(ssa.is_live(scratch, leader));
    assert!(!ssa.is_live(scratch, done));
    assert_eq!(ssa.live_allocas(done), AllocaSet::new());

    // `done` merges two paths, but nothing live there disagrees.
    assert!(ssa.join_blocks().is_empty());
}

#[test]
fn test_leader_inherits_the_lane_store() {
    let module = reduce_kernel();
    let function = module.function("reduce").unwrap();
    let region = Region::function_region(function);
    let mut ssa = AllocaSsa::new(&module, &region);
    ssa.compute();

    let scratch = function.inst_by_name("scratch").unwrap();
    let entry = function.entry_block();
    let leader = function.block_by_name("leader").unwrap();

    let entry_insts = &function.block(entry).unwrap().instructions;
    let lane_store = entry_insts[3];
    let lane_effect = ssa.effect_of(lane_store);
    assert!(lane_effect.is_some());
    assert_eq!(ssa.last_definition(entry, scratch), lane_effect);
    assert_eq!(ssa.last_definition(leader, scratch), lane_effect);

    // Stores through the kernel argument get an effect but touch no allocation.
    let out_store = function.block(leader).unwrap().instructions[1];
    assert!(ssa.effect_of(out_store).is_some());
    assert_ne!(ssa.effect_of(out_store), lane_effect);
}

#[test]
fn test_every_loop_region_converges() {
    let module = reduce_kernel();
    let function = module.function("reduce").unwrap();
    let loops = LoopAnalysis::from_function(function);
    assert!(loops.loops.is_empty());

    let text = {
        let region = Region::function_region(function);
        let mut ssa = AllocaSsa::new(&module, &region);
        ssa.compute();
        ssa.to_string()
    };
    assert!(text.starts_with("Pointer Provenance {\nBlock entry\n"));
    assert!(text.contains("    %slot = gep %scratch, %lid : [%scratch]\n"));
    assert!(text.ends_with("}\n"));
}

#[test]
fn test_provenance_display() {
    let module = reduce_kernel();
    let function = module.function("reduce").unwrap();
    let scratch = function.inst_by_name("scratch").unwrap();

    let tracked = Provenance::from_alloca(scratch);
    let mut external = Provenance::external();
    external.merge(&tracked);

    assert_eq!(tracked.display(function).to_string(), "[%scratch]");
    assert_eq!(external.display(function).to_string(), "[%scratch]+");
    assert_eq!(Provenance::Wildcard.display(function).to_string(), "*");
    assert_eq!(Provenance::default().display(function).to_string(), "[]");
}
