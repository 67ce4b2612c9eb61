use crate::block::{BlockId, Terminator};
use crate::builder::ModuleBuilder;
use crate::function::{MemoryEffects, Parameter};
use crate::instructions::{Callee, Instruction};
use crate::types::Type;
use crate::values::Value;
use crate::IrError;

#[test]
fn test_instruction_ids_are_sequential() {
    let mut module = ModuleBuilder::new("ids");
    let mut func = module.function("f");
    {
        let mut entry = func.entry_block();
        let a = entry.alloca(Type::i32());
        let b = entry.alloca(Type::i64());
        let s = entry.store(Value::int(0), a);
        let l = entry.load(Type::i64(), b);
        entry.return_void().unwrap();

        assert_eq!(a, Value::Inst(crate::InstId(0)));
        assert_eq!(b, Value::Inst(crate::InstId(1)));
        assert_eq!(s, crate::InstId(2));
        assert_eq!(l, Value::Inst(crate::InstId(3)));
    }
    let function = func.build().unwrap();

    assert_eq!(function.body.insts.len(), 4);
    assert_eq!(function.allocas_in(function.entry_block()).len(), 2);
    assert!(function.inst(crate::InstId(0)).has_result());
    assert!(!function.inst(crate::InstId(2)).has_result());
}

#[test]
fn test_named_applies_to_next_instruction_only() {
    let mut module = ModuleBuilder::new("names");
    let mut func = module.function("f");
    {
        let mut entry = func.entry_block();
        entry.named("slot").alloca(Type::i32());
        entry.alloca(Type::i32());
        entry.return_void().unwrap();
    }
    let function = func.build().unwrap();

    assert_eq!(function.inst_by_name("slot"), Some(crate::InstId(0)));
    assert_eq!(function.inst(crate::InstId(1)).name, None);
}

#[test]
fn test_unterminated_block_is_rejected() {
    let mut module = ModuleBuilder::new("bad");
    let mut func = module.function("f");
    let dangling = func.create_block("dangling");
    {
        let mut entry = func.entry_block();
        entry.jump(dangling).unwrap();
    }

    match func.build() {
        Err(IrError::UnterminatedBlock { function, block }) => {
            assert_eq!(function, "f");
            assert_eq!(block, "dangling");
        }
        other => panic!("expected unterminated block error, got {:?}", other.map(|f| f.name().to_string())),
    }
}

#[test]
fn test_block_cannot_be_sealed_twice() {
    let mut module = ModuleBuilder::new("seal");
    let mut func = module.function("f");
    let mut entry = func.entry_block();
    entry.return_void().unwrap();
    assert!(entry.is_sealed());
    assert!(matches!(
        entry.unreachable(),
        Err(IrError::BuilderError(_))
    ));
}

#[test]
fn test_switch_to_unknown_block_fails() {
    let mut module = ModuleBuilder::new("switch");
    let mut func = module.function("f");
    assert!(matches!(
        func.switch_to_block(BlockId(42)),
        Err(IrError::UnknownBlock { .. })
    ));
}

#[test]
fn test_duplicate_function_names() {
    let mut module = ModuleBuilder::new("dup");
    module
        .declare("f", vec![], Type::Void, MemoryEffects::ReadNone)
        .unwrap();

    let mut func = module.function("f");
    func.entry_block().return_void().unwrap();
    assert!(matches!(func.build(), Err(IrError::DuplicateFunction(name)) if name == "f"));
}

#[test]
fn test_calls_and_callee_resolution() {
    let mut module = ModuleBuilder::new("calls");
    module
        .declare(
            "observe",
            vec![Parameter::unnamed(Type::Ptr).readonly()],
            Type::Void,
            MemoryEffects::ReadOnly,
        )
        .unwrap();

    let mut func = module.function("k");
    func.kernel().readonly_param("table", Type::Ptr);
    {
        let mut entry = func.entry_block();
        let table = Value::param(0);
        entry.call("observe", vec![table], Type::Void);
        entry.call_indirect(table, vec![], Type::Void);
        entry.return_void().unwrap();
    }
    func.build().unwrap();
    let module = module.build();

    let function = module.function("k").unwrap();
    assert!(function.is_kernel());
    assert!(function.signature.param_is_readonly(0));
    assert_eq!(module.kernels().count(), 1);

    let (signature, attributes) = module.resolve_callee("observe").unwrap();
    assert!(signature.param_is_readonly(0));
    assert!(attributes.memory.only_reads_memory());
    assert!(module.resolve_callee("k").is_some());
    assert!(module.resolve_callee("missing").is_none());

    match &function.inst(crate::InstId(1)).kind {
        Instruction::Call { callee, args } => {
            assert_eq!(callee, &Callee::Indirect(Value::param(0)));
            assert!(args.is_empty());
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_branch_to_same_block_has_one_successor() {
    let term = Terminator::Branch {
        condition: Value::bool(true),
        then_block: BlockId(1),
        else_block: BlockId(1),
    };
    assert_eq!(term.successors(), vec![BlockId(1)]);
    assert!(Terminator::Return(None).successors().is_empty());
}

#[test]
fn test_select_takes_type_of_then_value() {
    let mut module = ModuleBuilder::new("select");
    let mut func = module.function("f");
    {
        let mut entry = func.entry_block();
        let a = entry.alloca(Type::i32());
        let s = entry.select(Value::bool(true), a, Value::null());
        entry.return_void().unwrap();
    }
    let function = func.build().unwrap();
    assert_eq!(function.inst(crate::InstId(1)).ty, Type::Ptr);
}
