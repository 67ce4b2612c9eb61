//! Which pointers an instruction reads or writes through.

use crate::function::{Function, FunctionAttributes, FunctionSignature};
use crate::instructions::{Callee, InstData, Instruction};
use crate::module::Module;
use crate::values::Value;

fn resolve<'m>(
    module: &'m Module,
    callee: &Callee,
) -> Option<(&'m FunctionSignature, &'m FunctionAttributes)> {
    callee.name().and_then(|name| module.resolve_callee(name))
}

/// Pointers the instruction may write through, or `None` if it does not write memory.
///
/// Calls to a known callee skip arguments bound to read-only parameters. Calls that cannot be
/// resolved write through every pointer argument.
pub(crate) fn written_pointers(
    module: &Module,
    function: &Function,
    data: &InstData,
) -> Option<Vec<Value>> {
    match &data.kind {
        Instruction::Store { ptr, .. } => Some(vec![*ptr]),
        Instruction::MemTransfer { dst, .. } => Some(vec![*dst]),
        Instruction::Call { callee, args } => {
            let resolved = resolve(module, callee);
            if let Some((_, attributes)) = resolved {
                if attributes.memory.only_reads_memory() {
                    return None;
                }
            }

            let written: Vec<Value> = args
                .iter()
                .enumerate()
                .filter(|(_, arg)| function.is_pointer(arg))
                .filter(|(index, _)| {
                    resolved
                        .map(|(signature, _)| !signature.param_is_readonly(*index))
                        .unwrap_or(true)
                })
                .map(|(_, arg)| *arg)
                .collect();

            if written.is_empty() {
                None
            } else {
                Some(written)
            }
        }
        _ => None,
    }
}

pub(crate) fn read_pointers(module: &Module, function: &Function, data: &InstData) -> Vec<Value> {
    match &data.kind {
        Instruction::Load { ptr } => vec![*ptr],
        Instruction::MemTransfer { src, .. } => vec![*src],
        Instruction::Call { callee, args } => {
            let may_read = resolve(module, callee)
                .map(|(_, attributes)| attributes.memory.may_read_memory())
                .unwrap_or(true);
            if !may_read {
                return Vec::new();
            }
            args.iter()
                .filter(|arg| function.is_pointer(arg))
                .copied()
                .collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ModuleBuilder;
    use crate::function::{MemoryEffects, Parameter};
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn module_with_calls() -> Module {
        let mut builder = ModuleBuilder::new("effects");
        builder
            .declare(
                "fill",
                vec![
                    Parameter::unnamed(Type::i32()),
                    Parameter::unnamed(Type::Ptr).readonly(),
                    Parameter::unnamed(Type::Ptr),
                ],
                Type::Void,
                MemoryEffects::ReadWrite,
            )
            .unwrap();
        builder
            .declare(
                "peek",
                vec![Parameter::unnamed(Type::Ptr)],
                Type::i32(),
                MemoryEffects::ReadOnly,
            )
            .unwrap();
        builder
            .declare(
                "pure",
                vec![Parameter::unnamed(Type::Ptr)],
                Type::i32(),
                MemoryEffects::ReadNone,
            )
            .unwrap();

        let mut func = builder.function("k");
        {
            let mut entry = func.entry_block();
            let a = entry.named("a").alloca(Type::i32());
            let b = entry.named("b").alloca(Type::i32());
            entry.call("fill", vec![Value::int(3), a, b], Type::Void);
            entry.call("peek", vec![a], Type::i32());
            entry.call("pure", vec![a], Type::i32());
            entry.call("unknown", vec![a, Value::int(1), b], Type::Void);
            entry.return_void().unwrap();
        }
        func.build().unwrap();
        builder.build()
    }

    #[test]
    fn call_skips_readonly_parameter_by_its_own_index() {
        let module = module_with_calls();
        let function = module.function("k").unwrap();
        let a = function.inst_by_name("a").unwrap();
        let b = function.inst_by_name("b").unwrap();

        // `a` binds the read-only parameter 1, `b` the writable parameter 2.
        let fill = function.inst(crate::InstId(2));
        assert_eq!(
            written_pointers(&module, function, fill),
            Some(vec![Value::Inst(b)])
        );
        assert_eq!(
            read_pointers(&module, function, fill),
            vec![Value::Inst(a), Value::Inst(b)]
        );
    }

    #[test]
    fn readonly_and_readnone_calls_do_not_write() {
        let module = module_with_calls();
        let function = module.function("k").unwrap();

        let peek = function.inst(crate::InstId(3));
        let pure = function.inst(crate::InstId(4));
        assert_eq!(written_pointers(&module, function, peek), None);
        assert_eq!(written_pointers(&module, function, pure), None);
        assert_eq!(read_pointers(&module, function, peek).len(), 1);
        assert!(read_pointers(&module, function, pure).is_empty());
    }

    #[test]
    fn unresolved_call_writes_every_pointer_argument() {
        let module = module_with_calls();
        let function = module.function("k").unwrap();
        let a = function.inst_by_name("a").unwrap();
        let b = function.inst_by_name("b").unwrap();

        let unknown = function.inst(crate::InstId(5));
        assert_eq!(
            written_pointers(&module, function, unknown),
            Some(vec![Value::Inst(a), Value::Inst(b)])
        );
    }
}
