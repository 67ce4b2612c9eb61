use crate::{
    block::{BasicBlock, Terminator},
    function::{Function, FunctionAttributes, FunctionSignature, MemoryEffects},
    instructions::{Callee, InstId, Instruction},
    module::Module,
    types::Type,
    values::Value,
};

pub fn format_module(module: &Module) -> String {
    let mut output = String::new();

    for decl in module.declarations.values() {
        output.push_str(&format_declaration(&decl.signature, &decl.attributes));
        output.push('\n');
    }
    if !module.declarations.is_empty() && !module.functions.is_empty() {
        output.push('\n');
    }

    for (i, function) in module.functions.values().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format_function(function));
    }

    output
}

pub fn format_declaration(signature: &FunctionSignature, attributes: &FunctionAttributes) -> String {
    let params: Vec<String> = signature
        .params
        .iter()
        .map(|p| {
            if p.readonly {
                format!("{} readonly", p.param_type)
            } else {
                p.param_type.to_string()
            }
        })
        .collect();

    format!(
        "declare @{}({}) -> {}{}",
        signature.name,
        params.join(", "),
        signature.returns,
        format_memory(attributes.memory)
    )
}

pub fn format_function(function: &Function) -> String {
    let params: Vec<String> = function
        .signature
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let name = p.name.clone().unwrap_or_else(|| format!("arg{}", i));
            if p.readonly {
                format!("{} readonly %{}", p.param_type, name)
            } else {
                format!("{} %{}", p.param_type, name)
            }
        })
        .collect();

    let mut output = format!("func @{}({})", function.name(), params.join(", "));
    if !function.signature.returns.is_void() {
        output.push_str(&format!(" -> {}", function.signature.returns));
    }
    if function.is_kernel() {
        output.push_str(" kernel");
    }
    output.push_str(&format_memory(function.attributes.memory));
    output.push_str(" {\n");

    for block in function.blocks() {
        output.push_str(&format_block(function, block));
    }

    output.push_str("}\n");
    output
}

pub fn format_block(function: &Function, block: &BasicBlock) -> String {
    let mut output = format!("{}:\n", block.name);

    for &inst in &block.instructions {
        output.push_str("    ");
        output.push_str(&format_instruction(function, inst));
        output.push('\n');
    }

    output.push_str("    ");
    output.push_str(&format_terminator(function, &block.terminator));
    output.push('\n');
    output
}

pub fn format_instruction(function: &Function, id: InstId) -> String {
    let data = function.inst(id);
    let v = |value: &Value| format_value(function, value);

    let body = match &data.kind {
        Instruction::Alloca { ty, count } => {
            if *count == 1 {
                format!("alloca {}", ty)
            } else {
                format!("alloca {}, {}", ty, count)
            }
        }
        Instruction::Load { ptr } => format!("load {}, {}", data.ty, v(ptr)),
        Instruction::Store { value, ptr } => format!("store {}, {}", v(value), v(ptr)),
        Instruction::MemTransfer {
            kind,
            dst,
            src,
            len,
        } => format!("{} {}, {}, {}", kind.mnemonic(), v(dst), v(src), v(len)),
        Instruction::PtrOffset { base, offset } => format!("gep {}, {}", v(base), v(offset)),
        Instruction::Cast { op, value } => {
            format!("{} {} to {}", op.mnemonic(), v(value), data.ty)
        }
        Instruction::Binary { op, left, right } => {
            format!("{} {} {}, {}", op.mnemonic(), data.ty, v(left), v(right))
        }
        Instruction::Compare { pred, left, right } => {
            format!("icmp {} {}, {}", pred.mnemonic(), v(left), v(right))
        }
        Instruction::Select {
            condition,
            then_val,
            else_val,
        } => format!("select {}, {}, {}", v(condition), v(then_val), v(else_val)),
        Instruction::Phi { incoming } => {
            let edges: Vec<String> = incoming
                .iter()
                .map(|(block, value)| format!("[{}, {}]", v(value), function.block_name(*block)))
                .collect();
            format!("phi {} {}", data.ty, edges.join(", "))
        }
        Instruction::Call { callee, args } => {
            let target = match callee {
                Callee::Direct(name) => format!("@{}", name),
                Callee::Indirect(value) => v(value),
            };
            let args: Vec<String> = args.iter().map(|a| v(a)).collect();
            format!("call {} {}({})", data.ty, target, args.join(", "))
        }
        Instruction::WorkItemId { dim } => format!("local_id {}", dim),
        Instruction::Barrier => "barrier".to_string(),
    };

    if data.has_result() {
        format!("{} = {}", v(&Value::Inst(id)), body)
    } else {
        body
    }
}

pub fn format_terminator(function: &Function, terminator: &Terminator) -> String {
    match terminator {
        Terminator::Jump(target) => format!("jump {}", function.block_name(*target)),
        Terminator::Branch {
            condition,
            then_block,
            else_block,
        } => format!(
            "br {}, {}, {}",
            format_value(function, condition),
            function.block_name(*then_block),
            function.block_name(*else_block)
        ),
        Terminator::Return(Some(value)) => format!("ret {}", format_value(function, value)),
        Terminator::Return(None) => "ret".to_string(),
        Terminator::Unreachable => "unreachable".to_string(),
        Terminator::Invalid => "<invalid>".to_string(),
    }
}

pub fn format_value(function: &Function, value: &Value) -> String {
    match value {
        Value::Inst(id) => format_inst_ref(function, *id),
        Value::Param(id) => match function.param(*id).and_then(|p| p.name.as_ref()) {
            Some(name) => format!("%{}", name),
            None => format!("%{}", id),
        },
        Value::Constant(c) => c.to_string(),
    }
}

pub fn format_inst_ref(function: &Function, id: InstId) -> String {
    match &function.inst(id).name {
        Some(name) => format!("%{}", name),
        None => format!("%{}", id),
    }
}

pub fn format_type(ty: &Type) -> String {
    ty.to_string()
}

fn format_memory(memory: MemoryEffects) -> String {
    match memory {
        MemoryEffects::ReadWrite => String::new(),
        MemoryEffects::ReadOnly => " readonly".to_string(),
        MemoryEffects::ReadNone => " readnone".to_string(),
    }
}
