//! Lowering of parse trees into [`Module`]s through the core builders.

use crate::error::{ParseError, Result};
use crate::Rule;
use lanestate_core::{
    block::BlockId,
    builder::{BlockBuilder, FunctionBuilder, ModuleBuilder},
    instructions::{BinaryOp, CastOp, CmpPredicate, InstId},
    Constant, MemoryEffects, Module, Parameter, Type, Value,
};
use pest::iterators::{Pair, Pairs};
use std::collections::HashMap;
use tracing::debug;

pub fn lower_module(name: &str, pairs: Pairs<'_, Rule>) -> Result<Module> {
    let mut builder = ModuleBuilder::new(name);

    for pair in pairs.flat_map(|p| p.into_inner()) {
        match pair.as_rule() {
            Rule::declaration => lower_declaration(&mut builder, pair)?,
            Rule::function => lower_function(&mut builder, pair)?,
            _ => {}
        }
    }

    let module = builder.build();
    debug!(
        module = %module.name,
        functions = module.functions.len(),
        declarations = module.declarations.len(),
        "lowered module"
    );
    Ok(module)
}

fn symbol(pair: &Pair<'_, Rule>) -> String {
    pair.as_str()[1..].to_string()
}

pub(crate) fn parse_type(text: &str) -> Result<Type> {
    let bits = |rest: &str| {
        rest.parse::<u16>()
            .map_err(|_| ParseError::InvalidLiteral(text.to_string()))
    };

    match text {
        "void" => Ok(Type::Void),
        "bool" => Ok(Type::Bool),
        "ptr" => Ok(Type::Ptr),
        _ if text.starts_with('i') => Ok(Type::Int(bits(&text[1..])?)),
        _ if text.starts_with('f') => Ok(Type::Float(bits(&text[1..])?)),
        _ => Err(ParseError::InvalidLiteral(text.to_string())),
    }
}

fn parse_memory(text: &str) -> MemoryEffects {
    match text {
        "readonly" => MemoryEffects::ReadOnly,
        "readnone" => MemoryEffects::ReadNone,
        _ => MemoryEffects::ReadWrite,
    }
}

fn lower_declaration(builder: &mut ModuleBuilder, pair: Pair<'_, Rule>) -> Result<()> {
    let mut name = String::new();
    let mut params = Vec::new();
    let mut returns = Type::Void;
    let mut memory = MemoryEffects::ReadWrite;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::global_name => name = symbol(&part),
            Rule::decl_params => {
                for decl_param in part.into_inner() {
                    let mut inner = decl_param.into_inner();
                    let ty = match inner.next() {
                        Some(ty) => parse_type(ty.as_str())?,
                        None => continue,
                    };
                    let param = Parameter::unnamed(ty);
                    params.push(if inner.next().is_some() {
                        param.readonly()
                    } else {
                        param
                    });
                }
            }
            Rule::ty => returns = parse_type(part.as_str())?,
            Rule::memory_attr => memory = parse_memory(part.as_str()),
            _ => {}
        }
    }

    builder.declare(&name, params, returns, memory)?;
    Ok(())
}

struct Scope {
    function: String,
    values: HashMap<String, Value>,
    blocks: HashMap<String, BlockId>,
}

impl Scope {
    fn define_value(&mut self, name: String, value: Value) -> Result<()> {
        if self.values.insert(name.clone(), value).is_some() {
            return Err(ParseError::DuplicateValue {
                function: self.function.clone(),
                name,
            });
        }
        Ok(())
    }

    fn value(&self, pair: Pair<'_, Rule>) -> Result<Value> {
        let text = pair.as_str();
        match pair.as_rule() {
            Rule::local_name => {
                self.values
                    .get(&text[1..])
                    .copied()
                    .ok_or_else(|| ParseError::UnknownValue {
                        function: self.function.clone(),
                        name: text[1..].to_string(),
                    })
            }
            Rule::int_lit => text
                .parse::<i64>()
                .map(Value::int)
                .map_err(|_| ParseError::InvalidLiteral(text.to_string())),
            Rule::bool_lit => Ok(Value::bool(text == "true")),
            Rule::null_lit => Ok(Value::null()),
            Rule::undef_lit => Ok(Value::Constant(Constant::Undef)),
            _ => Err(ParseError::InvalidLiteral(text.to_string())),
        }
    }

    fn block(&self, pair: &Pair<'_, Rule>) -> Result<BlockId> {
        self.blocks
            .get(pair.as_str())
            .copied()
            .ok_or_else(|| ParseError::UnknownBlock {
                function: self.function.clone(),
                name: pair.as_str().to_string(),
            })
    }
}

struct ParsedBlock<'i> {
    id: BlockId,
    statements: Vec<Pair<'i, Rule>>,
    terminator: Option<Pair<'i, Rule>>,
}

fn lower_function(builder: &mut ModuleBuilder, pair: Pair<'_, Rule>) -> Result<()> {
    let mut name = String::new();
    let mut params: Vec<(String, Type, bool)> = Vec::new();
    let mut returns = Type::Void;
    let mut kernel = false;
    let mut memory = MemoryEffects::ReadWrite;
    let mut blocks = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::global_name => name = symbol(&part),
            Rule::params => {
                for param in part.into_inner() {
                    let mut ty = Type::Void;
                    let mut readonly = false;
                    let mut param_name = String::new();
                    for piece in param.into_inner() {
                        match piece.as_rule() {
                            Rule::ty => ty = parse_type(piece.as_str())?,
                            Rule::readonly_kw => readonly = true,
                            Rule::local_name => param_name = symbol(&piece),
                            _ => {}
                        }
                    }
                    params.push((param_name, ty, readonly));
                }
            }
            Rule::ty => returns = parse_type(part.as_str())?,
            Rule::kernel_kw => kernel = true,
            Rule::memory_attr => memory = parse_memory(part.as_str()),
            Rule::block => blocks.push(part),
            _ => {}
        }
    }

    let mut scope = Scope {
        function: name.clone(),
        values: HashMap::new(),
        blocks: HashMap::new(),
    };

    let mut func = builder.function(&name);
    for (index, (param_name, ty, readonly)) in params.into_iter().enumerate() {
        if readonly {
            func.readonly_param(&param_name, ty);
        } else {
            func.param(&param_name, ty);
        }
        scope.define_value(param_name, Value::param(index as u32))?;
    }
    func.returns(returns).memory(memory);
    if kernel {
        func.kernel();
    }

    let parsed = declare_blocks(&mut func, &mut scope, blocks)?;
    number_values(&mut scope, &parsed)?;

    for block in parsed {
        let mut block_builder = func.switch_to_block(block.id)?;
        for statement in block.statements {
            lower_statement(&mut block_builder, &scope, statement)?;
        }
        if let Some(terminator) = block.terminator {
            lower_terminator(&mut block_builder, &scope, terminator)?;
        }
    }

    func.build()?;
    Ok(())
}

fn declare_blocks<'i>(
    func: &mut FunctionBuilder<'_>,
    scope: &mut Scope,
    blocks: Vec<Pair<'i, Rule>>,
) -> Result<Vec<ParsedBlock<'i>>> {
    let mut parsed = Vec::with_capacity(blocks.len());

    for (index, block) in blocks.into_iter().enumerate() {
        let mut inner = block.into_inner();
        let label = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();

        if scope.blocks.contains_key(&label) {
            return Err(ParseError::DuplicateBlock {
                function: scope.function.clone(),
                name: label,
            });
        }

        let id = if index == 0 {
            let entry = func.current_function().entry_block();
            func.set_block_name(entry, &label)?;
            entry
        } else {
            func.create_block(&label)
        };
        scope.blocks.insert(label, id);

        let mut statements: Vec<Pair<'i, Rule>> = inner.collect();
        let terminator = statements.pop();
        parsed.push(ParsedBlock {
            id,
            statements,
            terminator,
        });
    }

    Ok(parsed)
}

fn number_values(scope: &mut Scope, blocks: &[ParsedBlock<'_>]) -> Result<()> {
    let mut next = 0u32;
    for block in blocks {
        for statement in &block.statements {
            if statement.as_rule() == Rule::assignment {
                if let Some(name) = statement.clone().into_inner().next() {
                    scope.define_value(symbol(&name), Value::Inst(InstId(next)))?;
                }
            }
            next += 1;
        }
    }
    Ok(())
}

fn lower_statement(b: &mut BlockBuilder<'_>, scope: &Scope, pair: Pair<'_, Rule>) -> Result<()> {
    if pair.as_rule() != Rule::assignment {
        return lower_operation(b, scope, pair);
    }

    let mut inner = pair.into_inner();
    if let Some(name) = inner.next() {
        b.named(&symbol(&name));
    }
    match inner.next() {
        Some(operation) => lower_operation(b, scope, operation),
        None => Ok(()),
    }
}

fn next_value(scope: &Scope, inner: &mut Pairs<'_, Rule>) -> Result<Value> {
    match inner.next() {
        Some(pair) => scope.value(pair),
        None => Err(ParseError::InvalidLiteral("missing operand".to_string())),
    }
}

fn next_type(inner: &mut Pairs<'_, Rule>) -> Result<Type> {
    match inner.next() {
        Some(pair) => parse_type(pair.as_str()),
        None => Err(ParseError::InvalidLiteral("missing type".to_string())),
    }
}

fn next_text<'i>(inner: &mut Pairs<'i, Rule>) -> &'i str {
    inner.next().map(|p| p.as_str()).unwrap_or_default()
}

fn lower_operation(b: &mut BlockBuilder<'_>, scope: &Scope, pair: Pair<'_, Rule>) -> Result<()> {
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();

    match rule {
        Rule::alloca => {
            let ty = next_type(&mut inner)?;
            let count = match inner.next() {
                Some(count) => count
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| ParseError::InvalidLiteral(count.as_str().to_string()))?,
                None => 1,
            };
            b.alloca_array(ty, count);
        }
        Rule::load => {
            let ty = next_type(&mut inner)?;
            let ptr = next_value(scope, &mut inner)?;
            b.load(ty, ptr);
        }
        Rule::gep => {
            let base = next_value(scope, &mut inner)?;
            let offset = next_value(scope, &mut inner)?;
            b.gep(base, offset);
        }
        Rule::cast => {
            let op_text = next_text(&mut inner);
            let op = CastOp::from_mnemonic(op_text)
                .ok_or_else(|| ParseError::InvalidLiteral(op_text.to_string()))?;
            let value = next_value(scope, &mut inner)?;
            let ty = next_type(&mut inner)?;
            b.cast(op, value, ty);
        }
        Rule::binary => {
            let op_text = next_text(&mut inner);
            let op = BinaryOp::from_mnemonic(op_text)
                .ok_or_else(|| ParseError::InvalidLiteral(op_text.to_string()))?;
            let ty = next_type(&mut inner)?;
            let left = next_value(scope, &mut inner)?;
            let right = next_value(scope, &mut inner)?;
            b.binary(op, left, right, ty);
        }
        Rule::icmp => {
            let pred_text = next_text(&mut inner);
            let pred = CmpPredicate::from_mnemonic(pred_text)
                .ok_or_else(|| ParseError::InvalidLiteral(pred_text.to_string()))?;
            let left = next_value(scope, &mut inner)?;
            let right = next_value(scope, &mut inner)?;
            b.icmp(pred, left, right);
        }
        Rule::select => {
            let condition = next_value(scope, &mut inner)?;
            let then_val = next_value(scope, &mut inner)?;
            let else_val = next_value(scope, &mut inner)?;
            b.select(condition, then_val, else_val);
        }
        Rule::phi => {
            let ty = next_type(&mut inner)?;
            let mut incoming = Vec::new();
            for edge in inner {
                let mut parts = edge.into_inner();
                let value = next_value(scope, &mut parts)?;
                let block = match parts.next() {
                    Some(label) => scope.block(&label)?,
                    None => continue,
                };
                incoming.push((block, value));
            }
            b.phi(ty, incoming);
        }
        Rule::call => {
            let returns = next_type(&mut inner)?;
            let target = inner
                .next()
                .ok_or_else(|| ParseError::InvalidLiteral("missing callee".to_string()))?;
            let mut args = Vec::new();
            if let Some(arg_list) = inner.next() {
                for arg in arg_list.into_inner() {
                    args.push(scope.value(arg)?);
                }
            }
            if target.as_rule() == Rule::global_name {
                b.call(&symbol(&target), args, returns);
            } else {
                let target = scope.value(target)?;
                b.call_indirect(target, args, returns);
            }
        }
        Rule::local_id => {
            let text = next_text(&mut inner);
            let dim = text
                .parse::<u8>()
                .map_err(|_| ParseError::InvalidLiteral(text.to_string()))?;
            b.local_id(dim);
        }
        Rule::store => {
            let value = next_value(scope, &mut inner)?;
            let ptr = next_value(scope, &mut inner)?;
            b.store(value, ptr);
        }
        Rule::memtransfer => {
            let op = next_text(&mut inner);
            let dst = next_value(scope, &mut inner)?;
            let src = next_value(scope, &mut inner)?;
            let len = next_value(scope, &mut inner)?;
            if op == "memmove" {
                b.memmove(dst, src, len);
            } else {
                b.memcpy(dst, src, len);
            }
        }
        Rule::barrier => {
            b.barrier();
        }
        other => {
            return Err(ParseError::InvalidLiteral(format!(
                "unexpected {:?} in block body",
                other
            )))
        }
    }

    Ok(())
}

fn lower_terminator(b: &mut BlockBuilder<'_>, scope: &Scope, pair: Pair<'_, Rule>) -> Result<()> {
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();

    match rule {
        Rule::jump => {
            let target = next_block(scope, &mut inner)?;
            b.jump(target)?;
        }
        Rule::branch => {
            let condition = next_value(scope, &mut inner)?;
            let then_block = next_block(scope, &mut inner)?;
            let else_block = next_block(scope, &mut inner)?;
            b.branch(condition, then_block, else_block)?;
        }
        Rule::ret => match inner.next() {
            Some(value) => b.return_value(scope.value(value)?)?,
            None => b.return_void()?,
        },
        Rule::unreachable => b.unreachable()?,
        other => {
            return Err(ParseError::InvalidLiteral(format!(
                "expected terminator, found {:?}",
                other
            )))
        }
    }

    Ok(())
}

fn next_block(scope: &Scope, inner: &mut Pairs<'_, Rule>) -> Result<BlockId> {
    match inner.next() {
        Some(label) => scope.block(&label),
        None => Err(ParseError::InvalidLiteral("missing block label".to_string())),
    }
}
