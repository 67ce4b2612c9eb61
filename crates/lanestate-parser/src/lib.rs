/*! Parse textual kernel IR into modules.
 *
 * Analysis results are easiest to check against small hand-written kernels. This parser reads the
 * text format produced by `lanestate_core::format` back into a [`Module`], resolving forward
 * references to values and blocks so loop headers can name values defined in their latches.
 */

use lanestate_core::Module;
use pest::Parser;
use pest_derive::Parser;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub mod error;
pub mod lower;

pub use error::{ParseError, Result};

pub const EXTENSION: &str = "lsir";

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct KernelParser;

pub type ParseResult<T> = std::result::Result<T, Box<pest::error::Error<Rule>>>;

pub fn parse(input: &str) -> ParseResult<pest::iterators::Pairs<'_, Rule>> {
    KernelParser::parse(Rule::module, input).map_err(Box::new)
}

pub fn check(input: &str) -> bool {
    parse(input).is_ok()
}

pub fn parse_module(input: &str) -> Result<Module> {
    parse_module_named("module", input)
}

pub fn parse_module_named(name: &str, input: &str) -> Result<Module> {
    let pairs = parse(input)?;
    lower::lower_module(name, pairs)
}

pub fn parse_module_file<P: AsRef<Path>>(path: P) -> Result<Module> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());

    debug!(path = %path.display(), bytes = input.len(), "parsing module file");
    parse_module_named(&name, &input)
}

pub fn parse_directory<P: AsRef<Path>>(root: P) -> Result<Vec<(PathBuf, Module)>> {
    let root = root.as_ref();
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ParseError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            source: e.into(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(EXTENSION)
        {
            paths.push(path.to_path_buf());
        }
    }

    paths
        .into_iter()
        .map(|path| parse_module_file(&path).map(|module| (path, module)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanestate_core::{format::format_module, BlockId, Instruction, Terminator, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_module() {
        assert!(check(""));
        let module = parse_module("").unwrap();
        assert!(module.functions.is_empty());
    }

    #[test]
    fn test_comments_and_declarations() {
        let input = r"
; helpers provided by the runtime
declare @sink(ptr readonly) -> void readonly
declare @fill(ptr, i32) -> void
";
        let module = parse_module(input).unwrap();
        let (sig, attrs) = module.resolve_callee("sink").unwrap();
        assert!(sig.param_is_readonly(0));
        assert!(attrs.memory.only_reads_memory());

        let (sig, attrs) = module.resolve_callee("fill").unwrap();
        assert_eq!(sig.params.len(), 2);
        assert!(!sig.param_is_readonly(0));
        assert!(!attrs.memory.only_reads_memory());
    }

    #[test]
    fn test_simple_kernel() {
        let input = r"
func @k(ptr %out, i32 %n) kernel {
entry:
    %x = alloca i32
    store %n, %x
    %v = load i32, %x
    store %v, %out
    ret
}
";
        let module = parse_module(input).unwrap();
        let function = module.function("k").unwrap();
        assert!(function.is_kernel());
        assert_eq!(function.body.insts.len(), 4);

        let x = function.inst_by_name("x").unwrap();
        match &function.inst(function.inst_by_name("v").unwrap()).kind {
            Instruction::Load { ptr } => assert_eq!(*ptr, Value::Inst(x)),
            other => panic!("expected load, got {:?}", other),
        }
    }

    #[test]
    fn test_forward_references_in_loops() {
        let input = r"
func @walk(ptr %base) {
entry:
    jump header
header:
    %p = phi ptr [%base, entry], [%next, body]
    %c = icmp ne %p, null
    br %c, body, exit
body:
    %next = gep %p, 4
    jump header
exit:
    ret
}
";
        let module = parse_module(input).unwrap();
        let function = module.function("walk").unwrap();
        let header = function.block_by_name("header").unwrap();
        let body = function.block_by_name("body").unwrap();
        let next = function.inst_by_name("next").unwrap();

        match &function.inst(function.inst_by_name("p").unwrap()).kind {
            Instruction::Phi { incoming } => {
                assert_eq!(incoming[0], (BlockId(0), Value::param(0)));
                assert_eq!(incoming[1], (body, Value::Inst(next)));
            }
            other => panic!("expected phi, got {:?}", other),
        }
        assert_eq!(
            function.block(body).unwrap().terminator,
            Terminator::Jump(header)
        );
    }

    #[test]
    fn test_unknown_value_is_reported() {
        let input = r"
func @f() {
entry:
    store 1, %missing
    ret
}
";
        match parse_module(input) {
            Err(ParseError::UnknownValue { function, name }) => {
                assert_eq!(function, "f");
                assert_eq!(name, "missing");
            }
            other => panic!("expected unknown value, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_block_is_reported() {
        let input = r"
func @f() {
entry:
    jump nowhere
}
";
        assert!(matches!(
            parse_module(input),
            Err(ParseError::UnknownBlock { name, .. }) if name == "nowhere"
        ));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let input = r"
func @f(i32 %a) {
entry:
    %a = alloca i32
    ret
}
";
        assert!(matches!(
            parse_module(input),
            Err(ParseError::DuplicateValue { .. })
        ));

        let input = r"
func @g() {
entry:
    jump entry
entry:
    ret
}
";
        assert!(matches!(
            parse_module(input),
            Err(ParseError::DuplicateBlock { .. })
        ));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(!check("func @f( {"));
        assert!(matches!(
            parse_module("func @f() { entry: }"),
            Err(ParseError::Syntax(_))
        ));
    }

    #[test]
    fn test_invalid_literal() {
        let input = r"
func @f() {
entry:
    %a = alloca i99999
    ret
}
";
        assert!(matches!(
            parse_module(input),
            Err(ParseError::InvalidLiteral(text)) if text == "i99999"
        ));
    }

    #[test]
    fn test_format_round_trip() {
        let input = r"declare @sink(ptr readonly) -> void readonly

func @diamond(i32 %n) kernel {
entry:
    %x = alloca i32, 4
    %c = icmp slt %n, 0
    br %c, then, else
then:
    %t = gep %x, 1
    store 1, %t
    jump merge
else:
    %w = zext %n to i64
    store 2, %x
    jump merge
merge:
    %p = phi ptr [%t, then], [%x, else]
    %v = load i32, %p
    %s = add i32 %v, -1
    %l = local_id 0
    barrier
    memcpy %x, %p, 16
    call void @sink(%x)
    ret %s
}
";
        let module = parse_module(input).unwrap();
        let printed = format_module(&module);
        assert_eq!(printed, input);

        let reparsed = parse_module(&printed).unwrap();
        assert_eq!(format_module(&reparsed), printed);
    }

    #[test]
    fn test_comments_dropped_from_canonical_print() {
        let input = r"
; scalar spill through a private slot
func @k(ptr %out, i32 %n) kernel {
entry:
    %x = alloca i32 ; private
    store %n, %x
    %v = load i32, %x ; reload
    store %v, %out
    ret
}
";
        let module = parse_module(input).unwrap();
        insta::assert_snapshot!(format_module(&module), @r"
        func @k(ptr %out, i32 %n) kernel {
        entry:
            %x = alloca i32
            store %n, %x
            %v = load i32, %x
            store %v, %out
            ret
        }
        ");
    }
}
