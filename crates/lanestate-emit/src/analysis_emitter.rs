use crate::config::EmitterConfig;
use crate::emitter::{Color, EmitContext, EmitHelper, EmitResult, Emitter};
use crate::output::{JsonFormatter, OutputFormat};
use crate::report::RegionReport;
use anyhow::{Context, Result};
use lanestate_core::{format::format_function, AllocaSsa, Function, LoopAnalysis, Module, Region};
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct AnalysisEmitter {
    config: EmitterConfig,
    function: Option<String>,
}

impl AnalysisEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            function: None,
        }
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn selected_functions<'m>(&self, module: &'m Module) -> Result<Vec<&'m Function>> {
        if let Some(name) = &self.function {
            let function = module
                .function(name)
                .with_context(|| format!("no function @{} in module {}", name, module.name))?;
            return Ok(vec![function]);
        }

        Ok(module
            .functions
            .values()
            .filter(|function| !self.config.kernels_only || function.is_kernel())
            .collect())
    }

    pub fn reports(&self, module: &Module) -> Result<Vec<RegionReport>> {
        let mut reports = Vec::new();
        for function in self.selected_functions(module)? {
            self.for_each_region(module, function, &mut |ssa| {
                reports.push(RegionReport::from_analysis(ssa));
                Ok(())
            })?;
        }
        Ok(reports)
    }

    fn for_each_region(
        &self,
        module: &Module,
        function: &Function,
        visit: &mut dyn FnMut(&AllocaSsa<'_>) -> Result<()>,
    ) -> Result<()> {
        let region = Region::function_region(function);
        visit(&analyze(module, &region))?;

        if !self.config.include_loops {
            return Ok(());
        }

        let loops = LoopAnalysis::from_function(function);
        debug!(
            function = function.name(),
            loops = loops.loops.len(),
            "analyzing loop regions"
        );
        for loop_info in &loops.loops {
            let region = Region::loop_region(function, loop_info);
            visit(&analyze(module, &region))?;
        }
        Ok(())
    }

    fn emit_text<W: Write>(
        &self,
        module: &Module,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let verbosity = self.config.verbosity;
        let mut first = true;

        for function in self.selected_functions(module)? {
            if verbosity.should_print_ir() {
                if !first {
                    writeln!(writer)?;
                }
                first = false;
                for line in format_function(function).lines() {
                    EmitHelper::write_colored_line(writer, context, line, Color::Dimmed)?;
                }
            }

            self.for_each_region(module, function, &mut |ssa| {
                if !verbosity.should_print_dump() {
                    return write_join_summary(writer, context, &RegionReport::from_analysis(ssa));
                }

                if !first {
                    writeln!(writer)?;
                }
                first = false;

                EmitHelper::write_section(writer, context, &ssa.region().describe())?;
                write_dump(writer, context, &ssa.to_string())?;
                if verbosity.should_print_definitions() {
                    write_definitions(writer, context, &RegionReport::from_analysis(ssa))?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

impl Emitter for AnalysisEmitter {
    type Item = Module;

    fn emit<W: Write>(
        &self,
        module: &Module,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        debug!(module = %module.name, format = ?self.config.format, "emitting analysis");
        match self.config.format {
            OutputFormat::Json => JsonFormatter::write_pretty(writer, &self.reports(module)?),
            OutputFormat::Text => self.emit_text(module, writer, context),
        }
    }

    fn default_context(&self) -> EmitContext {
        EmitContext::from_config(&self.config)
    }
}

fn analyze<'a>(module: &'a Module, region: &'a Region<'a>) -> AllocaSsa<'a> {
    let mut ssa = AllocaSsa::new(module, region);
    ssa.compute();
    ssa
}

fn write_dump<W: Write>(writer: &mut W, context: &EmitContext, dump: &str) -> EmitResult {
    for line in dump.lines() {
        let color = if line.starts_with("Block ") {
            Color::Magenta
        } else if line.starts_with("\tjoin") {
            Color::Yellow
        } else if line.starts_with("\tlive") {
            Color::Green
        } else {
            Color::Plain
        };
        EmitHelper::write_colored_line(writer, context, line, color)?;
    }
    Ok(())
}

fn write_definitions<W: Write>(
    writer: &mut W,
    context: &mut EmitContext,
    report: &RegionReport,
) -> EmitResult {
    EmitHelper::write_line(writer, context, "Definitions {")?;
    context.indent();
    for block in &report.blocks {
        for def in &block.definitions {
            let line = format!("{}: {} = {}", block.name, def.alloca, def.descriptor);
            EmitHelper::write_line(writer, context, &line)?;
        }
    }
    context.dedent();
    EmitHelper::write_line(writer, context, "}")
}

fn write_join_summary<W: Write>(
    writer: &mut W,
    context: &EmitContext,
    report: &RegionReport,
) -> EmitResult {
    let joins = report.join_blocks();
    let line = if joins.is_empty() {
        format!("{}: no joins", report.region)
    } else {
        format!("{}: joins {}", report.region, joins.join(", "))
    };
    EmitHelper::write_line(writer, context, &line)
}
