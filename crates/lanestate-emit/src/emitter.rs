use crate::config::EmitterConfig;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

pub type EmitResult = Result<()>;

#[derive(Debug, Clone)]
pub struct EmitContext {
    pub indent_level: usize,
    pub indent_chars: String,
    pub use_colors: bool,
}

impl EmitContext {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_chars: "    ".to_string(),
            use_colors: true,
        }
    }

    pub fn from_config(config: &EmitterConfig) -> Self {
        Self {
            indent_level: 0,
            indent_chars: config.indent_style.unit(),
            use_colors: config.use_colors,
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn get_indent(&self) -> String {
        self.indent_chars.repeat(self.indent_level)
    }
}

impl Default for EmitContext {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Emitter {
    type Item;

    fn emit<W: Write>(
        &self,
        item: &Self::Item,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult;

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = self.default_context();
        self.emit(item, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn default_context(&self) -> EmitContext {
        EmitContext::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Plain,
    Cyan,
    Green,
    Yellow,
    Magenta,
    Dimmed,
}

pub struct EmitHelper;

impl EmitHelper {
    pub fn write_line<W: Write>(writer: &mut W, context: &EmitContext, text: &str) -> EmitResult {
        writeln!(writer, "{}{}", context.get_indent(), text)?;
        Ok(())
    }

    pub fn write_colored_line<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        text: &str,
        color: Color,
    ) -> EmitResult {
        if !context.use_colors {
            return Self::write_line(writer, context, text);
        }

        let colored_text = match color {
            Color::Plain => text.normal(),
            Color::Cyan => text.cyan().bold(),
            Color::Green => text.green(),
            Color::Yellow => text.yellow(),
            Color::Magenta => text.magenta(),
            Color::Dimmed => text.dimmed(),
        };
        writeln!(writer, "{}{}", context.get_indent(), colored_text)?;
        Ok(())
    }

    pub fn write_section<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        title: &str,
    ) -> EmitResult {
        Self::write_colored_line(writer, context, &format!("=== {} ===", title), Color::Cyan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndentStyle;

    #[test]
    fn test_context_indentation() {
        let mut ctx = EmitContext::new();
        assert_eq!(ctx.get_indent(), "");

        ctx.indent();
        ctx.indent();
        assert_eq!(ctx.get_indent(), "        ");

        ctx.dedent();
        ctx.dedent();
        ctx.dedent();
        assert_eq!(ctx.indent_level, 0);
    }

    #[test]
    fn test_context_from_config() {
        let config = EmitterConfig {
            indent_style: IndentStyle::Tabs,
            use_colors: false,
            ..EmitterConfig::default()
        };
        let mut ctx = EmitContext::from_config(&config);
        ctx.indent();
        assert_eq!(ctx.get_indent(), "\t");
        assert!(!ctx.use_colors);
    }

    #[test]
    fn test_plain_section() {
        let mut buffer = Vec::new();
        let mut ctx = EmitContext::new();
        ctx.use_colors = false;

        EmitHelper::write_section(&mut buffer, &ctx, "LoopRegion (header loop)").unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "=== LoopRegion (header loop) ===\n"
        );
    }

    #[test]
    fn test_colored_line_keeps_text() {
        let mut buffer = Vec::new();
        let ctx = EmitContext::new();

        EmitHelper::write_colored_line(&mut buffer, &ctx, "live [%x]", Color::Green).unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("live [%x]"));
    }
}
