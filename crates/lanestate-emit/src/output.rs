use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn write_pretty<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(serde_json::to_string(&OutputFormat::Json).unwrap(), "\"json\"");
        let parsed: OutputFormat = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(parsed, OutputFormat::Text);
    }

    #[test]
    fn test_pretty_json_ends_with_newline() {
        let mut buffer = Vec::new();
        JsonFormatter::write_pretty(&mut buffer, &vec![1, 2]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "[\n  1,\n  2\n]\n");
    }
}
