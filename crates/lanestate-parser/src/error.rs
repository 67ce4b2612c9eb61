use crate::Rule;
use lanestate_core::IrError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unknown value %{name} in function @{function}")]
    UnknownValue { function: String, name: String },
    #[error("Unknown block {name} in function @{function}")]
    UnknownBlock { function: String, name: String },
    #[error("Value %{name} defined twice in function @{function}")]
    DuplicateValue { function: String, name: String },
    #[error("Block {name} defined twice in function @{function}")]
    DuplicateBlock { function: String, name: String },
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
    #[error(transparent)]
    Ir(#[from] IrError),
}

pub type Result<T> = std::result::Result<T, ParseError>;
