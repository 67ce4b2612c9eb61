/*! Render alloca provenance results for people and tools.
 *
 * The analysis answers queries; this crate turns those answers into something to read. Text
 * output follows the canonical provenance dump, one section per analyzed region, and JSON output
 * carries the same facts as [`RegionReport`]s for scripts that diff results across builds.
 */

pub mod analysis_emitter;
pub mod config;
pub mod emitter;
pub mod output;
pub mod report;

pub use analysis_emitter::AnalysisEmitter;
pub use config::{EmitterConfig, IndentStyle, VerbosityLevel};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use output::OutputFormat;
pub use report::{BlockReport, DefinitionReport, InstProvenance, RegionReport};
