//! Conversion function generator for Go API types.
//!
//! Given a versioned package (`example.com/api/v1`) and its internal
//! counterpart (`example.com/api`), convgen writes
//! `Convert_v1_T_To_api_T` / `Convert_api_T_To_v1_T` for every struct type
//! the two share, plus a `RegisterConversions` function adding them to a
//! runtime scheme.
//!
//! # Pipeline
//!
//! ```text
//! RunConfig ─> PackageLoader ─> Universe ─> plan() ─> Generator ─> write_atomic()
//! ```

pub mod cli;
pub mod config;
pub mod output;
pub mod plan;
pub mod run;
pub mod write;

pub use config::{ConfigError, GenerationKind, RunConfig};
pub use output::{EmitError, EmitOptions, Generator, get_generator};
pub use plan::{PackagePlan, Plan, Registration, conversion_names, plan};
pub use run::{Artifact, Mode, RunError, RunSummary, run};
