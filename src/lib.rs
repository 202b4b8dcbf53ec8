// src/lib.rs
// Public library surface for the CLI and integration tests.

pub mod classify;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod resources;
pub mod sentiment;
pub mod sheet;
pub mod stopwords;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::classify::{aggregate, AggregateResult, Category, CategoryCounts, Examples};
pub use crate::config::{load_config_default, FailurePolicy, PipelineConfig};
pub use crate::error::{PipelineError, TranslationError};
pub use crate::pipeline::{GradeReport, Pipeline};
pub use crate::report::{FileReportRenderer, ReportContext, ReportRenderer};
pub use crate::sheet::SheetLayout;
pub use crate::translate::{DynTranslator, IdentityTranslator, Translator};
