//! Sluice Runtime
//!
//! Executes rule pipelines against messages and hot-swaps the compiled
//! program in response to change events.

pub mod error;
pub mod interpret;
pub mod interpreter;
pub mod metrics;
pub mod program;
pub mod reload;
pub mod sources;
pub mod stages;

pub use error::EvalError;
pub use interpreter::{Descriptor, Interpreter};
pub use metrics::InterpreterMetrics;
pub use program::{ProgramSnapshot, ProgramStore};
pub use reload::{ChangeEvent, ReloadController, ReloadError, ReloadHandle};
pub use sources::{
    Journal, NullJournal, PipelineSource, PipelineSourceService, RuleSource, RuleSourceService,
    SourceError, StreamAssignment, StreamAssignmentService,
};
pub use stages::{StageIterator, StageRef};
