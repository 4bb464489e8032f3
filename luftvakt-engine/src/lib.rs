//! luftvakt-engine
//!
//! Frame intake, the analysis task and the runtime that connects them to a
//! capture source. Frontends (the CLI) only call into [`runtime`].

pub mod analysis;
pub mod error;
pub mod intake;
pub mod runtime;

pub use analysis::{AnalysisHandle, AnalysisStats, AnalysisTask, FrameAnalyzer, PollSettings, ShutdownSignal};
pub use error::EngineError;
pub use intake::{FrameRejection, FrameValidator, MIN_CAPTURE_LEN};
pub use runtime::{build_analyzer, run_live, run_replay, RunSummary};
