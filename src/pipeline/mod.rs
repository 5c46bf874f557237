//! Pipeline entry points for stock watching.
//!
//! - `run_check`: One full pass from config and storage directory
//! - `run_watch`: Repeated passes on an interval
//! - `run_validate`: Check configuration, rules and inventories
//!
//! `run_once` is the storage- and transport-agnostic core of a pass.

pub mod check;
pub mod diff;
pub mod guard;
pub mod load;
pub mod run;
pub mod validate;

pub use check::{WatchStats, run_check, run_watch};
pub use diff::{ChangeDetector, ChangeOutcome, StockDelta};
pub use guard::{GuardResult, UnreachableGuard};
pub use load::load_sources;
pub use run::{RunContext, RunReport, SourceSummary, run_once};
pub use validate::{ValidationSummary, run_validate};
