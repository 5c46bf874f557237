//! Unreachable-source guard.
//!
//! When every product fetch of a source fails, an empty in-stock set cannot
//! be told apart from "everything sold out". Sources that opt in with
//! `hold_when_unreachable` keep their previous baseline for that run and
//! are not notified. Sources that do not opt in record the empty set.

use crate::models::Source;
use crate::services::{SourceReport, SourceStatus};

/// Guard decision for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardResult {
    /// Record the observed set
    Accept,
    /// Observation discarded; carry the previous baseline forward
    Hold { failures: usize },
}

/// Decides whether a source's observation should replace its baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableGuard {
    enabled: bool,
}

impl UnreachableGuard {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn for_source(source: &Source) -> Self {
        Self::new(source.hold_when_unreachable)
    }

    pub fn check(&self, report: &SourceReport) -> GuardResult {
        match report.status() {
            SourceStatus::Unreachable if self.enabled => {
                log::warn!(
                    "{}: all {} fetches failed; keeping previous baseline",
                    report.source_key,
                    report.failures
                );
                GuardResult::Hold {
                    failures: report.failures,
                }
            }
            SourceStatus::Unreachable => {
                log::warn!(
                    "{}: all {} fetches failed; recording an empty in-stock set",
                    report.source_key,
                    report.failures
                );
                GuardResult::Accept
            }
            SourceStatus::Checked => GuardResult::Accept,
        }
    }
}
