//! Scan pipeline
//!
//! Pure building blocks ([`extract_links`], [`chunk_links`], [`ScanPolicy`])
//! and the [`ScanOrchestrator`] that drives one scan against the collaborators.

mod batcher;
mod extractor;
mod orchestrator;
mod policy;

pub use batcher::chunk_links;
pub use extractor::{extract_links, LINK_MARKER};
pub use orchestrator::{dedup_links, ScanError, ScanOrchestrator, ScanOutcome, ScanReport};
pub use policy::{ScanMode, ScanPlan, ScanPolicy};
