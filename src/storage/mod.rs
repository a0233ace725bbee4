//! Report Storage
//!
//! Object-storage persistence for finished reports, keyed by user, topic,
//! and timestamp. Content lives next to a `.meta.json` sidecar that the
//! listing endpoint reads instead of downloading every report.

pub mod report_store;

pub use report_store::{ReportStore, SavedReport};
