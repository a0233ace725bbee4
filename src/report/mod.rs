//! Report Generation Workflow
//!
//! This module contains the core pipeline that turns one topic string into
//! a finished research report:
//!
//! ```text
//! Topic
//!   │
//!   ▼
//! ┌─────────────┐
//! │   Planner   │  → ordered section plan (research / synthesis)
//! └─────────────┘
//!   │
//!   ▼
//! ┌─────────────┐
//! │  Section    │  → per research section, in parallel:
//! │ Sub-workflow│    queries → web search → write
//! └─────────────┘
//!   │ join
//!   ▼
//! ┌─────────────┐
//! │  Synthesis  │  → intro/conclusion written from the research context,
//! │   Writer    │    in parallel
//! └─────────────┘
//!   │ join
//!   ▼
//! ┌─────────────┐
//! │   Compile   │  → merge by name onto plan order, escape, join
//! └─────────────┘
//!   │
//!   ▼
//! Final report (markdown)
//! ```

pub mod clients;
pub mod compile;
pub mod planner;
pub mod prompts;
pub mod section;
pub mod state;
pub mod synthesis;
pub mod workflow;

pub use clients::{ClientFactory, EnvClientFactory};
pub use state::{ReportState, Section};
pub use workflow::{generate_report, WorkflowOptions, WorkflowStage, DEFAULT_RECURSION_LIMIT};
