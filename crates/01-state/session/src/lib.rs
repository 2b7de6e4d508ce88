//! Canonical session state shared between the tick supervisor and extensions.
//!
//! The `session` crate intentionally stays small. It defines the load-stage state
//! machine, the process-wide [`SessionContext`] that extensions observe through a
//! read-only borrow, and the [`InstanceRegistry`] used by split-screen hosts.

/// Process-wide session state container.
pub mod context;
/// Ordered load stages and the tracker that moves between them.
pub mod load_stage;
/// Registry of live host instances.
pub mod registry;

pub use crate::context::SessionContext;
pub use crate::load_stage::{LoadStage, LoadStageTracker, StageChange};
pub use crate::registry::{InstanceEntry, InstanceRegistry};
