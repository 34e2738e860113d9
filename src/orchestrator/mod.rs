//! Application-level orchestration utilities.
//!
//! This module owns the plan session lifecycle (submit, watch, cancel) and
//! post-completion processing such as auto-save and exports. CLI layers call
//! into this module to keep responsibilities separated.

mod controller;
mod post_process;

pub use controller::run_plan_session;
pub use post_process::{process_plan_completion, ProcessedPlan};
