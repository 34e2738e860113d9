//! Client library for the cultural date planning service.
//!
//! The binary in `main.rs` wires these pieces together: the screen flow
//! controller ([`flow`]), the job submission and polling client ([`planner`]),
//! session orchestration ([`orchestrator`]), and presentation helpers.

pub mod cli;
pub mod error;
pub mod flow;
pub mod model;
pub mod orchestrator;
pub mod planner;
pub mod progress;
pub mod storage;
pub mod text_summary;
