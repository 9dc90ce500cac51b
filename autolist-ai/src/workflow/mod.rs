//! Analysis workflow
//!
//! Turns the agents' loosely typed reports into one canonical listing:
//! - `defects` - label normalization for inspection findings
//! - `resolver` - overall status and confidence warnings
//! - `assembler` - maps reports onto the response contract
//! - `orchestrator` - runs the two concurrent phases per request

pub mod assembler;
pub mod defects;
pub mod orchestrator;
pub mod resolver;

pub use orchestrator::AnalysisOrchestrator;
pub use resolver::Resolution;
