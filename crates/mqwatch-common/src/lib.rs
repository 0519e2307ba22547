//! Shared types and value semantics for the mqwatch workspace.
//!
//! Watch rules, the expression language and the notification path all
//! agree on one view of JSON payload values: how they normalize, how
//! they stringify, and how severities rank. That view lives here.

pub mod types;
pub mod value;
