//! Deterministic, pure logic shared by the engine and the orchestrator.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod content;
pub mod invariants;
pub mod lifecycle;
pub mod ops;
pub mod report;
pub mod review_body;
pub mod types;
