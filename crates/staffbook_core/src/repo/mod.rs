//! Storage collaborator contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the statement-level storage contract the write path runs on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Store methods execute exactly one logical statement each and never
//!   open or close transactions implicitly.
//! - Every failure surfaces as `StoreError`; business rules live above.

pub mod employee_store;
