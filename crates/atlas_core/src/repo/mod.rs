//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contract the bookmark use-cases depend on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes validate rows before SQL mutations.
//! - The store provides at-most-one-create semantics per normalized URL;
//!   callers never re-check before inserting.

pub mod bookmark_repo;
