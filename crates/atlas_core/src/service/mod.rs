//! Use-case services over repository implementations.
//!
//! # Responsibility
//! - Provide stable entry points for collaborator surfaces (CLI, future
//!   transports) without exposing SQL details.
//!
//! # Invariants
//! - Services never bypass repository validation or atomicity contracts.
//! - Duplicate detection is a normal outcome, never an error.

pub mod bookmark_service;
