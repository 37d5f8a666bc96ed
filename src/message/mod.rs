//! This module exports the minimal message-passing API the driver needs for
//! distributed runs, encapsulated by a `Communicator` trait. Implementors
//! only need to write `send` and `recv` operations for a given transport
//! layer (a pure-Rust TCP implementation is included, along with a no-op
//! communicator for single-process runs). The trait then provides binomial
//! tree broadcast, reduce, and reduce-all operations on top, which the
//! checkpoint reporter uses to agree on solution errors across ranks.
//!

pub mod comm;
pub mod tcp;
