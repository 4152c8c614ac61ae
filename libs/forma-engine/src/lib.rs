//! Concrete converter host.
//!
//! The generators in `forma-gen` are stateless; this crate supplies the
//! owning side of the `Converter` contract: the encoder registry, the
//! per-type caches with at-most-once generation, and runtime dispatch
//! for values whose type is only known at call time.

pub mod registry;

pub use registry::{BaseConverter, TypeOptions};
