//! Specialized conversion function generators.
//!
//! For each composite type the generators produce, once, a dedicated
//! encode closure and a dedicated decode closure. All per-field analysis
//! (omission policy, converter resolution, identity elision, external
//! keys) happens at generation time; the returned closures run a flat
//! sequence of pre-bound field plans on every call.
//!
//! The generators are stateless free functions: caching and at-most-once
//! generation per type belong to the owning `Converter`.

pub mod decode;
pub mod encode;
pub mod support;

#[cfg(test)]
mod testing;

pub use decode::{RecordDecodeFn, generate_decoder};
pub use encode::{RecordEncodeFn, generate_encoder};
