use std::fmt;
use std::sync::Arc;

use crate::error::{ConvertError, GenerateError};
use crate::schema::TypeDescriptor;
use crate::value::Value;

/// Value-level encode function, bound into generated code by reference.
pub type EncodeFn = Arc<dyn Fn(&Value) -> Result<Value, ConvertError> + Send + Sync>;

/// Resolved conversion strategy for a declared type.
///
/// `Identity` is an explicit tag, not a sentinel function reference:
/// generators compare the tag to elide the call and copy the value
/// through unchanged.
#[derive(Clone)]
pub enum Encoder {
    /// The value passes through as-is.
    Identity,
    Fn(EncodeFn),
}

impl Encoder {
    pub fn is_identity(&self) -> bool {
        matches!(self, Encoder::Identity)
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoder::Identity => f.write_str("Encoder::Identity"),
            Encoder::Fn(_) => f.write_str("Encoder::Fn(..)"),
        }
    }
}

/// The collaborator owning registration, caching and runtime dispatch.
///
/// Generators consult `resolve_encoder` once per typed field at
/// generation time and bind the dispatch entry points into the closures
/// they produce for everything resolved at call time.
pub trait Converter: Send + Sync {
    /// Encode a value whose type is only known at runtime. Inspects the
    /// value's own shape on every call.
    fn encode_value(&self, value: &Value) -> Result<Value, ConvertError>;

    /// Decode a value toward a declared target type.
    fn decode_value(&self, value: &Value, target: &TypeDescriptor)
    -> Result<Value, ConvertError>;

    /// Best known encoder for a declared type. Sequence-shaped types
    /// normalize to a single generic sequence key before lookup.
    fn resolve_encoder(&self, target: &TypeDescriptor) -> Result<Encoder, GenerateError>;
}
