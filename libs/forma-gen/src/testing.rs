//! Minimal converter stub for exercising the generators in isolation.

use std::sync::Arc;

use forma_api::convert::{Converter, Encoder};
use forma_api::error::{ConvertError, GenerateError};
use forma_api::schema::{TypeDescriptor, TypeKey};
use forma_api::value::Value;

/// Observable behavior, so tests can tell the paths apart:
/// - dynamic dispatch prefixes strings with `dyn:`
/// - resolved string fields get an uppercasing encoder
/// - everything else resolves to identity
/// - named types are unresolved
/// - decoding toward `Named("boom")` fails
pub(crate) struct StubConverter;

impl Converter for StubConverter {
    fn encode_value(&self, value: &Value) -> Result<Value, ConvertError> {
        match value {
            Value::String(s) => Ok(Value::String(format!("dyn:{s}"))),
            other => Ok(other.clone()),
        }
    }

    fn decode_value(
        &self,
        value: &Value,
        target: &TypeDescriptor,
    ) -> Result<Value, ConvertError> {
        match target {
            TypeDescriptor::Named(name) if name == "boom" => Err(ConvertError::custom("boom")),
            _ => Ok(value.clone()),
        }
    }

    fn resolve_encoder(&self, target: &TypeDescriptor) -> Result<Encoder, GenerateError> {
        match target.lookup_key() {
            key @ TypeKey::Named(_) => Err(GenerateError::UnresolvedConverter(key)),
            TypeKey::Str => Ok(Encoder::Fn(Arc::new(|v: &Value| match v {
                Value::String(s) => Ok(Value::String(s.to_uppercase())),
                other => Err(ConvertError::mismatch("string", other.kind())),
            }))),
            _ => Ok(Encoder::Identity),
        }
    }
}

pub(crate) fn converter() -> Arc<dyn Converter> {
    Arc::new(StubConverter)
}
