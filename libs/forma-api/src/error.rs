use crate::schema::TypeKey;

/// Composite type construction failures.
///
/// Raised while building a `CompositeType`, before any generation runs.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("type '{ty}': duplicate field '{field}'")]
    DuplicateField { ty: String, field: String },

    #[error("type '{ty}': fields '{first}' and '{second}' share external key '{key}'")]
    KeyCollision {
        ty: String,
        first: String,
        second: String,
        key: String,
    },
}

/// Failures while producing a specialized function.
///
/// Never raised by the generated functions themselves.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("no encoder registered for type {0}")]
    UnresolvedConverter(TypeKey),

    #[error("override targets unknown field '{field}' on type '{ty}'")]
    InvalidOverrideTarget { ty: String, field: String },
}

/// Failures while invoking a generated function.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("type '{ty}': missing required field '{field}'")]
    MissingRequiredField { ty: String, field: String },

    /// A nested decode failed. Wraps the nested error with the enclosing
    /// type and field so the failure path reads top-down.
    #[error("decoding {ty}.{field}: {source}")]
    Decode {
        ty: String,
        field: String,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("expected {expected}, got {got}")]
    Mismatch { expected: String, got: String },

    #[error("type '{ty}': expected {expected} values, got {got}")]
    Arity {
        ty: String,
        expected: usize,
        got: usize,
    },

    /// Specialization failed on the lazy first-use path. Registering the
    /// type up front surfaces the same failure as a `GenerateError`.
    #[error("generating converter for '{ty}': {source}")]
    Generation {
        ty: String,
        #[source]
        source: GenerateError,
    },

    /// Free-form failure, e.g. from a user-supplied default factory.
    #[error("{0}")]
    Custom(String),
}

impl ConvertError {
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        ConvertError::Mismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        ConvertError::Custom(message.into())
    }
}
