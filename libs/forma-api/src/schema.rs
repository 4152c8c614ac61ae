use std::fmt;
use std::sync::Arc;

use crate::error::{ConvertError, SchemaError};
use crate::record::Record;
use crate::value::Value;

/// Declared field type, inspectable at generation time.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Bool,
    Int64,
    UInt64,
    Float64,
    Str,
    Bytes,
    /// Homogeneous sequence. The element type drives decoding; encoder
    /// lookup collapses every sequence to one key.
    Seq(Box<TypeDescriptor>),
    /// Nested composite type.
    Composite(Arc<CompositeType>),
    /// Opaque user type, handled by an explicitly registered encoder.
    Named(String),
}

impl TypeDescriptor {
    /// Registry lookup key. All `Seq(_)` normalize to `TypeKey::Seq` so
    /// one rule covers every sequence unless a more specific encoder is
    /// registered.
    pub fn lookup_key(&self) -> TypeKey {
        match self {
            TypeDescriptor::Bool => TypeKey::Bool,
            TypeDescriptor::Int64 => TypeKey::Int64,
            TypeDescriptor::UInt64 => TypeKey::UInt64,
            TypeDescriptor::Float64 => TypeKey::Float64,
            TypeDescriptor::Str => TypeKey::Str,
            TypeDescriptor::Bytes => TypeKey::Bytes,
            TypeDescriptor::Seq(_) => TypeKey::Seq,
            TypeDescriptor::Composite(ty) => TypeKey::Composite(ty.name().to_string()),
            TypeDescriptor::Named(name) => TypeKey::Named(name.clone()),
        }
    }
}

/// Normalized encoder-registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Bool,
    Int64,
    UInt64,
    Float64,
    Str,
    Bytes,
    Seq,
    Composite(String),
    Named(String),
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Bool => f.write_str("bool"),
            TypeKey::Int64 => f.write_str("int64"),
            TypeKey::UInt64 => f.write_str("uint64"),
            TypeKey::Float64 => f.write_str("float64"),
            TypeKey::Str => f.write_str("string"),
            TypeKey::Bytes => f.write_str("bytes"),
            TypeKey::Seq => f.write_str("sequence"),
            TypeKey::Composite(name) => write!(f, "composite '{name}'"),
            TypeKey::Named(name) => write!(f, "'{name}'"),
        }
    }
}

pub type DefaultFn = Arc<dyn Fn() -> Result<Value, ConvertError> + Send + Sync>;
pub type InstanceDefaultFn = Arc<dyn Fn(&Record) -> Result<Value, ConvertError> + Send + Sync>;

/// Default policy for one field.
///
/// `Required` is the no-fallback sentinel. A field whose default is an
/// actual null carries `Constant(Value::Null)`, which is a different
/// thing entirely.
#[derive(Clone)]
pub enum DefaultSpec {
    /// Mandatory, no fallback value.
    Required,
    Constant(Value),
    /// Computed fresh on every use, never memoized.
    Factory(DefaultFn),
    /// Computed fresh from the enclosing instance.
    SelfFactory(InstanceDefaultFn),
}

impl fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSpec::Required => f.write_str("Required"),
            DefaultSpec::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            DefaultSpec::Factory(_) => f.write_str("Factory(..)"),
            DefaultSpec::SelfFactory(_) => f.write_str("SelfFactory(..)"),
        }
    }
}

/// Generation-time metadata for one field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    /// `None`: unknown until runtime, encoded through dynamic dispatch.
    pub declared: Option<TypeDescriptor>,
    pub default: DefaultSpec,
}

impl FieldDescriptor {
    pub fn required(name: impl Into<String>, declared: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            declared: Some(declared),
            default: DefaultSpec::Required,
        }
    }

    pub fn with_default(
        name: impl Into<String>,
        declared: TypeDescriptor,
        default: Value,
    ) -> Self {
        Self {
            name: name.into(),
            declared: Some(declared),
            default: DefaultSpec::Constant(default),
        }
    }

    /// Mapping key for this field: a single leading private marker is
    /// stripped, so internal `_id` reads and writes external `id`.
    pub fn external_key(&self) -> &str {
        self.name.strip_prefix('_').unwrap_or(&self.name)
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default, DefaultSpec::Required)
    }
}

/// A record-like type: a fixed, ordered set of named fields.
#[derive(Debug)]
pub struct CompositeType {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl CompositeType {
    /// Validates the field set. Duplicate internal names and external-key
    /// collisions after private-marker stripping (`_id` next to `id`) are
    /// rejected here rather than resolved by silent preference.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Arc<Self>, SchemaError> {
        let name = name.into();
        for (i, field) in fields.iter().enumerate() {
            for earlier in &fields[..i] {
                if earlier.name == field.name {
                    return Err(SchemaError::DuplicateField {
                        ty: name,
                        field: field.name.clone(),
                    });
                }
                if earlier.external_key() == field.external_key() {
                    return Err(SchemaError::KeyCollision {
                        ty: name,
                        first: earlier.name.clone(),
                        second: field.name.clone(),
                        key: field.external_key().to_string(),
                    });
                }
            }
        }
        Ok(Arc::new(Self { name, fields }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
