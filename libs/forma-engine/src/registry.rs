use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use forma_api::convert::{Converter, Encoder};
use forma_api::error::{ConvertError, GenerateError};
use forma_api::mapping::Mapping;
use forma_api::overrides::FieldOverride;
use forma_api::record::Record;
use forma_api::schema::{CompositeType, TypeDescriptor, TypeKey};
use forma_api::value::Value;
use forma_gen::{RecordDecodeFn, RecordEncodeFn, generate_decoder, generate_encoder};

/// Generation options fixed per type at registration time.
#[derive(Debug, Clone, Default)]
pub struct TypeOptions {
    pub omit_if_default: bool,
    pub overrides: HashMap<String, FieldOverride>,
}

impl TypeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn omit_if_default(mut self, value: bool) -> Self {
        self.omit_if_default = value;
        self
    }

    pub fn with_override(mut self, field: impl Into<String>, ovr: FieldOverride) -> Self {
        self.overrides.insert(field.into(), ovr);
        self
    }
}

// ═══════════════════════════════════════════════════════════════
//  BaseConverter
// ═══════════════════════════════════════════════════════════════

/// Registry, cache and runtime dispatch: the owning side of the
/// `Converter` contract.
///
/// Scalar, bytes, string and sequence encoders are pre-registered;
/// `register_encoder` attaches handlers for named opaque types (and can
/// replace the stock entries, a more specific registration always wins).
/// Specialized record functions generate at most once per type per host:
/// the fast path is a read lock, insertion re-checks under the write
/// lock, and racing callers share whichever function landed first.
pub struct BaseConverter {
    me: Weak<BaseConverter>,
    encoders: RwLock<HashMap<TypeKey, Encoder>>,
    record_encoders: RwLock<HashMap<String, RecordEncodeFn>>,
    record_decoders: RwLock<HashMap<String, RecordDecodeFn>>,
}

impl BaseConverter {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<BaseConverter>| {
            let mut encoders = HashMap::new();
            for key in [
                TypeKey::Bool,
                TypeKey::Int64,
                TypeKey::UInt64,
                TypeKey::Float64,
                TypeKey::Str,
                TypeKey::Bytes,
            ] {
                encoders.insert(key, Encoder::Identity);
            }

            // Sequences encode element-wise through runtime dispatch, so
            // heterogeneous and record-bearing arrays both work.
            let host = me.clone();
            encoders.insert(
                TypeKey::Seq,
                Encoder::Fn(Arc::new(move |value: &Value| {
                    let host = host
                        .upgrade()
                        .ok_or_else(|| ConvertError::custom("converter dropped"))?;
                    match value {
                        Value::Array(items) => items
                            .iter()
                            .map(|v| host.encode_value(v))
                            .collect::<Result<Vec<_>, _>>()
                            .map(Value::Array),
                        other => Err(ConvertError::mismatch("array", other.kind())),
                    }
                })),
            );

            Self {
                me: me.clone(),
                encoders: RwLock::new(encoders),
                record_encoders: RwLock::new(HashMap::new()),
                record_decoders: RwLock::new(HashMap::new()),
            }
        })
    }

    /// Register an encoder for a lookup key, typically a `Named` type.
    /// Replaces any existing entry for the key.
    pub fn register_encoder(&self, key: TypeKey, encoder: Encoder) {
        tracing::debug!(key = %key, "encoder registered");
        write_guard(&self.encoders, "encoders").insert(key, encoder);
    }

    /// Generate and cache both specialized functions for a composite
    /// type with explicit options. Replaces previously cached functions
    /// for the type, so explicit registration wins over the lazily
    /// generated defaults.
    pub fn register_type(
        &self,
        ty: &Arc<CompositeType>,
        options: TypeOptions,
    ) -> Result<(), GenerateError> {
        let converter = self.as_converter();
        let encoder = generate_encoder(ty, &converter, options.omit_if_default, &options.overrides)?;
        let decoder = generate_decoder(ty, &converter)?;
        write_guard(&self.record_encoders, "record encoders")
            .insert(ty.name().to_string(), encoder);
        write_guard(&self.record_decoders, "record decoders")
            .insert(ty.name().to_string(), decoder);
        Ok(())
    }

    /// Encode a record through its cached specialized function,
    /// generating one with default options on first use.
    pub fn encode_record(&self, record: &Record) -> Result<Mapping, ConvertError> {
        let encode = self
            .record_encoder(record.ty())
            .map_err(|e| ConvertError::Generation {
                ty: record.type_name().to_string(),
                source: e,
            })?;
        encode(record)
    }

    /// Decode a mapping into a record of `ty` through its cached
    /// specialized function, generating one on first use.
    pub fn decode_record(
        &self,
        input: &Mapping,
        ty: &Arc<CompositeType>,
    ) -> Result<Record, ConvertError> {
        let decode = self
            .record_decoder(ty)
            .map_err(|e| ConvertError::Generation {
                ty: ty.name().to_string(),
                source: e,
            })?;
        decode(input)
    }

    fn record_encoder(&self, ty: &Arc<CompositeType>) -> Result<RecordEncodeFn, GenerateError> {
        if let Some(f) = read_guard(&self.record_encoders, "record encoders").get(ty.name()) {
            tracing::trace!(ty = %ty.name(), "encoder cache hit");
            return Ok(Arc::clone(f));
        }
        let generated = generate_encoder(ty, &self.as_converter(), false, &HashMap::new())?;
        let mut guard = write_guard(&self.record_encoders, "record encoders");
        // A racing generation may have landed first; everyone shares it.
        Ok(Arc::clone(
            guard.entry(ty.name().to_string()).or_insert(generated),
        ))
    }

    fn record_decoder(&self, ty: &Arc<CompositeType>) -> Result<RecordDecodeFn, GenerateError> {
        if let Some(f) = read_guard(&self.record_decoders, "record decoders").get(ty.name()) {
            tracing::trace!(ty = %ty.name(), "decoder cache hit");
            return Ok(Arc::clone(f));
        }
        let generated = generate_decoder(ty, &self.as_converter())?;
        let mut guard = write_guard(&self.record_decoders, "record decoders");
        Ok(Arc::clone(
            guard.entry(ty.name().to_string()).or_insert(generated),
        ))
    }

    fn as_converter(&self) -> Arc<dyn Converter> {
        // Set in `new`; upgrading cannot fail while a borrow of self
        // exists.
        self.me.upgrade().expect("BaseConverter outside its Arc")
    }
}

impl Converter for BaseConverter {
    fn encode_value(&self, value: &Value) -> Result<Value, ConvertError> {
        match value {
            Value::Record(record) => self.encode_record(record).map(Value::Map),
            Value::Array(items) => items
                .iter()
                .map(|v| self.encode_value(v))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Map(mapping) => mapping
                .iter()
                .map(|(k, v)| Ok((k.to_string(), self.encode_value(v)?)))
                .collect::<Result<Mapping, ConvertError>>()
                .map(Value::Map),
            other => Ok(other.clone()),
        }
    }

    fn decode_value(
        &self,
        value: &Value,
        target: &TypeDescriptor,
    ) -> Result<Value, ConvertError> {
        match target {
            TypeDescriptor::Bool => match value {
                Value::Bool(_) => Ok(value.clone()),
                other => Err(ConvertError::mismatch("bool", other.kind())),
            },
            TypeDescriptor::Int64 => match value {
                Value::Int64(_) => Ok(value.clone()),
                other => Err(ConvertError::mismatch("int64", other.kind())),
            },
            TypeDescriptor::UInt64 => match value {
                Value::UInt64(_) => Ok(value.clone()),
                // Most transport formats lack unsigned integers; accept
                // non-negative signed values.
                Value::Int64(v) if *v >= 0 => Ok(Value::UInt64(*v as u64)),
                other => Err(ConvertError::mismatch("uint64", other.kind())),
            },
            TypeDescriptor::Float64 => match value {
                Value::Float64(_) => Ok(value.clone()),
                Value::Int64(v) => Ok(Value::Float64(*v as f64)),
                Value::UInt64(v) => Ok(Value::Float64(*v as f64)),
                other => Err(ConvertError::mismatch("float64", other.kind())),
            },
            TypeDescriptor::Str => match value {
                Value::String(_) => Ok(value.clone()),
                other => Err(ConvertError::mismatch("string", other.kind())),
            },
            TypeDescriptor::Bytes => match value {
                Value::Bytes(_) => Ok(value.clone()),
                other => Err(ConvertError::mismatch("bytes", other.kind())),
            },
            TypeDescriptor::Seq(element) => match value {
                Value::Array(items) => items
                    .iter()
                    .map(|v| self.decode_value(v, element))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => Err(ConvertError::mismatch("array", other.kind())),
            },
            TypeDescriptor::Composite(ty) => match value {
                Value::Map(mapping) => self.decode_record(mapping, ty).map(Value::Record),
                other => Err(ConvertError::mismatch(
                    format!("map for composite '{}'", ty.name()),
                    other.kind(),
                )),
            },
            // Registered named encoders are one-way value
            // transformations; named targets decode verbatim.
            TypeDescriptor::Named(_) => Ok(value.clone()),
        }
    }

    fn resolve_encoder(&self, target: &TypeDescriptor) -> Result<Encoder, GenerateError> {
        let key = target.lookup_key();
        if let Some(encoder) = read_guard(&self.encoders, "encoders").get(&key) {
            return Ok(encoder.clone());
        }
        match target {
            TypeDescriptor::Composite(ty) => {
                let encode = self.record_encoder(ty)?;
                let name = ty.name().to_string();
                Ok(Encoder::Fn(Arc::new(move |value: &Value| match value {
                    Value::Record(record) => encode(record).map(Value::Map),
                    other => Err(ConvertError::mismatch(
                        format!("record of type '{name}'"),
                        other.kind(),
                    )),
                })))
            }
            _ => Err(GenerateError::UnresolvedConverter(key)),
        }
    }
}

fn read_guard<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(lock = what, "read lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn write_guard<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(lock = what, "write lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
