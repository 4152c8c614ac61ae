use std::sync::Arc;

use crate::error::ConvertError;
use crate::mapping::Mapping;
use crate::schema::{CompositeType, DefaultSpec};
use crate::value::Value;

/// A typed instance: positional values in field declaration order.
///
/// Maximally lightweight, values only. All metadata (names, declared
/// types, defaults) lives in the shared `CompositeType`.
#[derive(Debug, Clone)]
pub struct Record {
    ty: Arc<CompositeType>,
    values: Vec<Value>,
}

impl Record {
    /// Build from positional values. Length must match the field count.
    pub fn new(ty: Arc<CompositeType>, values: Vec<Value>) -> Result<Self, ConvertError> {
        if values.len() != ty.fields().len() {
            return Err(ConvertError::Arity {
                ty: ty.name().to_string(),
                expected: ty.fields().len(),
                got: values.len(),
            });
        }
        Ok(Self { ty, values })
    }

    pub(crate) fn from_parts(ty: Arc<CompositeType>, values: Vec<Value>) -> Self {
        Self { ty, values }
    }

    /// The type's own constructor: named arguments (internal field names)
    /// to a positional record. Absent optional fields fall back to their
    /// default; absent required fields are an error. Self-referencing
    /// factories observe the instance built so far, later fields read as
    /// null.
    pub fn construct(ty: &Arc<CompositeType>, args: &Mapping) -> Result<Self, ConvertError> {
        let mut values = Vec::with_capacity(ty.fields().len());
        for field in ty.fields() {
            let value = match args.get(&field.name) {
                Some(v) => v.clone(),
                None => match &field.default {
                    DefaultSpec::Required => {
                        return Err(ConvertError::MissingRequiredField {
                            ty: ty.name().to_string(),
                            field: field.name.clone(),
                        });
                    }
                    DefaultSpec::Constant(v) => v.clone(),
                    DefaultSpec::Factory(make) => make()?,
                    DefaultSpec::SelfFactory(make) => {
                        let mut partial = values.clone();
                        partial.resize(ty.fields().len(), Value::Null);
                        make(&Record::from_parts(Arc::clone(ty), partial))?
                    }
                },
            };
            values.push(value);
        }
        Ok(Record::from_parts(Arc::clone(ty), values))
    }

    pub fn ty(&self) -> &Arc<CompositeType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a field's declaration position.
    pub fn value(&self, index: usize) -> &Value {
        &self.values[index]
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.ty.field_index(name).map(|i| &self.values[i])
    }
}

/// Same type name, same values. Two records of structurally identical
/// types compare equal even when the `Arc`s differ.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ty.name() == other.ty.name() && self.values == other.values
    }
}
