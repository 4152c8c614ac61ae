pub mod convert;
pub mod error;
pub mod mapping;
pub mod overrides;
pub mod record;
pub mod schema;
pub mod ser;
pub mod value;

pub use convert::{Converter, EncodeFn, Encoder};
pub use error::{ConvertError, GenerateError, SchemaError};
pub use mapping::Mapping;
pub use overrides::FieldOverride;
pub use record::Record;
pub use schema::{
    CompositeType, DefaultFn, DefaultSpec, FieldDescriptor, InstanceDefaultFn, TypeDescriptor,
    TypeKey,
};
pub use value::Value;
