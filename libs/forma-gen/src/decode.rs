use std::sync::Arc;

use forma_api::convert::Converter;
use forma_api::error::{ConvertError, GenerateError};
use forma_api::mapping::Mapping;
use forma_api::record::Record;
use forma_api::schema::{CompositeType, TypeDescriptor};

/// Specialized decode function: one mapping in, one typed record out.
pub type RecordDecodeFn = Arc<dyn Fn(&Mapping) -> Result<Record, ConvertError> + Send + Sync>;

/// Read plan for one field, bound at generation time.
struct FieldRead {
    /// Internal field name, the key in the constructor arguments.
    internal: String,
    /// Mapping key: internal name with the private marker stripped.
    key: String,
    /// Decode target. `None` copies the value through verbatim.
    target: Option<TypeDescriptor>,
    required: bool,
}

/// Generate a specialized decoder for `ty`.
///
/// Every typed field decodes toward its statically declared type through
/// the converter's decode entry point; there is no deferred dispatch on
/// this path. Decoded values accumulate under internal field names and
/// the type's own constructor finishes the job, so absent optional keys
/// fall back to the type's default logic, not the generator's.
pub fn generate_decoder(
    ty: &Arc<CompositeType>,
    converter: &Arc<dyn Converter>,
) -> Result<RecordDecodeFn, GenerateError> {
    let reads: Vec<FieldRead> = ty
        .fields()
        .iter()
        .map(|field| FieldRead {
            internal: field.name.clone(),
            key: field.external_key().to_string(),
            target: field.declared.clone(),
            required: !field.has_default(),
        })
        .collect();

    tracing::debug!(ty = %ty.name(), fields = reads.len(), "generated decoder");

    let ty = Arc::clone(ty);
    let converter = Arc::clone(converter);
    Ok(Arc::new(move |input: &Mapping| {
        let mut args = Mapping::with_capacity(reads.len());
        for read in &reads {
            match input.get(&read.key) {
                Some(raw) => {
                    let value = match &read.target {
                        Some(target) => {
                            converter.decode_value(raw, target).map_err(|e| {
                                ConvertError::Decode {
                                    ty: ty.name().to_string(),
                                    field: read.internal.clone(),
                                    source: Box::new(e),
                                }
                            })?
                        }
                        None => raw.clone(),
                    };
                    args.insert(read.internal.clone(), value);
                }
                None if read.required => {
                    return Err(ConvertError::MissingRequiredField {
                        ty: ty.name().to_string(),
                        field: read.internal.clone(),
                    });
                }
                None => {}
            }
        }
        Record::construct(&ty, &args)
    }))
}
