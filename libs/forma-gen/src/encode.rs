use std::collections::HashMap;
use std::sync::Arc;

use forma_api::convert::{Converter, EncodeFn, Encoder};
use forma_api::error::{ConvertError, GenerateError};
use forma_api::mapping::Mapping;
use forma_api::overrides::FieldOverride;
use forma_api::record::Record;
use forma_api::schema::{CompositeType, DefaultFn, DefaultSpec, InstanceDefaultFn};
use forma_api::value::Value;

use crate::support::omission_enabled;

/// Specialized encode function: one record in, one ordered mapping out.
pub type RecordEncodeFn = Arc<dyn Fn(&Record) -> Result<Mapping, ConvertError> + Send + Sync>;

/// How a field's value reaches the output, decided at generation time.
enum FieldOp {
    /// Identity-elided: the value is copied through, no call at all.
    Copy,
    /// A converter resolved once at generation time.
    Convert(EncodeFn),
    /// Type unknown until runtime: dispatch through the converter on
    /// every call.
    Dynamic,
}

/// Default evaluator for a deferred field, bound at generation time.
/// Factories run fresh on every encode, never memoized.
enum DefaultEval {
    Constant(Value),
    Factory(DefaultFn),
    SelfFactory(InstanceDefaultFn),
}

struct FieldPlan {
    index: usize,
    key: String,
    op: FieldOp,
}

struct DeferredPlan {
    plan: FieldPlan,
    default: DefaultEval,
}

/// Generate a specialized encoder for `ty`.
///
/// Per-field work done here, once: effective omission policy
/// (`omit_if_default` plus per-field overrides), converter resolution for
/// declared types, identity elision, external key computation. The
/// returned closure captures only immutable bindings and is safe to call
/// from any number of threads.
///
/// Output order: fields encoded unconditionally first, in declaration
/// order, then omit-if-default fields in declaration order (those that
/// make it in at all).
pub fn generate_encoder(
    ty: &Arc<CompositeType>,
    converter: &Arc<dyn Converter>,
    omit_if_default: bool,
    overrides: &HashMap<String, FieldOverride>,
) -> Result<RecordEncodeFn, GenerateError> {
    for name in overrides.keys() {
        if ty.field_index(name).is_none() {
            return Err(GenerateError::InvalidOverrideTarget {
                ty: ty.name().to_string(),
                field: name.clone(),
            });
        }
    }

    let mut eager: Vec<FieldPlan> = Vec::new();
    let mut deferred: Vec<DeferredPlan> = Vec::new();

    for (index, field) in ty.fields().iter().enumerate() {
        let ovr = overrides
            .get(&field.name)
            .copied()
            .unwrap_or(FieldOverride::NEUTRAL);

        let op = match &field.declared {
            None => FieldOp::Dynamic,
            Some(target) => match converter.resolve_encoder(target)? {
                Encoder::Identity => FieldOp::Copy,
                Encoder::Fn(f) => FieldOp::Convert(f),
            },
        };

        let plan = FieldPlan {
            index,
            key: field.external_key().to_string(),
            op,
        };

        // Omission applies only where a default exists; mandatory fields
        // are always included.
        match (&field.default, omission_enabled(omit_if_default, ovr)) {
            (DefaultSpec::Constant(v), true) => deferred.push(DeferredPlan {
                plan,
                default: DefaultEval::Constant(v.clone()),
            }),
            (DefaultSpec::Factory(make), true) => deferred.push(DeferredPlan {
                plan,
                default: DefaultEval::Factory(Arc::clone(make)),
            }),
            (DefaultSpec::SelfFactory(make), true) => deferred.push(DeferredPlan {
                plan,
                default: DefaultEval::SelfFactory(Arc::clone(make)),
            }),
            (DefaultSpec::Required, _) | (_, false) => eager.push(plan),
        }
    }

    tracing::debug!(
        ty = %ty.name(),
        eager = eager.len(),
        deferred = deferred.len(),
        "generated encoder"
    );

    let type_name = ty.name().to_string();
    let converter = Arc::clone(converter);
    Ok(Arc::new(move |record: &Record| {
        if record.type_name() != type_name {
            return Err(ConvertError::mismatch(
                format!("record of type '{type_name}'"),
                format!("record of type '{}'", record.type_name()),
            ));
        }

        let mut out = Mapping::with_capacity(eager.len() + deferred.len());
        for p in &eager {
            out.insert(p.key.clone(), apply(&p.op, record.value(p.index), &converter)?);
        }
        for d in &deferred {
            let current = record.value(d.plan.index);
            let differs = match &d.default {
                DefaultEval::Constant(v) => current != v,
                DefaultEval::Factory(make) => *current != make()?,
                DefaultEval::SelfFactory(make) => *current != make(record)?,
            };
            if differs {
                out.insert(
                    d.plan.key.clone(),
                    apply(&d.plan.op, current, &converter)?,
                );
            }
        }
        Ok(out)
    }))
}

fn apply(
    op: &FieldOp,
    value: &Value,
    converter: &Arc<dyn Converter>,
) -> Result<Value, ConvertError> {
    match op {
        FieldOp::Copy => Ok(value.clone()),
        FieldOp::Convert(f) => f(value),
        FieldOp::Dynamic => converter.encode_value(value),
    }
}
