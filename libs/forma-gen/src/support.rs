use forma_api::overrides::FieldOverride;

/// Effective omit-if-default decision for one field.
///
/// The per-field override can force omission on under a type-wide
/// "always include" policy, and force it off under a type-wide "omit by
/// default" policy. Whether the field has a default at all is checked by
/// the caller; a mandatory field is always included.
pub fn omission_enabled(type_wide: bool, ovr: FieldOverride) -> bool {
    (type_wide && ovr.omit_if_default != Some(false)) || ovr.omit_if_default == Some(true)
}
