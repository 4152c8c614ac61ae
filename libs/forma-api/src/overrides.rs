/// Per-field customization, consumed once at generation time.
///
/// Layered on top of the type-wide omission policy: `None` inherits it,
/// `Some` forces the field either way regardless of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOverride {
    pub omit_if_default: Option<bool>,
}

impl FieldOverride {
    /// Inherits every type-wide setting.
    pub const NEUTRAL: FieldOverride = FieldOverride {
        omit_if_default: None,
    };

    pub fn omit_if_default(value: bool) -> Self {
        Self {
            omit_if_default: Some(value),
        }
    }
}
