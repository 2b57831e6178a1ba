//! Raw SQL capability switch.

use std::fmt;

/// Whether `execute_sql` is offered to callers.
///
/// When disabled the tool is neither listed nor callable; only the
/// introspection tools remain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawSqlCapability {
    #[default]
    Enabled,
    Disabled,
}

impl RawSqlCapability {
    pub fn from_disabled_flag(disabled: bool) -> Self {
        if disabled {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

impl fmt::Display for RawSqlCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}
