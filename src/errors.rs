//! Crate error type. Malformed GPMF is normally absorbed (truncation ends
//! the stream, missing metadata falls back to defaults), so errors only
//! surface when a defensive limit trips or a timestamp fails to format.

use std::fmt;

#[derive(Debug)]
pub enum GpmfError {
    /// Container nesting beyond [`crate::constants::MAX_NESTING_DEPTH`].
    /// Real GPMF nests three levels deep; this is a crafted blob.
    MaxDepthExceeded { depth: usize, max: usize },
    /// More projected KLV items than [`crate::constants::MAX_ITEM_COUNT`].
    MaxItemsExceeded { max: usize },
    /// Datetime formatting failed.
    Time(time::error::Format),
}

impl fmt::Display for GpmfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxDepthExceeded { depth, max } => write!(
                f,
                "GPMF container nesting depth {depth} exceeds maximum {max}"
            ),
            Self::MaxItemsExceeded { max } => {
                write!(f, "GPMF stream contains more than {max} KLV items")
            }
            Self::Time(err) => write!(f, "Failed to format datetime: {err}"),
        }
    }
}

impl std::error::Error for GpmfError {}

impl From<time::error::Format> for GpmfError {
    fn from(value: time::error::Format) -> Self {
        Self::Time(value)
    }
}
