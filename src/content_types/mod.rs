//! Content-level interpretation of located GPMF streams. Only GPS streams
//! are decoded; everything below this layer is format-agnostic.

pub mod gps;

pub use gps::{GpsFormat, GpsSample, GpsTrack};

use time::{format_description::FormatItem, macros::format_description, PrimitiveDateTime};

use crate::errors::GpmfError;

/// All datetimes in this crate are UTC wall-clock without an offset.
const ISO8601_MILLIS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

pub(crate) fn primitivedatetime_to_string(dt: &PrimitiveDateTime) -> Result<String, GpmfError> {
    dt.format(ISO8601_MILLIS).map_err(GpmfError::from)
}
