//! Decode GoPro GPMF telemetry from a raw byte buffer into a structured
//! GPS track, and optionally render it as GPX 1.1.
//!
//! The input is the concatenated GPMF blob an MP4 demuxer (or FFmpeg's
//! `GoPro MET` track extraction) produces; this crate never opens files.
//! Both the `GPS5` cluster format (Hero5-Hero10) and the per-sample `GPS9`
//! format (Hero11 and later) are supported.
//!
//! ```rs
//! use gpmf_track::{parse, gpx};
//!
//! fn main() -> Result<(), gpmf_track::GpmfError> {
//!     let blob: Vec<u8> = std::fs::read("telemetry.gpmf").unwrap();
//!     let track = parse(&blob)?;
//!     println!("{} samples from {}", track.len(), track.device_name);
//!     let xml = gpx::to_gpx(&track, &gpx::GpxOptions::default())?;
//!     Ok(())
//! }
//! ```
//!
//! Malformed input is tolerated by design: truncation ends the KLV stream,
//! missing GPS metadata falls back to documented defaults, and a blob
//! without GPS data decodes to an empty track. Only the defensive caps on
//! container nesting and item count can fail.

pub mod gpmf;
pub mod gpx;
mod constants;
mod content_types;
mod errors;

pub use gpmf::{
    ceil4, detect_format, device_info, parse, project_tree, read_klv, DataKind, DeviceInfo,
    FourCC, KlvItem, KlvReader, Node, Tree,
};
pub use content_types::{GpsFormat, GpsSample, GpsTrack};
pub use errors::GpmfError;
