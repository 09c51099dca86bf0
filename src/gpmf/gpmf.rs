//! Device/stream location and the top-level decode entry points.
//!
//! Input is a raw GPMF blob: the concatenated `DEVC` blocks an MP4 demuxer
//! (or FFmpeg `GoPro MET` extraction) hands over. This module walks the
//! projected tree to find GPS-bearing streams and drives the `GPS5`/`GPS9`
//! decoders; it knows nothing about MP4 itself.

use log::debug;

use crate::constants::{DEFAULT_DEVICE_ID, DEFAULT_DEVICE_NAME};
use crate::content_types::{GpsFormat, GpsSample, GpsTrack};
use crate::errors::GpmfError;

use super::fourcc::FourCC;
use super::tree::{project_tree, Tree};

/// Device identity pulled from the `DVID`/`DVNM` items of the first
/// device container that carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Decimal rendering of `DVID`, `"unknown"` when absent.
    pub id: String,
    /// `DVNM` string, `"GoPro"` when absent.
    pub name: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            id: DEFAULT_DEVICE_ID.to_owned(),
            name: DEFAULT_DEVICE_NAME.to_owned(),
        }
    }
}

/// Top-level `DEVC` containers in on-wire order.
pub(crate) fn devices<'t, 'a>(tree: &'t Tree<'a>) -> Vec<&'t Tree<'a>> {
    tree.branches(&FourCC::DEVC)
}

/// `STRM` children of a device container in on-wire order.
pub(crate) fn streams<'t, 'a>(devc: &'t Tree<'a>) -> Vec<&'t Tree<'a>> {
    devc.branches(&FourCC::STRM)
}

/// The GPS payload format a single stream carries. `GPS9` wins when a
/// stream carries both, since it embeds per-sample time/DOP/fix.
fn stream_format(strm: &Tree<'_>) -> GpsFormat {
    if strm.contains(&FourCC::GPS9) {
        GpsFormat::Gps9
    } else if strm.contains(&FourCC::GPS5) {
        GpsFormat::Gps5
    } else {
        GpsFormat::Unknown
    }
}

/// First GPS-bearing stream of a device container, preferring `GPS9`
/// streams over `GPS5` ones regardless of their relative order.
pub(crate) fn gps_stream<'t, 'a>(devc: &'t Tree<'a>) -> Option<(&'t Tree<'a>, GpsFormat)> {
    let streams = streams(devc);
    for wanted in [GpsFormat::Gps9, GpsFormat::Gps5] {
        if let Some(&strm) = streams.iter().find(|s| stream_format(s) == wanted) {
            return Some((strm, wanted));
        }
    }
    None
}

/// Blocks of different formats never coexist in practice; when they do,
/// the richer format is reported and decoded.
fn precedence(fmt: &GpsFormat) -> u8 {
    match fmt {
        GpsFormat::Gps9 => 2,
        GpsFormat::Gps5 => 1,
        GpsFormat::Unknown => 0,
    }
}

fn device_info_from_tree(tree: &Tree<'_>) -> DeviceInfo {
    let mut info = DeviceInfo::default();
    let devices = devices(tree);

    if let Some(dvid) = devices
        .iter()
        .find_map(|d| d.find_leaf(&FourCC::DVID))
        .and_then(|item| item.first_u32())
    {
        info.id = dvid.to_string();
    }
    if let Some(dvnm) = devices
        .iter()
        .find_map(|d| d.find_leaf(&FourCC::DVNM))
        .map(|item| item.to_ascii())
        .filter(|name| !name.is_empty())
    {
        info.name = dvnm;
    }

    info
}

/// Decode a GPMF blob into a [`GpsTrack`].
///
/// Every `DEVC` block contributes its GPS-bearing stream's samples, in
/// on-wire order. When blocks disagree on payload format (never observed
/// from a single camera), `GPS9` blocks win and `GPS5` blocks are ignored.
/// A blob without GPS data yields an empty track with
/// [`GpsFormat::Unknown`], not an error.
pub fn parse(data: &[u8]) -> Result<GpsTrack, GpmfError> {
    let tree = project_tree(data)?;
    let device = device_info_from_tree(&tree);

    let located = devices(&tree)
        .into_iter()
        .filter_map(|devc| gps_stream(devc))
        .collect::<Vec<_>>();
    let format = located
        .iter()
        .map(|(_, fmt)| *fmt)
        .max_by_key(precedence)
        .unwrap_or(GpsFormat::Unknown);

    let mut samples: Vec<GpsSample> = Vec::new();
    for &(strm, fmt) in &located {
        if fmt != format {
            continue;
        }
        let block = match fmt {
            GpsFormat::Gps5 => GpsSample::from_gps5(strm),
            GpsFormat::Gps9 => GpsSample::from_gps9(strm),
            GpsFormat::Unknown => Vec::new(),
        };
        debug!("Decoded {} {format} samples from stream block", block.len());
        samples.extend(block);
    }

    Ok(GpsTrack {
        device_id: device.id,
        device_name: device.name,
        format,
        samples,
    })
}

/// Report which GPS payload format the blob carries, without decoding
/// samples.
pub fn detect_format(data: &[u8]) -> Result<GpsFormat, GpmfError> {
    let tree = project_tree(data)?;
    Ok(devices(&tree)
        .into_iter()
        .filter_map(|devc| gps_stream(devc))
        .map(|(_, fmt)| fmt)
        .max_by_key(precedence)
        .unwrap_or(GpsFormat::Unknown))
}

/// Device id and name from the blob, without decoding samples.
pub fn device_info(data: &[u8]) -> Result<DeviceInfo, GpmfError> {
    let tree = project_tree(data)?;
    Ok(device_info_from_tree(&tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpmf::klv::ceil4;

    fn klv(key: &[u8; 4], typ: u8, size: u8, repeat: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(key);
        out.push(typ);
        out.push(size);
        out.extend_from_slice(&repeat.to_be_bytes());
        out.extend_from_slice(payload);
        out.resize(8 + ceil4(payload.len()), 0);
        out
    }

    fn container(key: &[u8; 4], children: &[u8]) -> Vec<u8> {
        klv(key, 0, 1, children.len() as u16, children)
    }

    #[test]
    fn gps9_wins_within_a_single_stream() {
        let mut strm = klv(b"GPS5", b'l', 20, 0, &[]);
        strm.extend(klv(b"GPS9", b'?', 36, 0, &[]));
        let buf = container(b"DEVC", &container(b"STRM", &strm));

        assert_eq!(detect_format(&buf).unwrap(), GpsFormat::Gps9);
    }

    #[test]
    fn gps9_stream_preferred_over_earlier_gps5_stream() {
        let gps5_strm = container(b"STRM", &klv(b"GPS5", b'l', 20, 0, &[]));
        let gps9_strm = container(b"STRM", &klv(b"GPS9", b'?', 36, 0, &[]));
        let mut children = gps5_strm;
        children.extend(gps9_strm);
        let buf = container(b"DEVC", &children);

        assert_eq!(detect_format(&buf).unwrap(), GpsFormat::Gps9);
    }

    #[test]
    fn no_gps_stream_detects_unknown() {
        let strm = container(b"STRM", &klv(b"ACCL", b's', 6, 1, &[0; 6]));
        let buf = container(b"DEVC", &strm);

        assert_eq!(detect_format(&buf).unwrap(), GpsFormat::Unknown);
        let track = parse(&buf).unwrap();
        assert!(track.samples.is_empty());
        assert_eq!(track.format, GpsFormat::Unknown);
    }

    #[test]
    fn device_info_defaults_when_absent() {
        let buf = container(b"DEVC", &container(b"STRM", &[]));
        let info = device_info(&buf).unwrap();
        assert_eq!(info.id, "unknown");
        assert_eq!(info.name, "GoPro");
    }

    #[test]
    fn device_info_from_dvid_and_dvnm() {
        let mut children = klv(b"DVID", b'L', 4, 1, &1234_u32.to_be_bytes());
        children.extend(klv(b"DVNM", b'c', 1, 12, b"HERO11 Black"));
        let buf = container(b"DEVC", &children);

        let info = device_info(&buf).unwrap();
        assert_eq!(info.id, "1234");
        assert_eq!(info.name, "HERO11 Black");
    }
}
