//! GPX 1.1 output for decoded GPS tracks.
//!
//! One `<trk>` with one `<trkseg>`; each sample becomes a `<trkpt>` with
//! elevation, UTC time, and an `<extensions>` block carrying speeds, fix
//! quality, and horizontal DOP. The minimal variant strips everything but
//! the `lat`/`lon` attributes, which is enough for polyline rendering and
//! considerably smaller.

use std::fmt::Write;

use log::warn;

use crate::content_types::{primitivedatetime_to_string, GpsSample, GpsTrack};
use crate::errors::GpmfError;

/// Rendering options for [`to_gpx`].
#[derive(Debug, Clone)]
pub struct GpxOptions {
    /// `creator` attribute of the `<gpx>` root.
    pub creator: String,
    /// Optional `<name>` for the track.
    pub name: Option<String>,
    /// Drop samples without satellite lock before writing.
    pub valid_fix_only: bool,
    /// Emit `trkpt` elements with `lat`/`lon` attributes only.
    pub minimal: bool,
}

impl Default for GpxOptions {
    fn default() -> Self {
        Self {
            creator: concat!("gpmf-track ", env!("CARGO_PKG_VERSION")).to_owned(),
            name: None,
            valid_fix_only: false,
            minimal: false,
        }
    }
}

/// Render a track as a GPX 1.1 document.
pub fn to_gpx(track: &GpsTrack, options: &GpxOptions) -> Result<String, GpmfError> {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<gpx version=\"1.1\" creator=\"{}\" xmlns=\"http://www.topografix.com/GPX/1/1\">",
        xml_escape(&options.creator)
    );
    out.push_str("  <trk>\n");
    if let Some(name) = &options.name {
        let _ = writeln!(out, "    <name>{}</name>", xml_escape(name));
    }
    out.push_str("    <trkseg>\n");

    for sample in track.iter() {
        if options.valid_fix_only && !sample.has_valid_fix() {
            continue;
        }
        write_trkpt(&mut out, sample, options.minimal)?;
    }

    out.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    Ok(out)
}

fn write_trkpt(out: &mut String, sample: &GpsSample, minimal: bool) -> Result<(), GpmfError> {
    let (lat, lon) = checked_position(sample);

    if minimal {
        let _ = writeln!(out, "      <trkpt lat=\"{lat:.7}\" lon=\"{lon:.7}\"/>");
        return Ok(());
    }

    let _ = writeln!(out, "      <trkpt lat=\"{lat:.7}\" lon=\"{lon:.7}\">");
    let _ = writeln!(out, "        <ele>{:.2}</ele>", sample.altitude);
    let _ = writeln!(
        out,
        "        <time>{}</time>",
        primitivedatetime_to_string(&sample.datetime)?
    );
    out.push_str("        <extensions>\n");
    let _ = writeln!(out, "          <speed>{:.2}</speed>", sample.speed2d);
    let _ = writeln!(out, "          <speed3d>{:.2}</speed3d>", sample.speed3d);
    let _ = writeln!(out, "          <fix>{}</fix>", fix_str(sample.fix));
    let _ = writeln!(out, "          <hdop>{:.2}</hdop>", sample.dop());
    out.push_str("        </extensions>\n      </trkpt>\n");
    Ok(())
}

/// Out-of-range coordinates come from fixless samples logging garbage;
/// they are written as 0.0 so downstream GPX consumers do not reject the
/// whole file.
fn checked_position(sample: &GpsSample) -> (f64, f64) {
    let mut lat = sample.latitude;
    let mut lon = sample.longitude;
    if !(-90.0..=90.0).contains(&lat) {
        warn!("Invalid latitude {lat} in {} block, writing 0.0", sample.description);
        lat = 0.0;
    }
    if !(-180.0..=180.0).contains(&lon) {
        warn!("Invalid longitude {lon} in {} block, writing 0.0", sample.description);
        lon = 0.0;
    }
    (lat, lon)
}

fn fix_str(fix: u32) -> &'static str {
    match fix {
        3.. => "3d",
        2 => "2d",
        _ => "none",
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_types::GpsFormat;
    use time::macros::datetime;

    fn sample() -> GpsSample {
        GpsSample {
            description: "GPS9".to_owned(),
            datetime: datetime!(2023-06-15 12:00:00.500),
            precision_x100: 150,
            fix: 3,
            latitude: 47.5,
            longitude: -122.5,
            altitude: 12.25,
            speed2d: 5.0,
            speed3d: 5.1,
            ..Default::default()
        }
    }

    fn track(samples: Vec<GpsSample>) -> GpsTrack {
        GpsTrack {
            device_id: "1234".to_owned(),
            device_name: "HERO11 Black".to_owned(),
            format: GpsFormat::Gps9,
            samples,
        }
    }

    #[test]
    fn full_trkpt_carries_extensions() {
        let gpx = to_gpx(&track(vec![sample()]), &GpxOptions::default()).unwrap();

        assert!(gpx.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(gpx.contains("xmlns=\"http://www.topografix.com/GPX/1/1\""));
        assert!(gpx.contains("<trkpt lat=\"47.5000000\" lon=\"-122.5000000\">"));
        assert!(gpx.contains("<ele>12.25</ele>"));
        assert!(gpx.contains("<time>2023-06-15T12:00:00.500Z</time>"));
        assert!(gpx.contains("<speed>5.00</speed>"));
        assert!(gpx.contains("<speed3d>5.10</speed3d>"));
        assert!(gpx.contains("<fix>3d</fix>"));
        assert!(gpx.contains("<hdop>1.50</hdop>"));
    }

    #[test]
    fn minimal_variant_emits_positions_only() {
        let options = GpxOptions {
            minimal: true,
            ..Default::default()
        };
        let gpx = to_gpx(&track(vec![sample()]), &options).unwrap();

        assert!(gpx.contains("<trkpt lat=\"47.5000000\" lon=\"-122.5000000\"/>"));
        assert!(!gpx.contains("<ele>"));
        assert!(!gpx.contains("<extensions>"));
    }

    #[test]
    fn valid_fix_only_drops_unlocked_samples() {
        let mut unlocked = sample();
        unlocked.fix = 0;
        let options = GpxOptions {
            valid_fix_only: true,
            ..Default::default()
        };
        let gpx = to_gpx(&track(vec![unlocked, sample()]), &options).unwrap();

        assert_eq!(gpx.matches("<trkpt").count(), 1);
    }

    #[test]
    fn fix_rendering() {
        assert_eq!(fix_str(0), "none");
        assert_eq!(fix_str(1), "none");
        assert_eq!(fix_str(2), "2d");
        assert_eq!(fix_str(3), "3d");
    }

    #[test]
    fn out_of_range_coordinates_are_zeroed() {
        let mut bad = sample();
        bad.latitude = 4750.0;
        bad.longitude = -12250.0;
        let gpx = to_gpx(&track(vec![bad]), &GpxOptions::default()).unwrap();

        assert!(gpx.contains("<trkpt lat=\"0.0000000\" lon=\"0.0000000\">"));
    }

    #[test]
    fn name_and_creator_are_escaped() {
        let options = GpxOptions {
            creator: "tool <v1 & co>".to_owned(),
            name: Some("Morning \"ride\"".to_owned()),
            ..Default::default()
        };
        let gpx = to_gpx(&track(vec![]), &options).unwrap();

        assert!(gpx.contains("creator=\"tool &lt;v1 &amp; co&gt;\""));
        assert!(gpx.contains("<name>Morning &quot;ride&quot;</name>"));
    }
}
