//! WigleWifi CSV export: format line, header row, one row per sighting.
//!
//! The archive written by [`write_archive`] is the artifact uploaded to the
//! collection service. Given the same records and timezone, its bytes are
//! reproducible.

pub mod compress;

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{Local, TimeZone};
use tracing::debug;

use crate::model::NetworkRecord;
use self::compress::CompressingWriter;

/// Format identifier and version, first line of every export.
pub const FORMAT_VERSION: &str = "WigleWifi-1.0";

/// Column header, second line of every export.
pub const HEADER: &str =
    "MAC,SSID,AuthMode,FirstSeen,Channel,RSSI,CurrentLatitude,CurrentLongitude";

const FIRST_SEEN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write the CSV document with `FirstSeen` rendered in local time.
pub fn write_csv<W: Write>(sink: &mut W, networks: &[NetworkRecord]) -> io::Result<()> {
    write_csv_in(sink, networks, &Local)
}

/// Write the CSV document with `FirstSeen` rendered in `tz`.
///
/// `FirstSeen` carries each observation's own timestamp, not the network's
/// earliest sighting. The receiving service has always been fed this way.
pub fn write_csv_in<W, Tz>(sink: &mut W, networks: &[NetworkRecord], tz: &Tz) -> io::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    writeln!(sink, "{}", FORMAT_VERSION)?;
    writeln!(sink, "{}", HEADER)?;

    for network in networks {
        let ssid = network.sanitized_ssid();
        debug!(%ssid, observations = network.observations.len(), "writing network");

        for obs in &network.observations {
            let seen = tz
                .timestamp_millis_opt(obs.timestamp_millis)
                .single()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("timestamp out of range: {}", obs.timestamp_millis),
                    )
                })?;

            writeln!(
                sink,
                "{},{},{},{},{},{},{},{}",
                network.bssid,
                ssid,
                network.capabilities,
                seen.format(FIRST_SEEN_FORMAT),
                network.channel,
                obs.signal_level,
                format_decimal(obs.latitude),
                format_decimal(obs.longitude),
            )?;
        }
    }

    Ok(())
}

/// Create `path` (truncating) and write the gzip-compressed export into it.
pub fn write_archive(path: &Path, networks: &[NetworkRecord]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = CompressingWriter::new(BufWriter::new(file));
    write_csv(&mut writer, networks)?;

    let mut inner = writer.finish()?;
    inner.flush()?;

    debug!(path = %path.display(), networks = networks.len(), "export archive finalized");
    Ok(())
}

/// Shortest round-trip digits in the JVM `Double.toString` layout: plain
/// decimal with a fractional part (`51.0`) for magnitudes in `[1e-3, 1e7)`,
/// `d.dddE<n>` (`5.0E-4`) outside it.
fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-3..1e7).contains(&magnitude) {
        let sci = format!("{:e}", value);
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        return format!("{}E{}", with_fraction(mantissa), exponent);
    }

    with_fraction(&value.to_string())
}

fn with_fraction(digits: &str) -> String {
    if digits.contains('.') {
        digits.to_string()
    } else {
        format!("{}.0", digits)
    }
}
