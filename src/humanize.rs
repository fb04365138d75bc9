//! Human readable rendering of durations, byte amounts and plain numbers.

use std::fmt::Write;

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;

const BYTE_UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Renders a nanosecond count as `1h2m3.5s`, `12.5ms`, `800ns` and so on.
pub fn format_duration(nanos: i64) -> String {
    if nanos == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if nanos < 0 {
        out.push('-');
    }
    let u = nanos.unsigned_abs();

    if u < NANOS_PER_MICRO {
        let _ = write!(out, "{u}ns");
    } else if u < NANOS_PER_MILLI {
        push_fraction(&mut out, u, NANOS_PER_MICRO);
        out.push_str("µs");
    } else if u < NANOS_PER_SEC {
        push_fraction(&mut out, u, NANOS_PER_MILLI);
        out.push_str("ms");
    } else {
        let secs = u / NANOS_PER_SEC;
        let hours = secs / 3600;
        let minutes = secs / 60 % 60;
        if hours > 0 {
            let _ = write!(out, "{hours}h");
        }
        if hours > 0 || minutes > 0 {
            let _ = write!(out, "{minutes}m");
        }
        push_fraction(&mut out, (secs % 60) * NANOS_PER_SEC + u % NANOS_PER_SEC, NANOS_PER_SEC);
        out.push('s');
    }
    out
}

// writes value/unit with the remainder as trimmed decimals
fn push_fraction(out: &mut String, value: u64, unit: u64) {
    let whole = value / unit;
    let rem = value % unit;
    let _ = write!(out, "{whole}");
    if rem == 0 {
        return;
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{rem:0width$}");
    out.push('.');
    out.push_str(digits.trim_end_matches('0'));
}

/// Renders a byte amount with SI units, e.g. `83 MB` or `1.5 kB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{bytes} B");
    }
    let mut exp = 0;
    let mut scaled = bytes;
    while scaled >= 1000 && exp < BYTE_UNITS.len() - 1 {
        scaled /= 1000;
        exp += 1;
    }
    let value = (bytes as f64 / 1000f64.powi(exp as i32) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{value:.1} {}", BYTE_UNITS[exp])
    } else {
        format!("{value:.0} {}", BYTE_UNITS[exp])
    }
}

/// Renders a float with at most six decimals and no trailing zeros.
pub fn format_float(value: f64) -> String {
    let s = format!("{value:.6}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(999), "999ns");
        assert_eq!(format_duration(1_500), "1.5µs");
        assert_eq!(format_duration(12_340_000), "12.34ms");
        assert_eq!(format_duration(1_000_000_000), "1s");
        assert_eq!(format_duration(2_500_000_000), "2.5s");
        assert_eq!(format_duration(90_000_000_000), "1m30s");
        assert_eq!(format_duration(7_200_000_000_000), "2h0m0s");
        assert_eq!(format_duration(-1_500_000), "-1.5ms");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(9), "9 B");
        assert_eq!(format_bytes(10), "10 B");
        assert_eq!(format_bytes(1_500), "1.5 kB");
        assert_eq!(format_bytes(82_854_982), "83 MB");
        assert_eq!(format_bytes(1_000_000_000), "1.0 GB");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(0.12345), "0.12345");
        assert_eq!(format_float(1.0000001), "1");
        assert_eq!(format_float(-3.25), "-3.25");
        assert_eq!(format_float(-0.0), "-0");
        assert_eq!(format_float(-0.0000001), "-0");
    }
}
