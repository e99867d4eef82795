//! Pace and clock-time parsing
//!
//! Threshold paces are configured as "mm:ss" strings (per km for running,
//! per 100 m for swimming). Malformed strings never error; callers pick a
//! fallback with [`parse_pace_or`].

/// Fallback running threshold when the configured pace is unparseable (s/km)
pub const DEFAULT_RUN_PACE_FALLBACK_SECS: f64 = 300.0;

/// Fallback swim threshold when the configured pace is unparseable (s/100 m)
pub const DEFAULT_SWIM_PACE_FALLBACK_SECS: f64 = 150.0;

/// Parse "m:ss", "mm:ss" or "h:mm:ss" into seconds.
///
/// The leading component is unbounded; every following component must be
/// below 60. The final component may carry a fractional part.
pub fn parse_clock(input: &str) -> Option<f64> {
    let parts: Vec<&str> = input.trim().split(':').map(str::trim).collect();
    if parts.len() < 2 || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    let (last, leading) = parts.split_last()?;
    let seconds: f64 = last.parse().ok()?;
    if !seconds.is_finite() || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    let mut total = 0.0;
    for (idx, part) in leading.iter().enumerate() {
        let value: u32 = part.parse().ok()?;
        if idx > 0 && value >= 60 {
            return None;
        }
        total = total * 60.0 + f64::from(value);
    }

    Some(total * 60.0 + seconds)
}

/// Parse a pace string, substituting `default` when it is malformed or not
/// strictly positive.
pub fn parse_pace_or(input: &str, default: f64) -> f64 {
    match parse_clock(input) {
        Some(secs) if secs > 0.0 => secs,
        _ => default,
    }
}

/// Format seconds as "m:ss" (or "h:mm:ss" past an hour)
pub fn format_pace(secs: f64) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return "--:--".to_string();
    }

    let total = secs.round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
