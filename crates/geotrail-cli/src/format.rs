//! Output formatting for text and JSON output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use geotrail_core::{DeleteAck, LocationAck, PositionSample, Route, UploadAck};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, compact: bool) -> Self {
        Self { no_color, compact }
    }

    /// Serialize a value as JSON followed by a newline.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let mut json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        json.push('\n');
        Ok(json)
    }

    fn label(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.bold().to_string()
        }
    }

    fn highlight(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.green().to_string()
        }
    }
}

/// Format a distance in meters, switching to kilometers past 1 km.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters)
    }
}

/// Format an elapsed duration as `1h 02m 03s`, `2m 03s` or `3s`.
pub fn format_elapsed(elapsed: time::Duration) -> String {
    let total = elapsed.whole_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn format_timestamp(sample: &PositionSample) -> String {
    sample
        .captured_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| sample.captured_at.to_string())
}

/// One sample on a single line.
pub fn format_sample_line(index: usize, sample: &PositionSample) -> String {
    format!(
        "{:>5}  {:>11.6}  {:>11.6}  {}",
        index,
        sample.latitude,
        sample.longitude,
        format_timestamp(sample)
    )
}

pub fn format_upload_ack(ack: &UploadAck, opts: &FormatOptions) -> String {
    let verb = if ack.replaced { "Replaced" } else { "Uploaded" };
    format!(
        "{} route for {} on {} ({} points)\n",
        opts.highlight(verb),
        ack.user_id,
        ack.date,
        ack.point_count
    )
}

pub fn format_delete_ack(ack: &DeleteAck, opts: &FormatOptions) -> String {
    format!(
        "{} route for {} on {} ({} points)\n",
        opts.highlight("Deleted"),
        ack.user_id,
        ack.date,
        ack.deleted_points
    )
}

pub fn format_location_ack(ack: &LocationAck, opts: &FormatOptions) -> String {
    let sample = &ack.record.sample;
    format!(
        "{} position {:.6}, {:.6} for {} at {} (id {})\n",
        opts.highlight("Recorded"),
        sample.latitude,
        sample.longitude,
        ack.user_id,
        format_timestamp(sample),
        ack.record.id
    )
}

/// A route summary followed by every point.
pub fn format_route_text(route: &Route, opts: &FormatOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} on {}\n",
        opts.label("Route:"),
        route.owner,
        route.date
    ));
    out.push_str(&format!("{} {}\n", opts.label("Points:"), route.len()));
    out.push_str(&format!(
        "{} {}\n",
        opts.label("Distance:"),
        format_distance(route.distance_meters())
    ));
    if let Some(elapsed) = route.elapsed() {
        out.push_str(&format!(
            "{} {}\n",
            opts.label("Duration:"),
            format_elapsed(elapsed)
        ));
    }
    out.push('\n');
    out.push_str(&opts.label(&format!(
        "{:>5}  {:>11}  {:>11}  {}",
        "#", "lat", "lng", "ts"
    )));
    out.push('\n');
    for (i, sample) in route.points.iter().enumerate() {
        out.push_str(&format_sample_line(i, sample));
        out.push('\n');
    }
    out
}

/// One line per route.
pub fn format_history_text(routes: &[Route], opts: &FormatOptions) -> String {
    if routes.is_empty() {
        return "No routes stored.\n".to_string();
    }

    let mut out = opts.label(&format!(
        "{:<10}  {:>7}  {:>10}  {:>12}",
        "date", "points", "distance", "duration"
    ));
    out.push('\n');
    for route in routes {
        out.push_str(&format!(
            "{:<10}  {:>7}  {:>10}  {:>12}\n",
            route.date.to_string(),
            route.len(),
            format_distance(route.distance_meters()),
            route.elapsed().map(format_elapsed).unwrap_or_default()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn plain() -> FormatOptions {
        FormatOptions::new(true, false)
    }

    fn sample_route() -> Route {
        Route::new(
            "1",
            "2025-01-31".parse().unwrap(),
            vec![
                PositionSample::new(25.047924, 121.517081, datetime!(2025-01-31 08:30:00 UTC)),
                PositionSample::new(25.0465, 121.5168, datetime!(2025-01-31 08:32:05 UTC)),
            ],
        )
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(12.4), "12 m");
        assert_eq!(format_distance(1500.0), "1.50 km");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(time::Duration::seconds(3)), "3s");
        assert_eq!(format_elapsed(time::Duration::seconds(125)), "2m 05s");
        assert_eq!(format_elapsed(time::Duration::seconds(3723)), "1h 02m 03s");
    }

    #[test]
    fn test_format_route_text() {
        let text = format_route_text(&sample_route(), &plain());
        assert!(text.starts_with("Route: 1 on 2025-01-31\n"));
        assert!(text.contains("Points: 2"));
        assert!(text.contains("Duration: 2m 05s"));
        assert!(text.contains("25.047924"));
        assert!(text.contains("2025-01-31T08:32:05Z"));
    }

    #[test]
    fn test_format_history_text() {
        assert_eq!(format_history_text(&[], &plain()), "No routes stored.\n");

        let text = format_history_text(&[sample_route()], &plain());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2025-01-31"));
    }

    #[test]
    fn test_format_upload_ack() {
        let ack = UploadAck {
            message: "GPS route replaced successfully".to_string(),
            user_id: "1".to_string(),
            date: "2025-01-31".parse().unwrap(),
            point_count: 2,
            replaced: true,
        };
        assert_eq!(
            format_upload_ack(&ack, &plain()),
            "Replaced route for 1 on 2025-01-31 (2 points)\n"
        );
    }

    #[test]
    fn test_json_output() {
        let route = sample_route();
        let compact = FormatOptions::new(true, true).as_json(&route).unwrap();
        assert!(compact.starts_with("{\"user_id\":\"1\""));
        assert!(compact.ends_with('\n'));

        let pretty = plain().as_json(&route).unwrap();
        assert!(pretty.contains("\n  \"date\": \"2025-01-31\""));
    }
}
