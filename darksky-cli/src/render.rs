use chrono::{DateTime, FixedOffset, Offset, Utc};
use darksky_core::{DataBlock, DataPoint, Forecast};

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub hourly: bool,
    pub daily: bool,
}

/// Human-readable summary of a forecast, in the location's local time.
pub fn render(forecast: &Forecast, opts: RenderOptions) -> String {
    let offset = forecast.utc_offset().unwrap_or_else(|| Utc.fix());
    let mut lines = vec![format!(
        "{}, {} ({}, UTC{})",
        forecast.latitude, forecast.longitude, forecast.timezone, offset
    )];

    if let Some(now) = &forecast.currently {
        lines.push(String::new());
        lines.push(currently_line(now));
        let details = details_line(now);
        if !details.is_empty() {
            lines.push(format!("  {details}"));
        }
    }

    let summaries = [
        ("Next hour", &forecast.minutely),
        ("Next 48 hours", &forecast.hourly),
        ("This week", &forecast.daily),
    ];
    let summaries: Vec<String> = summaries
        .iter()
        .filter_map(|(label, block)| {
            let summary = block.as_ref()?.summary.as_deref()?;
            Some(format!("{label}: {summary}"))
        })
        .collect();
    if !summaries.is_empty() {
        lines.push(String::new());
        lines.extend(summaries);
    }

    if let Some(block) = forecast.hourly.as_ref().filter(|_| opts.hourly) {
        lines.push(String::new());
        lines.push("Hourly:".to_string());
        lines.extend(hourly_lines(block, offset));
    }

    if let Some(block) = forecast.daily.as_ref().filter(|_| opts.daily) {
        lines.push(String::new());
        lines.push("Daily:".to_string());
        lines.extend(daily_lines(block, offset));
    }

    if !forecast.alerts.is_empty() {
        lines.push(String::new());
        lines.push("Alerts:".to_string());
        for alert in &forecast.alerts {
            let until = alert
                .expires_at()
                .map(|t| format!(" (until {})", local(t, offset).format("%Y-%m-%d %H:%M")))
                .unwrap_or_default();
            lines.push(format!("  ! {}{}", alert.title, until));
            if !alert.uri.is_empty() {
                lines.push(format!("    {}", alert.uri));
            }
        }
    }

    lines.join("\n")
}

fn currently_line(point: &DataPoint) -> String {
    let summary = point.summary.as_deref().unwrap_or("Current conditions");
    match (point.temperature, point.apparent_temperature) {
        (Some(t), Some(feels)) => format!("Now: {summary}, {t:.1}°F (feels like {feels:.1}°F)"),
        (Some(t), None) => format!("Now: {summary}, {t:.1}°F"),
        _ => format!("Now: {summary}"),
    }
}

fn details_line(point: &DataPoint) -> String {
    let mut parts = Vec::new();

    if let Some(h) = point.humidity {
        parts.push(format!("humidity {:.0}%", h * 100.0));
    }
    if let Some(speed) = point.wind_speed {
        match point.wind_bearing {
            Some(bearing) => parts.push(format!("wind {speed:.1} mph from {bearing:.0}°")),
            None => parts.push(format!("wind {speed:.1} mph")),
        }
    }
    if let Some(p) = point.precip_probability {
        let kind = point.precip_type.as_deref().unwrap_or("precipitation");
        parts.push(format!("{:.0}% chance of {kind}", p * 100.0));
    }
    if let Some(distance) = point.nearest_storm_distance {
        parts.push(format!("nearest storm {distance:.0} mi"));
    }

    parts.join(", ")
}

fn hourly_lines(block: &DataBlock, offset: FixedOffset) -> Vec<String> {
    block
        .data
        .iter()
        .map(|point| {
            let when = point
                .datetime()
                .map(|t| local(t, offset).format("%a %H:%M").to_string())
                .unwrap_or_else(|| "?".to_string());
            let temp = point.temperature.map(|t| format!("{t:.1}°F")).unwrap_or_default();
            let summary = point.summary.as_deref().unwrap_or_default();
            format!("  {when}  {temp:>8}  {summary}").trim_end().to_string()
        })
        .collect()
}

fn daily_lines(block: &DataBlock, offset: FixedOffset) -> Vec<String> {
    block
        .data
        .iter()
        .map(|point| {
            let when = point
                .datetime()
                .map(|t| local(t, offset).format("%a %d %b").to_string())
                .unwrap_or_else(|| "?".to_string());
            let range = match (point.temperature_min, point.temperature_max) {
                (Some(lo), Some(hi)) => format!("{lo:.1}°F .. {hi:.1}°F"),
                _ => String::new(),
            };
            let summary = point.summary.as_deref().unwrap_or_default();
            format!("  {when}  {range}  {summary}").trim_end().to_string()
        })
        .collect()
}

fn local(t: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    t.with_timezone(&offset)
}
