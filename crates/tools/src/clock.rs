//! Current time tool.

use async_trait::async_trait;
use chatclaw_core::error::ToolError;
use chatclaw_core::tool::{ToolDescriptor, ToolHandler};
use chrono::{DateTime, FixedOffset, Utc};

pub const NAME: &str = "get_current_time";

pub struct ClockTool;

impl ClockTool {
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            NAME,
            "Get the current date and time. Defaults to UTC; pass a fixed offset such as '+02:00' for local time.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "utc_offset": {
                        "type": "string",
                        "description": "Offset from UTC as '+HH:MM' or '-HH:MM'"
                    }
                }
            }),
            ClockTool,
        )
    }
}

#[async_trait]
impl ToolHandler for ClockTool {
    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let offset = match arguments["utc_offset"].as_str() {
            Some(raw) => parse_offset(raw)?,
            None => FixedOffset::east_opt(0).ok_or_else(|| bad_offset("+00:00"))?,
        };
        Ok(render(Utc::now(), offset))
    }
}

fn render(now: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = now.with_timezone(&offset);
    format!("{} ({})", local.to_rfc3339(), local.format("%A, %B %-d %Y %H:%M"))
}

/// Parse `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HH`.
fn parse_offset(raw: &str) -> Result<FixedOffset, ToolError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| bad_offset(raw));
    }

    let (sign, rest) = match trimmed.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(bad_offset(raw)),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().map_err(|_| bad_offset(raw))?;
    let minutes: i32 = minutes.parse().map_err(|_| bad_offset(raw))?;
    if hours > 14 || minutes >= 60 {
        return Err(bad_offset(raw));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(|| bad_offset(raw))
}

fn bad_offset(raw: &str) -> ToolError {
    ToolError::InvalidArguments(format!("Invalid UTC offset '{raw}', expected '+HH:MM'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_offset("+02:00").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_offset("-05:30").unwrap().local_minus_utc(), -19800);
        assert_eq!(parse_offset("+9").unwrap().local_minus_utc(), 9 * 3600);
        assert_eq!(parse_offset("UTC").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("02:00").is_err());
        assert!(parse_offset("+25:00").is_err());
        assert!(parse_offset("+01:75").is_err());
    }

    #[test]
    fn renders_in_offset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 22, 15, 0).unwrap();
        let out = render(now, parse_offset("+02:00").unwrap());
        assert!(out.starts_with("2024-03-02T00:15:00+02:00"));
        assert!(out.contains("Saturday, March 2 2024 00:15"));
    }

    #[tokio::test]
    async fn tool_defaults_to_utc() {
        let out = ClockTool.call(serde_json::json!({})).await.unwrap();
        assert!(out.contains("+00:00"));
    }

    #[tokio::test]
    async fn tool_rejects_bad_offset() {
        let err = ClockTool
            .call(serde_json::json!({"utc_offset": "later"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("later"));
    }
}
