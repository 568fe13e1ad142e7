//! Pure mapping from quota state to status text and tooltip

use chrono::{DateTime, Local};

use super::types::{DisplayState, StatusView};
use crate::quota_usage::error::QuotaError;
use crate::quota_usage::types::QuotaSnapshot;

pub const ICON_NORMAL: &str = "●";
pub const ICON_REFRESHING: &str = "↻";
pub const ICON_LOADING: &str = "○";
pub const ICON_ERROR: &str = "✖";
pub const ICON_SETUP: &str = "⚠";

const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Nearest-integer display of a quota amount
fn format_amount(value: f64) -> String {
    format!("{}", value.round() as i64)
}

/// `"<used>/<total> (<percentage>%)"`
pub fn format_usage(snapshot: &QuotaSnapshot) -> String {
    format!(
        "{}/{} ({}%)",
        format_amount(snapshot.used()),
        format_amount(snapshot.total()),
        snapshot.percentage()
    )
}

/// Multi-line detail block shared by every tooltip that has numbers
pub fn detail_tooltip(snapshot: &QuotaSnapshot) -> String {
    format!(
        "Quota usage\nTotal: {}\nUsed: {}\nRemaining: {}\nUsage: {}%",
        format_amount(snapshot.total()),
        format_amount(snapshot.used()),
        format_amount(snapshot.remaining()),
        snapshot.percentage()
    )
}

pub fn format_last_updated(at: &DateTime<Local>) -> String {
    at.format(LAST_UPDATED_FORMAT).to_string()
}

pub fn render_setup_required() -> StatusView {
    StatusView {
        state: DisplayState::SetupRequired,
        text: format!("{ICON_SETUP} Set API token"),
        tooltip: "No API token configured.\nRun `set-token <token>` to start tracking quota usage."
            .to_string(),
        error_styling: false,
    }
}

/// Only used while nothing is cached
pub fn render_loading() -> StatusView {
    StatusView {
        state: DisplayState::Loading,
        text: format!("{ICON_LOADING} Loading quota..."),
        tooltip: "Fetching quota usage...".to_string(),
        error_styling: false,
    }
}

pub fn render_refreshing_with_cache(snapshot: &QuotaSnapshot) -> StatusView {
    StatusView {
        state: DisplayState::Refreshing,
        text: format!("{ICON_REFRESHING} {}", format_usage(snapshot)),
        tooltip: format!("{}\n\nRefreshing...", detail_tooltip(snapshot)),
        error_styling: false,
    }
}

pub fn render_normal(snapshot: &QuotaSnapshot) -> StatusView {
    StatusView {
        state: DisplayState::Normal,
        text: format!("{ICON_NORMAL} {}", format_usage(snapshot)),
        tooltip: detail_tooltip(snapshot),
        error_styling: false,
    }
}

/// Error display, keeping cached numbers when there are any
pub fn render_error(
    error: &QuotaError,
    cached: Option<&QuotaSnapshot>,
    last_updated_at: Option<&DateTime<Local>>,
) -> StatusView {
    let (text, tooltip) = match cached {
        Some(snapshot) => {
            let mut tooltip = detail_tooltip(snapshot);
            if let Some(at) = last_updated_at {
                tooltip.push_str(&format!("\n\nLast updated: {}", format_last_updated(at)));
            }
            tooltip.push_str(&format!("\n\nError: {error}"));
            (format!("{ICON_ERROR} {}", format_usage(snapshot)), tooltip)
        }
        None => (
            format!("{ICON_ERROR} {}", error.label()),
            format!("Error fetching quota: {error}\nClick to retry."),
        ),
    };

    StatusView {
        state: DisplayState::Error,
        text,
        tooltip,
        error_styling: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(total: f64, used: f64) -> QuotaSnapshot {
        QuotaSnapshot::new(total, used).unwrap()
    }

    /// Strip the indicator glyph and check the `<int>/<int> (<int>%)` shape
    fn usage_parts(text: &str) -> (i64, i64, i64) {
        let core = text.split_once(' ').unwrap().1;
        let (used, rest) = core.split_once('/').unwrap();
        let (total, pct) = rest.split_once(" (").unwrap();
        let pct = pct.strip_suffix("%)").unwrap();
        (used.parse().unwrap(), total.parse().unwrap(), pct.parse().unwrap())
    }

    #[test]
    fn test_render_normal_exact_text() {
        let view = render_normal(&snapshot(2000.0, 380.0));
        assert_eq!(view.text, format!("{ICON_NORMAL} 380/2000 (19%)"));
        assert_eq!(view.state, DisplayState::Normal);
        assert!(!view.error_styling);
    }

    #[test]
    fn test_render_normal_shape_over_many_inputs() {
        for total in [1.0, 3.0, 7.0, 100.0, 2000.0, 123456.0] {
            for used in [0.0, 0.4, 0.5, 1.0, 2.49, 33.3, 99.9, 150.0, 2000.0] {
                let view = render_normal(&snapshot(total, used));
                let (shown_used, shown_total, pct) = usage_parts(&view.text);
                assert_eq!(shown_used, used.round() as i64);
                assert_eq!(shown_total, total as i64);
                assert_eq!(pct, (used / total * 100.0).round() as i64, "{used}/{total}");
            }
        }
    }

    #[test]
    fn test_used_is_rounded_not_truncated() {
        let view = render_normal(&snapshot(1000.0, 379.6));
        assert!(view.text.contains("380/1000"));
    }

    #[test]
    fn test_remaining_rounded_from_unrounded_difference() {
        // 100 - 0.5 = 99.5 -> 100; rounding `used` first would give 99
        let tooltip = detail_tooltip(&snapshot(100.0, 0.5));
        assert!(tooltip.contains("Remaining: 100"), "{tooltip}");
        assert!(tooltip.contains("Used: 1"), "{tooltip}");
    }

    #[test]
    fn test_detail_tooltip_contents() {
        let tooltip = detail_tooltip(&snapshot(2000.0, 380.0));
        assert!(tooltip.contains("Total: 2000"));
        assert!(tooltip.contains("Used: 380"));
        assert!(tooltip.contains("Remaining: 1620"));
        assert!(tooltip.contains("Usage: 19%"));
    }

    #[test]
    fn test_refreshing_indicator_is_distinct() {
        let s = snapshot(2000.0, 380.0);
        let refreshing = render_refreshing_with_cache(&s);
        let normal = render_normal(&s);

        assert_ne!(refreshing.text, normal.text);
        assert!(refreshing.text.starts_with(ICON_REFRESHING));
        assert!(refreshing.text.ends_with("380/2000 (19%)"));
        assert!(refreshing.tooltip.starts_with(&normal.tooltip));
        assert!(refreshing.tooltip.ends_with("Refreshing..."));
        assert_eq!(refreshing.state, DisplayState::Refreshing);
    }

    #[test]
    fn test_render_error_with_cache() {
        let s = snapshot(2000.0, 380.0);
        let at = Local.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        let view = render_error(&QuotaError::RateLimited, Some(&s), Some(&at));

        assert_eq!(view.text, format!("{ICON_ERROR} 380/2000 (19%)"));
        assert!(view.tooltip.contains("Used: 380"));
        assert!(view.tooltip.contains("Last updated: 2026-03-01 12:30:05"));
        assert!(view.tooltip.contains("Rate limited"));
        assert!(view.error_styling);
        assert_eq!(view.state, DisplayState::Error);
    }

    #[test]
    fn test_render_error_without_cache() {
        let view = render_error(&QuotaError::Unauthorized, None, None);
        assert_eq!(view.text, format!("{ICON_ERROR} Invalid Token"));
        assert!(view.tooltip.starts_with("Error fetching quota: Invalid API token"));
        assert!(view.tooltip.contains("Click to retry"));
    }

    #[test]
    fn test_division_guard_never_renders_nan() {
        let view = render_error(&QuotaError::DivisionGuard, None, None);
        assert!(!view.text.contains("NaN"));
        assert!(!view.text.contains("inf"));
        assert_eq!(view.text, format!("{ICON_ERROR} Invalid Data"));
    }

    #[test]
    fn test_setup_and_loading() {
        let setup = render_setup_required();
        assert_eq!(setup.state, DisplayState::SetupRequired);
        assert!(setup.tooltip.contains("set-token"));

        let loading = render_loading();
        assert_eq!(loading.state, DisplayState::Loading);
        assert!(loading.text.contains("Loading"));
    }
}
