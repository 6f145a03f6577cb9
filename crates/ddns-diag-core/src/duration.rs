//! Compact human-readable durations
//!
//! `3661` seconds renders as `1h 1m 1s`. Units are years of 52 weeks, weeks,
//! days, hours, minutes and seconds; zero-valued units are left out except
//! seconds, which are always present.

/// Length of each unit in seconds, largest first
const UNIT_SECONDS: [u64; 6] = [60 * 60 * 24 * 7 * 52, 60 * 60 * 24 * 7, 60 * 60 * 24, 60 * 60, 60, 1];

/// Duration formatter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationFormat {
    /// Suffixes for year, week, day, hour, minute, second
    pub suffixes: [String; 6],
    /// Append `s` to components greater than one (never to seconds)
    pub pluralize: bool,
    /// Separator between components
    pub separator: String,
}

impl Default for DurationFormat {
    fn default() -> Self {
        Self {
            suffixes: ["y", "w", "d", "h", "m", "s"].map(String::from),
            pluralize: false,
            separator: " ".to_string(),
        }
    }
}

impl DurationFormat {
    /// Set the component separator
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Enable or disable pluralized suffixes
    pub fn with_pluralize(mut self, pluralize: bool) -> Self {
        self.pluralize = pluralize;
        self
    }

    /// Set the unit suffixes
    pub fn with_suffixes(mut self, suffixes: [&str; 6]) -> Self {
        self.suffixes = suffixes.map(String::from);
        self
    }

    /// Format a number of seconds
    ///
    /// Whole inputs render seconds as an integer, fractional inputs with two
    /// decimals. Negative inputs render as the absolute value with a `-` prefix.
    pub fn format(&self, total_seconds: f64) -> String {
        if total_seconds.is_sign_negative() && total_seconds != 0.0 {
            return format!("-{}", self.format(-total_seconds));
        }

        let fractional = total_seconds.fract() != 0.0;
        let whole = total_seconds.trunc() as u64;
        let mut remaining = whole;
        let mut parts = Vec::new();

        for (i, &length) in UNIT_SECONDS[..5].iter().enumerate() {
            let value = remaining / length;
            remaining %= length;
            if value > 0 {
                let plural = if self.pluralize && value > 1 { "s" } else { "" };
                parts.push(format!("{}{}{}", value, self.suffixes[i], plural));
            }
        }

        let seconds = if fractional {
            format!("{:.2}", remaining as f64 + total_seconds.fract())
        } else {
            remaining.to_string()
        };
        parts.push(format!("{}{}", seconds, self.suffixes[5]));

        parts.join(&self.separator)
    }

    /// Format a `chrono::Duration` in whole seconds
    pub fn format_duration(&self, duration: chrono::Duration) -> String {
        self.format(duration.num_seconds() as f64)
    }
}

/// Format seconds with the default suffixes and separator
pub fn format_seconds(total_seconds: f64) -> String {
    DurationFormat::default().format(total_seconds)
}

/// Format a `chrono::Duration` with the default suffixes and separator
pub fn format_duration(duration: chrono::Duration) -> String {
    DurationFormat::default().format_duration(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(format_seconds(0.0), "0s");
    }

    #[test]
    fn test_skips_zero_units() {
        assert_eq!(format_seconds(3661.0), "1h 1m 1s");
        assert_eq!(format_seconds(3600.0), "1h 0s");
        assert_eq!(format_seconds(86_400.0 + 5.0), "1d 5s");
    }

    #[test]
    fn test_year_is_52_weeks() {
        assert_eq!(format_seconds(31_449_600.0), "1y 0s");
        // A calendar year is one day longer than 52 weeks
        assert_eq!(format_seconds(31_536_000.0), "1y 1d 0s");
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(format_seconds(61.5), "1m 1.50s");
        assert_eq!(format_seconds(0.25), "0.25s");
    }

    #[test]
    fn test_pluralize_and_separator() {
        let fmt = DurationFormat::default()
            .with_suffixes([" year", " week", " day", " hour", " minute", " second"])
            .with_pluralize(true)
            .with_separator(", ");
        assert_eq!(
            fmt.format((2 * 86_400 + 3600 + 2 * 60 + 5) as f64),
            "2 days, 1 hour, 2 minutes, 5 second"
        );
    }

    #[test]
    fn test_negative() {
        assert_eq!(format_seconds(-61.0), "-1m 1s");
    }

    #[test]
    fn test_chrono_duration() {
        assert_eq!(format_duration(chrono::Duration::seconds(90)), "1m 30s");
        assert_eq!(format_duration(chrono::Duration::milliseconds(1500)), "1s");
    }
}
