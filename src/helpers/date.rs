//! Date helper functions
//!
//! Dates are shown in one fixed locale and timezone using date-fns style
//! patterns (`dd MMM yyyy`, `dd MMM yyyy, 'às' HH:mm`).

use anyhow::{anyhow, Result};
use chrono::{DateTime, Locale, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Formats publication timestamps for display
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
    date_format: String,
    datetime_format: String,
}

impl DateFormatter {
    /// Create a formatter from a language tag (`pt-BR`), an IANA timezone
    /// and two date-fns patterns
    pub fn new(
        language: &str,
        timezone: &str,
        date_format: &str,
        datetime_format: &str,
    ) -> Result<Self> {
        let timezone: Tz = timezone
            .parse()
            .map_err(|e| anyhow!("Unknown timezone {:?}: {}", timezone, e))?;

        Ok(Self {
            locale: parse_locale(language)?,
            timezone,
            date_format: date_fns_to_chrono(date_format),
            datetime_format: date_fns_to_chrono(datetime_format),
        })
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(
            &config.language,
            &config.timezone,
            &config.date_format,
            &config.datetime_format,
        )
    }

    /// Creation date, e.g. `15 mar 2021`
    pub fn date(&self, date: &DateTime<Utc>) -> String {
        self.format_chrono(date, &self.date_format)
    }

    /// Last-modified timestamp, e.g. `19 mar 2021, às 15:49`
    pub fn datetime(&self, date: &DateTime<Utc>) -> String {
        self.format_chrono(date, &self.datetime_format)
    }

    /// Abbreviated month names, January first
    pub fn month_abbreviations(&self) -> Vec<String> {
        (1..=12)
            .filter_map(|month| Utc.with_ymd_and_hms(2021, month, 15, 12, 0, 0).single())
            .map(|date| date.format_localized("%b", self.locale).to_string())
            .collect()
    }

    fn format_chrono(&self, date: &DateTime<Utc>, format: &str) -> String {
        date.with_timezone(&self.timezone)
            .format_localized(format, self.locale)
            .to_string()
    }
}

/// Map a language tag like `pt-BR` onto a chrono locale
pub fn parse_locale(language: &str) -> Result<Locale> {
    let name = language.trim().replace('-', "_");
    let name = match name.split_once('_') {
        Some((lang, region)) => format!("{}_{}", lang.to_lowercase(), region.to_uppercase()),
        None => name.to_lowercase(),
    };
    Locale::try_from(name.as_str()).map_err(|_| anyhow!("Unsupported language: {}", language))
}

/// The last-modified timestamp worth showing: present and different from
/// the first publication
pub fn edited_at(
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    last.filter(|last| Some(*last) != first)
}

/// Convert a date-fns format pattern to a chrono format string
///
/// Letter runs are tokens, text between single quotes is literal and `''`
/// is a literal quote.
pub fn date_fns_to_chrono(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            // closing quote
            i += 1;
            continue;
        }

        if c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i] == c {
                i += 1;
            }
            let run = i - start;
            match token(c, run) {
                Some(directive) => out.push_str(directive),
                None => (0..run).for_each(|_| push_literal(&mut out, c)),
            }
            continue;
        }

        push_literal(&mut out, c);
        i += 1;
    }

    out
}

fn token(c: char, run: usize) -> Option<&'static str> {
    let directive = match (c, run) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1) => "%-m",
        ('M', 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('a', _) => "%p",
        _ => return None,
    };
    Some(directive)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
