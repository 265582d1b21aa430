//! Target path templates
//!
//! `{placeholder}` tokens are replaced by record fields. The date
//! placeholders `year`, `month`, `month_name` and `day` are derived from the
//! `created` timestamp in local time.

use std::sync::LazyLock;

use chrono::{DateTime, Local, TimeZone};
use regex::{Captures, Regex};

use crate::catalog::FileRecord;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Characters that are invalid in Windows file names (and `/`).
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> Self {
        Self {
            source: source.into().replace('\\', "/"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render against `record`.
    ///
    /// The result is relative: separator runs are collapsed and leading or
    /// trailing separators removed. It may be empty.
    pub fn render(&self, record: &FileRecord) -> String {
        let created = record
            .created
            .filter(|ts| ts.is_finite() && *ts != 0.0)
            .and_then(local_time);

        let rendered = PLACEHOLDER.replace_all(&self.source, |caps: &Captures<'_>| {
            let key = &caps[1];
            match (key, created.as_ref()) {
                ("year", Some(dt)) => dt.format("%Y").to_string(),
                ("month", Some(dt)) => dt.format("%m").to_string(),
                ("month_name", Some(dt)) => dt.format("%B").to_string(),
                ("day", Some(dt)) => dt.format("%d").to_string(),
                ("year" | "month_name", None) => "Unknown".to_string(),
                ("month" | "day", None) => "00".to_string(),
                (field, _) => sanitize(
                    &record
                        .field(field)
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                ),
            }
        });

        collapse_separators(&rendered)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn local_time(ts: f64) -> Option<DateTime<Local>> {
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9) as u32;
    Local.timestamp_opt(secs as i64, nanos.min(999_999_999)).single()
}

/// Make a substituted value safe to use inside a single path segment.
///
/// Invalid characters become `_`. A value consisting only of dots has every
/// dot replaced too, so it can never form a `.` or `..` segment.
pub fn sanitize(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c == '.') {
        return "_".repeat(value.len());
    }
    value.replace(INVALID_CHARS, "_")
}

fn collapse_separators(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Mid-day, mid-month so the local date is the same in every timezone.
    fn march_15_2024() -> f64 {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Local.from_local_datetime(&naive).single().unwrap().timestamp() as f64
    }

    #[test]
    fn renders_date_placeholders_from_created() {
        let record = FileRecord::new("/x/a.pdf").with_field("created", march_15_2024());
        let template = Template::parse("{year}/{month_name}/{name}");
        assert_eq!(template.render(&record), "2024/March/a.pdf");

        let template = Template::parse("{year}-{month}-{day}");
        assert_eq!(template.render(&record), "2024-03-15");
    }

    #[test]
    fn missing_or_zero_created_falls_back() {
        let template = Template::parse("{year}/{month_name}/{month}/{day}/{name}");
        let missing = FileRecord::new("/x/a.pdf");
        assert_eq!(template.render(&missing), "Unknown/Unknown/00/00/a.pdf");

        let zero = FileRecord::new("/x/a.pdf").with_field("created", 0.0);
        assert_eq!(template.render(&zero), "Unknown/Unknown/00/00/a.pdf");
    }

    #[test]
    fn missing_fields_render_empty_and_collapse() {
        let record = FileRecord::new("/x/a.pdf").with_field("category", "Documents");
        let template = Template::parse("/{category}/{subcategory}//{name}/");
        assert_eq!(template.render(&record), "Documents/a.pdf");
    }

    #[test]
    fn substituted_values_are_sanitized() {
        let record = FileRecord::new("/x/a.pdf")
            .with_field("category", "A/B:C")
            .with_field("project", "..");
        let template = Template::parse("{category}/{project}/{name}");
        assert_eq!(template.render(&record), "A_B_C/__/a.pdf");
    }

    #[test]
    fn backslashes_in_template_are_separators() {
        let record = FileRecord::new("/x/a.pdf").with_field("category", "Docs");
        let template = Template::parse("{category}\\Sub\\{name}");
        assert_eq!(template.render(&record), "Docs/Sub/a.pdf");
    }

    #[test]
    fn unknown_braces_are_left_alone() {
        let record = FileRecord::new("/x/a.pdf");
        let template = Template::parse("{not closed/{name}");
        assert_eq!(template.render(&record), "{not closed/a.pdf");
    }

    #[test]
    fn numeric_fields_render_as_text() {
        let record = FileRecord::new("/x/a.pdf").with_field("size", 2048i64);
        assert_eq!(Template::parse("{size}/{name}").render(&record), "2048/a.pdf");
    }

    #[test]
    fn local_time_handles_fractional_seconds() {
        let dt = local_time(march_15_2024() + 0.5).unwrap();
        assert_eq!(dt.year(), 2024);
    }

    proptest! {
        #[test]
        fn sanitized_values_never_introduce_separators(value in ".*") {
            let out = sanitize(&value);
            prop_assert!(!out.contains(INVALID_CHARS));
            prop_assert!(out != "." && out != "..");
        }

        #[test]
        fn rendered_paths_stay_inside_the_view(category in ".*", name in ".*") {
            let record = FileRecord::new("/x/file")
                .with_field("category", category)
                .with_field("name", name);
            let rendered = Template::parse("{category}/{name}").render(&record);

            prop_assert!(!rendered.starts_with('/'));
            prop_assert!(!rendered.ends_with('/'));
            prop_assert!(!rendered.contains("//"));
            prop_assert!(rendered.split('/').all(|s| s != ".." && s != "."));
        }
    }
}
