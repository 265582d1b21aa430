//! Preview ("dry-run") report of all views

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use vorg_fs::{NormalizedPath, io};

use super::{Mapping, ViewMappings};
use crate::Result;

/// Rows shown per view; the remainder is only counted.
pub const PREVIEW_ROW_LIMIT: usize = 100;

/// Per-view section of a [`PreviewReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub name: String,
    pub count: usize,
    /// At most [`PREVIEW_ROW_LIMIT`] mappings
    pub sample: Vec<Mapping>,
    pub omitted: usize,
}

/// Summary of what `link` would create across every view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewReport {
    pub generated_at: DateTime<Utc>,
    pub views: Vec<ViewSummary>,
    pub total_links: usize,
    pub unique_sources: usize,
}

impl PreviewReport {
    pub fn build(all: &ViewMappings) -> Self {
        let views = all
            .iter()
            .map(|(name, mappings)| ViewSummary {
                name: name.clone(),
                count: mappings.len(),
                sample: mappings.iter().take(PREVIEW_ROW_LIMIT).cloned().collect(),
                omitted: mappings.len().saturating_sub(PREVIEW_ROW_LIMIT),
            })
            .collect();
        let unique_sources = all
            .values()
            .flatten()
            .map(|m| m.source_path.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            generated_at: Utc::now(),
            views,
            total_links: all.values().map(Vec::len).sum(),
            unique_sources,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Virtual organization preview ({})", self.generated_at.to_rfc3339());
        for view in &self.views {
            let _ = writeln!(out, "\n== {} ({} files) ==", view.name, view.count);
            for mapping in &view.sample {
                let _ = writeln!(out, "  {} -> {}", mapping.source_path, mapping.target_path);
            }
            if view.omitted > 0 {
                let _ = writeln!(out, "  ... and {} more files", view.omitted);
            }
        }
        let _ = writeln!(out, "\nTotal links: {}", self.total_links);
        let _ = writeln!(out, "Unique source files: {}", self.unique_sources);
        out
    }

    pub fn render_html(&self) -> String {
        let mut out = String::new();
        out.push_str(HTML_HEAD);
        let _ = writeln!(
            out,
            "<p class=\"timestamp\">Generated {}</p>\n\
             <p>No files are moved; only links will be created.</p>",
            self.generated_at.to_rfc3339()
        );

        for view in &self.views {
            let _ = writeln!(
                out,
                "<div class=\"view\">\n<h2>View: {}</h2>\n<p class=\"count\">{} files</p>\n\
                 <table>\n<thead><tr><th>Source Path</th><th>Virtual Path</th></tr></thead>\n<tbody>",
                escape_html(&view.name),
                view.count
            );
            for mapping in &view.sample {
                let _ = writeln!(
                    out,
                    "<tr><td><code>{}</code></td><td><code>{}</code></td></tr>",
                    escape_html(&mapping.source_path),
                    escape_html(&mapping.target_path)
                );
            }
            if view.omitted > 0 {
                let _ = writeln!(
                    out,
                    "<tr><td colspan=\"2\"><em>... and {} more files</em></td></tr>",
                    view.omitted
                );
            }
            out.push_str("</tbody>\n</table>\n</div>\n");
        }

        let _ = writeln!(
            out,
            "<div class=\"summary\">\n<h3>Summary</h3>\n\
             <p>Total virtual links to create: <strong>{}</strong></p>\n\
             <p>Total unique source files: <strong>{}</strong></p>\n</div>\n</body>\n</html>",
            self.total_links, self.unique_sources
        );
        out
    }

    /// Write the report; `.html`/`.htm` get HTML, `.json` JSON, anything
    /// else plain text.
    pub fn write(&self, path: &NormalizedPath) -> Result<()> {
        let extension = path.extension().unwrap_or("").to_ascii_lowercase();
        let content = match extension.as_str() {
            "html" | "htm" => self.render_html(),
            "json" => serde_json::to_string_pretty(self)?,
            _ => self.render_text(),
        };
        io::write_text(path, &content)?;
        tracing::info!(path = %path, views = self.views.len(), "Wrote preview report");
        Ok(())
    }
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>Virtual Organization Preview</title>
<style>
body { font-family: sans-serif; margin: 2em; }
.view { margin-bottom: 2em; border: 1px solid #ccc; padding: 1em; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
.count { font-weight: bold; }
.timestamp { color: #777; font-size: 0.9em; }
.summary { padding: 1em; background-color: #e8f4fd; }
</style>
</head>
<body>
<h1>Virtual Organization Preview</h1>
"#;

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
