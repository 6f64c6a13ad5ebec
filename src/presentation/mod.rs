//! HTML fragments written into the editor's output panel
//!
//! The `output` field of every frame is an HTML fragment. Tool output is
//! escaped before it is wrapped so compiler text such as `<-chan int` renders
//! literally.

pub mod banners;

pub use banners::{Banners, MessageCatalog, MessageKey};

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::diagnostics::normalize_path;

/// `file.go:line[:col]:` at the start of a compiler error line
static LOCATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>[^\s:]+\.go):(?P<line>\d+)(?::(?P<col>\d+))?:")
        .expect("Valid regex pattern")
});

pub fn escape(text: &str) -> String {
    tera::escape_html(text)
}

pub fn span(class: &str, html: &str) -> String {
    format!("<span class='{class}'>{html}</span>")
}

/// A banner line, e.g. `<span class='build-succ'>Build succeeded</span>\n`.
pub fn banner(key: MessageKey, text: &str) -> String {
    format!("{}\n", span(key.css_class(), &escape(text)))
}

/// The start-build banner with the platform arguments spliced in:
/// `Start [go build]` becomes `Start [go build [-race]]`.
pub fn start_build_text(text: &str, platform_args: &[String]) -> String {
    text.replacen("build]", &format!("build [{}]]", platform_args.join(" ")), 1)
}

pub fn stdout_line(line: &str) -> String {
    format!("{}\n", escape(line))
}

/// Rewrite a leading source location to its absolute path and mark it up.
pub fn annotate_location(workdir: &Path, line: &str) -> String {
    match LOCATION_REGEX.captures(line) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let file = normalize_path(workdir, &caps["file"]);
            let mut location = format!("{}:{}", file, &caps["line"]);
            if let Some(col) = caps.name("col") {
                location.push(':');
                location.push_str(col.as_str());
            }
            format!(
                "{}:{}",
                span("path", &escape(&location)),
                escape(&line[whole..])
            )
        }
        None => escape(line),
    }
}

pub fn stderr_line(workdir: &Path, line: &str) -> String {
    span("stderr", &format!("{}\n", annotate_location(workdir, line)))
}
