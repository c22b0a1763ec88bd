//! Report rendering with a Jinja-style template.
//!
//! Templates see `org`, `date`, `status` (a list of `[name, "OK" | "NOT OK"]`
//! pairs), `outcomes` (name, status, error, saved_to), `aborted`, `skipped`
//! and `undispatched`.

use std::path::Path;

use minijinja::{Environment, context};

use crate::backup::RunReport;
use crate::error::ReportError;

/// Render `report` with the template at `path`.
pub fn render_file(path: &Path, report: &RunReport) -> Result<String, ReportError> {
    let source = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    render(&source, report)
}

/// Render `report` with template source text.
pub fn render(source: &str, report: &RunReport) -> Result<String, ReportError> {
    let env = Environment::new();
    let rendered = env.render_str(
        source,
        context! {
            org => &report.org,
            date => &report.date,
            status => report.status_pairs(),
            outcomes => &report.outcomes,
            aborted => &report.aborted,
            skipped => &report.skipped,
            undispatched => &report.undispatched,
        },
    )?;
    Ok(rendered)
}
