//! # File Host
//!
//! The host side of the editor contract for the command line:
//! - `on_save` writes the structured document back to the blueprint file
//! - `on_export` writes the Markdown report to a file or stdout
//! - `on_generate` prints the structured document to stdout for a generator
//!
//! Callbacks cannot return errors, so the first failure is kept and surfaced
//! by [`FileHost::take_error`].

use blueprint_core::{
    Blueprint, BlueprintError, BlueprintNode, HostCallbacks, export_report, export_structured,
};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileHost {
    document: PathBuf,
    report: Option<PathBuf>,
    error: Option<BlueprintError>,
}

impl FileHost {
    /// A host that saves to `document`.
    #[must_use]
    pub fn new(document: impl Into<PathBuf>) -> Self {
        Self {
            document: document.into(),
            report: None,
            error: None,
        }
    }

    /// Send report exports to `path` instead of stdout.
    #[must_use]
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report = Some(path.into());
        self
    }

    #[must_use]
    pub fn document(&self) -> &Path {
        &self.document
    }

    /// The first error raised inside a callback, if any.
    pub fn take_error(&mut self) -> Option<BlueprintError> {
        self.error.take()
    }

    fn record(&mut self, result: Result<(), BlueprintError>) {
        if let Err(e) = result {
            tracing::warn!("Host callback failed: {}", e);
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }
}

/// Write the structured document for `blueprint` to `path`.
pub fn write_document(path: &Path, blueprint: &Blueprint) -> Result<(), BlueprintError> {
    let json = export_structured(blueprint)?;
    std::fs::write(path, json)
        .map_err(|e| BlueprintError::IoError(format!("Write '{}': {}", path.display(), e)))
}

impl HostCallbacks for FileHost {
    fn on_save(&mut self, blueprint: &Blueprint) {
        let result = write_document(&self.document, blueprint);
        if result.is_ok() {
            tracing::info!(
                version = blueprint.version(),
                "Saved blueprint to {}",
                self.document.display()
            );
        }
        self.record(result);
    }

    fn on_export(&mut self, blueprint: &Blueprint) {
        let report = export_report(blueprint);
        let result = match &self.report {
            Some(path) => std::fs::write(path, &report)
                .map(|()| tracing::info!("Wrote report to {}", path.display()))
                .map_err(|e| BlueprintError::IoError(format!("Write '{}': {}", path.display(), e))),
            None => {
                print!("{}", report);
                Ok(())
            }
        };
        self.record(result);
    }

    fn on_generate(&mut self, blueprint: &Blueprint) {
        let result = export_structured(blueprint).map(|json| println!("{}", json));
        self.record(result);
    }

    fn on_node_select(&mut self, node: Option<&BlueprintNode>) {
        match node {
            Some(node) => tracing::debug!(node = %node.id, "Selected {}", node.title),
            None => tracing::debug!("Selection cleared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::import_structured;

    #[test]
    fn save_writes_importable_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bp.json");
        let mut host = FileHost::new(&path);

        let bp = Blueprint::new("saved");
        host.on_save(&bp);

        assert!(host.take_error().is_none());
        let json = std::fs::read_to_string(&path).expect("read");
        assert_eq!(import_structured(&json).expect("import"), bp);
    }

    #[test]
    fn failed_save_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut host = FileHost::new(dir.path().join("missing").join("bp.json"));

        host.on_save(&Blueprint::new("nowhere"));

        assert!(matches!(host.take_error(), Some(BlueprintError::IoError(_))));
        assert!(host.take_error().is_none());
    }

    #[test]
    fn export_writes_report_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = dir.path().join("report.md");
        let mut host = FileHost::new(dir.path().join("bp.json")).with_report_path(&report);

        host.on_export(&Blueprint::new("Report Title"));

        let text = std::fs::read_to_string(&report).expect("read");
        assert!(text.starts_with("# Report Title"));
    }
}
