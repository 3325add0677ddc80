//! Diff rendering for previewing patched files.

use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::path::{Path, PathBuf};

/// Before and after text of one patched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub original: String,
    pub modified: String,
}

impl FileDiff {
    pub fn new(path: impl Into<PathBuf>, original: impl Into<String>, modified: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original: original.into(),
            modified: modified.into(),
        }
    }

    /// Returns true if the document changed.
    pub fn is_modified(&self) -> bool {
        self.original != self.modified
    }

    /// Unified diff with three lines of context.
    pub fn unified(&self) -> String {
        unified_diff(&self.original, &self.modified, &self.path)
    }

    /// Unified diff with ANSI colors for terminal display.
    pub fn colorized(&self) -> String {
        colorized_diff(&self.original, &self.modified, &self.path)
    }

    /// Line statistics for this document.
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diff(&self.original, &self.modified)
    }
}

/// Generates a unified diff between two strings.
pub fn unified_diff(original: &str, modified: &str, path: &Path) -> String {
    let display = path.display().to_string().replace('\\', "/");
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{display}"), &format!("b/{display}"))
        .to_string()
}

/// Colorized diff output for terminal display.
pub fn colorized_diff(original: &str, modified: &str, path: &Path) -> String {
    const RED: &str = "\x1b[31m";
    const GREEN: &str = "\x1b[32m";
    const CYAN: &str = "\x1b[36m";
    const RESET: &str = "\x1b[0m";

    let diff = TextDiff::from_lines(original, modified);
    let mut output = format!(
        "{CYAN}--- a/{path}{RESET}\n{CYAN}+++ b/{path}{RESET}\n",
        path = path.display()
    );
    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str(&format!("{CYAN}...{RESET}\n"));
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let line = change.to_string_lossy();
                let line = line.trim_end_matches(['\r', '\n']);
                match change.tag() {
                    ChangeTag::Delete => output.push_str(&format!("{RED}-{line}{RESET}\n")),
                    ChangeTag::Insert => output.push_str(&format!("{GREEN}+{line}{RESET}\n")),
                    ChangeTag::Equal => output.push_str(&format!(" {line}\n")),
                }
            }
        }
    }
    output
}

/// Line-level statistics over one or more documents.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let (insertions, deletions) =
            diff.iter_all_changes()
                .fold((0, 0), |(ins, del), change| match change.tag() {
                    ChangeTag::Insert => (ins + 1, del),
                    ChangeTag::Delete => (ins, del + 1),
                    ChangeTag::Equal => (ins, del),
                });
        Self {
            files_changed: usize::from(insertions > 0 || deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} insertions(+), {} deletions(-)",
            self.files_changed, self.insertions, self.deletions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEFORE: &str = "services.AddControllers();\nservices.AddRouting();\n";
    const AFTER: &str = "services.AddControllers();\nservices.AddDbContext<Ctx>();\nservices.AddRouting();\n";

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff(BEFORE, AFTER, Path::new("Web/Startup.cs"));
        assert!(diff.starts_with("--- a/Web/Startup.cs\n+++ b/Web/Startup.cs\n"));
        assert!(diff.contains("+services.AddDbContext<Ctx>();\n"));
        assert!(diff.contains(" services.AddRouting();\n"));
    }

    #[test]
    fn test_colorized_diff() {
        let diff = colorized_diff(BEFORE, AFTER, Path::new("Startup.cs"));
        assert!(diff.contains("\x1b[32m+services.AddDbContext<Ctx>();\x1b[0m"));
    }

    #[test]
    fn test_summary() {
        let mut summary = FileDiff::new("Startup.cs", BEFORE, AFTER).summary();
        assert_eq!(
            summary,
            DiffSummary {
                files_changed: 1,
                insertions: 1,
                deletions: 0
            }
        );
        summary.merge(&DiffSummary::from_diff(BEFORE, BEFORE));
        assert_eq!(summary.files_changed, 1);
        assert_eq!(
            summary.to_string(),
            "1 file(s) changed, 1 insertions(+), 0 deletions(-)"
        );
    }

    #[test]
    fn test_unchanged_file() {
        let diff = FileDiff::new("Startup.cs", BEFORE, BEFORE);
        assert!(!diff.is_modified());
        assert_eq!(diff.summary(), DiffSummary::default());
    }
}
