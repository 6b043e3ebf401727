//! Unified diff parsing for comment position checks
//!
//! The hosting platform only accepts inline comments on lines the diff
//! actually touches. [`DiffIndex`] records, per file, which line numbers were
//! added on the new side and removed on the old side so proposed comments can
//! be checked before posting.

use std::collections::{BTreeSet, HashMap};

use crate::review::Side;

/// Changed lines of a single file
#[derive(Debug, Clone, Default)]
pub struct FileChanges {
    /// Line numbers removed from the old version
    pub left: BTreeSet<u64>,
    /// Line numbers added in the new version
    pub right: BTreeSet<u64>,
}

/// Per-file index of commentable diff positions
#[derive(Debug, Clone, Default)]
pub struct DiffIndex {
    files: HashMap<String, FileChanges>,
}

impl DiffIndex {
    /// Build an index from a unified diff
    ///
    /// Unrecognized lines are skipped rather than rejected; the hosting
    /// platform occasionally emits extended headers this parser does not
    /// need to understand.
    pub fn parse(diff: &str) -> Self {
        let mut files: HashMap<String, FileChanges> = HashMap::new();
        let mut current: Option<String> = None;
        let mut old_line: u64 = 0;
        let mut new_line: u64 = 0;
        let mut in_hunk = false;

        for line in diff.lines() {
            if let Some(path) = line.strip_prefix("+++ ") {
                current = parse_path(path);
                in_hunk = false;
                continue;
            }
            if line.starts_with("--- ") || line.starts_with("diff --git") {
                in_hunk = false;
                continue;
            }
            if let Some(header) = line.strip_prefix("@@ ") {
                if let Some((old_start, new_start)) = parse_hunk_header(header) {
                    old_line = old_start;
                    new_line = new_start;
                    in_hunk = true;
                }
                continue;
            }

            if !in_hunk {
                continue;
            }

            match line.as_bytes().first() {
                Some(b'+') => {
                    if let Some(path) = &current {
                        files.entry(path.clone()).or_default().right.insert(new_line);
                    }
                    new_line += 1;
                }
                Some(b'-') => {
                    if let Some(path) = &current {
                        files.entry(path.clone()).or_default().left.insert(old_line);
                    }
                    old_line += 1;
                }
                Some(b' ') => {
                    old_line += 1;
                    new_line += 1;
                }
                // "\ No newline at end of file"
                Some(b'\\') => {}
                _ => {
                    in_hunk = false;
                }
            }
        }

        Self { files }
    }

    /// Whether an inline comment at this position would be accepted
    pub fn is_commentable(&self, path: &str, line: u64, side: Side) -> bool {
        let Some(changes) = self.files.get(path) else {
            return false;
        };
        match side {
            Side::Left => changes.left.contains(&line),
            Side::Right => changes.right.contains(&line),
        }
    }

    /// Total count of added plus removed lines
    pub fn changed_line_count(&self) -> u64 {
        self.files
            .values()
            .map(|c| (c.left.len() + c.right.len()) as u64)
            .sum()
    }

    /// Paths of every file the diff touches
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn changes_for(&self, path: &str) -> Option<&FileChanges> {
        self.files.get(path)
    }
}

/// Extract the repository-relative path from a `+++` header
fn parse_path(raw: &str) -> Option<String> {
    let path = raw.split('\t').next().unwrap_or(raw).trim();
    if path == "/dev/null" {
        return None;
    }
    let stripped = path.strip_prefix("b/").unwrap_or(path);
    Some(stripped.to_string())
}

/// Parse `-a,b +c,d` out of a hunk header, returning the two start lines
fn parse_hunk_header(header: &str) -> Option<(u64, u64)> {
    let body = header.split(" @@").next()?;
    let mut parts = body.split_whitespace();

    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;

    let old_start = old.split(',').next()?.parse().ok()?;
    let new_start = new.split(',').next()?.parse().ok()?;
    Some((old_start, new_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -10,7 +10,8 @@ fn existing() {
 context line
-removed line
+replacement line
+added line
 more context
@@ -40,3 +41,4 @@ fn tail() {
 unchanged
 unchanged
+new tail line
diff --git a/docs/notes.md b/docs/notes.md
new file mode 100644
--- /dev/null
+++ b/docs/notes.md
@@ -0,0 +1,2 @@
+first line
+second line
";

    #[test]
    fn test_added_lines_are_commentable() {
        let index = DiffIndex::parse(SAMPLE);
        assert!(index.is_commentable("src/lib.rs", 11, Side::Right));
        assert!(index.is_commentable("src/lib.rs", 12, Side::Right));
        assert!(index.is_commentable("docs/notes.md", 1, Side::Right));
        assert!(index.is_commentable("docs/notes.md", 2, Side::Right));
    }

    #[test]
    fn test_removed_lines_are_commentable_on_left() {
        let index = DiffIndex::parse(SAMPLE);
        assert!(index.is_commentable("src/lib.rs", 11, Side::Left));
        assert!(!index.is_commentable("src/lib.rs", 13, Side::Left));
    }

    #[test]
    fn test_context_lines_are_not_commentable() {
        let index = DiffIndex::parse(SAMPLE);
        // Line 10 is context in the first hunk
        assert!(!index.is_commentable("src/lib.rs", 10, Side::Right));
        assert!(!index.is_commentable("src/lib.rs", 13, Side::Right));
    }

    #[test]
    fn test_second_hunk_counts_from_its_own_start() {
        let index = DiffIndex::parse(SAMPLE);
        assert!(index.is_commentable("src/lib.rs", 43, Side::Right));
        assert!(!index.is_commentable("src/lib.rs", 41, Side::Right));
    }

    #[test]
    fn test_unknown_file_is_not_commentable() {
        let index = DiffIndex::parse(SAMPLE);
        assert!(!index.is_commentable("src/other.rs", 11, Side::Right));
    }

    #[test]
    fn test_changed_line_count() {
        let index = DiffIndex::parse(SAMPLE);
        // 1 removed + 2 added + 1 added tail + 2 added in the new file
        assert_eq!(index.changed_line_count(), 6);
    }

    #[test]
    fn test_files_listed() {
        let index = DiffIndex::parse(SAMPLE);
        let mut files: Vec<&str> = index.files().collect();
        files.sort_unstable();
        assert_eq!(files, vec!["docs/notes.md", "src/lib.rs"]);
    }

    #[test]
    fn test_empty_diff() {
        let index = DiffIndex::parse("");
        assert_eq!(index.changed_line_count(), 0);
        assert!(!index.is_commentable("src/lib.rs", 1, Side::Right));
    }

    #[test]
    fn test_no_newline_marker_ignored() {
        let diff = "\
--- a/f.txt
+++ b/f.txt
@@ -1,1 +1,1 @@
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";
        let index = DiffIndex::parse(diff);
        assert!(index.is_commentable("f.txt", 1, Side::Left));
        assert!(index.is_commentable("f.txt", 1, Side::Right));
    }

    #[test]
    fn test_hunk_header_without_count() {
        // Single-line hunks may omit the count
        assert_eq!(parse_hunk_header("-5 +7 @@"), Some((5, 7)));
        assert_eq!(parse_hunk_header("-10,3 +12,4 @@ fn ctx()"), Some((10, 12)));
        assert_eq!(parse_hunk_header("garbage"), None);
    }
}
