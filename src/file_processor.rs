use crate::error_helpers::describe_io_error;
use crate::patcher::{self, Insertion, PatchOutcome, PatchRule};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeType {
    Unchanged, // Original line, passed through
    Added,     // Line inserted by the patcher
}

#[derive(Debug)]
pub struct FileDiff {
    pub file_path: String,
    pub all_lines: Vec<(usize, String, ChangeType)>, // (output line number, content, change_type)
    pub insertions: Vec<Insertion>,
}

impl FileDiff {
    pub fn insertion_count(&self) -> usize {
        self.insertions.len()
    }

    pub fn has_changes(&self) -> bool {
        !self.insertions.is_empty()
    }
}

pub struct LinePatcher {
    rule: PatchRule,
}

impl LinePatcher {
    pub fn new(rule: PatchRule) -> Self {
        Self { rule }
    }

    /// Patch a file in memory and describe the result without writing it
    pub fn process_file(&self, file_path: &Path) -> Result<FileDiff> {
        let (_, diff) = self.patch_file(file_path)?;
        Ok(diff)
    }

    /// Patch a file and overwrite it with the result
    ///
    /// The file is rewritten even when nothing matched; the content is then
    /// byte-identical to the original.
    pub fn apply_to_file(&self, file_path: &Path) -> Result<FileDiff> {
        let (outcome, diff) = self.patch_file(file_path)?;

        write_replacing(file_path, &patcher::join_lines(&outcome.lines))?;

        tracing::info!(
            file = %file_path.display(),
            insertions = diff.insertion_count(),
            "wrote patched file"
        );

        Ok(diff)
    }

    fn patch_file(&self, file_path: &Path) -> Result<(PatchOutcome, FileDiff)> {
        let content = fs::read_to_string(file_path)
            .map_err(|e| anyhow::anyhow!(describe_io_error(file_path, "reading", &e)))?;

        let lines = patcher::split_lines(&content);
        tracing::debug!(file = %file_path.display(), lines = lines.len(), "read file");

        let outcome = patcher::patch_lines(&lines, &self.rule);
        let diff = build_diff(file_path, &outcome);

        Ok((outcome, diff))
    }
}

fn build_diff(file_path: &Path, outcome: &PatchOutcome) -> FileDiff {
    // Each earlier insertion shifts later ones down by one output line
    let added: Vec<usize> = outcome
        .insertions
        .iter()
        .enumerate()
        .map(|(shift, ins)| ins.line_index + shift)
        .collect();

    let all_lines = outcome
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let change_type = if added.contains(&i) {
                ChangeType::Added
            } else {
                ChangeType::Unchanged
            };
            (i + 1, line.trim_end_matches(['\n', '\r']).to_string(), change_type)
        })
        .collect();

    FileDiff {
        file_path: file_path.display().to_string(),
        all_lines,
        insertions: outcome.insertions.clone(),
    }
}

/// Replace the contents of `file_path` with `content`
///
/// Symlinks are resolved first so the link's target is patched and the link
/// survives. A file with several hard links is rewritten in place; anything
/// else goes through a temp file in the same directory.
fn write_replacing(file_path: &Path, content: &str) -> Result<()> {
    let real_path = fs::canonicalize(file_path)
        .map_err(|e| anyhow::anyhow!(describe_io_error(file_path, "writing", &e)))?;

    let metadata = fs::metadata(&real_path)
        .map_err(|e| anyhow::anyhow!(describe_io_error(&real_path, "writing", &e)))?;

    if has_other_links(&metadata) {
        return write_in_place(&real_path, content);
    }

    let parent_dir = real_path.parent().unwrap_or(Path::new("."));

    let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| {
        anyhow::anyhow!(describe_io_error(parent_dir, "creating a temp file in", &e))
    })?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", real_path.display()))?;
    temp_file
        .as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush temp file for {}", real_path.display()))?;

    fs::set_permissions(temp_file.path(), metadata.permissions())
        .with_context(|| format!("Failed to copy permissions to {}", real_path.display()))?;

    temp_file
        .persist(&real_path)
        .map_err(|e| anyhow::anyhow!(describe_io_error(&real_path, "writing", &e.error)))?;

    Ok(())
}

#[cfg(unix)]
fn has_other_links(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink() > 1
}

#[cfg(not(unix))]
fn has_other_links(_metadata: &fs::Metadata) -> bool {
    false
}

/// Truncate and rewrite the existing inode so every hard link sees the change
fn write_in_place(real_path: &Path, content: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(real_path)
        .map_err(|e| anyhow::anyhow!(describe_io_error(real_path, "writing", &e)))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", real_path.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to flush file: {}", real_path.display()))?;

    Ok(())
}
