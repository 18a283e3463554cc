use crate::file_processor::{ChangeType, FileDiff};
use colored::*;
use std::io::IsTerminal;

pub struct DiffFormatter;

impl DiffFormatter {
    /// Auto-detect if we should use colors
    fn should_use_color() -> bool {
        // Check NO_COLOR env var (https://no-color.org/)
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }

        std::io::stdout().is_terminal()
    }

    /// Format file diff with context lines around each insertion
    pub fn format_diff_with_context(diff: &FileDiff, context_size: usize) -> String {
        Self::render_diff(diff, context_size, Self::should_use_color())
    }

    fn render_diff(diff: &FileDiff, context_size: usize, use_color: bool) -> String {
        let mut output = String::new();

        if use_color {
            output.push_str(&format!("{}\n", diff.file_path.bold().cyan()));
        } else {
            output.push_str(&format!("{}\n", diff.file_path));
        }

        for (line_num, content, change_type) in Self::filter_lines_with_context(&diff.all_lines, context_size) {
            // Placeholder between distant groups
            if line_num == 0 {
                if use_color {
                    output.push_str(&format!("{}\n", "...".dimmed()));
                } else {
                    output.push_str("...\n");
                }
                continue;
            }

            let indicator = match change_type {
                ChangeType::Unchanged => "=",
                ChangeType::Added => "+",
            };

            if use_color {
                let colored_line = match change_type {
                    ChangeType::Unchanged => format!("L{}: {} {}\n", line_num, indicator.dimmed(), content.dimmed()),
                    ChangeType::Added => format!("L{}: {} {}\n", line_num, indicator.green().bold(), content.green().bold()),
                };
                output.push_str(&colored_line);
            } else {
                output.push_str(&format!("L{}: {} {}\n", line_num, indicator, content));
            }
        }

        let total = diff.insertion_count();
        let noun = if total == 1 { "insertion" } else { "insertions" };
        if use_color {
            output.push_str(&format!("\nTotal: {} {}\n", total.to_string().bold().white(), noun.green()));
        } else {
            output.push_str(&format!("\nTotal: {} {}\n", total, noun));
        }

        output
    }

    /// Filter lines to show only inserted lines with context, grouping close changes
    ///
    /// A `(0, "...", Unchanged)` entry marks a gap between groups.
    fn filter_lines_with_context(
        lines: &[(usize, String, ChangeType)],
        context_size: usize,
    ) -> Vec<(usize, String, ChangeType)> {
        if context_size == 0 {
            return lines
                .iter()
                .filter(|(_, _, ct)| *ct != ChangeType::Unchanged)
                .cloned()
                .collect();
        }

        let changed_indices: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, (_, _, ct))| *ct != ChangeType::Unchanged)
            .map(|(i, _)| i)
            .collect();

        // Two changes share a group if their context windows touch
        let group_threshold = context_size * 2 + 1;
        let mut groups: Vec<(usize, usize)> = Vec::new();

        for idx in changed_indices {
            match groups.last_mut() {
                Some((_, end)) if idx.saturating_sub(*end) <= group_threshold => *end = idx,
                _ => groups.push((idx, idx)),
            }
        }

        let mut result = Vec::new();
        let mut last_included_end: Option<usize> = None;

        for (group_start, group_end) in groups {
            let mut start = group_start.saturating_sub(context_size);
            let end = (group_end + context_size + 1).min(lines.len());

            if let Some(last_end) = last_included_end {
                if start > last_end {
                    result.push((0, "...".to_string(), ChangeType::Unchanged));
                }
                start = start.max(last_end);
            }

            result.extend(lines[start..end].iter().cloned());
            last_included_end = Some(end);
        }

        result
    }

    /// Format dry run header
    pub fn format_dry_run_header(file_path: &str) -> String {
        if Self::should_use_color() {
            format!("{} {}\n\n", "🔍 Dry run:".bold().cyan(), file_path.white().bold())
        } else {
            format!("Dry run: {}\n\n", file_path)
        }
    }

    /// One-line outcome for a processed file
    pub fn format_summary(diff: &FileDiff, applied: bool) -> String {
        Self::render_summary(diff, applied, Self::should_use_color())
    }

    fn render_summary(diff: &FileDiff, applied: bool, use_color: bool) -> String {
        let count = diff.insertion_count();

        let text = match (count, applied) {
            (0, _) => "No matching call sites found.".to_string(),
            (n, true) => format!("Inserted {} line{} into {}", n, if n == 1 { "" } else { "s" }, diff.file_path),
            (n, false) => format!("Would insert {} line{} into {}", n, if n == 1 { "" } else { "s" }, diff.file_path),
        };

        if use_color && count > 0 {
            format!("{}\n", text.green())
        } else {
            format!("{}\n", text)
        }
    }
}
