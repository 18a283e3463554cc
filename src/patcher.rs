//! Line-level patching engine
//!
//! Finds a three-line call-argument pattern (previous / current / next line),
//! confirms it against a nearby anchor line and inserts one literal argument
//! line before the matched current line. Operates purely on line sequences so
//! it can be exercised without touching the filesystem.

use serde::{Deserialize, Serialize};

/// The substrings and limits that drive matching and insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchRule {
    /// Must appear in the line before the current line
    pub previous_marker: String,

    /// Must appear in the current line; everything before it is the indentation
    pub current_marker: String,

    /// Must appear in the line after the current line
    pub next_marker: String,

    /// Call name that has to appear within `lookback` lines to confirm a match
    pub anchor: String,

    /// How many lines before the current line are searched for the anchor
    pub lookback: usize,

    /// Text inserted (after the indentation) as the new line
    pub insert_text: String,
}

impl Default for PatchRule {
    fn default() -> Self {
        Self {
            previous_marker: "resumeData,".to_string(),
            current_marker: "apiKey".to_string(),
            next_marker: ");".to_string(),
            anchor: "generateCustomSectionContent".to_string(),
            lookback: 10,
            insert_text: "undefined,".to_string(),
        }
    }
}

impl PatchRule {
    /// Check the three-line substring pattern
    pub fn matches_window(&self, previous: &str, current: &str, next: &str) -> bool {
        previous.contains(&self.previous_marker)
            && current.contains(&self.current_marker)
            && next.contains(&self.next_marker)
    }

    /// Search backward from `index` (inclusive) down to `index - lookback`
    /// (inclusive, clamped at 0). Returns the closest anchor line.
    pub fn find_anchor<S: AsRef<str>>(&self, lines: &[S], index: usize) -> Option<usize> {
        if index >= lines.len() {
            return None;
        }

        let start = index.saturating_sub(self.lookback);
        (start..=index)
            .rev()
            .find(|&j| lines[j].as_ref().contains(&self.anchor))
    }

    /// Build the line inserted before `current`, reusing its indentation and terminator
    pub fn insertion_for(&self, current: &str) -> String {
        let indent = current
            .find(&self.current_marker)
            .map(|pos| &current[..pos])
            .unwrap_or("");

        format!("{}{}{}", indent, self.insert_text, line_ending(current))
    }
}

/// A confirmed match and the line inserted for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// 0-based index of the matched current line in the input
    pub line_index: usize,
    /// 0-based index of the anchor line that confirmed the match
    pub anchor_index: usize,
    /// Inserted content without its line terminator
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub lines: Vec<String>,
    pub insertions: Vec<Insertion>,
}

impl PatchOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.insertions.is_empty()
    }
}

/// Split text into lines, keeping each line's terminator
///
/// A trailing line without a newline is kept as-is, so joining the result
/// reproduces the input byte for byte.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
    }
    text
}

/// Terminator to use for a line synthesized next to `line`
fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") { "\r\n" } else { "\n" }
}

fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Run a single forward scan over `lines` and insert a line before every
/// confirmed match.
///
/// The first and last lines are never candidates. Matching always looks at
/// the original input, so inserted lines never influence later windows.
pub fn patch_lines<S: AsRef<str>>(lines: &[S], rule: &PatchRule) -> PatchOutcome {
    let mut output = Vec::with_capacity(lines.len());
    let mut insertions = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let current = line.as_ref();

        if i > 0 && i + 1 < lines.len() {
            let previous = lines[i - 1].as_ref();
            let next = lines[i + 1].as_ref();

            if rule.matches_window(previous, current, next) {
                match rule.find_anchor(lines, i) {
                    Some(anchor_index) => {
                        let inserted = rule.insertion_for(current);
                        tracing::debug!(
                            line = i + 1,
                            anchor_line = anchor_index + 1,
                            "confirmed match, inserting argument"
                        );
                        insertions.push(Insertion {
                            line_index: i,
                            anchor_index,
                            text: strip_line_ending(&inserted).to_string(),
                        });
                        output.push(inserted);
                    }
                    None => {
                        tracing::debug!(
                            line = i + 1,
                            lookback = rule.lookback,
                            "pattern matched but no anchor found, skipping"
                        );
                    }
                }
            }
        }

        output.push(current.to_string());
    }

    PatchOutcome {
        lines: output,
        insertions,
    }
}
