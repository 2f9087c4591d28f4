//! Content parser: placeholder markers and protected literal regions
//!
//! A placeholder is an HTML-comment marker, `<!-- outlet: name -->` or
//! `<!-- slot: name -->` (keywords case-insensitive, whitespace inside the
//! delimiters tolerated). Markers inside protected literal regions — fenced
//! code blocks and indented code blocks — are never substituted.
//!
//! Region detection and placeholder detection happen in one
//! [`ParsedDocument::parse`] pass, so detection and substitution can never
//! disagree about whether a marker is protected.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern for `<!-- outlet: name -->` / `<!-- slot: name -->` markers
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*(?i:outlet|slot)\s*:\s*([A-Za-z0-9_-]+)\s*-->").unwrap());

/// A located placeholder occurrence: name plus its byte span in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

/// A span of text exempt from substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    fn contains(&self, start: usize, end: usize) -> bool {
        self.start <= start && end <= self.end
    }
}

/// One scan over a document: protected regions plus the unprotected
/// placeholders, ordered by start offset.
#[derive(Debug)]
pub struct ParsedDocument<'a> {
    text: &'a str,
    regions: Vec<Region>,
    placeholders: Vec<Placeholder>,
}

impl<'a> ParsedDocument<'a> {
    pub fn parse(text: &'a str) -> Self {
        let regions = scan_protected_regions(text);
        let placeholders = PLACEHOLDER_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(0).expect("match 0 always present");
                if regions.iter().any(|r| r.contains(m.start(), m.end())) {
                    return None;
                }
                Some(Placeholder {
                    name: caps[1].to_string(),
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();
        Self {
            text,
            regions,
            placeholders,
        }
    }

    /// True iff at least one unprotected placeholder exists.
    pub fn has_placeholders(&self) -> bool {
        !self.placeholders.is_empty()
    }

    /// Unprotected placeholders in left-to-right order. Duplicate names are
    /// all reported as separate occurrences.
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Replace every unprotected occurrence whose name has an entry in
    /// `replacements`; occurrences without an entry are left verbatim.
    ///
    /// Occurrences are applied in reverse offset order so earlier
    /// replacements cannot shift later spans; the result behaves as if all
    /// replacements happened simultaneously against the original offsets.
    pub fn substitute(&self, replacements: &HashMap<String, String>) -> String {
        let mut out = self.text.to_string();
        for ph in self.placeholders.iter().rev() {
            if let Some(value) = replacements.get(&ph.name) {
                out.replace_range(ph.start..ph.end, value);
            }
        }
        out
    }
}

/// Convenience wrapper for a one-off check.
pub fn has_placeholders(text: &str) -> bool {
    ParsedDocument::parse(text).has_placeholders()
}

/// Convenience wrapper returning owned placeholders.
pub fn find_placeholders(text: &str) -> Vec<Placeholder> {
    ParsedDocument::parse(text).placeholders.clone()
}

// ============================================================================
// PROTECTED REGION SCAN
// ============================================================================

fn scan_protected_regions(text: &str) -> Vec<Region> {
    let mut regions = Vec::new();
    // (delimiter char, opening run length, region start)
    let mut fence: Option<(char, usize, usize)> = None;
    // (region start, end of last indented line)
    let mut indented: Option<(usize, usize)> = None;

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some((ch, len, start)) = fence {
            // Inside a fence everything is opaque, including lines that look
            // like fences of the other delimiter. Only the same delimiter
            // character, repeated at least the opening count, closes it.
            if closes_fence(content, ch, len) {
                regions.push(Region { start, end: offset });
                fence = None;
            }
            continue;
        }

        if let Some((ch, len)) = opens_fence(content) {
            if let Some((start, end)) = indented.take() {
                regions.push(Region { start, end });
            }
            fence = Some((ch, len, line_start));
            continue;
        }

        let blank = content.trim().is_empty();
        if !blank && is_indented(content) {
            match &mut indented {
                Some((_, last)) => *last = offset,
                None => indented = Some((line_start, offset)),
            }
        } else if !blank {
            // A non-indented non-blank line terminates an indented run.
            if let Some((start, end)) = indented.take() {
                regions.push(Region { start, end });
            }
        }
        // Blank lines neither extend nor terminate an indented run.
    }

    // An unterminated fence extends to end of text.
    if let Some((_, _, start)) = fence {
        regions.push(Region {
            start,
            end: text.len(),
        });
    }
    if let Some((start, end)) = indented {
        regions.push(Region { start, end });
    }

    regions
}

/// Fence opener: up to three leading spaces, then 3+ backticks or tildes.
/// The info string after the run is ignored.
fn opens_fence(content: &str) -> Option<(char, usize)> {
    let stripped = strip_fence_indent(content)?;
    let ch = stripped.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let len = stripped.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some((ch, len))
}

/// Closer: same delimiter char, run at least as long as the opener, nothing
/// else on the line but whitespace.
fn closes_fence(content: &str, ch: char, len: usize) -> bool {
    let Some(stripped) = strip_fence_indent(content) else {
        return false;
    };
    let run = stripped.chars().take_while(|&c| c == ch).count();
    run >= len && stripped[run..].trim().is_empty()
}

/// Fences may be indented by at most three spaces; four means code block.
fn strip_fence_indent(content: &str) -> Option<&str> {
    let indent = content.len() - content.trim_start_matches(' ').len();
    (indent <= 3).then(|| &content[indent..])
}

fn is_indented(content: &str) -> bool {
    content.starts_with('\t') || content.starts_with("    ")
}
