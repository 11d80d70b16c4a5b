//! Match-highlight segmentation for result rows.
//!
//! Turns a display path plus the daemon's matched char positions into a flat
//! run list the renderer can style span-by-span. Pure computation, recomputed
//! per row on every draw.
//!
//! Offsets are char indices into the display path (the daemon matches against
//! the filename and rebases by the directory prefix length before emitting).
//! Offsets that land inside the directory prefix or past the end of the
//! string are dropped rather than reported out of bounds.

/// Which part of the path a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPart {
    Directory,
    FileName,
}

/// A maximal run of characters sharing one style classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSegment {
    pub text: String,
    pub highlighted: bool,
    pub part: PathPart,
}

impl HighlightSegment {
    fn new(text: impl Into<String>, highlighted: bool, part: PathPart) -> Self {
        Self {
            text: text.into(),
            highlighted,
            part,
        }
    }
}

/// Split `display_path` into renderable runs, highlighting `match_offsets`.
///
/// The concatenation of the returned texts always equals `display_path`, and
/// no two adjacent segments share both `highlighted` and `part`.
pub fn segment(display_path: &str, match_offsets: &[u32]) -> Vec<HighlightSegment> {
    let chars: Vec<char> = display_path.chars().collect();
    if chars.is_empty() {
        return vec![HighlightSegment::new("", false, PathPart::FileName)];
    }

    // Index just past the last separator; 0 when the path has no directory.
    let dir_end = chars
        .iter()
        .rposition(|&c| c == '/')
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut offsets: Vec<u32> = match_offsets.to_vec();
    offsets.sort_unstable();
    offsets.dedup();

    let filename = &chars[dir_end..];
    let mut segments = Vec::new();
    if dir_end > 0 {
        segments.push(HighlightSegment::new(
            collect(&chars[..dir_end]),
            false,
            PathPart::Directory,
        ));
    }

    // Rebase onto the filename, dropping anything outside it.
    let rebased: Vec<usize> = offsets
        .iter()
        .filter_map(|&o| (o as usize).checked_sub(dir_end))
        .filter(|&o| o < filename.len())
        .collect();

    let mut cursor = 0;
    for off in rebased {
        if off > cursor {
            segments.push(HighlightSegment::new(
                collect(&filename[cursor..off]),
                false,
                PathPart::FileName,
            ));
        }
        segments.push(HighlightSegment::new(
            collect(&filename[off..off + 1]),
            true,
            PathPart::FileName,
        ));
        cursor = off + 1;
    }
    if cursor < filename.len() {
        segments.push(HighlightSegment::new(
            collect(&filename[cursor..]),
            false,
            PathPart::FileName,
        ));
    }

    coalesce(segments)
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Merge adjacent segments sharing both classification fields.
fn coalesce(segments: Vec<HighlightSegment>) -> Vec<HighlightSegment> {
    let mut merged: Vec<HighlightSegment> = Vec::with_capacity(segments.len());
    for seg in segments {
        match merged.last_mut() {
            Some(last) if last.highlighted == seg.highlighted && last.part == seg.part => {
                last.text.push_str(&seg.text);
            }
            _ => merged.push(seg),
        }
    }
    merged
}
