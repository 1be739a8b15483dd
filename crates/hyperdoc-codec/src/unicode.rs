//! Code-point offsets and annotation accumulation.
//!
//! Annotation offsets count Unicode code points. Rust strings iterate code
//! points directly; editors that hand over UTF-16 buffers go through the
//! `*_utf16` helpers, which count a surrogate pair as one position.

use std::collections::BTreeMap;

use hyperdoc_types::{Annotation, AnnotationKind, Spans};

/// Number of code points in `text`.
pub fn code_point_length(text: &str) -> u32 {
    text.chars().count() as u32
}

pub fn is_lead_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

pub fn is_trail_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Number of code points in a UTF-16 buffer. A lead surrogate followed by a
/// trail surrogate is one code point; a lone surrogate counts as one.
pub fn code_point_length_utf16(units: &[u16]) -> u32 {
    utf16_to_code_point_offset(units, units.len())
}

/// Convert a UTF-16 code-unit offset to a code-point offset. An offset that
/// splits a surrogate pair counts the pair as already consumed.
pub fn utf16_to_code_point_offset(units: &[u16], unit_offset: usize) -> u32 {
    let end = unit_offset.min(units.len());
    let mut count = 0;
    let mut i = 0;
    while i < end {
        let pair = is_lead_surrogate(units[i])
            && units.get(i + 1).is_some_and(|&u| is_trail_surrogate(u));
        i += if pair { 2 } else { 1 };
        count += 1;
    }
    count
}

/// Convert a code-point offset in `text` to a UTF-16 code-unit offset.
pub fn code_point_to_utf16_offset(text: &str, offset: u32) -> usize {
    text.chars()
        .take(offset as usize)
        .map(char::len_utf16)
        .sum()
}

/// Byte index of code point `offset` in `text`, clamped to the end.
pub fn byte_index(text: &str, offset: u32) -> usize {
    text.char_indices()
        .nth(offset as usize)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Builds annotation lists from spans, normally added in text order.
///
/// Spans are keyed by `(kind, link)`. A span that starts where the previous
/// span of the same key ended extends it, so touching runs never produce two
/// spans. A span added out of order is inserted by start and merged with
/// its neighbours.
#[derive(Debug, Default)]
pub struct AnnotationAccumulator {
    entries: BTreeMap<(AnnotationKind, Option<String>), Spans>,
}

impl AnnotationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `[start, end)` for the given key. Empty spans are ignored and
    /// style kinds ignore `link`.
    pub fn add_span(&mut self, kind: AnnotationKind, link: Option<&str>, start: u32, end: u32) {
        if start >= end {
            return;
        }
        let link = if kind.carries_link() {
            Some(link.unwrap_or_default().to_string())
        } else {
            None
        };
        let spans = self.entries.entry((kind, link)).or_default();
        let last = spans.starts.last().copied().zip(spans.ends.last().copied());
        match last {
            Some((last_start, _)) if last_start > start => insert_merged(spans, start, end),
            Some((_, last_end)) if last_end >= start => {
                if let Some(e) = spans.ends.last_mut() {
                    *e = last_end.max(end);
                }
            }
            _ => {
                spans.starts.push(start);
                spans.ends.push(end);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Annotations ordered by first start offset; equal starts keep key
    /// order.
    pub fn emit(self) -> Vec<Annotation> {
        let mut annotations: Vec<Annotation> = self
            .entries
            .into_iter()
            .map(|((kind, link), spans)| Annotation::new(kind, link, spans))
            .collect();
        annotations.sort_by_key(|a| a.spans().starts.first().copied().unwrap_or(0));
        annotations
    }
}

/// Slow path for a span that starts before the last one: insert in start
/// order, then coalesce touching or overlapping neighbours.
fn insert_merged(spans: &mut Spans, start: u32, end: u32) {
    let at = spans.starts.partition_point(|&s| s <= start);
    spans.starts.insert(at, start);
    spans.ends.insert(at, end);

    let mut starts = Vec::with_capacity(spans.starts.len());
    let mut ends: Vec<u32> = Vec::with_capacity(spans.ends.len());
    for (&s, &e) in spans.starts.iter().zip(spans.ends.iter()) {
        match ends.last_mut() {
            Some(last_end) if *last_end >= s => *last_end = (*last_end).max(e),
            _ => {
                starts.push(s);
                ends.push(e);
            }
        }
    }
    spans.starts = starts;
    spans.ends = ends;
}
