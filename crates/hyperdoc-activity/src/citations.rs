//! Citations and per-document interaction summaries.
//!
//! A citation is a mention record unpacked into identifiers. Repeated
//! mentions from one source collapse into its most recent citation before
//! anything is counted.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;
use tracing::debug;

use hyperdoc_types::{BlockFragment, Comment, HmId, parse_fragment};

use crate::store::{Change, Mention};

/// What kind of resource cites the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CitationSourceKind {
    Document,
    Comment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationSource {
    pub id: HmId,
    pub kind: CitationSourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Unix ms of the citing blob; 0 when unknown.
    pub time: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub source: CitationSource,
    pub target_id: HmId,
    pub target_fragment: Option<BlockFragment>,
    pub is_exact_version: bool,
}

impl Citation {
    /// Unpack a mention of `target`. `None` when the source is not a
    /// valid hypermedia id.
    pub fn from_mention(mention: &Mention, target: &HmId) -> Option<Self> {
        let Some(mut source_id) = HmId::parse(&mention.source) else {
            debug!(source = %mention.source, "dropping mention with unparseable source");
            return None;
        };
        let kind = if mention.source_type.to_ascii_lowercase().starts_with("comment") {
            CitationSourceKind::Comment
        } else {
            CitationSourceKind::Document
        };
        let blob = mention.source_blob.as_ref();
        // A document citation points at the version that contains the link.
        if kind == CitationSourceKind::Document
            && let Some(blob) = blob
            && !blob.cid.is_empty()
        {
            source_id = source_id.with_version(blob.cid.clone());
        }

        let mut target_id = HmId::parse(&mention.target).unwrap_or_else(|| target.latest_base());
        if let Some(version) = &mention.target_version {
            target_id = target_id.with_version(version.clone());
        }

        Some(Self {
            source: CitationSource {
                id: source_id,
                kind,
                author: blob.map(|b| b.author.clone()).filter(|a| !a.is_empty()),
                time: blob.map(|b| b.create_time).unwrap_or(0),
            },
            target_id,
            target_fragment: mention.target_fragment.as_deref().and_then(parse_fragment),
            is_exact_version: mention.is_exact_version,
        })
    }

    /// Identity of the citing resource across versions.
    pub fn dedupe_key(&self) -> String {
        self.source.id.base_id()
    }

    pub fn block_id(&self) -> Option<&str> {
        self.target_fragment.as_ref().map(|f| f.block_id.as_str())
    }
}

/// Keep one citation per source: the one with the latest `time`. On equal
/// times the first one seen wins. Output follows first-seen key order.
pub fn dedupe_citations(citations: impl IntoIterator<Item = Citation>) -> Vec<Citation> {
    let mut latest: IndexMap<String, Citation> = IndexMap::new();
    for citation in citations {
        match latest.entry(citation.dedupe_key()) {
            Entry::Occupied(mut slot) => {
                if citation.source.time > slot.get().source.time {
                    slot.insert(citation);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(citation);
            }
        }
    }
    latest.into_values().collect()
}

/// Per-block interaction counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlockCounts {
    pub citations: usize,
    pub comments: usize,
}

/// Counts per target block, for citations that carry a block fragment.
pub fn blocks_from_citations<'a>(
    citations: impl IntoIterator<Item = &'a Citation>,
) -> BTreeMap<String, BlockCounts> {
    let mut blocks: BTreeMap<String, BlockCounts> = BTreeMap::new();
    for citation in citations {
        let Some(block_id) = citation.block_id() else {
            continue;
        };
        let counts = blocks.entry(block_id.to_string()).or_default();
        match citation.source.kind {
            CitationSourceKind::Document => counts.citations += 1,
            CitationSourceKind::Comment => counts.comments += 1,
        }
    }
    blocks
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InteractionSummary {
    /// Distinct documents citing the target.
    pub citations: usize,
    /// Distinct comments on or citing the target.
    pub comments: usize,
    pub changes: usize,
    pub blocks: BTreeMap<String, BlockCounts>,
}

/// Fold mentions, direct comments and changes of `target` into counters.
pub fn summarize_interactions(
    mentions: &[Mention],
    comments: &[Comment],
    changes: &[Change],
    target: &HmId,
) -> InteractionSummary {
    let citations = dedupe_citations(
        mentions
            .iter()
            .filter_map(|m| Citation::from_mention(m, target)),
    );

    let mut summary = InteractionSummary {
        changes: changes.len(),
        blocks: blocks_from_citations(&citations),
        ..Default::default()
    };

    let mut counted_comments: HashSet<String> = HashSet::new();
    for citation in &citations {
        match citation.source.kind {
            CitationSourceKind::Document => summary.citations += 1,
            CitationSourceKind::Comment => {
                summary.comments += 1;
                counted_comments.insert(citation.dedupe_key());
            }
        }
    }

    for comment in comments {
        if counted_comments.insert(format!("hm://{}", comment.id)) {
            summary.comments += 1;
        }
    }

    summary
}
