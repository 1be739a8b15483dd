//! Embed expansion.
//!
//! Documents embed other documents (or single blocks of them), and can embed
//! themselves. Expansion follows Embed blocks through a [`DocumentSource`]
//! while tracking the chain of targets being expanded; a target already on
//! the chain becomes [`Expansion::Circular`] instead of recursing.

use hyperdoc_types::{Block, BlockNode, BlockRange, HmId};

use crate::tree::find_block;

/// Synchronous lookup of document content for expansion.
pub trait DocumentSource {
    fn load(&self, id: &HmId) -> Option<Vec<BlockNode>>;
}

impl<F> DocumentSource for F
where
    F: Fn(&HmId) -> Option<Vec<BlockNode>>,
{
    fn load(&self, id: &HmId) -> Option<Vec<BlockNode>> {
        self(id)
    }
}

/// What an Embed block expanded to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expansion {
    Content(Vec<ExpandedNode>),
    /// The target is already being expanded further up the chain.
    Circular(HmId),
    /// The source has no such document or block.
    Missing(HmId),
    /// The chain of embeds got longer than the allowed depth.
    TooDeep(HmId),
}

/// A block node whose Embed blocks carry their expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandedNode {
    pub block: Block,
    pub embedded: Option<Expansion>,
    pub children: Vec<ExpandedNode>,
}

/// Identity of an embed target on the expansion chain.
fn chain_key(id: &HmId) -> String {
    match &id.block_ref {
        Some(block_ref) => format!("{}#{block_ref}", id.base_id()),
        None => id.base_id(),
    }
}

struct Expander<'s> {
    source: &'s dyn DocumentSource,
    max_depth: usize,
    chain: Vec<String>,
}

impl Expander<'_> {
    fn nodes(&mut self, nodes: &[BlockNode], depth: usize) -> Vec<ExpandedNode> {
        nodes.iter().map(|node| self.node(node, depth)).collect()
    }

    fn node(&mut self, node: &BlockNode, depth: usize) -> ExpandedNode {
        let embedded = match &node.block {
            Block::Embed(embed) => HmId::parse(&embed.link).map(|target| self.expand(target, depth)),
            _ => None,
        };
        let children = if depth < self.max_depth {
            self.nodes(&node.children, depth + 1)
        } else {
            Vec::new()
        };
        ExpandedNode {
            block: node.block.clone(),
            embedded,
            children,
        }
    }

    fn expand(&mut self, target: HmId, depth: usize) -> Expansion {
        let key = chain_key(&target);
        if self.chain.contains(&key) {
            tracing::debug!(target = %target, "circular embed");
            return Expansion::Circular(target);
        }
        if depth >= self.max_depth {
            tracing::warn!(target = %target, max_depth = self.max_depth, "embed expansion too deep");
            return Expansion::TooDeep(target);
        }
        let Some(content) = self.source.load(&target) else {
            return Expansion::Missing(target);
        };
        let selected = match &target.block_ref {
            None => content,
            Some(block_ref) => match find_block(&content, block_ref) {
                Some(found) if target.block_range == Some(BlockRange::Expanded) => vec![found.clone()],
                Some(found) => vec![BlockNode::new(found.block.clone())],
                None => return Expansion::Missing(target),
            },
        };

        self.chain.push(key);
        let expanded = self.nodes(&selected, depth + 1);
        self.chain.pop();
        Expansion::Content(expanded)
    }
}

/// Expand every Embed block in `content`, which belongs to `root`.
///
/// Embedding `root` itself (directly or through other documents) yields
/// [`Expansion::Circular`].
pub fn expand_embeds(
    root: &HmId,
    content: &[BlockNode],
    source: &dyn DocumentSource,
    max_depth: usize,
) -> Vec<ExpandedNode> {
    let mut expander = Expander {
        source,
        max_depth,
        chain: vec![chain_key(&root.latest_base())],
    };
    expander.nodes(content, 0)
}
