//! Subcommand implementations. Each returns the JSON it prints.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use hyperdoc_activity::{Mention, summarize_interactions};
use hyperdoc_codec::{EditorBlock, decode_block_nodes, encode_editor_blocks};
use hyperdoc_comment::{CommentBuilder, DAG_CBOR_CODEC, Ed25519Signer, blob_cid, prepare_comment};
use hyperdoc_types::{BlockNode, HmId};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn parse_id(url: &str) -> Result<HmId> {
    HmId::parse(url).ok_or_else(|| anyhow!("not a hypermedia id: {url:?}"))
}

pub fn id(url: &str, gateway: &str) -> Result<Value> {
    let id = parse_id(url)?;
    Ok(json!({
        "id": id,
        "base": id.base_id(),
        "native": id.to_url(),
        "gateway": id.to_web_url(gateway),
    }))
}

/// Editor blocks to canonical block nodes.
pub fn encode(path: &Path) -> Result<Value> {
    let blocks: Vec<EditorBlock> = read_json(path)?;
    let nodes = encode_editor_blocks(&blocks).context("encoding editor blocks")?;
    Ok(serde_json::to_value(nodes)?)
}

/// Canonical block nodes to editor blocks.
pub fn decode(path: &Path) -> Result<Value> {
    let nodes: Vec<BlockNode> = read_json(path)?;
    Ok(serde_json::to_value(decode_block_nodes(&nodes))?)
}

pub struct CommentArgs<'a> {
    pub target: &'a str,
    pub version: &'a str,
    pub seed_hex: &'a str,
    pub content: &'a Path,
    pub reply_parent: Option<&'a str>,
    pub thread_root: Option<&'a str>,
    pub quote_block: Option<&'a str>,
    pub timestamp: Option<u64>,
}

/// Build and sign a comment from editor blocks.
pub async fn comment(args: CommentArgs<'_>) -> Result<Value> {
    let target = parse_id(args.target)?;
    let signer = Ed25519Signer::from_seed_hex(args.seed_hex.trim())?;
    let blocks: Vec<EditorBlock> = read_json(args.content)?;
    let nodes = encode_editor_blocks(&blocks).context("encoding comment body")?;

    let mut builder = CommentBuilder::new(target, args.version).content(nodes);
    if let Some(cid) = args.reply_parent {
        builder = builder.reply_parent(cid);
    }
    // A reply without an explicit root starts from its parent.
    if let Some(cid) = args.thread_root.or(args.reply_parent) {
        builder = builder.thread_root(cid);
    }
    if let Some(block_id) = args.quote_block {
        builder = builder.quoting_block(block_id);
    }
    if let Some(ts) = args.timestamp {
        builder = builder.timestamp(ts);
    }

    let payload = prepare_comment(&builder, &signer, Vec::new()).await?;
    let cid = blob_cid(DAG_CBOR_CODEC, &payload.comment)?;
    tracing::debug!(%cid, bytes = payload.comment.len(), "signed comment");
    Ok(json!({
        "author": signer.account_uid(),
        "cid": cid.to_string(),
        "comment": hex::encode(&payload.comment),
    }))
}

/// Interaction summary of `target` from a JSON array of mention records.
pub fn summarize(target: &str, mentions: &Path) -> Result<Value> {
    let target = parse_id(target)?;
    let mentions: Vec<Mention> = read_json(mentions)?;
    let summary = summarize_interactions(&mentions, &[], &[], &target);
    Ok(serde_json::to_value(summary)?)
}
