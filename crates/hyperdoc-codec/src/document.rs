//! Lossy document parsing.
//!
//! Viewers must show whatever valid content a document has, so this parser
//! keeps every block node that deserializes and validates, drops the rest
//! (with a warning), and falls back to default metadata when the metadata
//! object is malformed. Only a missing account is fatal.

use serde_json::{Map, Value};

use hyperdoc_types::{Block, BlockNode, Document, DocumentMetadata, time::normalize_millis};

use crate::MAX_TREE_DEPTH;
use crate::error::DocumentError;

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_node(value: &Value, depth: usize) -> Option<BlockNode> {
    let block = match value.get("block").map(|b| serde_json::from_value::<Block>(b.clone())) {
        Some(Ok(block)) => block,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "dropping unparseable block");
            return None;
        }
        None => {
            tracing::warn!("dropping block node without a block");
            return None;
        }
    };
    if let Err(e) = block.validate() {
        tracing::warn!(block_id = block.id(), error = %e, "dropping invalid block");
        return None;
    }

    let children = match value.get("children").and_then(Value::as_array) {
        Some(_) if depth + 1 >= MAX_TREE_DEPTH => {
            tracing::warn!(block_id = block.id(), "block tree too deep, dropping children");
            Vec::new()
        }
        Some(children) => parse_nodes(children, depth + 1),
        None => Vec::new(),
    };
    Some(BlockNode::new(block).with_children(children))
}

fn parse_nodes(values: &[Value], depth: usize) -> Vec<BlockNode> {
    values.iter().filter_map(|v| parse_node(v, depth)).collect()
}

/// Parse a document record, keeping every valid part.
pub fn parse_document_lossy(value: &Value) -> Result<Document, DocumentError> {
    let obj = value.as_object().ok_or(DocumentError::NotAnObject)?;
    let account = string_field(obj, "account")
        .filter(|a| !a.is_empty())
        .ok_or(DocumentError::MissingAccount)?;

    let metadata = match obj.get("metadata") {
        None | Some(Value::Null) => DocumentMetadata::default(),
        Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
            tracing::warn!(account = %account, error = %e, "invalid document metadata, using defaults");
            DocumentMetadata::default()
        }),
    };

    let authors = obj
        .get("authors")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let content = obj
        .get("content")
        .and_then(Value::as_array)
        .map(|nodes| parse_nodes(nodes, 0))
        .unwrap_or_default();

    let time = |key: &str| obj.get(key).and_then(normalize_millis).unwrap_or(0);

    Ok(Document {
        path: string_field(obj, "path").unwrap_or_default(),
        version: string_field(obj, "version").unwrap_or_default(),
        genesis: string_field(obj, "genesis"),
        create_time: time("createTime"),
        update_time: time("updateTime"),
        account,
        authors,
        metadata,
        content,
    })
}

/// Convenience entry point mirroring [`Document`]'s strict `Deserialize`.
pub trait DocumentExt: Sized {
    fn from_json_lossy(value: &Value) -> Result<Self, DocumentError>;
}

impl DocumentExt for Document {
    fn from_json_lossy(value: &Value) -> Result<Self, DocumentError> {
        parse_document_lossy(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keeps_valid_blocks_and_drops_invalid() {
        let raw = json!({
            "account": "z6Mkowner",
            "path": "/notes",
            "version": "bafyv1",
            "authors": ["z6Mkowner", 42, "z6Mkother"],
            "metadata": {"name": "Notes"},
            "createTime": {"seconds": 10, "nanos": 0},
            "updateTime": 20_000,
            "content": [
                {"block": {"type": "Paragraph", "id": "p0000001", "text": "hello"},
                 "children": [
                    {"block": {"type": "Mystery", "id": "x0000001"}},
                    {"block": {"type": "Paragraph", "id": "p0000002", "text": "kept"}}
                 ]},
                {"block": {"type": "Embed", "id": "e0000001", "link": "not a link"}},
                {"children": []},
                {"block": {"type": "Heading", "id": "h0000001", "text": "end"}}
            ]
        });
        let doc = Document::from_json_lossy(&raw).unwrap();
        assert_eq!(doc.account, "z6Mkowner");
        assert_eq!(doc.authors, vec!["z6Mkowner", "z6Mkother"]);
        assert_eq!(doc.name(), Some("Notes"));
        assert_eq!(doc.create_time, 10_000);
        assert_eq!(doc.update_time, 20_000);

        let ids: Vec<&str> = doc.content.iter().map(|n| n.block.id()).collect();
        assert_eq!(ids, vec!["p0000001", "h0000001"]);
        assert_eq!(doc.content[0].children.len(), 1);
        assert_eq!(doc.content[0].children[0].block.id(), "p0000002");
    }

    #[test]
    fn test_bad_metadata_falls_back_to_default() {
        let raw = json!({"account": "z6Mkowner", "metadata": {"name": 7}});
        let doc = parse_document_lossy(&raw).unwrap();
        assert_eq!(doc.metadata, DocumentMetadata::default());
        assert!(doc.content.is_empty());
    }

    #[test]
    fn test_account_is_required() {
        assert!(matches!(
            parse_document_lossy(&json!({"path": "/x"})),
            Err(DocumentError::MissingAccount)
        ));
        assert!(matches!(
            parse_document_lossy(&json!([1, 2])),
            Err(DocumentError::NotAnObject)
        ));
    }
}
