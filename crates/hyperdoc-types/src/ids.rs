//! Hypermedia identifiers.
//!
//! An identifier names an account, a document under it, optionally a version,
//! and optionally one block (or a sub-range of one block) inside that document.
//! Two string forms exist:
//!
//! ```text
//! hm://<uid>/<path...>?v=<version>&l#<blockRef>[<start>:<end>]
//! https://<host>/hm/<uid>/<path...>?v=<version>#<blockRef>+
//! ```
//!
//! The native form has no scheme/hostname recorded in [`HmId`]; the gateway
//! form records both. Parsing untrusted input returns `None` instead of an
//! error: malformed links inside documents are routine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of the native string form.
pub const HM_URL_PREFIX: &str = "hm://";

/// Minimum length (in characters) of a block reference token.
pub const MIN_BLOCK_REF_LEN: usize = 8;

/// Characters that would make a block reference ambiguous in URL form.
const BLOCK_REF_RESERVED: &[char] = &['+', '[', ']', '#', '?', '&', '/'];

/// Which part of a referenced block an identifier covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockRange {
    /// `+`: the block and all of its descendants.
    Expanded,
    /// `[start:end]`: a code-point range of the block's text.
    Exact { start: u32, end: u32 },
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockRange::Expanded => write!(f, "+"),
            BlockRange::Exact { start, end } => write!(f, "[{start}:{end}]"),
        }
    }
}

/// A parsed `#blockRef[range]` fragment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFragment {
    pub block_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<BlockRange>,
}

impl BlockFragment {
    pub fn new(block_id: impl Into<String>, range: Option<BlockRange>) -> Self {
        Self {
            block_id: block_id.into(),
            range,
        }
    }
}

impl fmt::Display for BlockFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_fragment(&self.block_id, self.range))
    }
}

/// Check that `token` can stand as a block reference.
pub fn is_block_ref(token: &str) -> bool {
    token.chars().count() >= MIN_BLOCK_REF_LEN
        && !token
            .chars()
            .any(|c| c.is_whitespace() || BLOCK_REF_RESERVED.contains(&c))
}

/// Parse a fragment (with or without the leading `#`).
///
/// Accepts `<token>`, `<token>+` and `<token>[start:end]`; anything else is
/// `None`.
pub fn parse_fragment(input: &str) -> Option<BlockFragment> {
    let input = input.strip_prefix('#').unwrap_or(input);
    let (token, range) = if let Some(token) = input.strip_suffix('+') {
        (token, Some(BlockRange::Expanded))
    } else if let Some(body) = input.strip_suffix(']') {
        let (token, span) = body.rsplit_once('[')?;
        let (start, end) = span.split_once(':')?;
        let start = parse_offset(start)?;
        let end = parse_offset(end)?;
        if start > end {
            return None;
        }
        (token, Some(BlockRange::Exact { start, end }))
    } else {
        (input, None)
    };

    is_block_ref(token).then(|| BlockFragment::new(token, range))
}

/// Render `blockRef` plus an optional range, without the leading `#`.
pub fn serialize_fragment(block_ref: &str, range: Option<BlockRange>) -> String {
    match range {
        Some(range) => format!("{block_ref}{range}"),
        None => block_ref.to_string(),
    }
}

fn parse_offset(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// A structured hypermedia identifier.
///
/// Valid identifiers satisfy `HmId::parse(&id.to_url()) == Some(id)`:
/// - `path` has no empty segments (constructors filter them)
/// - a non-`None` `version` is non-empty
/// - `block_range` is only set together with `block_ref`
/// - `scheme` and `hostname` are either both set (gateway form) or both `None`
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmId {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_range: Option<BlockRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub latest: bool,
}

impl HmId {
    /// Identifier of an account's root document.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    pub fn with_path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path = segments
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        self
    }

    /// Set the version. An empty string clears it.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into()).filter(|v| !v.is_empty());
        self
    }

    pub fn with_block(mut self, block_ref: impl Into<String>, range: Option<BlockRange>) -> Self {
        self.block_ref = Some(block_ref.into());
        self.block_range = range;
        self
    }

    pub fn with_latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    /// Address this identifier through a web gateway.
    pub fn on_gateway(mut self, scheme: impl Into<String>, hostname: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self.hostname = Some(hostname.into());
        self
    }

    /// Parse either string form. Returns `None` for anything malformed.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (rest, fragment) = match input.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (input, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };

        let (scheme, hostname, mut segments) = if let Some(body) = rest.strip_prefix(HM_URL_PREFIX) {
            (None, None, split_segments(body))
        } else {
            let (scheme, body) = rest.split_once("://")?;
            if scheme != "https" && scheme != "http" {
                return None;
            }
            let (host, body) = body.split_once('/')?;
            if host.is_empty() {
                return None;
            }
            let body = body.strip_prefix("hm/").or_else(|| (body == "hm").then_some(""))?;
            (
                Some(scheme.to_string()),
                Some(host.to_string()),
                split_segments(body),
            )
        };

        if segments.is_empty() {
            return None;
        }
        let uid = segments.remove(0);
        if uid.chars().any(char::is_whitespace) {
            return None;
        }

        let mut id = HmId {
            uid,
            path: segments,
            scheme,
            hostname,
            ..HmId::default()
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if let Some(version) = pair.strip_prefix("v=") {
                id.version = Some(version.to_string()).filter(|v| !v.is_empty());
            } else if pair == "l" || pair.starts_with("l=") {
                id.latest = true;
            }
        }

        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            let fragment = parse_fragment(fragment)?;
            id.block_ref = Some(fragment.block_id);
            id.block_range = fragment.range;
        }

        Some(id)
    }

    /// Serialize to the native form, or to the gateway form when a hostname
    /// is recorded.
    pub fn to_url(&self) -> String {
        let mut out = match &self.hostname {
            Some(host) => format!(
                "{}://{}/hm/{}",
                self.scheme.as_deref().unwrap_or("https"),
                host,
                self.uid
            ),
            None => format!("{HM_URL_PREFIX}{}", self.uid),
        };
        self.push_path(&mut out);
        self.push_query_and_fragment(&mut out);
        out
    }

    /// Gateway URL for this identifier at `gateway` (e.g. `https://hyper.media`).
    pub fn to_web_url(&self, gateway: &str) -> String {
        let mut out = format!("{}/hm/{}", gateway.trim_end_matches('/'), self.uid);
        self.push_path(&mut out);
        self.push_query_and_fragment(&mut out);
        out
    }

    /// `hm://uid/path` with no version, flags or fragment. Used as the
    /// identity key of a resource across versions.
    pub fn base_id(&self) -> String {
        let mut out = format!("{HM_URL_PREFIX}{}", self.uid);
        self.push_path(&mut out);
        out
    }

    /// Path in the `"/a/b"` form used by comments and the storage layer.
    /// The root document is `""`.
    pub fn entity_query_path(&self) -> String {
        self.path.iter().map(|s| format!("/{s}")).collect()
    }

    /// Inverse of [`HmId::entity_query_path`].
    pub fn from_entity_query_path(uid: impl Into<String>, path: &str) -> Self {
        HmId::new(uid).with_path(path.split('/'))
    }

    /// The block fragment, if any.
    pub fn fragment(&self) -> Option<BlockFragment> {
        self.block_ref
            .as_ref()
            .map(|block_ref| BlockFragment::new(block_ref.clone(), self.block_range))
    }

    /// `true` for an account's root document (no path).
    pub fn is_account(&self) -> bool {
        self.path.is_empty()
    }

    /// The same document without version, fragment or flags.
    pub fn latest_base(&self) -> Self {
        HmId::new(self.uid.clone()).with_path(self.path.iter().cloned())
    }

    /// Parent document: one path segment up. `None` for an account root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent_path) = self.path.split_last()?;
        Some(HmId::new(self.uid.clone()).with_path(parent_path.iter().cloned()))
    }

    /// Same account and same path, ignoring version and fragment.
    pub fn path_matches(&self, other: &HmId) -> bool {
        self.uid == other.uid && self.path == other.path
    }

    /// `true` when `other` is this document or lives beneath it.
    pub fn is_parent_of_or_equal(&self, other: &HmId) -> bool {
        self.uid == other.uid && other.path.starts_with(&self.path)
    }

    fn push_path(&self, out: &mut String) {
        for segment in &self.path {
            out.push('/');
            out.push_str(segment);
        }
    }

    fn push_query_and_fragment(&self, out: &mut String) {
        let mut query = Vec::new();
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            query.push(format!("v={version}"));
        }
        if self.latest {
            query.push("l".to_string());
        }
        if !query.is_empty() {
            out.push('?');
            out.push_str(&query.join("&"));
        }
        if let Some(block_ref) = self.block_ref.as_deref().filter(|b| !b.is_empty()) {
            out.push('#');
            out.push_str(&serialize_fragment(block_ref, self.block_range));
        }
    }
}

fn split_segments(body: &str) -> Vec<String> {
    body.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl fmt::Display for HmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

impl fmt::Debug for HmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HmId({})", self.to_url())
    }
}

impl std::str::FromStr for HmId {
    type Err = InvalidHmId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HmId::parse(s).ok_or_else(|| InvalidHmId(s.to_string()))
    }
}

/// A string that does not parse as a hypermedia identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a hypermedia identifier: {0:?}")]
pub struct InvalidHmId(pub String);
