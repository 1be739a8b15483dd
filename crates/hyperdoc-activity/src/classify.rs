//! Notification classification and inbox merging.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use hyperdoc_codec::mentioned_accounts;

use crate::resolver::{ResolvedEvent, ResolvedEventKind};

/// Why an event is in an account's inbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotificationReason {
    /// The account is embedded in a comment or cited by a document.
    Mention,
    /// Someone replied to the account's comment.
    Reply,
    /// A new thread on a document the account owns or edits.
    Discussion,
}

impl NotificationReason {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationReason::Mention => "mention",
            NotificationReason::Reply => "reply",
            NotificationReason::Discussion => "discussion",
        }
    }
}

impl std::fmt::Display for NotificationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification reason of `event` for `account`, or `None`.
///
/// Precedence: own events never notify, then reply, then discussion, then
/// mention.
pub fn classify_for_account(event: &ResolvedEvent, account: &str) -> Option<NotificationReason> {
    if event.kind.author_uid() == Some(account) {
        return None;
    }
    match &event.kind {
        ResolvedEventKind::Comment(c) => {
            if c.reply_parent_author.as_deref() == Some(account) {
                return Some(NotificationReason::Reply);
            }
            if c.comment.is_top_level() {
                let involved = match c.target_document.as_deref() {
                    Some(doc) => doc.is_authored_by(account),
                    None => c.target_id.uid == account,
                };
                if involved {
                    return Some(NotificationReason::Discussion);
                }
            }
            mentioned_accounts(&c.comment.content)
                .contains(account)
                .then_some(NotificationReason::Mention)
        }
        // Only a citation of the account itself is a mention; links to
        // its documents are backlinks.
        ResolvedEventKind::Citation(c) => {
            let target = &c.citation.target_id;
            (target.uid == account && target.is_account()).then_some(NotificationReason::Mention)
        }
        ResolvedEventKind::RefUpdate(_)
        | ResolvedEventKind::Capability(_)
        | ResolvedEventKind::Contact(_) => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NotificationItem {
    pub reason: NotificationReason,
    pub event: ResolvedEvent,
}

impl NotificationItem {
    pub fn feed_event_id(&self) -> &str {
        &self.event.feed_event_id
    }

    pub fn event_at_ms(&self) -> u64 {
        self.event.event_at_ms
    }
}

/// The notification-worthy subset of `events` for `account`.
pub fn notifications_for_account(events: &[ResolvedEvent], account: &str) -> Vec<NotificationItem> {
    events
        .iter()
        .filter_map(|event| {
            classify_for_account(event, account).map(|reason| NotificationItem {
                reason,
                event: event.clone(),
            })
        })
        .collect()
}

/// Merge `incoming` into `current` by feed event id. An incoming item
/// replaces a stored one unless it is older. The result is newest first,
/// id descending on equal times, at most `cap` long.
pub fn merge_notifications(
    current: Vec<NotificationItem>,
    incoming: Vec<NotificationItem>,
    cap: usize,
) -> Vec<NotificationItem> {
    let mut by_id: HashMap<String, NotificationItem> = current
        .into_iter()
        .map(|item| (item.feed_event_id().to_string(), item))
        .collect();

    for item in incoming {
        let replace = by_id
            .get(item.feed_event_id())
            .is_none_or(|existing| item.event_at_ms() >= existing.event_at_ms());
        if replace {
            by_id.insert(item.feed_event_id().to_string(), item);
        }
    }

    let mut merged: Vec<NotificationItem> = by_id.into_values().collect();
    merged.sort_by(|a, b| {
        b.event_at_ms()
            .cmp(&a.event_at_ms())
            .then_with(|| b.feed_event_id().cmp(a.feed_event_id()))
    });
    merged.truncate(cap);
    merged
}
