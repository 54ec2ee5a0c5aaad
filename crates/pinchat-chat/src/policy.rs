//! Pure rules applied to an already-fetched page. None of these touch
//! storage.

use std::collections::HashSet;

use pinchat_types::api::{LikeSummary, ReplyPreview};
use pinchat_types::models::Message;

/// Likers shown by name before collapsing into "and N more".
pub const LIKES_SHOWN: usize = 5;

/// The one message on `page` that `username` may edit: their most recent
/// message on this page, and only if it is text. Older messages by the
/// same author on the page are never editable.
pub fn editable_message<'a>(page: &'a [Message], username: &str) -> Option<&'a Message> {
    page.iter()
        .rev()
        .find(|m| m.author == username)
        .filter(|m| m.kind.is_text())
}

/// At least one page, even when nothing matches.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub fn like_summary(likers: &HashSet<String>, shown: usize) -> LikeSummary {
    let mut names: Vec<String> = likers.iter().cloned().collect();
    names.sort();
    let more = names.len().saturating_sub(shown);
    names.truncate(shown);
    LikeSummary {
        count: likers.len(),
        shown: names,
        more,
    }
}

/// `target` is `None` when the reply points at a message that does not
/// exist (or that the viewer may not see).
pub fn reply_preview(target: Option<&Message>) -> ReplyPreview {
    match target {
        Some(m) => ReplyPreview::Known {
            author: m.author.clone(),
            kind: m.kind,
            excerpt: match (&m.content, m.kind.is_text()) {
                (Some(content), true) => content.clone(),
                _ => format!("[{} message]", capitalize(m.kind.as_str())),
            },
        },
        None => ReplyPreview::Unknown,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pinchat_types::models::{AttachmentRef, MessageKind};
    use uuid::Uuid;

    fn msg(author: &str, kind: MessageKind, content: &str) -> Message {
        let text = kind.is_text();
        Message {
            id: Uuid::new_v4(),
            author: author.into(),
            recipient: None,
            created_at: Utc::now(),
            kind,
            content: text.then(|| content.to_string()),
            attachment: (!text).then(|| AttachmentRef {
                key: "k".into(),
                file_name: "f".into(),
            }),
            reply_to: None,
        }
    }

    #[test]
    fn only_latest_own_message_is_editable() {
        let page = vec![
            msg("alice", MessageKind::Text, "a1"),
            msg("alice", MessageKind::Text, "a2"),
            msg("bob", MessageKind::Text, "b1"),
        ];
        let editable = editable_message(&page, "alice").unwrap();
        assert_eq!(editable.content.as_deref(), Some("a2"));
        assert_eq!(
            editable_message(&page, "bob").unwrap().content.as_deref(),
            Some("b1")
        );
        assert!(editable_message(&page, "carol").is_none());
    }

    #[test]
    fn latest_own_attachment_blocks_editing() {
        let page = vec![
            msg("alice", MessageKind::Text, "a1"),
            msg("alice", MessageKind::Image, ""),
        ];
        assert!(editable_message(&page, "alice").is_none());
    }

    #[test]
    fn page_math() {
        assert_eq!(total_pages(0, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn like_summary_is_sorted_and_truncated() {
        let likers: HashSet<String> = ["g", "b", "f", "a", "e", "d", "c"]
            .into_iter()
            .map(String::from)
            .collect();
        let summary = like_summary(&likers, LIKES_SHOWN);
        assert_eq!(summary.count, 7);
        assert_eq!(summary.shown, ["a", "b", "c", "d", "e"]);
        assert_eq!(summary.more, 2);
        assert_eq!(like_summary(&HashSet::new(), LIKES_SHOWN), LikeSummary::default());
    }

    #[test]
    fn previews() {
        let text = msg("alice", MessageKind::Text, "hello");
        assert_eq!(
            reply_preview(Some(&text)),
            ReplyPreview::Known {
                author: "alice".into(),
                kind: MessageKind::Text,
                excerpt: "hello".into()
            }
        );
        let voice = msg("bob", MessageKind::Voice, "");
        assert!(matches!(
            reply_preview(Some(&voice)),
            ReplyPreview::Known { excerpt, .. } if excerpt == "[Voice message]"
        ));
        assert_eq!(reply_preview(None), ReplyPreview::Unknown);
    }
}
