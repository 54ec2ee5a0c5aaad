use std::collections::HashMap;

use pinchat_types::models::Scope;
use uuid::Uuid;

/// Ephemeral state of one logged-in client. Owned by the caller and handed
/// to every [`Coordinator`](crate::Coordinator) call; nothing here is
/// persisted.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub(crate) username: String,
    pub(crate) peer: Option<String>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) search: Option<String>,
    pub(crate) reply_to: Option<Uuid>,
    pub(crate) editing: Option<Uuid>,
    pub(crate) notifications: NotificationTracker,
}

impl ChatSession {
    pub fn new(username: impl Into<String>, page_size: u32) -> Self {
        Self {
            username: username.into(),
            peer: None,
            page: 1,
            page_size: page_size.max(1),
            search: None,
            reply_to: None,
            editing: None,
            notifications: NotificationTracker::default(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn peer(&self) -> Option<&str> {
        self.peer.as_deref()
    }

    pub fn scope(&self) -> Scope {
        Scope::from_peer(self.peer())
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn reply_to(&self) -> Option<Uuid> {
        self.reply_to
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }
}

/// Last observed page message count per scope.
///
/// The comparison base is the number of messages on the page being
/// viewed, not the scope total, so switching page or page size can make
/// it fire early or stay silent. The stored count only ever grows.
#[derive(Debug, Clone, Default)]
pub struct NotificationTracker {
    last_counts: HashMap<Scope, usize>,
}

impl NotificationTracker {
    /// Records `page_count` for `scope`; `true` when it exceeds the last
    /// recorded value.
    pub fn observe(&mut self, scope: &Scope, page_count: usize) -> bool {
        let last = self.last_counts.get(scope).copied().unwrap_or(0);
        if page_count > last {
            self.last_counts.insert(scope.clone(), page_count);
            true
        } else {
            false
        }
    }

    pub fn last_count(&self, scope: &Scope) -> usize {
        self.last_counts.get(scope).copied().unwrap_or(0)
    }
}
