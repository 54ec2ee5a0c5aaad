use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pinchat_db::presence::DEFAULT_PRESENCE_WINDOW;
use pinchat_db::{Database, NewMessage, Payload};
use pinchat_types::api::{ChatView, LikeSummary, MessageResponse, PendingReply, ReplyPreview};
use pinchat_types::models::{AttachmentRef, Message, MessageKind};
use pinchat_types::{ChatError, Result};
use tracing::{debug, info};
use uuid::Uuid;

use crate::policy::{self, LIKES_SHOWN};
use crate::session::ChatSession;

#[derive(Debug, Clone)]
pub struct Settings {
    pub presence_window: Duration,
    pub default_page_size: u32,
    pub max_attachment_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            presence_window: DEFAULT_PRESENCE_WINDOW,
            default_page_size: 20,
            max_attachment_bytes: 50 * 1024 * 1024,
        }
    }
}

/// What the user asked to send.
#[derive(Debug, Clone)]
pub enum Draft {
    Text(String),
    Upload {
        kind: MessageKind,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// Composes the stores into per-interaction operations. Holds no
/// per-user state; that lives in the caller's [`ChatSession`].
pub struct Coordinator {
    db: Arc<Database>,
    settings: Settings,
}

impl Coordinator {
    pub fn new(db: Arc<Database>, settings: Settings) -> Self {
        Self { db, settings }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // -- Login --

    pub fn is_registered(&self, username: &str) -> Result<bool> {
        self.db.is_registered(username.trim())
    }

    pub fn register(&self, username: &str, pin: &str, pin_confirm: &str) -> Result<()> {
        if pin != pin_confirm {
            return Err(ChatError::validation("PINs do not match"));
        }
        self.db.register(username.trim(), pin)
    }

    pub fn login(&self, username: &str, pin: &str) -> Result<ChatSession> {
        let username = username.trim();
        if !self.db.verify(username, pin)? {
            debug!("Rejected login for {}", username);
            return Err(ChatError::InvalidCredentials);
        }
        self.db.touch(username)?;
        info!("{} logged in", username);
        Ok(ChatSession::new(username, self.settings.default_page_size))
    }

    pub fn online_users(&self) -> Result<Vec<String>> {
        self.db.online_users(self.settings.presence_window)
    }

    // -- Navigation --

    /// `None` selects the global chat. A peer must be online and must not
    /// be the session's own user.
    pub fn select_peer(&self, session: &mut ChatSession, peer: Option<&str>) -> Result<()> {
        self.interact(session)?;
        let peer = peer.map(str::trim).filter(|p| !p.is_empty());
        if let Some(peer) = peer {
            if peer == session.username {
                return Err(ChatError::validation("cannot open a private chat with yourself"));
            }
            if !self.online_users()?.iter().any(|u| u == peer) {
                return Err(ChatError::validation(format!("{} is not online", peer)));
            }
        }
        let peer = peer.map(str::to_string);
        if peer != session.peer {
            session.peer = peer;
            session.editing = None;
        }
        Ok(())
    }

    pub fn set_page_size(&self, session: &mut ChatSession, page_size: u32) -> Result<()> {
        self.interact(session)?;
        if page_size == 0 {
            return Err(ChatError::validation("page size must be positive"));
        }
        if page_size != session.page_size {
            session.page_size = page_size;
            session.page = 1;
        }
        Ok(())
    }

    /// Blank text clears the filter. Any change returns to the first page.
    pub fn set_search(&self, session: &mut ChatSession, text: &str) -> Result<()> {
        self.interact(session)?;
        let search = Some(text.trim()).filter(|s| !s.is_empty()).map(str::to_string);
        if search != session.search {
            session.search = search;
            session.page = 1;
        }
        Ok(())
    }

    pub fn previous_page(&self, session: &mut ChatSession) -> Result<()> {
        self.interact(session)?;
        session.page = session.page.saturating_sub(1).max(1);
        Ok(())
    }

    pub fn next_page(&self, session: &mut ChatSession) -> Result<()> {
        self.interact(session)?;
        let last = self.last_page(session)?;
        session.page = session.page.saturating_add(1).min(last);
        Ok(())
    }

    // -- Replies --

    /// The target is not checked against the current scope or page; a
    /// dangling target renders as an unknown message.
    pub fn set_reply_target(&self, session: &mut ChatSession, message_id: Uuid) -> Result<()> {
        self.interact(session)?;
        session.reply_to = Some(message_id);
        Ok(())
    }

    pub fn clear_reply_target(&self, session: &mut ChatSession) -> Result<()> {
        self.interact(session)?;
        session.reply_to = None;
        Ok(())
    }

    // -- Sending --

    /// Stores the draft in the session's current scope, threaded under the
    /// pending reply target, then moves the session to the last page so
    /// the new message is in view.
    pub fn send(&self, session: &mut ChatSession, draft: Draft) -> Result<Message> {
        self.interact(session)?;
        let (kind, payload) = match draft {
            Draft::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(ChatError::validation("message text must not be empty"));
                }
                (MessageKind::Text, Payload::Text(text.to_string()))
            }
            Draft::Upload { kind, file_name, bytes } => {
                if kind.is_text() {
                    return Err(ChatError::validation("text messages cannot carry a file"));
                }
                if bytes.is_empty() {
                    return Err(ChatError::validation("no file was uploaded"));
                }
                if bytes.len() > self.settings.max_attachment_bytes {
                    return Err(ChatError::validation(format!(
                        "file exceeds {} bytes",
                        self.settings.max_attachment_bytes
                    )));
                }
                (kind, Payload::Attachment { file_name, bytes })
            }
        };

        let message = self.db.append(NewMessage {
            author: session.username.clone(),
            recipient: session.peer.clone(),
            kind,
            payload,
            reply_to: session.reply_to,
        })?;

        session.reply_to = None;
        session.page = self.last_page(session)?;
        Ok(message)
    }

    // -- Editing --

    pub fn begin_edit(&self, session: &mut ChatSession, message_id: Uuid) -> Result<()> {
        self.interact(session)?;
        self.ensure_editable(session, message_id)?;
        session.editing = Some(message_id);
        Ok(())
    }

    /// Saves the pending edit. Editability is checked again against the
    /// page as it is now, since newer messages may have arrived.
    pub fn save_edit(&self, session: &mut ChatSession, content: &str) -> Result<Message> {
        self.interact(session)?;
        let message_id = session
            .editing
            .ok_or_else(|| ChatError::validation("no edit in progress"))?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::validation("message text must not be empty"));
        }
        if let Err(e) = self.ensure_editable(session, message_id) {
            session.editing = None;
            return Err(e);
        }

        self.db.edit_content(message_id, content)?;
        session.editing = None;
        self.db
            .get_by_id(message_id)?
            .ok_or_else(|| ChatError::message_not_found(message_id))
    }

    pub fn cancel_edit(&self, session: &mut ChatSession) -> Result<()> {
        self.interact(session)?;
        session.editing = None;
        Ok(())
    }

    // -- Likes --

    pub fn like(&self, session: &mut ChatSession, message_id: Uuid) -> Result<LikeSummary> {
        self.interact(session)?;
        self.visible_message(session, message_id)?;
        self.db.like(&session.username, message_id)?;
        self.like_summary(message_id)
    }

    pub fn unlike(&self, session: &mut ChatSession, message_id: Uuid) -> Result<LikeSummary> {
        self.interact(session)?;
        self.db.unlike(&session.username, message_id)?;
        self.like_summary(message_id)
    }

    /// Returns whether the message is liked afterwards.
    pub fn toggle_like(
        &self,
        session: &mut ChatSession,
        message_id: Uuid,
    ) -> Result<(bool, LikeSummary)> {
        if self.db.has_liked(&session.username, message_id)? {
            Ok((false, self.unlike(session, message_id)?))
        } else {
            Ok((true, self.like(session, message_id)?))
        }
    }

    // -- Reads --

    pub fn message(&self, session: &mut ChatSession, message_id: Uuid) -> Result<MessageResponse> {
        self.interact(session)?;
        let message = self.visible_message(session, message_id)?;
        let mut views = self.render(session, vec![message])?;
        views
            .pop()
            .ok_or_else(|| ChatError::message_not_found(message_id))
    }

    pub fn attachment(
        &self,
        session: &mut ChatSession,
        message_id: Uuid,
    ) -> Result<(AttachmentRef, Vec<u8>)> {
        self.interact(session)?;
        let attachment = self
            .visible_message(session, message_id)?
            .attachment
            .ok_or_else(|| ChatError::NotFound(format!("attachment of message {}", message_id)))?;
        let bytes = self.db.attachments().read(&attachment.key)?;
        Ok((attachment, bytes))
    }

    /// Fetches the session's current page and everything needed to draw it.
    pub fn refresh(&self, session: &mut ChatSession) -> Result<ChatView> {
        self.interact(session)?;
        let online_users = self.online_users()?;
        let scope = session.scope();
        let page = self.db.page(
            &session.username,
            &scope,
            session.search(),
            session.page,
            session.page_size,
        )?;

        let new_message = session.notifications.observe(&scope, page.messages.len());
        let editable_message_id =
            policy::editable_message(&page.messages, &session.username).map(|m| m.id);

        let pending_reply = match session.reply_to {
            Some(target) => Some(PendingReply {
                message_id: target,
                preview: policy::reply_preview(self.reply_target(session, target)?.as_ref()),
            }),
            None => None,
        };

        Ok(ChatView {
            username: session.username.clone(),
            title: scope.title(),
            scope,
            online_users,
            page: session.page,
            page_size: session.page_size,
            total_pages: policy::total_pages(page.total_count, session.page_size),
            total_count: page.total_count,
            search: session.search.clone(),
            no_results: session.search.is_some() && page.total_count == 0,
            messages: self.render(session, page.messages)?,
            editable_message_id,
            editing_message_id: session.editing,
            new_message,
            pending_reply,
        })
    }

    // -- Internals --

    /// Every authenticated interaction counts as presence.
    fn interact(&self, session: &ChatSession) -> Result<()> {
        self.db.touch(&session.username)
    }

    fn last_page(&self, session: &ChatSession) -> Result<u32> {
        let total = self
            .db
            .count(&session.username, &session.scope(), session.search())?;
        Ok(policy::total_pages(total, session.page_size))
    }

    fn ensure_editable(&self, session: &ChatSession, message_id: Uuid) -> Result<()> {
        let page = self.db.page(
            &session.username,
            &session.scope(),
            session.search(),
            session.page,
            session.page_size,
        )?;
        match policy::editable_message(&page.messages, &session.username) {
            Some(m) if m.id == message_id => Ok(()),
            _ => Err(ChatError::NotEditable(message_id)),
        }
    }

    fn visible_message(&self, session: &ChatSession, message_id: Uuid) -> Result<Message> {
        self.db
            .get_by_id(message_id)?
            .filter(|m| m.visible_to(&session.username))
            .ok_or_else(|| ChatError::message_not_found(message_id))
    }

    /// Private messages the viewer is not part of render as unknown.
    fn reply_target(&self, session: &ChatSession, target: Uuid) -> Result<Option<Message>> {
        Ok(self
            .db
            .get_by_id(target)?
            .filter(|m| m.visible_to(&session.username)))
    }

    fn like_summary(&self, message_id: Uuid) -> Result<LikeSummary> {
        Ok(policy::like_summary(&self.db.likes_for(message_id)?, LIKES_SHOWN))
    }

    fn render(
        &self,
        session: &ChatSession,
        messages: Vec<Message>,
    ) -> Result<Vec<MessageResponse>> {
        let ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
        let likes = self.db.likes_for_many(&ids)?;
        let mut previews: HashMap<Uuid, ReplyPreview> = HashMap::new();

        let mut views = Vec::with_capacity(messages.len());
        for m in messages {
            let reply_preview = match m.reply_to {
                Some(target) => {
                    if !previews.contains_key(&target) {
                        let preview =
                            policy::reply_preview(self.reply_target(session, target)?.as_ref());
                        previews.insert(target, preview);
                    }
                    previews.get(&target).cloned()
                }
                None => None,
            };
            let likers = likes.get(&m.id).cloned().unwrap_or_default();
            views.push(MessageResponse {
                liked_by_me: likers.contains(&session.username),
                likes: policy::like_summary(&likers, LIKES_SHOWN),
                reply_preview,
                id: m.id,
                author: m.author,
                recipient: m.recipient,
                created_at: m.created_at,
                kind: m.kind,
                content: m.content,
                attachment: m.attachment,
                reply_to: m.reply_to,
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinchat_db::clock::FixedClock;
    use pinchat_types::models::Scope;
    use tempfile::TempDir;

    struct Harness {
        chat: Coordinator,
        clock: Arc<FixedClock>,
        _dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let clock = Arc::new(FixedClock::default());
            let db = Database::open(&dir.path().join("chat.db"), &dir.path().join("uploads"))
                .unwrap()
                .with_clock(clock.clone());
            Self {
                chat: Coordinator::new(Arc::new(db), Settings::default()),
                clock,
                _dir: dir,
            }
        }

        fn user(&self, name: &str) -> ChatSession {
            self.chat.register(name, "1234", "1234").unwrap();
            self.chat.login(name, "1234").unwrap()
        }

        fn say(&self, session: &mut ChatSession, text: &str) -> Message {
            let m = self.chat.send(session, Draft::Text(text.into())).unwrap();
            self.clock.advance(chrono::Duration::seconds(1));
            m
        }
    }

    fn texts(view: &ChatView) -> Vec<&str> {
        view.messages
            .iter()
            .map(|m| m.content.as_deref().unwrap_or(""))
            .collect()
    }

    #[test]
    fn login_requires_matching_pin() {
        let h = Harness::new();
        assert!(!h.chat.is_registered("alice").unwrap());
        assert!(matches!(
            h.chat.register("alice", "1234", "4321"),
            Err(ChatError::Validation(_))
        ));
        h.chat.register(" alice ", "1234", "1234").unwrap();
        assert!(h.chat.is_registered("alice").unwrap());
        assert!(matches!(
            h.chat.login("alice", "0000"),
            Err(ChatError::InvalidCredentials)
        ));
        assert!(matches!(
            h.chat.login("nobody", "1234"),
            Err(ChatError::InvalidCredentials)
        ));
        let session = h.chat.login("alice", "1234").unwrap();
        assert_eq!(session.username(), "alice");
        assert_eq!(h.chat.online_users().unwrap(), ["alice"]);
    }

    #[test]
    fn global_send_appears_in_view() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        h.say(&mut alice, "  hi  ");

        let view = h.chat.refresh(&mut alice).unwrap();
        assert_eq!(texts(&view), ["hi"]);
        assert!(view.messages[0].recipient.is_none());
        assert_eq!(view.title, "Global Chat");
        assert!(matches!(
            h.chat.send(&mut alice, Draft::Text("   ".into())),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn private_chat_is_shared_by_both_peers_only() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let mut bob = h.user("bob");
        let mut carol = h.user("carol");

        h.chat.select_peer(&mut alice, Some("bob")).unwrap();
        h.say(&mut alice, "secret");

        h.chat.select_peer(&mut bob, Some("alice")).unwrap();
        assert_eq!(texts(&h.chat.refresh(&mut alice).unwrap()), ["secret"]);
        assert_eq!(texts(&h.chat.refresh(&mut bob).unwrap()), ["secret"]);
        assert!(h.chat.refresh(&mut carol).unwrap().messages.is_empty());

        h.chat.select_peer(&mut alice, None).unwrap();
        assert!(h.chat.refresh(&mut alice).unwrap().messages.is_empty());
    }

    #[test]
    fn peers_must_be_online_and_not_self() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let _bob = h.user("bob");
        assert!(matches!(
            h.chat.select_peer(&mut alice, Some("alice")),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            h.chat.select_peer(&mut alice, Some("dave")),
            Err(ChatError::Validation(_))
        ));

        h.clock.advance(chrono::Duration::seconds(300));
        // alice's own call refreshes her presence, bob has gone stale.
        assert!(matches!(
            h.chat.select_peer(&mut alice, Some("bob")),
            Err(ChatError::Validation(_))
        ));
        assert_eq!(alice.scope(), Scope::Global);
    }

    #[test]
    fn only_latest_own_message_on_page_is_editable() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let a1 = h.say(&mut alice, "a1");
        let a2 = h.say(&mut alice, "a2");

        let view = h.chat.refresh(&mut alice).unwrap();
        assert_eq!(view.editable_message_id, Some(a2.id));

        assert!(matches!(
            h.chat.begin_edit(&mut alice, a1.id),
            Err(ChatError::NotEditable(id)) if id == a1.id
        ));
        h.chat.begin_edit(&mut alice, a2.id).unwrap();
        let edited = h.chat.save_edit(&mut alice, " a2 fixed ").unwrap();
        assert_eq!(edited.content.as_deref(), Some("a2 fixed"));
        assert_eq!(edited.created_at, a2.created_at);
        assert!(alice.editing().is_none());
    }

    #[test]
    fn others_cannot_edit_and_stale_edits_are_rejected() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let mut bob = h.user("bob");
        let a1 = h.say(&mut alice, "a1");
        assert!(matches!(
            h.chat.begin_edit(&mut bob, a1.id),
            Err(ChatError::NotEditable(_))
        ));

        h.chat.begin_edit(&mut alice, a1.id).unwrap();
        // A newer message by alice takes over the edit affordance.
        h.say(&mut alice, "a2");
        assert!(matches!(
            h.chat.save_edit(&mut alice, "changed"),
            Err(ChatError::NotEditable(_))
        ));
        assert!(alice.editing().is_none());
        assert!(matches!(
            h.chat.save_edit(&mut alice, "changed"),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn dangling_reply_renders_as_unknown() {
        let h = Harness::new();
        let mut bob = h.user("bob");
        let ghost = Uuid::new_v4();
        h.chat.set_reply_target(&mut bob, ghost).unwrap();

        let view = h.chat.refresh(&mut bob).unwrap();
        assert_eq!(
            view.pending_reply,
            Some(PendingReply {
                message_id: ghost,
                preview: ReplyPreview::Unknown
            })
        );

        let reply = h.say(&mut bob, "re: ?");
        assert_eq!(reply.reply_to, Some(ghost));
        assert!(bob.reply_to().is_none());

        let view = h.chat.refresh(&mut bob).unwrap();
        assert_eq!(view.messages[0].reply_preview, Some(ReplyPreview::Unknown));
    }

    #[test]
    fn reply_preview_shows_target() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let mut bob = h.user("bob");
        let hello = h.say(&mut alice, "hello");
        h.chat.set_reply_target(&mut bob, hello.id).unwrap();
        h.say(&mut bob, "hi back");

        let view = h.chat.refresh(&mut bob).unwrap();
        assert_eq!(
            view.messages[1].reply_preview,
            Some(ReplyPreview::Known {
                author: "alice".into(),
                kind: MessageKind::Text,
                excerpt: "hello".into()
            })
        );
    }

    #[test]
    fn private_reply_targets_stay_private() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let mut bob = h.user("bob");
        let mut carol = h.user("carol");
        h.chat.select_peer(&mut alice, Some("bob")).unwrap();
        let secret = h.say(&mut alice, "secret");

        h.chat.set_reply_target(&mut carol, secret.id).unwrap();
        h.say(&mut carol, "what?");
        let view = h.chat.refresh(&mut carol).unwrap();
        assert_eq!(view.messages[0].reply_preview, Some(ReplyPreview::Unknown));

        // bob is a participant, so the same reply shows the target.
        let view = h.chat.refresh(&mut bob).unwrap();
        assert!(matches!(
            &view.messages[0].reply_preview,
            Some(ReplyPreview::Known { excerpt, .. }) if excerpt == "secret"
        ));
        assert!(h.chat.message(&mut bob, secret.id).is_ok());
        assert!(matches!(
            h.chat.message(&mut carol, secret.id),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn send_jumps_to_last_page() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        h.chat.set_page_size(&mut alice, 2).unwrap();
        for i in 0..4 {
            h.say(&mut alice, &format!("m{}", i));
        }
        assert_eq!(alice.page(), 2);
        h.say(&mut alice, "m4");
        assert_eq!(alice.page(), 3);

        let view = h.chat.refresh(&mut alice).unwrap();
        assert_eq!(texts(&view), ["m4"]);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.total_count, 5);
    }

    #[test]
    fn navigation_is_clamped_and_filters_reset_page() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        h.chat.set_page_size(&mut alice, 2).unwrap();
        for body in ["apple", "banana", "cherry", "apricot", "date"] {
            h.say(&mut alice, body);
        }
        assert_eq!(alice.page(), 3);
        h.chat.next_page(&mut alice).unwrap();
        assert_eq!(alice.page(), 3);
        h.chat.previous_page(&mut alice).unwrap();
        h.chat.previous_page(&mut alice).unwrap();
        h.chat.previous_page(&mut alice).unwrap();
        assert_eq!(alice.page(), 1);
        h.chat.next_page(&mut alice).unwrap();
        assert_eq!(alice.page(), 2);

        h.chat.set_search(&mut alice, "  AP ").unwrap();
        assert_eq!(alice.page(), 1);
        assert_eq!(alice.search(), Some("AP"));
        let view = h.chat.refresh(&mut alice).unwrap();
        assert_eq!(texts(&view), ["apple", "apricot"]);

        h.chat.set_search(&mut alice, "zzz").unwrap();
        assert!(h.chat.refresh(&mut alice).unwrap().no_results);
        h.chat.set_search(&mut alice, "   ").unwrap();
        assert!(alice.search().is_none());

        h.chat.next_page(&mut alice).unwrap();
        h.chat.set_page_size(&mut alice, 10).unwrap();
        assert_eq!(alice.page(), 1);
        assert!(matches!(
            h.chat.set_page_size(&mut alice, 0),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn next_page_from_the_largest_page_number_clamps() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        h.say(&mut alice, "only");
        alice.page = u32::MAX;
        h.chat.next_page(&mut alice).unwrap();
        assert_eq!(alice.page(), 1);
    }

    #[test]
    fn notification_fires_once_per_page_growth() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let mut bob = h.user("bob");

        assert!(!h.chat.refresh(&mut alice).unwrap().new_message);
        h.say(&mut bob, "one");
        assert!(h.chat.refresh(&mut alice).unwrap().new_message);
        assert!(!h.chat.refresh(&mut alice).unwrap().new_message);

        h.chat.select_peer(&mut alice, Some("bob")).unwrap();
        h.chat.select_peer(&mut bob, Some("alice")).unwrap();
        h.say(&mut bob, "psst");
        assert!(h.chat.refresh(&mut alice).unwrap().new_message);
        assert!(!h.chat.refresh(&mut alice).unwrap().new_message);
    }

    #[test]
    fn likes_toggle_and_summarise() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let mut bob = h.user("bob");
        let hi = h.say(&mut alice, "hi");

        let (liked, summary) = h.chat.toggle_like(&mut bob, hi.id).unwrap();
        assert!(liked);
        assert_eq!(summary.shown, ["bob"]);

        let view = h.chat.refresh(&mut bob).unwrap();
        assert!(view.messages[0].liked_by_me);
        assert_eq!(view.messages[0].likes.count, 1);

        let (liked, summary) = h.chat.toggle_like(&mut bob, hi.id).unwrap();
        assert!(!liked);
        assert_eq!(summary.count, 0);
        assert!(matches!(
            h.chat.like(&mut bob, Uuid::new_v4()),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn uploads_are_validated_and_downloadable() {
        let h = Harness::new();
        let mut alice = h.user("alice");
        let mut bob = h.user("bob");
        assert!(matches!(
            h.chat.send(
                &mut alice,
                Draft::Upload {
                    kind: MessageKind::Image,
                    file_name: "x.png".into(),
                    bytes: vec![],
                }
            ),
            Err(ChatError::Validation(_))
        ));

        h.chat.select_peer(&mut alice, Some("bob")).unwrap();
        let sent = h
            .chat
            .send(
                &mut alice,
                Draft::Upload {
                    kind: MessageKind::File,
                    file_name: "notes.txt".into(),
                    bytes: b"notes".to_vec(),
                },
            )
            .unwrap();

        let (attachment, bytes) = h.chat.attachment(&mut bob, sent.id).unwrap();
        assert_eq!(attachment.file_name, "notes.txt");
        assert_eq!(bytes, b"notes");

        let mut carol = h.user("carol");
        assert!(matches!(
            h.chat.attachment(&mut carol, sent.id),
            Err(ChatError::NotFound(_))
        ));

        let view = h.chat.refresh(&mut alice).unwrap();
        // Latest own message is a file, so nothing is editable.
        assert!(view.editable_message_id.is_none());
    }
}
