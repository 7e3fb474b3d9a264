//! # Conversation Aggregation
//!
//! Turns the received and sent message feeds into one list of
//! conversations, one per counterpart, newest first, with unread counts.
//!
//! Aggregation is a pure function of the two feeds and the current user; it
//! is rerun in full whenever either feed changes. [`Inbox`] wires it to two
//! [`ResourceController`]s and caches the result between changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::Method;
use shared::models::{
    CurrentUser, FieldErrors, Message, MessageId, SendMessageRequest, Session, Timestamp, UserId,
    UserRef,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::error::ApiResult;
use crate::resource::{
    FeedLoader, MutationOutcome, ResourceController, ResourceState, RestResource,
};
use crate::transport::ApiTransport;

/// All messages exchanged with one counterpart, summarised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub counterpart_id: UserId,
    /// The other participant, with the first non-empty name seen.
    pub counterpart: UserRef,
    /// Most recent message in either direction.
    pub last_message: Option<Message>,
    /// Messages from the counterpart to the current user not yet read.
    pub unread_count: usize,
}

impl Conversation {
    #[must_use]
    pub fn display_name(&self) -> String {
        self.counterpart.display_name()
    }
}

/// A conversation together with its messages in chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationThread {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Build the conversation list for `me` from both feeds.
///
/// One conversation per distinct counterpart, in order of the most recent
/// message, newest first. Conversations whose latest message has no
/// timestamp go last. Ties keep first-encountered order, received before
/// sent.
#[must_use]
pub fn aggregate(received: &[Message], sent: &[Message], me: UserId) -> Vec<Conversation> {
    let working: Vec<&Message> = received.iter().chain(sent).collect();

    let mut unread: HashMap<UserId, usize> = HashMap::new();
    for message in &working {
        if message.is_unread_for(me) {
            *unread.entry(message.sender.id).or_default() += 1;
        }
    }

    let mut slots: HashMap<UserId, usize> = HashMap::new();
    let mut conversations: Vec<Conversation> = Vec::new();
    for message in working {
        let counterpart = message.counterpart(me);
        let slot = *slots.entry(counterpart.id).or_insert_with(|| {
            conversations.push(Conversation {
                counterpart_id: counterpart.id,
                counterpart: counterpart.clone(),
                last_message: None,
                unread_count: 0,
            });
            conversations.len() - 1
        });

        let conversation = &mut conversations[slot];
        if conversation.counterpart.name.trim().is_empty() && !counterpart.name.trim().is_empty() {
            conversation.counterpart.name.clone_from(&counterpart.name);
        }
        let newer = conversation
            .last_message
            .as_ref()
            .is_none_or(|current| message.created_at > current.created_at);
        if newer {
            conversation.last_message = Some(message.clone());
        }
    }

    for conversation in &mut conversations {
        conversation.unread_count = unread
            .get(&conversation.counterpart_id)
            .copied()
            .unwrap_or_default();
    }

    // Stable: equal timestamps keep encounter order.
    conversations.sort_by(|a, b| recency(b).cmp(&recency(a)));
    conversations
}

fn recency(conversation: &Conversation) -> Option<Timestamp> {
    conversation
        .last_message
        .as_ref()
        .and_then(|message| message.created_at)
}

/// Narrow an aggregated list by a case-insensitive substring of the
/// counterpart's display name. An empty query keeps everything.
#[must_use]
pub fn filter_conversations(conversations: &[Conversation], query: &str) -> Vec<Conversation> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return conversations.to_vec();
    }
    conversations
        .iter()
        .filter(|conversation| conversation.display_name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Every message exchanged with `counterpart`, oldest first. A message
/// present in both feeds appears once.
#[must_use]
pub fn thread_with(
    received: &[Message],
    sent: &[Message],
    counterpart: UserId,
    me: UserId,
) -> Vec<Message> {
    let mut seen = std::collections::HashSet::new();
    let mut messages: Vec<Message> = received
        .iter()
        .chain(sent)
        .filter(|message| message.counterpart(me).id == counterpart)
        .filter(|message| seen.insert(message.id))
        .cloned()
        .collect();
    messages.sort_by_key(|message| message.created_at);
    messages
}

/// API paths used by an [`Inbox`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEndpoints {
    pub received: String,
    pub sent: String,
    /// `POST` target for new messages; `{send}/{id}/read` marks one as read.
    pub send: String,
}

impl Default for InboxEndpoints {
    fn default() -> Self {
        Self {
            received: "messages/received".to_string(),
            sent: "messages/sent".to_string(),
            send: "messages".to_string(),
        }
    }
}

type Feed = ResourceController<FeedLoader<Message>>;
type FeedState = ResourceState<Vec<Message>>;

struct InboxCache {
    received: watch::Receiver<FeedState>,
    sent: watch::Receiver<FeedState>,
    conversations: Arc<Vec<Conversation>>,
    search: String,
    selected: Option<UserId>,
}

/// Messaging screen state: both feeds, the derived conversation list, the
/// current search and the selected conversation.
pub struct Inbox {
    me: CurrentUser,
    transport: Arc<dyn ApiTransport>,
    endpoints: InboxEndpoints,
    received: Feed,
    sent: Feed,
    cache: Mutex<InboxCache>,
}

impl Inbox {
    /// Inbox for the session's user over the default endpoints. Nothing is
    /// fetched until [`refresh`](Self::refresh).
    pub fn new(transport: Arc<dyn ApiTransport>, session: &Session) -> Self {
        Self::with_endpoints(transport, session, InboxEndpoints::default())
    }

    /// Like [`new`](Self::new), against custom API paths.
    pub fn with_endpoints(
        transport: Arc<dyn ApiTransport>,
        session: &Session,
        endpoints: InboxEndpoints,
    ) -> Self {
        let received: Feed = ResourceController::new(
            "messages.received",
            FeedLoader(RestResource::new(Arc::clone(&transport), endpoints.received.as_str())),
        );
        let sent: Feed = ResourceController::new(
            "messages.sent",
            FeedLoader(RestResource::new(Arc::clone(&transport), endpoints.sent.as_str())),
        );
        let cache = InboxCache {
            received: received.subscribe(),
            sent: sent.subscribe(),
            conversations: Arc::new(Vec::new()),
            search: String::new(),
            selected: None,
        };

        Self {
            me: session.user.clone(),
            transport,
            endpoints,
            received,
            sent,
            cache: Mutex::new(cache),
        }
    }

    fn cache(&self) -> MutexGuard<'_, InboxCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn me(&self) -> &CurrentUser {
        &self.me
    }

    /// Fetch both feeds concurrently.
    ///
    /// # Errors
    /// Returns the first feed error. The other feed is still applied.
    #[instrument(name = "inbox.refresh", skip(self), fields(user = self.me.id))]
    pub async fn refresh(&self) -> ApiResult<()> {
        let (received, sent) = futures::join!(self.received.trigger(()), self.sent.trigger(()));
        received?;
        sent?;
        Ok(())
    }

    /// The aggregated conversation list, recomputed only if either feed has
    /// changed since the last call.
    #[must_use]
    pub fn conversations(&self) -> Arc<Vec<Conversation>> {
        let mut guard = self.cache();
        let cache = &mut *guard;
        let changed = cache.received.has_changed().unwrap_or(false)
            || cache.sent.has_changed().unwrap_or(false);
        if changed {
            let received = cache.received.borrow_and_update();
            let sent = cache.sent.borrow_and_update();
            let conversations = aggregate(
                received.value.as_deref().unwrap_or_default(),
                sent.value.as_deref().unwrap_or_default(),
                self.me.id,
            );
            drop(received);
            drop(sent);
            debug!(count = conversations.len(), "conversations rebuilt");
            cache.conversations = Arc::new(conversations);
        }
        Arc::clone(&cache.conversations)
    }

    /// Remember `query` and return the matching conversations.
    pub fn search_conversations(&self, query: &str) -> Vec<Conversation> {
        query.clone_into(&mut self.cache().search);
        filter_conversations(&self.conversations(), query)
    }

    /// Conversations matching the current search.
    #[must_use]
    pub fn visible_conversations(&self) -> Vec<Conversation> {
        let search = self.cache().search.clone();
        filter_conversations(&self.conversations(), &search)
    }

    /// Select the conversation with `counterpart_id` and return its thread.
    pub fn select_conversation(&self, counterpart_id: UserId) -> Option<ConversationThread> {
        self.cache().selected = Some(counterpart_id);
        self.thread(counterpart_id)
    }

    /// Thread of the selected conversation, rebuilt from the current feeds.
    #[must_use]
    pub fn selected(&self) -> Option<ConversationThread> {
        let selected = self.cache().selected?;
        self.thread(selected)
    }

    fn thread(&self, counterpart_id: UserId) -> Option<ConversationThread> {
        let conversation = self
            .conversations()
            .iter()
            .find(|conversation| conversation.counterpart_id == counterpart_id)?
            .clone();
        let received = self.received.value().unwrap_or_default();
        let sent = self.sent.value().unwrap_or_default();
        Some(ConversationThread {
            conversation,
            messages: thread_with(&received, &sent, counterpart_id, self.me.id),
        })
    }

    #[must_use]
    pub fn unread_total(&self) -> usize {
        self.conversations()
            .iter()
            .map(|conversation| conversation.unread_count)
            .sum()
    }

    /// Send a message and refetch the sent feed.
    ///
    /// Blank content is rejected locally as a `content` field error.
    ///
    /// # Errors
    /// Propagates transport errors other than validation failures.
    #[instrument(name = "inbox.send", skip(self, content), fields(user = self.me.id))]
    pub async fn send_message(
        &self,
        recipient: UserId,
        content: &str,
    ) -> ApiResult<MutationOutcome<Option<Message>>> {
        if content.trim().is_empty() {
            let mut errors = FieldErrors::new();
            errors.insert(
                "content".to_string(),
                vec!["Message content cannot be empty".to_string()],
            );
            return Ok(MutationOutcome::Invalid(errors));
        }

        let request = SendMessageRequest {
            recipient_id: recipient,
            content: content.to_string(),
        };
        let endpoint =
            RestResource::<Message>::new(Arc::clone(&self.transport), self.endpoints.send.as_str());
        self.sent.mutate(endpoint.create(&request)).await
    }

    /// Mark a received message as read on the server and refetch the
    /// received feed. The local copy is never flipped.
    ///
    /// # Errors
    /// Propagates transport errors other than validation failures.
    #[instrument(name = "inbox.mark_read", skip(self), fields(user = self.me.id))]
    pub async fn mark_as_read(&self, message_id: MessageId) -> ApiResult<MutationOutcome<()>> {
        let path = format!("{}/{message_id}/read", self.endpoints.send);
        let write = async {
            self.transport
                .send(Method::PUT, &path, None, &CancellationToken::new())
                .await
                .map(|_| ())
        };
        self.received.mutate(write).await
    }

    #[must_use]
    pub fn received_state(&self) -> FeedState {
        self.received.state()
    }

    #[must_use]
    pub fn sent_state(&self) -> FeedState {
        self.sent.state()
    }

    /// Cancel both feeds.
    pub fn dispose(&self) {
        self.received.dispose();
        self.sent.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::transport::MockApiTransport;
    use serde_json::{Value, json};
    use shared::models::Role;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ME: UserId = 1;

    fn user(id: UserId) -> UserRef {
        UserRef::new(id, format!("User {id}"))
    }

    fn message(id: MessageId, from: UserId, to: UserId, at: &str, read: bool) -> Message {
        Message {
            id,
            sender: user(from),
            recipient: user(to),
            content: format!("message {id}"),
            created_at: Some(Timestamp::parse(at).unwrap()),
            is_read: read,
        }
    }

    fn session() -> Session {
        Session::new(
            CurrentUser {
                id: ME,
                name: "Me".into(),
                role: Role::Teacher,
            },
            None,
        )
    }

    #[test]
    fn one_conversation_per_counterpart() {
        let received = vec![
            message(1, 2, ME, "01/01/2024 08:00", true),
            message(2, 3, ME, "01/01/2024 09:00", true),
            message(3, 2, ME, "02/01/2024 08:00", true),
        ];
        let sent = vec![
            message(4, ME, 4, "03/01/2024 08:00", true),
            message(5, ME, 2, "04/01/2024 08:00", true),
        ];

        let conversations = aggregate(&received, &sent, ME);

        let distinct: HashSet<UserId> = received
            .iter()
            .chain(&sent)
            .map(|m| m.counterpart(ME).id)
            .collect();
        assert_eq!(conversations.len(), distinct.len());
        let ids: Vec<UserId> = conversations.iter().map(|c| c.counterpart_id).collect();
        assert_eq!(ids, vec![2, 4, 3]);
        assert_eq!(conversations[0].last_message.as_ref().unwrap().id, 5);
    }

    #[test]
    fn outbound_messages_never_count_as_unread() {
        let received = vec![
            message(1, 2, ME, "01/01/2024 08:00", false),
            message(2, 2, ME, "01/01/2024 08:01", true),
        ];
        let sent = vec![message(3, ME, 2, "01/01/2024 08:02", false)];

        let conversations = aggregate(&received, &sent, ME);

        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].unread_count, 1);
    }

    #[test]
    fn unread_counts_survive_interleaved_feeds() {
        let received = vec![
            message(1, 2, ME, "01/01/2024 08:00", false),
            message(2, 3, ME, "01/01/2024 08:01", false),
            message(3, 2, ME, "01/01/2024 08:02", false),
        ];
        let sent = vec![message(4, ME, 3, "01/01/2024 08:03", true)];

        let conversations = aggregate(&received, &sent, ME);
        let unread: HashMap<UserId, usize> = conversations
            .iter()
            .map(|c| (c.counterpart_id, c.unread_count))
            .collect();

        assert_eq!(unread[&2], 2);
        assert_eq!(unread[&3], 1);
    }

    #[test]
    fn newer_timestamp_sorts_first() {
        let received = vec![
            message(1, 2, ME, "10/01/2024 09:00", true),
            message(2, 3, ME, "10/01/2024 10:30", true),
        ];

        let conversations = aggregate(&received, &[], ME);

        assert_eq!(conversations[0].counterpart_id, 3);
        assert_eq!(conversations[1].counterpart_id, 2);
    }

    #[test]
    fn day_first_dates_sort_chronologically() {
        // 02/03 is the 2nd of March, after the 12th of February.
        let received = vec![
            message(1, 2, ME, "12/02/2024 10:00", true),
            message(2, 3, ME, "02/03/2024 10:00", true),
        ];

        let conversations = aggregate(&received, &[], ME);

        assert_eq!(conversations[0].counterpart_id, 3);
    }

    #[test]
    fn timestamp_ties_keep_first_encountered_message() {
        let received = vec![message(1, 2, ME, "01/01/2024 08:00", true)];
        let sent = vec![message(2, ME, 2, "01/01/2024 08:00", true)];

        let first = aggregate(&received, &sent, ME);
        let second = aggregate(&received, &sent, ME);

        assert_eq!(first, second);
        assert_eq!(first[0].last_message.as_ref().unwrap().id, 1);
    }

    #[test]
    fn undated_conversations_sort_last() {
        let mut undated = message(1, 2, ME, "01/01/2024 08:00", true);
        undated.created_at = None;
        let received = vec![undated, message(2, 3, ME, "01/01/2020 08:00", true)];

        let conversations = aggregate(&received, &[], ME);

        assert_eq!(conversations[0].counterpart_id, 3);
        assert_eq!(conversations[1].counterpart_id, 2);
    }

    #[test]
    fn blank_counterpart_name_is_filled_from_later_messages() {
        let mut anonymous = message(1, 2, ME, "01/01/2024 08:00", true);
        anonymous.sender.name = String::new();
        let received = vec![anonymous, message(2, 2, ME, "01/01/2024 09:00", true)];

        let conversations = aggregate(&received, &[], ME);

        assert_eq!(conversations[0].display_name(), "User 2");
    }

    #[test]
    fn empty_feeds_yield_no_conversations() {
        assert!(aggregate(&[], &[], ME).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_and_idempotent() {
        let mut from_amina = message(1, 2, ME, "01/01/2024 08:00", true);
        from_amina.sender.name = "Amina Haddad".into();
        let mut from_karim = message(2, 3, ME, "01/01/2024 09:00", true);
        from_karim.sender.name = "Karim Benali".into();
        let conversations = aggregate(&[from_amina, from_karim], &[], ME);

        let once = filter_conversations(&conversations, "HADD");
        let twice = filter_conversations(&once, "HADD");

        assert_eq!(once.len(), 1);
        assert_eq!(once[0].counterpart_id, 2);
        assert_eq!(once, twice);
        assert_eq!(filter_conversations(&conversations, "  ").len(), 2);
    }

    #[test]
    fn thread_is_chronological_and_deduplicated() {
        let received = vec![
            message(3, 2, ME, "01/01/2024 10:00", true),
            message(1, 2, ME, "01/01/2024 08:00", true),
            message(9, 5, ME, "01/01/2024 08:30", true),
        ];
        let sent = vec![
            message(2, ME, 2, "01/01/2024 09:00", true),
            message(3, 2, ME, "01/01/2024 10:00", true),
        ];

        let thread = thread_with(&received, &sent, 2, ME);

        let ids: Vec<MessageId> = thread.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    fn feed_transport(received: Value, sent: Value) -> MockApiTransport {
        let mut transport = MockApiTransport::new();
        transport.expect_get().returning(move |path, _, _| match path {
            "messages/received" => Ok(received.clone()),
            "messages/sent" => Ok(sent.clone()),
            other => Err(ApiError::from_response(404, Some(&json!({"message": other})))),
        });
        transport
    }

    #[tokio::test]
    async fn inbox_aggregates_both_feeds() {
        let received = json!([{
            "id": 1, "sender": {"id": 2, "name": "U2"}, "recipient": {"id": 1, "name": "U1"},
            "content": "hi", "created_at": "01/01/2024 08:00", "is_read": false
        }]);
        let sent = json!({"data": [{
            "id": 2, "sender": {"id": 1, "name": "U1"}, "recipient": {"id": 2, "name": "U2"},
            "content": "yo", "created_at": "01/01/2024 08:05", "is_read": true
        }]});
        let inbox = Inbox::new(Arc::new(feed_transport(received, sent)), &session());

        inbox.refresh().await.unwrap();
        let conversations = inbox.conversations();

        assert_eq!(conversations.len(), 1);
        let conversation = &conversations[0];
        assert_eq!(conversation.counterpart_id, 2);
        assert_eq!(conversation.counterpart.name, "U2");
        assert_eq!(conversation.last_message.as_ref().unwrap().id, 2);
        assert_eq!(conversation.unread_count, 1);
        assert_eq!(inbox.unread_total(), 1);
    }

    #[tokio::test]
    async fn conversations_are_cached_until_a_feed_changes() {
        let inbox = Inbox::new(
            Arc::new(feed_transport(json!([]), json!([]))),
            &session(),
        );

        let before = inbox.conversations();
        assert!(Arc::ptr_eq(&before, &inbox.conversations()));

        inbox.refresh().await.unwrap();
        let after = inbox.conversations();

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(Arc::ptr_eq(&after, &inbox.conversations()));
    }

    #[tokio::test]
    async fn search_narrows_without_touching_the_aggregate() {
        let received = json!([
            {
                "id": 1,
                "sender": {"id": 2, "name": "Amina"},
                "recipient": {"id": 1},
                "created_at": "01/01/2024 08:00"
            },
            {
                "id": 2,
                "sender": {"id": 3, "name": "Karim"},
                "recipient": {"id": 1},
                "created_at": "01/01/2024 09:00"
            }
        ]);
        let inbox = Inbox::new(Arc::new(feed_transport(received, json!([]))), &session());
        inbox.refresh().await.unwrap();
        let aggregate = inbox.conversations();

        let found = inbox.search_conversations("kar");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].counterpart_id, 3);
        assert_eq!(inbox.visible_conversations(), found);
        assert!(Arc::ptr_eq(&aggregate, &inbox.conversations()));
    }

    #[tokio::test]
    async fn select_conversation_returns_thread() {
        let received = json!([
            {
                "id": 1,
                "sender": {"id": 2, "name": "Amina"},
                "recipient": {"id": 1},
                "created_at": "01/01/2024 08:00"
            }
        ]);
        let sent = json!([
            {
                "id": 2,
                "sender": {"id": 1},
                "recipient": {"id": 2, "name": "Amina"},
                "created_at": "01/01/2024 08:05"
            }
        ]);
        let inbox = Inbox::new(Arc::new(feed_transport(received, sent)), &session());
        inbox.refresh().await.unwrap();

        let thread = inbox.select_conversation(2).unwrap();

        assert_eq!(thread.messages.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(inbox.selected(), Some(thread));
        assert!(inbox.select_conversation(42).is_none());
    }

    #[tokio::test]
    async fn mark_as_read_refetches_instead_of_flipping_locally() {
        let unread = json!([
            {
                "id": 7,
                "sender": {"id": 2},
                "recipient": {"id": 1},
                "created_at": "01/01/2024 08:00",
                "is_read": false
            }
        ]);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut transport = MockApiTransport::new();
        transport.expect_get().returning(move |path, _, _| {
            if path == "messages/received" {
                seen.fetch_add(1, Ordering::SeqCst);
            }
            Ok(if path == "messages/received" { unread.clone() } else { json!([]) })
        });
        transport
            .expect_send()
            .withf(|method, path, body, _| {
                *method == Method::PUT && path == "messages/7/read" && body.is_none()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(None));
        let inbox = Inbox::new(Arc::new(transport), &session());
        inbox.refresh().await.unwrap();

        let outcome = inbox.mark_as_read(7).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Applied(()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // The server still reports the message unread, so it stays unread.
        assert_eq!(inbox.unread_total(), 1);
    }

    #[tokio::test]
    async fn send_message_posts_and_refetches_sent_feed() {
        let sent_calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&sent_calls);
        let mut transport = MockApiTransport::new();
        transport.expect_get().returning(move |path, _, _| {
            if path == "messages/sent" {
                seen.fetch_add(1, Ordering::SeqCst);
            }
            Ok(json!([]))
        });
        transport
            .expect_send()
            .withf(|method, path, body, _| {
                *method == Method::POST
                    && path == "messages"
                    && *body == Some(json!({"recipient_id": 2, "content": "Bonjour"}))
            })
            .times(1)
            .returning(|_, _, _, _| {
                Ok(Some(json!({"data": {
                    "id": 10,
                    "sender": {"id": 1},
                    "recipient": {"id": 2},
                    "content": "Bonjour"
                }})))
            });
        let inbox = Inbox::new(Arc::new(transport), &session());
        inbox.refresh().await.unwrap();

        let outcome = inbox.send_message(2, "Bonjour").await.unwrap();

        let MutationOutcome::Applied(Some(created)) = outcome else {
            panic!("expected the created message, got {outcome:?}");
        };
        assert_eq!(created.id, 10);
        assert_eq!(sent_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blank_message_is_rejected_without_a_request() {
        let inbox = Inbox::new(Arc::new(MockApiTransport::new()), &session());

        let outcome = inbox.send_message(2, "   ").await.unwrap();

        assert!(outcome.field_errors().unwrap().contains_key("content"));
    }

    #[tokio::test]
    async fn one_failing_feed_does_not_block_the_other() {
        let mut transport = MockApiTransport::new();
        transport.expect_get().returning(|path, _, _| {
            if path == "messages/sent" {
                Err(ApiError::transport("offline"))
            } else {
                Ok(json!([
                    {
                        "id": 1,
                        "sender": {"id": 2},
                        "recipient": {"id": 1},
                        "created_at": "01/01/2024 08:00"
                    }
                ]))
            }
        });
        let inbox = Inbox::new(Arc::new(transport), &session());

        assert!(inbox.refresh().await.is_err());

        assert_eq!(inbox.conversations().len(), 1);
        assert!(inbox.sent_state().error.is_some());
    }
}
