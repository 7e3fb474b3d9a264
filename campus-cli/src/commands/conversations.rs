use anyhow::{Context, Result, ensure};
use client::{Conversation, Inbox};
use serde::Serialize;
use shared::config::ClientConfig;
use shared::models::{Message, Session, UserId};

use super::{print_json, transport};

#[derive(Serialize)]
struct ConversationSummary<'a> {
    counterpart_id: UserId,
    counterpart: String,
    unread_count: usize,
    last_message: Option<&'a Message>,
}

impl<'a> From<&'a Conversation> for ConversationSummary<'a> {
    fn from(conversation: &'a Conversation) -> Self {
        Self {
            counterpart_id: conversation.counterpart_id,
            counterpart: conversation.display_name(),
            unread_count: conversation.unread_count,
            last_message: conversation.last_message.as_ref(),
        }
    }
}

pub async fn run(
    config: &ClientConfig,
    session: &Session,
    search: Option<&str>,
    select: Option<UserId>,
) -> Result<()> {
    ensure!(
        session.user_id() != 0,
        "--user-id is required to aggregate conversations"
    );

    let inbox = Inbox::new(transport(config, session)?, session);
    inbox.refresh().await.context("failed to fetch messages")?;

    if let Some(counterpart) = select {
        let thread = inbox
            .select_conversation(counterpart)
            .with_context(|| format!("no conversation with user {counterpart}"))?;
        return print_json(&serde_json::json!({
            "conversation": ConversationSummary::from(&thread.conversation),
            "messages": thread.messages,
        }));
    }

    let conversations = inbox.search_conversations(search.unwrap_or_default());
    let summaries: Vec<ConversationSummary<'_>> =
        conversations.iter().map(ConversationSummary::from).collect();
    print_json(&serde_json::json!({
        "unread_total": inbox.unread_total(),
        "conversations": summaries,
    }))
}
