//! One-shot CLI commands over the conversation endpoints (print to stdout).

use anyhow::{bail, Context, Result};

use super::client::ChatClient;
use super::ChatApi;
use crate::config::Config;
use crate::models::Conversation;
use crate::sync::grouping::{group_by_day, local_time};

/// Longest preview shown per conversation line.
const PREVIEW_LEN: usize = 80;

/// Shorten a preview to fit on one line.
fn preview(text: &str) -> String {
    let text = text.trim().replace('\n', " ");
    if text.chars().count() > PREVIEW_LEN {
        let truncated: String = text.chars().take(PREVIEW_LEN - 3).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}

fn print_conversation(conv: &Conversation) {
    let badge = if conv.unread_count > 0 {
        format!(" ({} unread)", conv.unread_count)
    } else {
        String::new()
    };
    println!("{}{}", conv.display_name(), badge);
    println!("  ID: {}", conv.id);

    match conv.person.as_person() {
        Some(person) => println!("  Phone: {}", person.phone_number),
        None => println!("  Person: {}", conv.person.id()),
    }

    if let Some(ref title) = conv.title {
        println!("  Title: {}", title);
    }
    if let Some(ref ts) = conv.last_message_timestamp {
        println!("  Last: {}", local_time(ts));
    }
    match conv.last_message.as_deref().map(preview) {
        Some(text) if !text.is_empty() => println!("  {}", text),
        _ => println!("  No messages yet"),
    }
    println!();
}

/// List conversations, optionally narrowed by a name filter.
pub async fn list_conversations(
    config: &Config,
    limit: usize,
    filter: Option<&str>,
) -> Result<()> {
    let client = ChatClient::new(config)?;
    let conversations = client
        .list_conversations()
        .await
        .context("Failed to fetch conversations")?;

    println!("\nConversations:");
    println!("{:-<60}", "");

    let query = filter.unwrap_or("");
    let visible: Vec<&Conversation> = conversations
        .iter()
        .filter(|c| c.matches_name(query))
        .take(limit)
        .collect();

    if visible.is_empty() {
        println!("  (no conversations found)");
        return Ok(());
    }

    for conv in visible {
        print_conversation(conv);
    }

    Ok(())
}

/// Print a conversation's messages grouped by day, then mark it read.
pub async fn read_messages(
    config: &Config,
    conversation_id: &str,
    mark_read: bool,
) -> Result<()> {
    let client = ChatClient::new(config)?;
    let messages = match client.list_messages(conversation_id).await {
        Ok(messages) => messages,
        Err(e) if e.status_code() == Some(404) => {
            bail!("Conversation {} not found", conversation_id)
        }
        Err(e) => return Err(e).context("Failed to fetch messages"),
    };

    if messages.is_empty() {
        println!("(no messages)");
    }

    for group in group_by_day(&messages) {
        println!("\n-- {} --", group.label);
        for msg in group.messages {
            let who = if msg.sender.is_operator() {
                "me"
            } else {
                "them"
            };
            println!(
                "[{}] {}: {}",
                local_time(&msg.timestamp),
                who,
                msg.display_text()
            );
        }
    }

    if mark_read {
        // Best effort, as in the interactive client.
        if let Err(e) = client.mark_read(conversation_id).await {
            tracing::warn!("Error marking conversation as read: {}", e);
        }
    }

    Ok(())
}

/// Send one text message.
pub async fn send_message(config: &Config, conversation_id: &str, content: &str) -> Result<()> {
    if content.trim().is_empty() {
        bail!("Refusing to send an empty message");
    }

    let client = ChatClient::new(config)?;
    let message = client
        .send_message(conversation_id, content)
        .await
        .context("Failed to send message")?;

    println!("Message sent ({}).", message.id);
    Ok(())
}

/// Mark a conversation as read.
pub async fn mark_read(config: &Config, conversation_id: &str) -> Result<()> {
    let client = ChatClient::new(config)?;
    client
        .mark_read(conversation_id)
        .await
        .context("Failed to mark conversation as read")?;
    println!("Marked as read.");
    Ok(())
}
