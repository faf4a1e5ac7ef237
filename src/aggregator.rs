use chrono::DateTime;

use crate::debug_log;
use crate::types::{Conversation, ConversationStats, Message, MessageCheck, MissingField};

/// Check that a message carries everything the aggregates need.
pub fn check_message(message: &Message) -> MessageCheck<'_> {
    let Some(sender) = message.sender_name.as_deref() else {
        return MessageCheck::Invalid(MissingField::Sender);
    };
    let Some(timestamp_ms) = message.timestamp_ms else {
        return MessageCheck::Invalid(MissingField::Timestamp);
    };
    let Some(content) = message.content.as_deref() else {
        return MessageCheck::Invalid(MissingField::Content);
    };
    let Some(timestamp) = DateTime::from_timestamp_millis(timestamp_ms) else {
        return MessageCheck::Invalid(MissingField::TimestampRange);
    };

    MessageCheck::Valid {
        sender,
        timestamp,
        content,
    }
}

/// Build the per-participant and per-word aggregates for one conversation in a
/// single pass over its messages.
pub fn aggregate(conversation: &Conversation) -> ConversationStats {
    let mut stats = ConversationStats {
        conversation_id: conversation.id.clone(),
        raw_message_count: conversation.message_count() as u64,
        ..Default::default()
    };

    for message in &conversation.messages {
        let (sender, timestamp, content) = match check_message(message) {
            MessageCheck::Valid {
                sender,
                timestamp,
                content,
            } => (sender, timestamp, content),
            MessageCheck::Invalid(missing) => {
                stats.invalid_messages += 1;
                if debug_log::is_enabled() {
                    debug_log::log(
                        "AGGREGATE",
                        "INVALID",
                        &format!("{}: {missing:?}", conversation.id),
                    );
                }
                continue;
            }
        };

        *stats
            .messages_per_participant
            .entry(sender.to_string())
            .or_insert(0) += 1;

        stats
            .timestamps
            .entry(sender.to_string())
            .or_default()
            .push(timestamp);

        let mut words = 0;
        for word in words_of(content) {
            words += 1;
            *stats.word_frequency.entry(word.to_string()).or_insert(0) += 1;
        }
        stats
            .word_counts
            .entry(sender.to_string())
            .or_default()
            .push(words);
    }

    stats
}

/// Unicode whitespace plus the ASCII information separators U+001C to U+001F.
fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn words_of(content: &str) -> impl Iterator<Item = &str> {
    content.split(is_word_separator).filter(|w| !w.is_empty())
}

/// Aggregate every ranked conversation, returning the stats in the same order
/// along with the total number of invalid messages seen.
pub fn aggregate_all(conversations: &[Conversation]) -> (Vec<ConversationStats>, u64) {
    let _timer = debug_log::Timed::new("AGGREGATE", format!("{} chats", conversations.len()));

    let all: Vec<ConversationStats> = conversations.iter().map(aggregate).collect();
    let invalid = all.iter().map(|s| s.invalid_messages).sum();
    (all, invalid)
}
