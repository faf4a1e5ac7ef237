use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::deserialize_lenient;

/// One raw message as it appears in an archive. Every field is optional:
/// deactivated or removed accounts show up without a sender, and stickers,
/// calls and attachments show up without content. A field of the wrong type
/// reads as absent so only that message is dropped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub sender_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub timestamp_ms: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub content: Option<String>,
}

/// Top-level shape of an archive file. Anything besides `messages` is ignored.
#[derive(Debug, Deserialize)]
pub struct Archive {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    /// Name of the directory the archive was read from.
    pub id: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Why a message was left out of the aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Sender,
    Timestamp,
    Content,
    /// `timestamp_ms` was present but outside the representable range.
    TimestampRange,
}

/// Result of checking a message for the fields the aggregator needs.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageCheck<'a> {
    Valid {
        sender: &'a str,
        timestamp: DateTime<Utc>,
        content: &'a str,
    },
    Invalid(MissingField),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationStats {
    pub conversation_id: String,
    pub raw_message_count: u64,
    pub messages_per_participant: BTreeMap<String, u64>,
    pub timestamps: BTreeMap<String, Vec<DateTime<Utc>>>,
    pub word_counts: BTreeMap<String, Vec<usize>>,
    pub word_frequency: BTreeMap<String, u64>,
    pub invalid_messages: u64,
}

impl ConversationStats {
    #[cfg(test)]
    pub fn counted_messages(&self) -> u64 {
        self.messages_per_participant.values().sum()
    }

    /// Earliest and latest timestamp across all participants.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut all = self.timestamps.values().flatten();
        let first = *all.next()?;
        Some(all.fold((first, first), |(lo, hi), t| (lo.min(*t), hi.max(*t))))
    }
}

/// Counters describing one load/filter/aggregate run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub directories_scanned: u64,
    pub archives_parsed: u64,
    pub archives_missing: u64,
    pub archives_malformed: u64,
    pub conversations_retained: u64,
    pub invalid_messages: u64,
    pub message_threshold: usize,
}

/// Entry in the ranked conversation list of the JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct RankedConversation {
    pub index: usize,
    pub id: String,
    pub message_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsExport {
    pub summary: RunSummary,
    pub conversations: Vec<RankedConversation>,
    pub stats: Vec<ConversationStats>,
}
