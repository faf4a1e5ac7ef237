use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::aggregator::aggregate_all;
use crate::loader::{discover_conversations, load_dirs};
use crate::ranking::filter_and_rank;
use crate::types::{
    Conversation, ConversationStats, RankedConversation, RunSummary, StatsExport,
};

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub messages_dir: PathBuf,
    pub archive_file: String,
    pub max_conversations: usize,
    pub message_threshold: usize,
}

/// Everything produced by one load → filter → aggregate pass. `conversations`
/// and `stats` share the same ranked order.
#[derive(Debug)]
pub struct Analysis {
    pub summary: RunSummary,
    pub conversations: Vec<Conversation>,
    pub stats: Vec<ConversationStats>,
}

/// Run the whole pipeline, writing progress lines to `progress`.
pub fn run_analysis(options: &AnalysisOptions, progress: &mut dyn Write) -> Result<Analysis> {
    let dirs = discover_conversations(&options.messages_dir, options.max_conversations)?;
    writeln!(progress, "Analyzing {} chats...", dirs.len())?;

    let loaded = load_dirs(dirs, &options.archive_file);
    let archives_parsed = loaded.conversations.len() as u64;
    let conversations = filter_and_rank(loaded.conversations, options.message_threshold);
    writeln!(progress, "Finished processing chats...")?;

    for (i, conversation) in conversations.iter().enumerate() {
        writeln!(
            progress,
            "{i} - {} messages - {}",
            conversation.message_count(),
            conversation.id
        )?;
    }

    let (stats, invalid_messages) = aggregate_all(&conversations);

    writeln!(progress, "Found {invalid_messages} invalid messages...")?;
    writeln!(
        progress,
        "Found {} chats with {} messages or more",
        conversations.len(),
        options.message_threshold
    )?;

    let summary = RunSummary {
        directories_scanned: loaded.scanned,
        archives_parsed,
        archives_missing: loaded.missing,
        archives_malformed: loaded.malformed,
        conversations_retained: conversations.len() as u64,
        invalid_messages,
        message_threshold: options.message_threshold,
    };

    Ok(Analysis {
        summary,
        conversations,
        stats,
    })
}

impl Analysis {
    /// Stats of the conversation at `index` in the ranked list.
    pub fn select(&self, index: usize) -> Result<&ConversationStats> {
        match self.stats.get(index) {
            Some(stats) => Ok(stats),
            None if self.stats.is_empty() => bail!(
                "No chats with {} messages or more to chart",
                self.summary.message_threshold
            ),
            None => bail!(
                "Conversation index {index} is out of range; {} chats were retained (0-{})",
                self.stats.len(),
                self.stats.len() - 1
            ),
        }
    }

    /// Build the JSON export. With `selected` only that conversation's stats
    /// are included; otherwise all of them are.
    pub fn export(&self, selected: Option<usize>) -> Result<StatsExport> {
        let stats = match selected {
            Some(index) => vec![self.select(index)?.clone()],
            None => self.stats.clone(),
        };

        Ok(StatsExport {
            summary: self.summary.clone(),
            conversations: self
                .conversations
                .iter()
                .enumerate()
                .map(|(index, c)| RankedConversation {
                    index,
                    id: c.id.clone(),
                    message_count: c.message_count(),
                })
                .collect(),
            stats,
        })
    }
}
