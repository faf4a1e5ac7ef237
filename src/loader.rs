use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use walkdir::WalkDir;

use crate::debug_log;
use crate::types::{Archive, Conversation, Message};
use crate::utils::warn_once;

pub const DEFAULT_ARCHIVE_FILE: &str = "message.json";

/// A candidate conversation: one subdirectory of the messages directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDir {
    pub id: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct LoadedConversations {
    pub conversations: Vec<Conversation>,
    pub scanned: u64,
    pub missing: u64,
    pub malformed: u64,
}

/// List conversation directories under `base_dir`, sorted by name and capped at
/// `max_conversations`. Plain files are not conversations and are ignored.
///
/// Failing to read `base_dir` itself is an error; unreadable entries below it
/// are skipped with a warning.
pub fn discover_conversations(
    base_dir: &Path,
    max_conversations: usize,
) -> Result<Vec<ConversationDir>> {
    let metadata = std::fs::metadata(base_dir)
        .with_context(|| format!("Failed to read messages directory {}", base_dir.display()))?;
    if !metadata.is_dir() {
        bail!("{} is not a directory", base_dir.display());
    }

    let mut dirs = Vec::new();
    let walker = WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(anyhow!(e)).with_context(|| {
                    format!("Failed to list messages directory {}", base_dir.display())
                });
            }
            Err(e) => {
                warn_once(format!("⚠️  Skipping unreadable entry: {e}"));
                continue;
            }
        };

        if !entry.path().is_dir() {
            continue;
        }
        if dirs.len() >= max_conversations {
            break;
        }

        dirs.push(ConversationDir {
            id: entry.file_name().to_string_lossy().into_owned(),
            path: entry.into_path(),
        });
    }

    Ok(dirs)
}

/// Read and parse the archive of one conversation.
///
/// Returns `Ok(None)` when the archive is absent or cannot be read; some
/// directories are not conversations at all. A file that is present but not a
/// valid archive is an error.
pub fn load_archive(dir: &Path, archive_file: &str) -> Result<Option<Vec<Message>>> {
    let path = dir.join(archive_file);

    let mut bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if debug_log::is_enabled() {
                debug_log::log("LOAD", "SKIP", &format!("{}: {e}", path.display()));
            }
            return Ok(None);
        }
    };

    let archive: Archive = simd_json::from_slice(&mut bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(archive.messages))
}

/// Load the archive of every discovered directory. Missing archives and
/// malformed ones are counted and skipped.
pub fn load_dirs(dirs: Vec<ConversationDir>, archive_file: &str) -> LoadedConversations {
    let _timer = debug_log::Timed::new("LOAD", format!("{} dirs", dirs.len()));

    let mut loaded = LoadedConversations {
        scanned: dirs.len() as u64,
        ..Default::default()
    };

    for dir in dirs {
        match load_archive(&dir.path, archive_file) {
            Ok(Some(messages)) => loaded.conversations.push(Conversation {
                id: dir.id,
                messages,
            }),
            Ok(None) => loaded.missing += 1,
            Err(e) => {
                eprintln!("⚠️  Skipping {}: {e:#}", dir.id);
                loaded.malformed += 1;
            }
        }
    }

    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_archive(base: &Path, id: &str, body: &str) {
        let dir = base.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DEFAULT_ARCHIVE_FILE), body).unwrap();
    }

    #[test]
    fn discovery_lists_sorted_directories_only() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("zed_1")).unwrap();
        fs::create_dir(temp.path().join("amy_2")).unwrap();
        fs::write(temp.path().join(".DS_Store"), "junk").unwrap();

        let dirs = discover_conversations(temp.path(), 10).unwrap();
        let ids: Vec<&str> = dirs.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, vec!["amy_2", "zed_1"]);
        assert_eq!(dirs[0].path, temp.path().join("amy_2"));
    }

    #[test]
    fn discovery_respects_the_scan_cap() {
        let temp = TempDir::new().unwrap();
        for id in ["a", "b", "c", "d"] {
            fs::create_dir(temp.path().join(id)).unwrap();
        }

        let dirs = discover_conversations(temp.path(), 2).unwrap();
        let ids: Vec<&str> = dirs.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn discovery_fails_for_missing_base_directory() {
        let temp = TempDir::new().unwrap();
        let err = discover_conversations(&temp.path().join("nope"), 10).unwrap_err();

        assert!(
            format!("{err:#}").contains("Failed to read messages directory"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn missing_archive_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("stickers_used")).unwrap();

        let result = load_archive(&temp.path().join("stickers_used"), DEFAULT_ARCHIVE_FILE);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn malformed_archive_is_an_error() {
        let temp = TempDir::new().unwrap();
        write_archive(temp.path(), "broken", "{\"messages\": [");
        write_archive(temp.path(), "no_messages", "{\"participants\": []}");

        assert!(load_archive(&temp.path().join("broken"), DEFAULT_ARCHIVE_FILE).is_err());
        assert!(load_archive(&temp.path().join("no_messages"), DEFAULT_ARCHIVE_FILE).is_err());
    }

    #[test]
    fn load_dirs_counts_skips() {
        let temp = TempDir::new().unwrap();
        write_archive(
            temp.path(),
            "good",
            r#"{"messages": [{"sender_name": "A", "timestamp_ms": 1, "content": "hi"}]}"#,
        );
        write_archive(temp.path(), "bad", "not json");
        fs::create_dir(temp.path().join("empty")).unwrap();

        let dirs = discover_conversations(temp.path(), 1000).unwrap();
        let loaded = load_dirs(dirs, DEFAULT_ARCHIVE_FILE);

        assert_eq!(loaded.scanned, 3);
        assert_eq!(loaded.missing, 1);
        assert_eq!(loaded.malformed, 1);
        assert_eq!(loaded.conversations.len(), 1);
        assert_eq!(loaded.conversations[0].id, "good");
        assert_eq!(loaded.conversations[0].message_count(), 1);
    }

    #[test]
    fn custom_archive_file_name() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("chat");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("message_1.json"), r#"{"messages": []}"#).unwrap();

        let dirs = discover_conversations(temp.path(), 1000).unwrap();
        let loaded = load_dirs(dirs, "message_1.json");

        assert_eq!(loaded.conversations.len(), 1);
        assert!(loaded.conversations[0].messages.is_empty());
    }
}
