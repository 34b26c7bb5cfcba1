//! Filesystem-backed note store.
//!
//! Layout: one `{id}.md` per note under the root, first line `# {title}`,
//! attachments under `attachments/{note_id}/`. The note's datetime is the
//! file's modification time.

use crate::error::{Result, SyncError};
use crate::protocol::Note;
use crate::storage::traits::NoteStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct FsNoteStore {
    root: PathBuf,
}

impl FsNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn note_path(&self, note_id: &str) -> PathBuf {
        self.root.join(format!("{note_id}.md"))
    }

    fn attachments_dir(&self, note_id: &str) -> PathBuf {
        self.root.join("attachments").join(note_id)
    }

    async fn read_note(&self, note_id: &str, path: &Path) -> Result<Note> {
        let raw = tokio::fs::read_to_string(path).await?;
        let (title, content) = split_title(&raw);

        let modified = tokio::fs::metadata(path).await?.modified()?;
        let datetime: DateTime<Utc> = modified.into();

        let mut attachments = Vec::new();
        let dir = self.attachments_dir(note_id);
        if let Ok(mut entries) = tokio::fs::read_dir(&dir).await {
            while let Some(entry) = entries.next_entry().await? {
                if let Some(name) = entry.file_name().to_str() {
                    attachments.push(name.to_string());
                }
            }
        }
        attachments.sort();

        Ok(Note {
            id: note_id.to_string(),
            title,
            content,
            datetime,
            attachments,
        })
    }
}

#[async_trait]
impl NoteStore for FsNoteStore {
    async fn list_notes(&self) -> Result<Vec<Note>> {
        let mut notes = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // An empty store is a store that has never saved anything.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(notes),
            Err(err) => return Err(err.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let Some(note_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            notes.push(self.read_note(note_id, &path).await?);
        }

        notes.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        Ok(notes)
    }

    async fn get_note(&self, note_id: &str) -> Result<Note> {
        let path = self.note_path(note_id);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(SyncError::NoteNotFound {
                note_id: note_id.to_string(),
            });
        }
        self.read_note(note_id, &path).await
    }

    async fn save_note(&self, note: &Note) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let body = format!("# {}\n\n{}", note.title, note.content);
        tokio::fs::write(self.note_path(&note.id), body).await?;
        Ok(())
    }

    async fn delete_note(&self, note_id: &str) -> Result<()> {
        let path = self.note_path(note_id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path).await?;
        }

        let dir = self.attachments_dir(note_id);
        if tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&dir).await?;
        }
        Ok(())
    }

    async fn save_attachment(
        &self,
        note_id: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<String> {
        let dir = self.attachments_dir(note_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), data).await?;
        Ok(file_name.to_string())
    }

    async fn import_attachment(&self, note_id: &str, source: &Path) -> Result<String> {
        let file_name = source
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SyncError::store("source path has no file name"))?
            .to_string();

        let dir = self.attachments_dir(note_id);
        tokio::fs::create_dir_all(&dir).await?;

        // Keep an existing attachment of the same name instead of
        // silently overwriting it.
        let mut stored = file_name.clone();
        if tokio::fs::try_exists(dir.join(&stored)).await.unwrap_or(false) {
            let prefix = uuid::Uuid::new_v4().to_string();
            stored = format!("{}-{}", &prefix[..8], file_name);
        }

        tokio::fs::copy(source, dir.join(&stored)).await?;
        Ok(stored)
    }

    async fn attachment_bytes(&self, note_id: &str, file_name: &str) -> Result<Vec<u8>> {
        let path = self.attachments_dir(note_id).join(file_name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(SyncError::AttachmentNotFound {
                note_id: note_id.to_string(),
                file_name: file_name.to_string(),
            });
        }
        Ok(tokio::fs::read(&path).await?)
    }
}

/// First line `# title` becomes the title; everything after the following
/// blank line is the content. Files without a heading read as "Untitled".
fn split_title(raw: &str) -> (String, String) {
    let mut lines = raw.lines();
    match lines.next() {
        Some(first) if first.starts_with("# ") => {
            let title = first[2..].to_string();
            let rest: Vec<&str> = lines.collect();
            let content = rest.join("\n");
            let content = content.strip_prefix('\n').unwrap_or(&content).to_string();
            (title, content)
        }
        _ => ("Untitled".to_string(), raw.to_string()),
    }
}
