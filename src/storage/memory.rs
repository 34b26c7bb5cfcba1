//! In-memory note store, the counterpart the [`NoteStore`] trait exists
//! for: unit and integration tests drive the accept path against it
//! without touching a disk.

use crate::error::{Result, SyncError};
use crate::protocol::Note;
use crate::storage::traits::NoteStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;

#[derive(Default)]
pub struct MemoryNoteStore {
    notes: Mutex<HashMap<String, Note>>,
    attachments: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored notes, newest first.
    pub fn notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.notes.lock().values().cloned().collect();
        notes.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        notes
    }

    pub fn attachment(&self, note_id: &str, file_name: &str) -> Option<Vec<u8>> {
        self.attachments
            .lock()
            .get(&(note_id.to_string(), file_name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn list_notes(&self) -> Result<Vec<Note>> {
        Ok(self.notes())
    }

    async fn get_note(&self, note_id: &str) -> Result<Note> {
        self.notes
            .lock()
            .get(note_id)
            .cloned()
            .ok_or_else(|| SyncError::NoteNotFound {
                note_id: note_id.to_string(),
            })
    }

    async fn save_note(&self, note: &Note) -> Result<()> {
        self.notes.lock().insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn delete_note(&self, note_id: &str) -> Result<()> {
        self.notes.lock().remove(note_id);
        self.attachments
            .lock()
            .retain(|(id, _), _| id != note_id);
        Ok(())
    }

    async fn save_attachment(
        &self,
        note_id: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<String> {
        self.attachments.lock().insert(
            (note_id.to_string(), file_name.to_string()),
            data.to_vec(),
        );
        Ok(file_name.to_string())
    }

    async fn import_attachment(&self, note_id: &str, source: &Path) -> Result<String> {
        let file_name = source
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SyncError::store("source path has no file name"))?
            .to_string();
        let data = tokio::fs::read(source).await?;
        self.save_attachment(note_id, &file_name, &data).await
    }

    async fn attachment_bytes(&self, note_id: &str, file_name: &str) -> Result<Vec<u8>> {
        self.attachment(note_id, file_name)
            .ok_or_else(|| SyncError::AttachmentNotFound {
                note_id: note_id.to_string(),
                file_name: file_name.to_string(),
            })
    }
}
