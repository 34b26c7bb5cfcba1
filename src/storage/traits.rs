use crate::error::Result;
use crate::protocol::Note;
use async_trait::async_trait;
use std::path::Path;

/// Local note/attachment persistence, abstracted for testability and
/// flexibility. The sync core only calls it; it never manages the store's
/// internal concurrency.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All persisted notes, newest first.
    async fn list_notes(&self) -> Result<Vec<Note>>;

    /// A single note by id.
    async fn get_note(&self, note_id: &str) -> Result<Note>;

    /// Upsert a note by id.
    async fn save_note(&self, note: &Note) -> Result<()>;

    /// Remove a note and its attachment refs.
    async fn delete_note(&self, note_id: &str) -> Result<()>;

    /// Write attachment bytes into the note's attachment area.
    async fn save_attachment(&self, note_id: &str, file_name: &str, data: &[u8])
    -> Result<String>;

    /// Copy a file from disk into the note's attachment area; returns the
    /// stored file name.
    async fn import_attachment(&self, note_id: &str, source: &Path) -> Result<String>;

    /// Read attachment bytes for display or transfer.
    async fn attachment_bytes(&self, note_id: &str, file_name: &str) -> Result<Vec<u8>>;
}
