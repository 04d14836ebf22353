//! Disk-backed snapshot store with one JSON file per record.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use store_core::{ChatSummary, Message, SnapshotStore, StoreError, UnreadEntry};

const CHAT_LIST_FILE: &str = "chats.json";
const MESSAGES_FILE: &str = "messages.json";
const UNREAD_FILE: &str = "unread.json";
const ACTIVE_CHAT_FILE: &str = "active-chat.json";

/// JSON-file implementation of [`SnapshotStore`].
///
/// Each of the four snapshot records lives in its own file under the data
/// dir, so a corrupt or missing record never takes the others down with it.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    root: PathBuf,
}

impl SnapshotDir {
    /// Open (and create if needed) the snapshot directory.
    pub fn new(data_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            root: data_dir.to_path_buf(),
        })
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(value).map_err(|err| {
            StoreError::serialization(&err)
        })?;
        fs::write(self.root.join(file), encoded).map_err(|err| StoreError::storage(&err))
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.root.join(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::storage(&err)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| StoreError::serialization(&err))
    }
}

impl SnapshotStore for SnapshotDir {
    fn save_chat_list(&mut self, chats: &[ChatSummary]) -> Result<(), StoreError> {
        self.write(CHAT_LIST_FILE, &chats)
    }

    fn save_messages(
        &mut self,
        messages: &BTreeMap<String, Vec<Message>>,
    ) -> Result<(), StoreError> {
        self.write(MESSAGES_FILE, messages)
    }

    fn save_unread(&mut self, entries: &[UnreadEntry]) -> Result<(), StoreError> {
        self.write(UNREAD_FILE, &entries)
    }

    fn save_active_chat(&mut self, chat: Option<&ChatSummary>) -> Result<(), StoreError> {
        self.write(ACTIVE_CHAT_FILE, &chat)
    }

    fn load_chat_list(&self) -> Result<Option<Vec<ChatSummary>>, StoreError> {
        self.read(CHAT_LIST_FILE)
    }

    fn load_messages(&self) -> Result<Option<BTreeMap<String, Vec<Message>>>, StoreError> {
        self.read(MESSAGES_FILE)
    }

    fn load_unread(&self) -> Result<Option<Vec<UnreadEntry>>, StoreError> {
        self.read(UNREAD_FILE)
    }

    fn load_active_chat(&self) -> Result<Option<ChatSummary>, StoreError> {
        // The file stores an Option so an explicit deselect round-trips too.
        Ok(self
            .read::<Option<ChatSummary>>(ACTIVE_CHAT_FILE)?
            .flatten())
    }
}
