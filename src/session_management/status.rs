//! Human-readable progress while records flow.

use log::{debug, info};
use uuid::Uuid;

use crate::protocol::record::{Category, Record};

/// Tracks the section being transferred and how many entries it has
/// completed so far.
pub struct TransferProgress {
    session_id: Uuid,
    section: Option<Category>,
    entries: u32,
    done: bool,
}

impl TransferProgress {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            section: None,
            entries: 0,
            done: false,
        }
    }

    pub fn observe(&mut self, record: &Record) {
        if let Some(category) = record.category() {
            info!("[{}] {}", self.session_id, category);
            self.section = Some(category);
            self.entries = 0;
        } else if record.is_section_end() {
            self.entries += 1;
            match self.section {
                Some(section) => debug!(
                    "[{}] {}: {} entries",
                    self.session_id, section, self.entries
                ),
                None => debug!("[{}] {} entries", self.session_id, self.entries),
            }
        } else if record.is_end_of_transfer() {
            info!("[{}] DONE", self.session_id);
            self.done = true;
        }
    }

    pub fn section(&self) -> Option<Category> {
        self.section
    }

    /// Section-end records seen since the last category record.
    pub fn entries(&self) -> u32 {
        self.entries
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}
