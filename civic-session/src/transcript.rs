//! Append-only conversation log with a single pending tail entry.

use std::sync::Arc;

use civic_types::ConversationEntry;

/// Ordered conversation transcript.
///
/// Committed entries are never modified or removed. At most one assistant
/// entry is pending (still receiving text); it is stored apart from the log,
/// so it is always the last entry and the only one whose content can change.
///
/// The committed log is shared with published snapshots, so streaming a
/// chunk never copies earlier entries. Only the owning
/// [`ChatSession`](crate::ChatSession) mutates a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    committed: Arc<Vec<ConversationEntry>>,
    pending: Option<ConversationEntry>,
}

impl Transcript {
    /// An empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, pending entry included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.committed.len() + usize::from(self.pending.is_some())
    }

    /// Whether the transcript has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in order, pending entry last.
    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.committed.iter().chain(self.pending.as_ref())
    }

    /// The last entry.
    #[must_use]
    pub fn last(&self) -> Option<&ConversationEntry> {
        self.pending.as_ref().or_else(|| self.committed.last())
    }

    /// The assistant entry still receiving text, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&ConversationEntry> {
        self.pending.as_ref()
    }

    /// Owned copy of all entries.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ConversationEntry> {
        self.entries().cloned().collect()
    }

    /// Shared handle on the committed entries, pending entry excluded.
    #[must_use]
    pub fn history(&self) -> Arc<Vec<ConversationEntry>> {
        Arc::clone(&self.committed)
    }

    /// Append a finished entry. A pending entry is committed first.
    pub(crate) fn push(&mut self, entry: ConversationEntry) {
        self.commit();
        Arc::make_mut(&mut self.committed).push(entry);
    }

    /// Open an empty assistant placeholder as the pending entry.
    pub(crate) fn open_pending(&mut self) {
        self.commit();
        self.pending = Some(ConversationEntry::assistant(String::new()));
    }

    /// Overwrite the pending entry's content. Returns `false` when nothing is pending.
    pub(crate) fn replace_pending(&mut self, content: &str) -> bool {
        match self.pending.as_mut() {
            Some(entry) => {
                entry.content.clear();
                entry.content.push_str(content);
                true
            }
            None => false,
        }
    }

    /// Move the pending entry, if any, onto the committed log.
    pub(crate) fn commit(&mut self) {
        if let Some(entry) = self.pending.take() {
            Arc::make_mut(&mut self.committed).push(entry);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.committed = Arc::default();
        self.pending = None;
    }
}
