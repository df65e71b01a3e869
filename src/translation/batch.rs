/*!
 * Pending-entry extraction and batch partitioning.
 *
 * Batches are bounded by the total number of characters of their source
 * strings. An entry longer than the bound travels alone; no entry is ever
 * dropped.
 */

use log::debug;

use crate::catalog::Catalog;

/// Default upper bound on the source characters of one batch
pub const DEFAULT_BATCH_CHAR_LIMIT: usize = 2000;

/// Reference to one pending catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Context group of the entry
    pub context: String,
    /// Source string, also the key inside its context
    pub msgid: String,
    /// Position in the pending list
    pub index: usize,
}

impl BatchItem {
    /// Length of the source string in characters
    pub fn char_len(&self) -> usize {
        self.msgid.chars().count()
    }
}

/// Outcome of scanning a catalog for work
#[derive(Debug, Default)]
pub struct PendingScan {
    /// Entries whose singular translation is empty, in catalog order
    pub pending: Vec<BatchItem>,
    /// Number of translations that had surrounding whitespace removed
    pub trimmed: usize,
}

/// Collect untranslated entries and trim whitespace around existing translations
///
/// The header and obsolete entries are never pending.
pub fn scan_pending(catalog: &mut Catalog) -> PendingScan {
    let mut scan = PendingScan::default();

    for entry in catalog.entries_mut() {
        if entry.obsolete {
            continue;
        }
        let translation = entry.translation();
        if translation.is_empty() {
            let index = scan.pending.len();
            scan.pending.push(BatchItem {
                context: entry.context_key().to_string(),
                msgid: entry.msgid.clone(),
                index,
            });
        } else if translation.trim() != translation {
            let trimmed = translation.trim().to_string();
            entry.set_translation(trimmed);
            scan.trimmed += 1;
        }
    }

    scan
}

/// Partition pending items into consecutive batches of at most `char_limit`
/// source characters, except for single oversized items
pub fn split_into_batches(items: Vec<BatchItem>, char_limit: usize) -> Vec<Vec<BatchItem>> {
    let total_items = items.len();
    let mut batches = Vec::new();
    let mut current: Vec<BatchItem> = Vec::new();
    let mut current_chars = 0;

    for item in items {
        let item_chars = item.char_len();

        if !current.is_empty() && current_chars + item_chars > char_limit {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        current_chars += item_chars;
        current.push(item);

        if current_chars >= char_limit {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }
    }

    if !current.is_empty() {
        batches.push(current);
    }

    debug!("Split {} pending entries into {} batches", total_items, batches.len());
    batches
}
