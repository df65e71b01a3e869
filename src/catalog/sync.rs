/*!
 * Template merge.
 *
 * The template decides which contexts and entries exist. A prior catalog
 * only contributes whole live entries whose singular form is translated.
 */

use indexmap::IndexMap;
use log::info;
use std::path::Path;

use crate::errors::CatalogError;

use super::codec::{self, CompileOptions};
use super::model::{Catalog, Context};

/// Counts reported after a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Template entries that took over the prior translation
    pub adopted: usize,
    /// Template entries left as they are in the template
    pub untranslated: usize,
    /// Prior entries that no longer exist in the template
    pub dropped: usize,
}

/// Merge prior translations onto the template's structure
pub fn merge_contexts(prior: &Catalog, template: &Catalog) -> (IndexMap<String, Context>, SyncSummary) {
    let mut summary = SyncSummary::default();
    let mut merged: IndexMap<String, Context> = IndexMap::with_capacity(template.contexts.len());

    for (context_key, template_entries) in &template.contexts {
        let mut entries = Context::with_capacity(template_entries.len());
        for (msgid, template_entry) in template_entries {
            // The header belongs to the prior catalog
            if template_entry.is_header() {
                let header = prior.header_entry().unwrap_or(template_entry);
                entries.insert(msgid.clone(), header.clone());
                continue;
            }

            // A `#~` entry whose msgid came back is not a live translation
            let entry = match prior.get(context_key, msgid) {
                Some(prior_entry) if !prior_entry.obsolete && !prior_entry.translation().is_empty() => {
                    summary.adopted += 1;
                    prior_entry.clone()
                }
                _ => {
                    summary.untranslated += 1;
                    template_entry.clone()
                }
            };
            entries.insert(msgid.clone(), entry);
        }
        merged.insert(context_key.clone(), entries);
    }

    // Templates without a header still keep the prior one, in front
    if let Some(header) = prior.header_entry() {
        if merged.get("").is_none_or(|entries| !entries.contains_key("")) {
            merged
                .entry(String::new())
                .or_default()
                .shift_insert(0, String::new(), header.clone());
            if let Some(index) = merged.get_index_of("") {
                merged.move_index(index, 0);
            }
        }
    }

    summary.dropped = prior
        .entries()
        .filter(|entry| template.get(entry.context_key(), &entry.msgid).is_none())
        .count();

    (merged, summary)
}

/// Replace the prior catalog's entries with the merged set, keeping its headers
pub fn sync_catalogs(mut prior: Catalog, template: &Catalog) -> (Catalog, SyncSummary) {
    let (contexts, summary) = merge_contexts(&prior, template);
    prior.contexts = contexts;
    (prior, summary)
}

/// Update a PO file from its POT template and write the result
///
/// The result goes to `output` when given, otherwise back to `po_path`.
pub fn sync<P: AsRef<Path>, T: AsRef<Path>>(
    po_path: P,
    pot_path: T,
    output: Option<&Path>,
    options: &CompileOptions,
) -> Result<SyncSummary, CatalogError> {
    let po_path = po_path.as_ref();
    let prior = codec::read_catalog(po_path)?;
    let template = codec::read_catalog(pot_path.as_ref())?;

    let (merged, summary) = sync_catalogs(prior, &template);
    let target = output.unwrap_or(po_path);
    codec::write_catalog(&merged, target, options)?;

    info!(
        "Synced {:?}: {} kept, {} untranslated, {} dropped",
        target, summary.adopted, summary.untranslated, summary.dropped
    );
    Ok(summary)
}
