/*!
 * Gettext catalogs.
 *
 * - `model`: in-memory catalog, contexts and entries
 * - `codec`: PO/POT parsing and serialization
 * - `filter`: predicate-based entry removal
 * - `sync`: merging a catalog onto an updated template
 */

pub use self::codec::{CompileOptions, parse, read_catalog, serialize, write_catalog};
pub use self::filter::{EntryFilter, RemoveOptions, remove_by_options};
pub use self::model::{Catalog, Context, Entry, EntryComments};
pub use self::sync::{SyncSummary, sync, sync_catalogs};

pub mod codec;
pub mod filter;
pub mod model;
pub mod sync;
