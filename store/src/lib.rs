//! Generic persistent state management: a JSONL append log as the source of
//! truth, mirrored into a rebuildable SQLite index for filtered queries.
//!
//! Any type that implements [`Record`] can be stored. Collections are kept
//! separate by [`Record::collection_name`]; writes within a collection are
//! serialized by an advisory file lock so the log and index never drift
//! out of sync within a single process, and [`Store::rebuild_indexes`] makes
//! recovery from an unclean shutdown a replay rather than a repair.

mod error;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use record::{Filter, FilterOp, IndexValue, Record, filters_match, now_ms};
pub use store::Store;
