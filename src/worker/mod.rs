mod backfill;
mod checkpoint;
mod decoder;
mod indexer;
mod sources;

pub use backfill::{BackfillEngine, ProcessLog};
pub use checkpoint::{CheckpointManager, CheckpointStore, MemoryCheckpointStore};
pub use decoder::{DecodedEvent, EventDecoder, LogMeta};
pub use indexer::Indexer;
pub use sources::EventSource;
