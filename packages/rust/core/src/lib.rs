//! Ingestion pipeline around the chunking engine.
//!
//! Wires the storage collaborators to the chunker: read a Markdown object,
//! classify it, chunk it, and write the chunk list next to it. Batches run
//! documents concurrently and isolate each document's failure.

pub mod event;
pub mod pipeline;
pub mod store;

pub use event::{EventRecords, ObjectRef, RejectedRecord, parse_event};
pub use pipeline::{
    DocumentOutcome, IngestReport, Ingestor, ProgressReporter, SilentProgress, ingest_batch,
};
pub use store::{ChunkSink, ContentSource, FsStore, chunks_key};
