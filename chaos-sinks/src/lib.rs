#![deny(missing_docs)]
//! Event sink implementations (spec §6 `EventSink`) for the agent-chaos
//! harness: discard, collect in memory, append to a JSON-lines file, or
//! fan out to several of the above at once.

pub mod fan_out;
pub mod jsonl_file;
pub mod memory;
pub mod null;

pub use fan_out::FanOutSink;
pub use jsonl_file::JsonlFileSink;
pub use memory::MemorySink;
pub use null::NullSink;
