#![deny(missing_docs)]
//! The fault injection engine: consults a scenario's chaos rules at each
//! interception point, applies stream-shaped faults chunk by chunk, and
//! funnels every metric update and event through one recorder.
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`injector`] | Rule consultation (spec §4.3) |
//! | [`stream_wrapper`] | Chunk-by-chunk stream fault pipeline (spec §4.4) |
//! | [`metrics_store`] | Lock-guarded run state, read by assertions |
//! | [`recorder`] | Single funnel for metrics + event timeline (spec §4.6) |

pub mod injector;
pub mod metrics_store;
pub mod recorder;
pub mod stream_wrapper;

pub use injector::{Injection, Injector};
pub use metrics_store::MetricsStore;
pub use recorder::Recorder;
pub use stream_wrapper::wrap_stream;
