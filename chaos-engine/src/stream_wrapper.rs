//! The stream wrapper (spec §4.4) — applies a single STREAM-point fault
//! to a chunk stream as it flows, if the injector chose one.
//!
//! Faults compose in a fixed pipeline rather than all applying at once:
//! a delay before the first chunk (`TTFT_DELAY`), a delay before every
//! chunk (`SLOW_CHUNKS`), a point past which the stream hangs forever
//! (`STREAM_HANG`) or ends abruptly (`STREAM_CUT`), and corruption of one
//! chunk's bytes (`CORRUPT`). At most one of these is active per stream,
//! since the injector hands back a single [`FaultKind`]; the pipeline
//! order here is what a real response would encounter these problems in.

use std::time::Instant;

use async_stream::stream;
use chaos_core::prelude::{CorruptEventKind, DurationMs, FaultKind};
use futures::{Stream, StreamExt};

/// Wrap a raw chunk stream, applying `fault` (if any) as chunks flow.
///
/// `on_chunk` is called once per chunk actually yielded downstream, with
/// its delay and whether it was the first chunk — callers (the
/// recorder) use it to log `STREAM_CHUNK` events and TTFT without this
/// module needing to know about events at all.
pub fn wrap_stream<S>(
    inner: S,
    fault: Option<FaultKind>,
    mut on_chunk: impl FnMut(u32, DurationMs, bool) + Send + 'static,
) -> impl Stream<Item = Vec<u8>>
where
    S: Stream<Item = Vec<u8>> + Send + 'static,
{
    stream! {
        futures::pin_mut!(inner);
        let started = Instant::now();
        let mut index: u32 = 0;
        let mut first = true;

        while let Some(mut chunk) = inner.next().await {
            let chunk_deadline = Instant::now();

            if first {
                if let Some(FaultKind::TtftDelay { delay }) = &fault {
                    tokio::time::sleep(delay.to_std()).await;
                }
            }

            if let Some(FaultKind::SlowChunks { per_chunk_delay }) = &fault {
                tokio::time::sleep(per_chunk_delay.to_std()).await;
            }

            if let Some(FaultKind::StreamHang { after_chunks }) = &fault {
                if index >= *after_chunks {
                    // Never resolves: the stream hangs until the caller's
                    // own deadline fires.
                    futures::future::pending::<()>().await;
                }
            }

            if let Some(FaultKind::StreamCut { after_chunks }) = &fault {
                if index >= *after_chunks {
                    return;
                }
            }

            if let Some(FaultKind::Corrupt { event_kind, parameters }) = &fault {
                let target_index = parameters
                    .get("chunk_index")
                    .and_then(|v| v.as_u64())
                    .map(|v| v as u32)
                    .unwrap_or(0);
                if index == target_index {
                    chunk = corrupt_chunk(chunk, *event_kind);
                }
            }

            let delay: DurationMs = chunk_deadline.elapsed().into();
            on_chunk(index, delay, first);
            first = false;
            index += 1;
            yield chunk;
        }

        let _ = started;
    }
}

fn corrupt_chunk(chunk: Vec<u8>, kind: CorruptEventKind) -> Vec<u8> {
    match kind {
        CorruptEventKind::InvalidJson => {
            let mut corrupted = chunk;
            corrupted.extend_from_slice(b"{not valid json");
            corrupted
        }
        CorruptEventKind::UnknownEventType => {
            b"event: a_type_no_provider_ever_sends\ndata: {}\n\n".to_vec()
        }
        CorruptEventKind::TruncatedUtf8 => {
            let mut corrupted = chunk;
            // A lone leading byte of a multi-byte UTF-8 sequence, left
            // dangling with nothing to complete it.
            corrupted.push(0xE2);
            corrupted
        }
        CorruptEventKind::MissingField => {
            if let Ok(text) = String::from_utf8(chunk.clone()) {
                text.replacen("\"index\":", "\"_removed_index\":", 1).into_bytes()
            } else {
                chunk
            }
        }
    }
}
