use serde::Serialize;

use crate::decode::DecoderRegistry;
use crate::error::SyncError;
use crate::target::SyncTarget;
use crate::throttle::Throttle;
use crate::traits::{PageFetcher, RecordSink};

/// Counts for one drained collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainStats {
    pub pages: u64,
    pub records: u64,
}

/// Walks a collection page by page: throttle → fetch → decode → emit.
pub struct Paginator<F: PageFetcher> {
    fetcher: F,
    throttle: Throttle,
    decoders: DecoderRegistry,
}

impl<F: PageFetcher> Paginator<F> {
    pub fn new(fetcher: F, throttle: Throttle, decoders: DecoderRegistry) -> Self {
        Self {
            fetcher,
            throttle,
            decoders,
        }
    }

    /// Fetch every remaining page of `target` and emit its records in server order.
    ///
    /// Stops once a page reports `hasNext = false`. The decoder is resolved up
    /// front, so an unknown entity tag fails before any request is sent.
    pub async fn drain<S: RecordSink>(
        &self,
        target: &mut SyncTarget,
        sink: &mut S,
    ) -> Result<DrainStats, SyncError> {
        let decode = self.decoders.resolve(target.endpoint.entity)?;
        let mut stats = DrainStats::default();

        loop {
            self.throttle.acquire().await;
            let page = self.fetcher.fetch_page(target).await?;

            let records = decode(page.data)?;
            for record in &records {
                sink.emit(record)?;
            }

            stats.pages += 1;
            stats.records += records.len() as u64;
            tracing::debug!(
                endpoint = target.endpoint.name,
                key = ?target.parent_key,
                page = stats.pages,
                records = records.len(),
                has_more = target.cursor.has_more,
                "Page drained"
            );

            if !target.cursor.has_more {
                break;
            }
            if target.cursor.next.is_empty() {
                // Refetching without an offset would replay the first page forever.
                return Err(SyncError::DecodeError(format!(
                    "page {} of '{}' reports hasNext without a next token",
                    stats.pages, target.endpoint.name
                )));
            }
        }

        Ok(stats)
    }
}
