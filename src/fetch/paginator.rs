//! Cursor Pagination
//!
//! [`PaginationStream`] drives one cursor traversal as an async stream of
//! pages: strictly sequential, at most one request in flight, cooperative
//! stop between requests. Errors never appear in the stream itself; they are
//! recorded on the [`LoadSession`] and the stream simply ends, so consumers
//! always observe a clean prefix of the data.
//!
//! [`follow_cached`] is the cache-only variant: it walks pages a sibling
//! traversal writes into the shared query cache, waiting on cache updates
//! for pages that have not landed yet.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project::pin_project;
use tokio::sync::watch;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use super::session::LoadSession;
use crate::github::{Page, SourceError, SourceResult};

/// Boxed page stream, for signatures that must erase the fetch closure
pub type PageStream<T> = Pin<Box<dyn Stream<Item = Page<T>> + Send>>;

/// Stream of pages produced by repeatedly applying a fetch closure to the
/// continuation cursor of the previous page.
#[pin_project]
pub struct PaginationStream<T, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = SourceResult<Page<T>>>,
{
    fetch: F,
    session: LoadSession,
    cursor: Option<String>,
    #[pin]
    in_flight: Option<Fut>,
    exhausted: bool,
}

/// Build a pagination stream over `fetch`, reporting into `session`.
///
/// The closure receives the cursor for the page to load (`None` for the
/// first page) and returns the future resolving to that page.
///
/// ```
/// use futures::StreamExt;
/// use statshub::fetch::{paginate, LoadSession};
/// use statshub::github::Page;
///
/// # tokio_test::block_on(async {
/// let session = LoadSession::new();
/// let stream = paginate(session.clone(), |_cursor: Option<String>| {
///     futures::future::ready(Ok(Page::last(vec![1u32, 2, 3], Some(3))))
/// });
/// let pages: Vec<_> = stream.collect().await;
/// assert_eq!(pages.len(), 1);
/// assert_eq!(session.progress_percent(), 100.0);
/// # });
/// ```
pub fn paginate<T, F, Fut>(session: LoadSession, fetch: F) -> PaginationStream<T, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = SourceResult<Page<T>>>,
{
    PaginationStream {
        fetch,
        session,
        cursor: None,
        in_flight: None,
        exhausted: false,
    }
}

impl<T, F, Fut> Stream for PaginationStream<T, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = SourceResult<Page<T>>>,
{
    type Item = Page<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if *this.exhausted {
                return Poll::Ready(None);
            }

            if this.in_flight.as_mut().as_pin_mut().is_none() {
                // Stop is honoured between requests
                if this.session.is_cancelled() {
                    *this.exhausted = true;
                    return Poll::Ready(None);
                }
                let fut = (this.fetch)(this.cursor.clone());
                this.in_flight.set(Some(fut));
            }

            let Some(fut) = this.in_flight.as_mut().as_pin_mut() else {
                continue;
            };
            let result = match fut.poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(result) => result,
            };
            this.in_flight.set(None);

            // A stop that raced an in-flight request lets it finish but
            // discards the response
            if this.session.is_cancelled() {
                *this.exhausted = true;
                return Poll::Ready(None);
            }

            match result {
                Ok(page) => {
                    this.session.observe_page(&page);
                    *this.cursor = page.page_info.end_cursor.clone();
                    if !page.page_info.has_next_page {
                        *this.exhausted = true;
                        this.session.mark_complete();
                    }
                    return Poll::Ready(Some(page));
                }
                Err(error) => {
                    // Terminate quietly; the session carries the error
                    this.session.record_error(&error);
                    *this.exhausted = true;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

/// Walk a cache-only traversal that a sibling fetch is still filling.
///
/// `updates` must be subscribed from the shared cache before the first call
/// so an insert racing a miss is never lost. When a page is missing, the
/// walk waits for the next cache update; once `settled` fires (no further
/// writes will happen) each remaining cursor is tried once more and the walk
/// ends at the first page that never arrived.
///
/// Returns the error that ended the walk, if it was not a plain cache miss.
pub async fn follow_cached<T, F, Fut>(
    stop: CancellationToken,
    mut updates: watch::Receiver<u64>,
    settled: CancellationToken,
    mut fetch: F,
    mut on_page: impl FnMut(Page<T>),
) -> Option<SourceError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = SourceResult<Page<T>>>,
{
    let mut cursor: Option<String> = None;
    let mut settled_seen = false;
    loop {
        if stop.is_cancelled() {
            return None;
        }
        match fetch(cursor.clone()).await {
            Ok(page) => {
                let has_next = page.page_info.has_next_page;
                cursor = page.page_info.end_cursor.clone();
                on_page(page);
                if !has_next {
                    return None;
                }
            }
            Err(error) if error.is_cache_miss() => {
                if settled_seen {
                    return None;
                }
                tokio::select! {
                    _ = stop.cancelled() => return None,
                    _ = settled.cancelled() => settled_seen = true,
                    changed = updates.changed() => {
                        if changed.is_err() {
                            settled_seen = true;
                        }
                    }
                }
            }
            Err(error) => return Some(error),
        }
    }
}
