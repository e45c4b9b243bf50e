//! Sliding-window concurrency for row tasks
//!
//! At most `limit` futures are in flight; the next item is admitted as soon as
//! any one of them completes. Futures run interleaved on the calling task, so
//! they may borrow from the caller.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;

fn tagged<Fut: Future>(index: usize, fut: Fut) -> impl Future<Output = (usize, Fut::Output)> {
    async move { (index, fut.await) }
}

/// Maps `f` over `items` with bounded concurrency
///
/// `results[i]` corresponds to `items[i]` regardless of completion order. The
/// first error stops admission of new items; tasks already in flight settle
/// and the error is returned.
///
/// ```
/// use lingbuzz_sync::sync::map_with_concurrency;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let doubled: Result<Vec<u32>, ()> =
///     map_with_concurrency(vec![1, 2, 3], 2, |n| async move { Ok(n * 2) }).await;
/// assert_eq!(doubled, Ok(vec![2, 4, 6]));
/// # }
/// ```
pub async fn map_with_concurrency<T, R, E, F, Fut>(
    items: Vec<T>,
    limit: usize,
    mut f: F,
) -> Result<Vec<R>, E>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let limit = limit.max(1);
    let mut results: Vec<Option<R>> = items.iter().map(|_| None).collect();
    let mut pending = items.into_iter().enumerate();
    let mut in_flight = FuturesUnordered::new();
    let mut first_error = None;

    for (index, item) in pending.by_ref().take(limit) {
        in_flight.push(tagged(index, f(item)));
    }

    while let Some((index, result)) = in_flight.next().await {
        match result {
            Ok(value) => results[index] = Some(value),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        if first_error.is_none() {
            if let Some((index, item)) = pending.next() {
                in_flight.push(tagged(index, f(item)));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results.into_iter().flatten().collect()),
    }
}
