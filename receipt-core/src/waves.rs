//! Bounded wave runner.
//!
//! Items are split into groups of `wave_size`; every future in a group is
//! awaited (success or failure) before the next group starts. At most
//! `wave_size` units are ever in flight.

use futures_util::future::join_all;
use std::future::Future;

/// Files extracted concurrently per wave.
pub const DEFAULT_WAVE_SIZE: usize = 3;

/// Run `f` over `items` in waves. Results come back in input order.
pub async fn run_in_waves<T, R, F, Fut>(items: Vec<T>, wave_size: usize, mut f: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let wave_size = wave_size.max(1);
    let total = items.len();
    let mut out = Vec::with_capacity(total);
    let mut iter = items.into_iter().peekable();
    let mut wave_no = 0usize;

    while iter.peek().is_some() {
        wave_no += 1;
        let wave: Vec<Fut> = iter.by_ref().take(wave_size).map(&mut f).collect();
        tracing::debug!(wave = wave_no, size = wave.len(), total, "starting wave");
        out.extend(join_all(wave).await);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let out = run_in_waves(vec![5u64, 1, 3, 2], 3, |n| async move {
            tokio::time::sleep(Duration::from_millis(n)).await;
            n * 10
        })
        .await;
        assert_eq!(out, vec![50, 10, 30, 20]);
    }

    #[tokio::test]
    async fn test_never_exceeds_wave_size() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let out = run_in_waves((0..8).collect(), 3, |i: usize| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await;

        assert_eq!(out.len(), 8);
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_later_waves() {
        let out: Vec<Result<usize, String>> = run_in_waves((0..5).collect(), 2, |i: usize| async move {
            if i == 1 { Err(format!("file {i} failed")) } else { Ok(i) }
        })
        .await;
        assert_eq!(out.len(), 5);
        assert!(out[1].is_err());
        assert_eq!(out[4], Ok(4));
    }

    #[tokio::test]
    async fn test_zero_wave_size_runs_one_at_a_time() {
        let out = run_in_waves(vec![1, 2], 0, |n: i32| async move { n }).await;
        assert_eq!(out, vec![1, 2]);
    }
}
