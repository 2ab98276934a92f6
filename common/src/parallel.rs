//! Concurrency-limited parallel iteration utilities.
//!
//! Wraps rayon's `par_iter` to process items in parallel while limiting
//! the number of items in flight at once (e.g. to cap memory or IO pressure).

use rayon::prelude::*;

/// Runs `f` over `items` with at most `max_concurrent` items in flight.
///
/// Items are taken in order, `max_concurrent` at a time. With `max_concurrent == 1`
/// everything runs sequentially on the calling thread and rayon is not touched.
///
/// Stops at the first window that contains an error and returns it.
/// Items within the failing window may still be processed in parallel.
///
/// # Panics
///
/// Panics if `max_concurrent` is 0.
pub fn try_par_for_each_limited<T, E, F>(items: &[T], max_concurrent: usize, f: F) -> Result<(), E>
where
    T: Sync,
    E: Send,
    F: Fn(&T) -> Result<(), E> + Sync,
{
    assert!(max_concurrent > 0, "max_concurrent must be > 0");

    if max_concurrent == 1 {
        return items.iter().try_for_each(&f);
    }

    for window in items.chunks(max_concurrent) {
        window.par_iter().try_for_each(&f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_visits_every_item_once() {
        let items: Vec<usize> = (0..50).collect();
        let seen = Mutex::new(Vec::new());

        let result: Result<(), ()> = try_par_for_each_limited(&items, 4, |&x| {
            seen.lock().unwrap().push(x);
            Ok(())
        });

        assert!(result.is_ok());
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, items);
    }

    #[test]
    fn test_single_concurrency_keeps_order_on_caller_thread() {
        let items: Vec<usize> = (0..10).collect();
        let caller = std::thread::current().id();
        let seen = Mutex::new(Vec::new());

        let result: Result<(), ()> = try_par_for_each_limited(&items, 1, |&x| {
            assert_eq!(std::thread::current().id(), caller);
            seen.lock().unwrap().push(x);
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(seen.into_inner().unwrap(), items);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<usize> = vec![];
        let result: Result<(), &str> = try_par_for_each_limited(&items, 3, |_| Err("never"));
        assert!(result.is_ok());
    }

    #[test]
    #[should_panic(expected = "max_concurrent must be > 0")]
    fn test_zero_concurrency_panics() {
        let _: Result<(), ()> = try_par_for_each_limited(&[1, 2, 3], 0, |_| Ok(()));
    }

    #[test]
    fn test_concurrency_cap() {
        let items: Vec<i32> = (0..20).collect();
        let in_flight = AtomicUsize::new(0);
        let max_observed = AtomicUsize::new(0);

        let result: Result<(), ()> = try_par_for_each_limited(&items, 3, |_| {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_observed.fetch_max(current, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(result.is_ok());
        let max = max_observed.load(Ordering::SeqCst);
        assert!(max <= 3, "max in-flight was {max}, expected <= 3");
    }

    #[test]
    fn test_stops_after_failing_window() {
        let items: Vec<i32> = (0..10).collect();
        let processed = AtomicUsize::new(0);

        let result = try_par_for_each_limited(&items, 2, |&x| {
            processed.fetch_add(1, Ordering::SeqCst);
            if x == 3 {
                Err(format!("bad {x}"))
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Err("bad 3".to_string()));
        assert!(processed.load(Ordering::SeqCst) <= 4);
    }
}
