// The single-flight guarantee: any number of concurrent callers for the
// same uncached key share exactly one underlying computation.
use sessionlens_runtime::AggregationCache;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn fifty_concurrent_callers_trigger_one_scan() {
    const CALLERS: usize = 50;

    let cache: Arc<AggregationCache<u64>> =
        Arc::new(AggregationCache::new(Duration::from_secs(120)));
    let scans = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let mut handles = Vec::new();
    for _ in 0..CALLERS {
        let cache = Arc::clone(&cache);
        let scans = Arc::clone(&scans);
        let barrier = Arc::clone(&barrier);

        handles.push(thread::spawn(move || {
            barrier.wait();
            let compute = || -> Result<u64, std::io::Error> {
                scans.fetch_add(1, Ordering::SeqCst);
                // long enough that every caller arrives while in flight
                thread::sleep(Duration::from_millis(50));
                Ok(42)
            };
            cache.get_or_compute("usage:total", false, compute).unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 42);
    }
    assert_eq!(scans.load(Ordering::SeqCst), 1);
}

#[test]
fn different_keys_compute_independently_under_concurrency() {
    let cache: Arc<AggregationCache<u64>> =
        Arc::new(AggregationCache::new(Duration::from_secs(120)));
    let scans = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for i in 0..10u64 {
        let cache = Arc::clone(&cache);
        let scans = Arc::clone(&scans);
        handles.push(thread::spawn(move || {
            let key = format!("usage:daily:{}", i % 2);
            let compute = || -> Result<u64, std::io::Error> {
                scans.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                Ok(i)
            };
            cache.get_or_compute(&key, false, compute).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // one computation per distinct key at most (plus none after caching)
    assert!(scans.load(Ordering::SeqCst) <= 2);
}
