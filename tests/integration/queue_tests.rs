//! Sample queue under real thread concurrency.

use futures_lite::future::block_on;
use motorctl::error::QueueError;
use motorctl::queue::SampleQueue;

#[test]
fn producer_thread_to_blocked_consumer_preserves_order() {
    const COUNT: i32 = 2_000;
    let q: SampleQueue<i32, 8> = SampleQueue::new();

    std::thread::scope(|s| {
        s.spawn(|| {
            for v in 0..COUNT {
                // The producer itself never blocks; the test retries so
                // that every value is eventually delivered.
                while q.put(v) == Err(QueueError::Full) {
                    std::thread::yield_now();
                }
            }
        });

        for expected in 0..COUNT {
            assert_eq!(block_on(q.get()), expected);
        }
    });

    assert!(q.is_empty());
}

#[test]
fn consumer_suspends_until_put() {
    let q: SampleQueue<u16, 4> = SampleQueue::new();

    std::thread::scope(|s| {
        let consumer = s.spawn(|| block_on(q.get()));
        std::thread::sleep(std::time::Duration::from_millis(20));
        q.put(2400).unwrap();
        assert_eq!(consumer.join().unwrap(), 2400);
    });
}

#[test]
fn lost_count_matches_rejected_puts() {
    let q: SampleQueue<u16, 4> = SampleQueue::new();
    let rejected = (0..10).filter(|&v| q.put(v).is_err()).count();
    assert_eq!(rejected, 6);
    assert_eq!(q.lost_count(), 6);
    assert_eq!(block_on(q.peek()), Some(0));
}
