//! End-to-end behaviour of the handler: queueing, overflow, timer flushes,
//! drains and retries, observed through a recording transport.

mod test_utils;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use rstest::rstest;
use splunk_logging::test_utils::RecordingTransport;
use splunk_logging::{Diagnostic, HandlerError, LogHandler, TransportError};

use test_utils::{builder, decode_events, delivered_messages, harness, harness_with, record};

#[rstest]
fn keep_ahead_never_drops_and_batches_by_capacity() {
    let h = harness(builder().with_queue_size(10).with_force_keep_ahead(true));

    for _ in 0..20 {
        h.handler.handle(record("same")).expect("blocking enqueue succeeds");
    }
    assert!(h.handler.wait_until_empty(None));

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let events = decode_events(request);
        assert_eq!(events.len(), 10);
        assert!(events.iter().all(|e| *e == events[0]));
    }
    assert_eq!(requests[0].body, requests[1].body);
    assert!(h.reporter.notices().iter().all(|d| !d.is_drop()));
}

#[rstest]
fn drop_policy_rejects_overflow_without_panicking() {
    let h = harness(builder().with_queue_size(10));

    let results: Vec<_> = (0..20)
        .map(|i| h.handler.handle(record(&format!("event {i}"))))
        .collect();
    assert!(h.handler.wait_until_empty(Some(Duration::from_secs(5))));

    let rejected = results
        .iter()
        .filter(|r| **r == Err(HandlerError::QueueFull))
        .count();
    assert!(rejected >= 10);
    assert!(h.reporter.count(|d| *d == Diagnostic::QueueFull) >= 10);
    let delivered = delivered_messages(&h.transport.requests());
    assert!(delivered.len() <= 10);
    assert_eq!(delivered.len() + rejected, 20);
}

#[rstest]
fn timer_flushes_single_event() {
    let h = harness(builder().with_flush_interval(Duration::from_millis(100)));

    h.handler.handle(record("tick")).expect("enqueue");
    assert!(h.transport.wait_for_requests(1, Duration::from_secs(5)));

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url,
        "https://splunk.example.com:8088/services/collector"
    );
    assert_eq!(requests[0].authorization, "Splunk TOKEN");
    assert_eq!(
        requests[0].body,
        r#"{"event":"tick","host":"test_host","index":"main","source":"app","sourcetype":"text","time":10}"#
    );
}

#[rstest]
fn timer_keeps_firing_after_each_flush() {
    let h = harness(builder().with_flush_interval(Duration::from_millis(50)));

    h.handler.handle(record("first")).expect("enqueue");
    assert!(h.transport.wait_for_requests(1, Duration::from_secs(5)));
    h.handler.handle(record("second")).expect("enqueue");
    assert!(h.transport.wait_for_requests(2, Duration::from_secs(5)));

    assert_eq!(
        delivered_messages(&h.transport.requests()),
        ["first", "second"]
    );
}

#[rstest]
fn overrides_apply_to_their_own_event_only() {
    let h = harness(builder().with_allow_overrides(true));

    h.handler.handle(record("before")).expect("enqueue");
    h.handler
        .handle(
            record("tagged")
                .with_override("_index", "audit")
                .with_override("_time", "12.5")
                .with_override("_host", 42),
        )
        .expect("enqueue");
    h.handler.handle(record("after")).expect("enqueue");
    assert!(h.handler.wait_until_empty(None));

    let events = decode_events(&h.transport.requests()[0]);
    let indexes: Vec<_> = events.iter().map(|e| e["index"].clone()).collect();
    assert_eq!(indexes, ["main", "audit", "main"]);
    assert_eq!(events[1]["time"], 12.5);
    assert_eq!(events[1]["host"], "42");
    assert_eq!(events[2]["host"], "test_host");
    assert_eq!(events[2]["time"], 10);
}

#[rstest]
fn overrides_are_ignored_unless_allowed() {
    let h = harness(builder());

    h.handler
        .handle(record("plain").with_override("_index", "audit"))
        .expect("enqueue");
    assert!(h.handler.wait_until_empty(None));

    let events = decode_events(&h.transport.requests()[0]);
    assert_eq!(events[0]["index"], "main");
}

#[rstest]
fn drain_covers_events_from_concurrent_producers() {
    let h = harness(builder().with_queue_size(0));
    let handler = Arc::new(h.handler);

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                for i in 0..50 {
                    handler
                        .handle(record(&format!("p{p}-{i}")))
                        .expect("unbounded enqueue");
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer thread");
    }
    assert!(handler.wait_until_empty(Some(Duration::from_secs(5))));

    let delivered = delivered_messages(&h.transport.requests());
    assert_eq!(delivered.len(), 200);
    for p in 0..4 {
        let prefix = format!("p{p}-");
        let own: Vec<_> = delivered
            .iter()
            .filter(|m| m.starts_with(&prefix))
            .collect();
        let expected: Vec<_> = (0..50).map(|i| format!("p{p}-{i}")).collect();
        assert_eq!(own, expected.iter().collect::<Vec<_>>());
    }
}

#[rstest]
fn drain_returns_while_producers_keep_enqueueing() {
    let h = harness(builder().with_queue_size(0));
    let handler = Arc::new(h.handler);
    let stop = Arc::new(AtomicBool::new(false));
    let counts: Arc<Vec<AtomicUsize>> =
        Arc::new((0..4).map(|_| AtomicUsize::new(0)).collect());

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let handler = Arc::clone(&handler);
            let stop = Arc::clone(&stop);
            let counts = Arc::clone(&counts);
            thread::spawn(move || {
                let mut i = 0;
                while !stop.load(Ordering::Acquire) && i < 100_000 {
                    handler
                        .handle(record(&format!("p{p}-{i}")))
                        .expect("unbounded enqueue");
                    i += 1;
                    counts[p].store(i, Ordering::Release);
                }
            })
        })
        .collect();

    while counts.iter().any(|c| c.load(Ordering::Acquire) < 10) {
        thread::sleep(Duration::from_millis(1));
    }
    let before: Vec<usize> = counts.iter().map(|c| c.load(Ordering::Acquire)).collect();
    let drained = handler.wait_until_empty(Some(Duration::from_secs(10)));
    let delivered: HashSet<String> = delivered_messages(&h.transport.requests())
        .into_iter()
        .collect();

    stop.store(true, Ordering::Release);
    for producer in producers {
        producer.join().expect("producer thread");
    }

    assert!(drained);
    for (p, &sent) in before.iter().enumerate() {
        for i in 0..sent {
            let message = format!("p{p}-{i}");
            assert!(delivered.contains(&message), "{message} missing after drain");
        }
    }
}

#[rstest]
fn oversized_drain_timeout_waits_without_deadline() {
    let h = harness(builder());
    h.handler.handle(record("patient")).expect("enqueue");

    assert!(h.handler.wait_until_empty(Some(Duration::MAX)));
    assert_eq!(delivered_messages(&h.transport.requests()), ["patient"]);
}

#[rstest]
fn oversized_flush_interval_keeps_worker_alive() {
    let h = harness(builder().with_flush_interval(Duration::MAX));

    h.handler.handle(record("first")).expect("enqueue");
    assert!(h.handler.wait_until_empty(None));
    h.handler.handle(record("second")).expect("enqueue");
    assert!(h.handler.wait_until_empty(None));

    assert_eq!(
        delivered_messages(&h.transport.requests()),
        ["first", "second"]
    );
    assert_eq!(h.reporter.count(|d| *d == Diagnostic::HandlerClosed), 0);
}

#[rstest]
fn exhausted_batch_is_dropped_not_requeued() {
    let h = harness_with(
        builder().with_retry_count(2),
        RecordingTransport::with_responses([
            Ok(503),
            Err(TransportError::Network("connection refused".into())),
            Ok(500),
        ]),
    );

    h.handler.handle(record("lost")).expect("enqueue");
    assert!(h.handler.wait_until_empty(None));
    h.handler.handle(record("kept")).expect("enqueue");
    assert!(h.handler.wait_until_empty(None));

    assert_eq!(h.transport.request_count(), 4);
    assert_eq!(delivered_messages(&h.transport.requests()[3..]), ["kept"]);
    assert_eq!(
        h.reporter.count(|d| matches!(d, Diagnostic::DeliveryFailed { events: 1, .. })),
        1
    );
    assert_eq!(
        h.reporter.count(|d| matches!(d, Diagnostic::DeliveryRetry { .. })),
        2
    );
}

#[rstest]
fn empty_drain_sends_nothing() {
    let h = harness(builder());
    assert!(h.handler.wait_until_empty(Some(Duration::from_millis(500))));
    assert_eq!(h.transport.request_count(), 0);
}

#[rstest]
fn dropping_handler_flushes_queue() {
    let h = harness(builder());
    h.handler.handle(record("bye")).expect("enqueue");
    let transport = Arc::clone(&h.transport);

    drop(h.handler);

    assert_eq!(delivered_messages(&transport.requests()), ["bye"]);
}
