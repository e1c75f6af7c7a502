//! Synthetic producers feeding the batcher from dedicated threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use batcher::BatcherHandle;
use serde::Serialize;

/// Item emitted by a producer
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub producer: usize,
    pub seq: u64,
    /// Wall-clock emission time (ms since the Unix epoch)
    pub emitted_at_ms: u64,
}

/// What a producer did before it stopped
#[derive(Debug, Clone, Copy, Default)]
pub struct ProducerReport {
    pub emitted: u64,
    pub accepted: u64,
}

/// Producer settings shared by all threads
#[derive(Debug, Clone, Copy)]
pub struct ProducerSettings {
    /// Items per producer (None = until stopped)
    pub items: Option<u64>,
    /// Items per second per producer (None = unthrottled)
    pub rate: Option<u64>,
}

impl ProducerSettings {
    fn pause(&self) -> Option<Duration> {
        self.rate
            .filter(|rate| *rate > 0)
            .map(|rate| Duration::from_secs_f64(1.0 / rate as f64))
    }
}

/// Spawn one named thread per producer
pub fn spawn_producers(
    count: usize,
    settings: ProducerSettings,
    handle: &BatcherHandle<Event>,
    stop: &Arc<AtomicBool>,
) -> std::io::Result<Vec<JoinHandle<ProducerReport>>> {
    (0..count)
        .map(|producer| {
            let handle = handle.clone();
            let stop = Arc::clone(stop);
            thread::Builder::new()
                .name(format!("producer-{producer}"))
                .spawn(move || produce(producer, settings, &handle, &stop))
        })
        .collect()
}

fn produce(
    producer: usize,
    settings: ProducerSettings,
    handle: &BatcherHandle<Event>,
    stop: &AtomicBool,
) -> ProducerReport {
    let pause = settings.pause();
    let mut next_at = Instant::now();
    let mut report = ProducerReport::default();

    for seq in 0.. {
        if stop.load(Ordering::Relaxed) || settings.items.is_some_and(|items| seq >= items) {
            break;
        }

        let event = Event {
            producer,
            seq,
            emitted_at_ms: now_ms(),
        };
        report.emitted += 1;
        if handle.enqueue(event) {
            report.accepted += 1;
        }

        if let Some(pause) = pause {
            next_at += pause;
            let now = Instant::now();
            if next_at > now {
                thread::sleep(next_at - now);
            }
        }
    }

    tracing::debug!(
        producer,
        emitted = report.emitted,
        accepted = report.accepted,
        "Producer finished"
    );
    report
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
