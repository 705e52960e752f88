// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use yare::parameterized;

fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Box<dyn FnOnce() + Send>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let make = move |n: u32| -> Box<dyn FnOnce() + Send> {
        let sink = Arc::clone(&sink);
        Box::new(move || sink.lock().unwrap().push(n))
    };
    (log, make)
}

#[test]
fn new_session_is_live() {
    let destroyer = SessionDestroyer::new("visitor-1");
    assert_eq!(destroyer.key(), "visitor-1");
    assert!(!destroyer.is_destroyed());
}

#[test]
fn destroy_runs_callbacks_in_registration_order() {
    let destroyer = SessionDestroyer::new("s");
    let (log, make) = recorder();
    for n in 1..=3 {
        destroyer.add(make(n));
    }

    assert!(destroyer.destroy());
    assert!(destroyer.is_destroyed());
    assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
}

#[parameterized(
    once = { 1 },
    twice = { 2 },
    many = { 10 },
)]
fn destroy_is_idempotent(calls: usize) {
    let destroyer = SessionDestroyer::new("s");
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    destroyer.add(move || {
        c.fetch_add(1, Ordering::SeqCst);
    });

    let first_wins: Vec<bool> = (0..calls).map(|_| destroyer.destroy()).collect();
    assert!(first_wins[0]);
    assert!(first_wins[1..].iter().all(|won| !won));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(destroyer.is_destroyed());
}

#[test]
fn add_after_destroy_runs_immediately() {
    let destroyer = SessionDestroyer::new("s");
    destroyer.destroy();

    let (log, make) = recorder();
    destroyer.add(make(7));
    assert_eq!(*log.lock().unwrap(), vec![7]);

    destroyer.destroy();
    assert_eq!(*log.lock().unwrap(), vec![7]);
}

#[test]
fn concurrent_destroy_runs_each_callback_once() {
    let destroyer = Arc::new(SessionDestroyer::new("s"));
    let count = Arc::new(AtomicUsize::new(0));
    for _ in 0..5 {
        let c = Arc::clone(&count);
        destroyer.add(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
    }

    let winners: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| destroyer.destroy()))
            .collect();
        handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum()
    });

    assert_eq!(winners, 1);
    assert_eq!(count.load(Ordering::SeqCst), 5);
    assert!(destroyer.is_destroyed());
}

#[test]
fn teardown_may_query_destroyer() {
    let destroyer = Arc::new(SessionDestroyer::new("s"));
    let seen = Arc::new(AtomicBool::new(false));
    let (d, s) = (Arc::clone(&destroyer), Arc::clone(&seen));
    destroyer.add(move || s.store(d.is_destroyed(), Ordering::SeqCst));

    destroyer.destroy();
    assert!(seen.load(Ordering::SeqCst));
}
