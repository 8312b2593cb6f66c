use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use hushword_core::{AdmissionPolicy, BatchOrchestrator, JobReport, RedactError};

/// Sleep for `ms`, tracking how many jobs are in flight at once.
fn tracked_sleep(ms: u64, in_flight: &AtomicUsize, peak: &AtomicUsize) {
    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    peak.fetch_max(now, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(ms));
    in_flight.fetch_sub(1, Ordering::SeqCst);
}

fn batch_bounds<T>(reports: &[JobReport<T>], batch: usize) -> (Instant, Instant) {
    let members: Vec<_> = reports.iter().filter(|r| r.batch == Some(batch)).collect();
    let start = members.iter().map(|r| r.started_at).min().expect("non-empty batch");
    let finish = members.iter().map(|r| r.finished_at).max().expect("non-empty batch");
    (start, finish)
}

#[test]
fn twelve_jobs_run_as_five_five_two() {
    let orchestrator = BatchOrchestrator::new(5, AdmissionPolicy::BatchBarrier);
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    let reports = orchestrator.run((0..12u64).collect(), |_, j| {
        // Vary durations so a fast job would be tempted to start the next batch early.
        tracked_sleep(10 + (j % 5) * 10, &in_flight, &peak);
        Ok(j)
    });

    assert_eq!(reports.len(), 12);
    assert!(reports.iter().all(|r| r.is_ok()));
    assert!(peak.load(Ordering::SeqCst) <= 5);

    let sizes: Vec<usize> = (0..3)
        .map(|b| reports.iter().filter(|r| r.batch == Some(b)).count())
        .collect();
    assert_eq!(sizes, vec![5, 5, 2]);

    // Admission order: jobs 0-4, 5-9, 10-11.
    for r in &reports {
        assert_eq!(r.batch, Some(r.index / 5));
    }

    for b in 1..3 {
        let (_, prev_finish) = batch_bounds(&reports, b - 1);
        let (start, _) = batch_bounds(&reports, b);
        assert!(start >= prev_finish, "batch {b} started before batch {} ended", b - 1);
    }
}

#[test]
fn failures_and_panics_do_not_cancel_siblings() {
    let orchestrator = BatchOrchestrator::new(3, AdmissionPolicy::BatchBarrier);
    let reports = orchestrator.run((0..6usize).collect(), |_, j| match j {
        1 => Err(RedactError::Decode("bad header".into())),
        4 => panic!("job {j} exploded"),
        _ => Ok(j),
    });

    assert_eq!(reports.len(), 6);
    assert!(matches!(reports[1].result, Err(RedactError::Decode(_))));
    match &reports[4].result {
        Err(RedactError::JobPanicked(msg)) => assert!(msg.contains("exploded")),
        other => panic!("expected JobPanicked, got {other:?}"),
    }
    for i in [0, 2, 3, 5] {
        assert_eq!(reports[i].result.as_ref().ok(), Some(&i));
    }
}

#[test]
fn sliding_window_refills_slots_without_waiting() {
    let orchestrator = BatchOrchestrator::new(2, AdmissionPolicy::SlidingWindow);
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    // Job 0 is slow; jobs 1-4 are quick and should all finish before it.
    let reports = orchestrator.run((0..5usize).collect(), |_, j| {
        let ms = if j == 0 { 300 } else { 20 };
        tracked_sleep(ms, &in_flight, &peak);
        Ok(j)
    });

    assert_eq!(reports.len(), 5);
    assert!(reports.iter().all(|r| r.is_ok() && r.batch.is_none()));
    assert!(peak.load(Ordering::SeqCst) <= 2);

    let slow_finish = reports[0].finished_at;
    for r in &reports[1..] {
        assert!(r.finished_at <= slow_finish, "job {} waited on the slow job", r.index);
    }
}

#[test]
fn budget_larger_than_job_count_is_one_batch() {
    let orchestrator = BatchOrchestrator::new(8, AdmissionPolicy::BatchBarrier);
    let reports = orchestrator.run(vec!["a", "b", "c"], |_, s| Ok(s.len()));
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.batch == Some(0)));
}

#[test]
fn zero_budget_is_clamped_to_one() {
    let orchestrator = BatchOrchestrator::new(0, AdmissionPolicy::BatchBarrier);
    assert_eq!(orchestrator.budget(), 1);
    let reports = orchestrator.run(vec![1, 2], |_, n| Ok(n));
    assert_eq!(reports[1].batch, Some(1));
}
