//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

use std::sync::Arc;

use course_schedule::db::repositories::LocalRepository;
use course_schedule::models::CourseOffering;
use course_schedule::services::ScheduleService;

/// Teacher 10 teaches offerings 1 and 2; offering 3 shares room 100 with offering 1;
/// offering 4 shares nothing; offering 5 has no credits.
pub fn seeded_offerings() -> Vec<CourseOffering> {
    vec![
        CourseOffering::new(1).with_teacher(10).with_room(100).with_credits(3),
        CourseOffering::new(2).with_teacher(10).with_room(200).with_credits(2),
        CourseOffering::new(3).with_teacher(30).with_room(100).with_credits(4),
        CourseOffering::new(4).with_teacher(40).with_room(400).with_credits(3),
        CourseOffering::new(5).with_teacher(50).with_room(500),
    ]
}

pub fn seeded_repository() -> Arc<LocalRepository> {
    Arc::new(LocalRepository::with_offerings(seeded_offerings()))
}

/// A service over [`seeded_repository`], returned with the repository for row counts.
pub fn seeded_service() -> (ScheduleService, Arc<LocalRepository>) {
    let repo = seeded_repository();
    (ScheduleService::new(repo.clone()), repo)
}
