//! Stage markers for the sampling profiler.
//!
//! Variants wrap each stage (building the sign array, taking logs,
//! multiplying, summing) in [`enter`]. Outside a profiling session that is a
//! single relaxed atomic load. While a [`Session`] is active, frames entered
//! on the session's owning thread are pushed onto a shared stack which the
//! sampler thread copies with [`snapshot`].
//!
//! Only one session can be active per process; [`Session::start`] blocks
//! until a session held by another thread is dropped, and fails with
//! [`NestedSession`] when the calling thread already holds one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::{const_mutex, Mutex, MutexGuard};
use thiserror::Error;

static ACTIVE: AtomicBool = AtomicBool::new(false);
static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static EXCLUSIVE: Mutex<()> = const_mutex(());
static STATE: Mutex<Option<State>> = const_mutex(None);

struct State {
    id: u64,
    owner: ThreadId,
    stack: Vec<&'static str>,
}

/// Pops its frame on drop. Inert when created outside a session.
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct FrameGuard {
    session: u64,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if self.session == 0 {
            return;
        }
        if let Some(state) = STATE.lock().as_mut() {
            if state.id == self.session {
                state.stack.pop();
            }
        }
    }
}

/// Mark entry into a named stage.
#[inline]
pub fn enter(name: &'static str) -> FrameGuard {
    if !ACTIVE.load(Ordering::Relaxed) {
        return FrameGuard { session: 0 };
    }
    enter_active(name)
}

#[cold]
fn enter_active(name: &'static str) -> FrameGuard {
    let mut state = STATE.lock();
    match state.as_mut() {
        Some(s) if s.owner == thread::current().id() => {
            s.stack.push(name);
            FrameGuard { session: s.id }
        }
        _ => FrameGuard { session: 0 },
    }
}

/// Copy of the current frame stack, outermost first.
///
/// `None` when no session is active.
pub fn snapshot() -> Option<Vec<&'static str>> {
    STATE.lock().as_ref().map(|s| s.stack.clone())
}

/// Whether a profiling session is currently recording.
pub fn is_active() -> bool {
    ACTIVE.load(Ordering::Acquire)
}

/// The calling thread already owns the active session.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("a profiling session is already active on this thread")]
pub struct NestedSession;

/// An active profiling session owned by the thread that started it.
pub struct Session {
    id: u64,
    _exclusive: MutexGuard<'static, ()>,
}

impl Session {
    /// Start recording frames entered on the current thread.
    ///
    /// Waits for a session held by another thread. The session lock is not
    /// reentrant, so a second start on the owning thread is refused instead.
    pub fn start() -> Result<Self, NestedSession> {
        let current = thread::current().id();
        if STATE.lock().as_ref().is_some_and(|s| s.owner == current) {
            return Err(NestedSession);
        }
        let exclusive = EXCLUSIVE.lock();
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        *STATE.lock() = Some(State {
            id,
            owner: current,
            stack: Vec::with_capacity(16),
        });
        ACTIVE.store(true, Ordering::Release);
        tracing::debug!(session = id, "frame recording started");
        Ok(Self {
            id,
            _exclusive: exclusive,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
        *STATE.lock() = None;
        tracing::debug!(session = self.id, "frame recording stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inert_without_session() {
        let _session_free = EXCLUSIVE.lock();
        let _g = enter("outer");
        assert!(snapshot().is_none());
    }

    #[test]
    fn test_nested_frames_push_and_pop() {
        let _session = Session::start().unwrap();
        {
            let _outer = enter("outer");
            {
                let _inner = enter("inner");
                assert_eq!(snapshot().unwrap(), vec!["outer", "inner"]);
            }
            assert_eq!(snapshot().unwrap(), vec!["outer"]);
        }
        assert_eq!(snapshot().unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn test_other_threads_are_ignored() {
        let _session = Session::start().unwrap();
        let _outer = enter("main");
        thread::spawn(|| {
            let _g = enter("elsewhere");
        })
        .join()
        .unwrap();
        assert_eq!(snapshot().unwrap(), vec!["main"]);
    }

    #[test]
    fn test_guard_outliving_session_is_harmless() {
        let stale = {
            let _session = Session::start().unwrap();
            enter("stale")
        };
        let _session = Session::start().unwrap();
        let _fresh = enter("fresh");
        drop(stale);
        assert_eq!(snapshot().unwrap(), vec!["fresh"]);
    }

    #[test]
    fn test_nested_start_on_owner_thread_is_refused() {
        let session = Session::start().unwrap();
        assert_eq!(Session::start().err(), Some(NestedSession));
        assert!(is_active());
        drop(session);
        let _again = Session::start().unwrap();
    }
}
