//! Hand-off of work onto the browser's owning thread.
//!
//! A [`ShellBrowser`] never leaves the thread that created it. Other threads
//! hold a [`BrowserHandle`], which queues a closure, wakes the owning thread
//! through an optional hook and blocks until the closure has run. The owning
//! thread drains the queue with [`ShellBrowser::pump`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::browser::ShellBrowser;
use crate::error::{BrowserError, BrowserResult};
use crate::navigation::{NavigationOutcome, NavigationRequest};

pub(crate) type Task = Box<dyn FnOnce(&mut ShellBrowser) + Send>;
pub(crate) type WakeHook = Arc<dyn Fn() + Send + Sync>;

struct Queue {
    tasks: VecDeque<Task>,
    closed: bool,
}

pub(crate) struct Dispatcher {
    owner: ThreadId,
    queue: Mutex<Queue>,
    ready: Condvar,
    wake: Mutex<Option<WakeHook>>,
}

impl Dispatcher {
    pub(crate) fn for_current_thread() -> Self {
        Self {
            owner: thread::current().id(),
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
            wake: Mutex::new(None),
        }
    }

    pub(crate) fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.queue.lock().closed
    }

    pub(crate) fn set_wake_hook(&self, hook: Option<WakeHook>) {
        *self.wake.lock() = hook;
    }

    pub(crate) fn submit(&self, task: Task) -> BrowserResult<()> {
        {
            let mut queue = self.queue.lock();
            if queue.closed {
                return Err(BrowserError::ContextClosed);
            }
            queue.tasks.push_back(task);
        }
        self.ready.notify_one();
        // Called unlocked: the hook may itself post through a handle.
        let wake = self.wake.lock().clone();
        if let Some(wake) = wake {
            wake();
        }
        Ok(())
    }

    pub(crate) fn pop(&self) -> Option<Task> {
        self.queue.lock().tasks.pop_front()
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.queue.lock().tasks.len()
    }

    /// Block until work is queued, the queue closes or `timeout` elapses.
    /// Returns whether work is available.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut queue = self.queue.lock();
        while queue.tasks.is_empty() && !queue.closed {
            match deadline {
                Some(deadline) => {
                    if self.ready.wait_until(&mut queue, deadline).timed_out() {
                        break;
                    }
                }
                None => self.ready.wait(&mut queue),
            }
        }
        !queue.tasks.is_empty()
    }

    /// Refuse further work and drop whatever is still queued.
    ///
    /// Dropping a queued task drops its reply channel, which wakes the
    /// blocked caller with [`BrowserError::ContextClosed`].
    pub(crate) fn close(&self) {
        let dropped: Vec<Task> = {
            let mut queue = self.queue.lock();
            queue.closed = true;
            queue.tasks.drain(..).collect()
        };
        self.ready.notify_all();
        self.set_wake_hook(None);
        if !dropped.is_empty() {
            browser_debug!(count = dropped.len(), "dropping queued work on close");
        }
        drop(dropped);
    }
}

/// Thread-safe handle to a [`ShellBrowser`].
///
/// Calls from any thread other than the owning one are handed over and block
/// until the owning thread runs them; there is no timeout.
#[derive(Clone)]
pub struct BrowserHandle {
    dispatcher: Arc<Dispatcher>,
}

impl BrowserHandle {
    pub(crate) fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Whether the calling thread owns the browser.
    pub fn is_owning_context(&self) -> bool {
        self.dispatcher.is_owner()
    }

    /// Whether the browser has been closed.
    pub fn is_closed(&self) -> bool {
        self.dispatcher.is_closed()
    }

    /// Queue `f` to run on the owning thread without waiting for it.
    pub fn post<F>(&self, f: F) -> BrowserResult<()>
    where
        F: FnOnce(&mut ShellBrowser) + Send + 'static,
    {
        self.dispatcher.submit(Box::new(f))
    }

    /// Run `f` on the owning thread and wait for its result.
    ///
    /// Fails with [`BrowserError::OwningContextBusy`] when called from the
    /// owning thread, which would otherwise wait on itself.
    pub fn invoke<F, R>(&self, f: F) -> BrowserResult<R>
    where
        F: FnOnce(&mut ShellBrowser) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.dispatcher.is_owner() {
            return Err(BrowserError::OwningContextBusy);
        }
        let (tx, rx) = mpsc::sync_channel(1);
        self.post(move |browser| {
            let _ = tx.send(f(browser));
        })?;
        rx.recv().map_err(|_| BrowserError::ContextClosed)
    }

    /// Navigate from any thread.
    ///
    /// From another thread this blocks until the navigation has finished on
    /// the owning thread. On the owning thread the request is queued behind
    /// the current work and [`NavigationOutcome::Queued`] is returned; call
    /// [`ShellBrowser::navigate`] directly to navigate inline.
    pub fn navigate(&self, request: NavigationRequest<'_>) -> BrowserResult<NavigationOutcome> {
        let request = request.into_owned();
        if self.dispatcher.is_owner() {
            self.post(move |browser| {
                if let Err(_err) = browser.navigate(request) {
                    browser_warn!("queued navigation failed: {}", _err);
                }
            })?;
            return Ok(NavigationOutcome::Queued);
        }
        self.invoke(move |browser| browser.navigate(request))?
    }
}

impl fmt::Debug for BrowserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserHandle")
            .field("owner", &self.dispatcher.owner)
            .field("closed", &self.is_closed())
            .finish()
    }
}
