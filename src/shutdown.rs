use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

type RestoreHook = Box<dyn FnOnce() + Send>;

struct Inner {
    triggered: AtomicBool,
    notify: Notify,
    restore: Mutex<Option<RestoreHook>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let hook = self.restore.get_mut().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

/// Process-wide stop signal shared by the input and render tasks.
///
/// The terminal restore hook runs at most once: on the first call to
/// [`Shutdown::restore_terminal`], or when the last handle is dropped.
#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                triggered: AtomicBool::new(false),
                notify: Notify::new(),
                restore: Mutex::new(None),
            }),
        }
    }

    pub fn with_restore(hook: impl FnOnce() + Send + 'static) -> Self {
        let shutdown = Self::new();
        shutdown.set_restore(hook);
        shutdown
    }

    /// Install the hook that gives the terminal back to the user.
    pub fn set_restore(&self, hook: impl FnOnce() + Send + 'static) {
        *self.inner.restore.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(hook));
    }

    /// Request shutdown. Returns `true` only for the first caller.
    pub fn trigger(&self) -> bool {
        if self.inner.triggered.swap(true, Ordering::SeqCst) {
            return false;
        }
        log::info!("shutdown requested");
        self.inner.notify.notify_waiters();
        true
    }

    /// Check if shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_triggered() {
            return;
        }
        notified.await;
    }

    /// Run the restore hook if it has not run yet. Returns `true` if it ran now.
    pub fn restore_terminal(&self) -> bool {
        let hook = self
            .inner
            .restore
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }
}
