//! Process-wide Ctrl-C handling.
//!
//! Listening for SIGINT replaces its default behaviour for the rest of the
//! process, so one listener serves every command: an interrupt cancels the
//! task in progress, and exits when nothing is running.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tokio::sync::Notify;
use tracing::debug;

/// Exit status of a process stopped by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Default)]
pub struct Interrupts {
    busy: AtomicBool,
    cancel: Notify,
}

impl Interrupts {
    /// The process-wide instance. The Ctrl-C listener starts on first use.
    pub fn global() -> &'static Interrupts {
        static INTERRUPTS: OnceLock<Interrupts> = OnceLock::new();

        let mut fresh = false;
        let interrupts = INTERRUPTS.get_or_init(|| {
            fresh = true;
            Interrupts::default()
        });
        if fresh {
            tokio::spawn(listen(interrupts));
        }
        interrupts
    }

    /// Handle one interrupt. Returns true when the process should exit.
    pub fn interrupt(&self) -> bool {
        if self.busy.load(Ordering::SeqCst) {
            self.cancel.notify_waiters();
            false
        } else {
            true
        }
    }

    /// Run `work` to completion, or return `None` if an interrupt cancels it.
    pub async fn cancellable<T>(&self, work: impl Future<Output = T>) -> Option<T> {
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();
        self.busy.store(true, Ordering::SeqCst);

        let outcome = tokio::select! {
            value = work => Some(value),
            _ = cancelled => None,
        };

        self.busy.store(false, Ordering::SeqCst);
        outcome
    }
}

async fn listen(interrupts: &'static Interrupts) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if interrupts.interrupt() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        debug!("Interrupt cancelled the running task");
    }
}
