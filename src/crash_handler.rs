// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::crash_info::{CrashRecord, CrashRecordBuilder};
use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::shared::configuration::CrashReporterConfiguration;
use crate::sinks::http_client::{HttpClient, HyperClient};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, PanicHookInfo};
use std::ptr;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::atomic::{AtomicPtr, AtomicU8};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

// Crash-cycle states. One cycle runs per process: Idle -> Capturing ->
// Dispatching -> (Exiting ->) Done, and Done is terminal. A crash arriving
// while the state is not Idle is not observed by the reporter and falls
// through to the previously installed hook (host-default handling).
const STATE_IDLE: u8 = 0;
const STATE_CAPTURING: u8 = 1;
const STATE_DISPATCHING: u8 = 2;
const STATE_EXITING: u8 = 3;
const STATE_DONE: u8 = 4;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync>;
static PREVIOUS_PANIC_HOOK: AtomicPtr<PanicHook> = AtomicPtr::new(ptr::null_mut());

/// Result of one completed crash cycle.
#[derive(Debug)]
pub struct CrashCycleOutcome {
    pub report: DispatchReport,
    /// Exit code the controller wants the process terminated with; `None`
    /// when `exit_on_crash` is disabled.
    pub exit_code: Option<i32>,
}

/// Process-wide crash reporting controller.
///
/// Owns the configuration and the dispatcher, registers the global panic
/// hook through an explicit [`install`](Self::install) /
/// [`uninstall`](Self::uninstall) pair, and drives the crash cycle:
/// snapshot, fan-out to sinks, optional process exit once dispatch settled.
pub struct CrashReporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    config: CrashReporterConfiguration,
    dispatcher: Dispatcher,
    state: AtomicU8,
    started_at: Instant,
}

impl CrashReporter {
    pub fn new(config: CrashReporterConfiguration) -> Self {
        Self::with_http_client(config, Arc::new(HyperClient))
    }

    /// Plugs a custom transport behind the HTTP sink.
    pub fn with_http_client(
        config: CrashReporterConfiguration,
        client: Arc<dyn HttpClient + Send + Sync>,
    ) -> Self {
        let dispatcher = Dispatcher::from_configuration(&config, client);
        Self {
            inner: Arc::new(ReporterInner {
                config,
                dispatcher,
                state: AtomicU8::new(STATE_IDLE),
                started_at: Instant::now(),
            }),
        }
    }

    /// Registers the global panic hook, storing the previous hook so it can
    /// be chained and later restored.
    ///
    /// PRECONDITIONS:
    ///     No crash reporter hook is currently installed, from this reporter
    ///     or any other.
    /// SAFETY:
    ///     Crash-reporting functions are not guaranteed to be reentrant.
    ///     No other crash-reporter functions should be called concurrently.
    /// ATOMICITY:
    ///     This function uses a swap on an atomic pointer.
    pub fn install(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            PREVIOUS_PANIC_HOOK.load(SeqCst).is_null(),
            "A crash reporter hook is already installed"
        );

        let old_hook = panic::take_hook();
        PREVIOUS_PANIC_HOOK.store(Box::into_raw(Box::new(old_hook)), SeqCst);

        let inner = Arc::clone(&self.inner);
        panic::set_hook(Box::new(move |panic_info| {
            let error = normalized_error_text(panic_info);
            let exit_code = inner.on_crash(error).and_then(|outcome| outcome.exit_code);
            call_previous_panic_hook(panic_info);
            // Termination was deferred past dispatch settling and the
            // previous hook; it is not cancellable from here on.
            if let Some(code) = exit_code {
                std::process::exit(code);
            }
        }));
        Ok(())
    }

    /// Restores the hook that was in place before [`install`](Self::install).
    ///
    /// PRECONDITIONS:
    ///     A crash reporter hook is currently installed.
    /// SAFETY:
    ///     Crash-reporting functions are not guaranteed to be reentrant.
    ///     No other crash-reporter functions should be called concurrently.
    /// ATOMICITY:
    ///     This function uses a swap on an atomic pointer.
    pub fn uninstall(&self) -> anyhow::Result<()> {
        let old_hook_ptr = PREVIOUS_PANIC_HOOK.swap(ptr::null_mut(), SeqCst);
        anyhow::ensure!(
            !old_hook_ptr.is_null(),
            "No crash reporter hook is installed"
        );
        let _ = panic::take_hook();
        // Safety: the pointer can only come from Box::into_raw in install.
        let old_hook = unsafe { Box::from_raw(old_hook_ptr) };
        panic::set_hook(*old_hook);
        Ok(())
    }

    /// Runs one crash cycle for an already-normalized error. This is the
    /// entry point the installed hook uses; it is public so hosts with their
    /// own fatal-error interception can drive the reporter directly.
    ///
    /// Returns `None` when a cycle is already in flight or has completed:
    /// the interception point is single-shot per process.
    pub fn on_crash(&self, error: String) -> Option<CrashCycleOutcome> {
        self.inner.on_crash(error)
    }
}

impl ReporterInner {
    fn on_crash(&self, error: String) -> Option<CrashCycleOutcome> {
        if self
            .state
            .compare_exchange(STATE_IDLE, STATE_CAPTURING, SeqCst, SeqCst)
            .is_err()
        {
            debug!("Crash intercepted outside the Idle state, deferring to host handling");
            return None;
        }

        let record = self.build_record(error);
        self.state.store(STATE_DISPATCHING, SeqCst);
        let report = self.dispatch(Arc::new(record));
        info!(
            sinks = report.len(),
            all_succeeded = report.all_succeeded(),
            "Crash dispatch settled"
        );

        let exit_code = if self.config.exit_on_crash() {
            self.state.store(STATE_EXITING, SeqCst);
            Some(self.config.exit_code())
        } else {
            None
        };
        self.state.store(STATE_DONE, SeqCst);
        Some(CrashCycleOutcome { report, exit_code })
    }

    // Snapshot construction cannot fail; missing ambient facts degrade to
    // sentinels inside the builder.
    fn build_record(&self, error: String) -> CrashRecord {
        CrashRecordBuilder::new()
            .with_uptime(self.started_at.elapsed().as_secs_f64())
            .with_error(error)
            .build()
    }

    // The crash may originate on a tokio worker thread, where blocking on a
    // nested runtime panics. The cycle therefore always runs on its own
    // thread; the hook is allowed to block until it joins.
    fn dispatch(&self, record: Arc<CrashRecord>) -> DispatchReport {
        std::thread::scope(|scope| {
            scope
                .spawn(move || self.dispatch_blocking(record))
                .join()
                .unwrap_or_else(|_| {
                    error!("Dispatch thread panicked, skipping sink dispatch");
                    DispatchReport::empty()
                })
        })
    }

    fn dispatch_blocking(&self, record: Arc<CrashRecord>) -> DispatchReport {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(async {
                let report = self.dispatcher.run_all(record).await;
                if self.config.exit_on_crash() {
                    // One extra scheduling tick so i/o queued behind the
                    // sinks can flush before the process is torn down.
                    tokio::task::yield_now().await;
                }
                report
            }),
            Err(e) => {
                error!(error = %e, "Failed to build dispatch runtime, skipping sink dispatch");
                DispatchReport::empty()
            }
        }
    }
}

fn call_previous_panic_hook(panic_info: &PanicHookInfo<'_>) {
    let old_hook_ptr = PREVIOUS_PANIC_HOOK.load(SeqCst);
    if !old_hook_ptr.is_null() {
        // Safety: this pointer can only come from Box::into_raw in install.
        // We borrow it without taking ownership so it remains valid for
        // future calls.
        unsafe {
            let old_hook = &*old_hook_ptr;
            old_hook(panic_info);
        }
    }
}

/// Normalizes a panic into report text: the payload message plus the
/// captured backtrace when one is available, the message alone otherwise.
pub fn normalized_error_text(panic_info: &PanicHookInfo<'_>) -> String {
    let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    let message = match panic_info.location() {
        Some(location) => format!("panicked at {location}: {message}"),
        None => format!("panicked: {message}"),
    };

    let backtrace = Backtrace::force_capture();
    match backtrace.status() {
        BacktraceStatus::Captured => format!("{message}\nstack backtrace:\n{backtrace}"),
        _ => message,
    }
}
