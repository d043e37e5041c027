//! SIGINT/SIGTERM handling.
//!
//! The handler only flips an atomic flag. A watcher thread polls the flag and
//! interrupts the ring channel, which is not async-signal-safe to touch from
//! the handler itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use touch_core::RingChannel;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

#[cfg(unix)]
extern "C" fn on_signal(_signum: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs the signal handlers and starts the watcher for `channel`.
pub fn install(channel: &Arc<RingChannel>) {
    #[cfg(unix)]
    {
        let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        for signum in [libc::SIGINT, libc::SIGTERM] {
            // SAFETY: the handler only performs an atomic store, which is
            // async-signal-safe.
            #[allow(unsafe_code)]
            let previous = unsafe { libc::signal(signum, handler) };
            if previous == libc::SIG_ERR {
                warn!(signum, "Failed to install signal handler");
            }
        }
    }

    let channel = Arc::clone(channel);
    thread::spawn(move || loop {
        if requested() {
            info!("Shutdown requested; interrupting reader");
            channel.interrupt();
            break;
        }
        // The run finished on its own.
        if channel.is_interrupted() {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    });
}
