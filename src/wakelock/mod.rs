// Display wake lock
// Best-effort "keep the screen on while playing". A dedicated worker thread
// owns the platform state because the Windows call applies per thread.
// Failures are logged and swallowed; playback and the sleep timer never
// depend on this succeeding.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread;

enum WakeRequest {
    Acquire,
    Release,
}

pub struct WakeLock {
    requests: Sender<WakeRequest>,
}

impl WakeLock {
    pub fn new() -> Self {
        let (requests, receiver) = unbounded();

        if let Err(e) = thread::Builder::new()
            .name("wakelock".into())
            .spawn(move || worker(receiver))
        {
            eprintln!("[WakeLock] Failed to start worker: {}", e);
        }

        Self { requests }
    }

    /// Keep the display on; no-op when already held
    pub fn acquire(&self) {
        let _ = self.requests.send(WakeRequest::Acquire);
    }

    /// Let the display sleep again; no-op when not held
    pub fn release(&self) {
        let _ = self.requests.send(WakeRequest::Release);
    }
}

fn worker(receiver: Receiver<WakeRequest>) {
    let mut held = false;

    while let Ok(request) = receiver.recv() {
        match request {
            WakeRequest::Acquire => {
                if !held && apply(true) {
                    held = true;
                    eprintln!("[WakeLock] Display keep-awake acquired");
                }
            }
            WakeRequest::Release => {
                if held {
                    apply(false);
                    held = false;
                    eprintln!("[WakeLock] Display keep-awake released");
                }
            }
        }
    }

    if held {
        apply(false);
    }
}

#[cfg(windows)]
fn apply(keep_awake: bool) -> bool {
    use windows::Win32::System::Power::{
        SetThreadExecutionState, ES_CONTINUOUS, ES_DISPLAY_REQUIRED, ES_SYSTEM_REQUIRED,
    };

    let state = if keep_awake {
        ES_CONTINUOUS | ES_DISPLAY_REQUIRED | ES_SYSTEM_REQUIRED
    } else {
        ES_CONTINUOUS
    };

    let previous = unsafe { SetThreadExecutionState(state) };
    if previous.0 == 0 {
        eprintln!("[WakeLock] SetThreadExecutionState failed");
        false
    } else {
        true
    }
}

#[cfg(not(windows))]
fn apply(keep_awake: bool) -> bool {
    if keep_awake {
        eprintln!("[WakeLock] Keep-awake not supported on this platform");
    }
    false
}
