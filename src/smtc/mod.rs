// Windows System Media Transport Controls (SMTC) integration
// Lock-screen style now-playing surface and media key support on Windows.
// Everything here is best effort: failures are logged by callers and never
// interrupt playback or the sleep timer.

#[cfg(windows)]
mod windows_smtc;

#[cfg(windows)]
pub use windows_smtc::*;

// Stub for non-Windows platforms
#[cfg(not(windows))]
mod stub {
    pub struct SmtcManager;

    impl SmtcManager {
        pub fn new() -> Result<Self, String> {
            Ok(Self)
        }

        pub fn update_metadata(&self, _title: &str) -> Result<(), String> {
            Ok(())
        }

        pub fn set_playback_status(&self, _is_playing: bool) -> Result<(), String> {
            Ok(())
        }

        pub fn set_button_callback<F>(&self, _callback: F) -> Result<(), String>
        where
            F: Fn(SmtcButton) + Send + Sync + 'static,
        {
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SmtcButton {
        Play,
        Pause,
        Stop,
    }
}

#[cfg(not(windows))]
pub use stub::*;
