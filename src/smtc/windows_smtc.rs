// Windows SMTC implementation using windows-rs crate

use std::sync::{Arc, Mutex};
use windows::Foundation::TypedEventHandler;
use windows::Media::{
    MediaPlaybackStatus, MediaPlaybackType, SystemMediaTransportControls,
    SystemMediaTransportControlsButton, SystemMediaTransportControlsButtonPressedEventArgs,
};
use windows::Media::Playback::MediaPlayer;

/// Button events from SMTC; a single looping track needs no next/previous
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtcButton {
    Play,
    Pause,
    Stop,
}

type ButtonCallback = Arc<Mutex<Option<Box<dyn Fn(SmtcButton) + Send + Sync + 'static>>>>;

/// Manager for Windows System Media Transport Controls
pub struct SmtcManager {
    _media_player: MediaPlayer,
    smtc: SystemMediaTransportControls,
    button_callback: ButtonCallback,
}

impl SmtcManager {
    /// Create a new SMTC manager
    pub fn new() -> Result<Self, String> {
        // A MediaPlayer is the documented way to get at SMTC
        let media_player = MediaPlayer::new()
            .map_err(|e| format!("Failed to create MediaPlayer: {}", e))?;

        // Disable the command manager so we drive SMTC manually
        media_player.CommandManager()
            .map_err(|e| format!("Failed to get CommandManager: {}", e))?
            .SetIsEnabled(false)
            .map_err(|e| format!("Failed to disable CommandManager: {}", e))?;

        let smtc = media_player.SystemMediaTransportControls()
            .map_err(|e| format!("Failed to get SMTC: {}", e))?;

        smtc.SetIsEnabled(true)
            .map_err(|e| format!("Failed to enable SMTC: {}", e))?;

        smtc.SetIsPlayEnabled(true)
            .map_err(|e| format!("Failed to enable play button: {}", e))?;
        smtc.SetIsPauseEnabled(true)
            .map_err(|e| format!("Failed to enable pause button: {}", e))?;
        smtc.SetIsStopEnabled(true)
            .map_err(|e| format!("Failed to enable stop button: {}", e))?;

        let button_callback: ButtonCallback = Arc::new(Mutex::new(None));

        let callback_clone = button_callback.clone();
        let handler = TypedEventHandler::new(
            move |_sender: &Option<SystemMediaTransportControls>,
                  args: &Option<SystemMediaTransportControlsButtonPressedEventArgs>| {
                if let Some(args) = args {
                    if let Ok(button) = args.Button() {
                        let smtc_button = match button {
                            SystemMediaTransportControlsButton::Play => Some(SmtcButton::Play),
                            SystemMediaTransportControlsButton::Pause => Some(SmtcButton::Pause),
                            SystemMediaTransportControlsButton::Stop => Some(SmtcButton::Stop),
                            _ => None,
                        };

                        if let Some(btn) = smtc_button {
                            if let Ok(guard) = callback_clone.lock() {
                                if let Some(ref cb) = *guard {
                                    cb(btn);
                                }
                            }
                        }
                    }
                }
                Ok(())
            },
        );

        smtc.ButtonPressed(&handler)
            .map_err(|e| format!("Failed to register button handler: {}", e))?;

        Ok(Self {
            _media_player: media_player,
            smtc,
            button_callback,
        })
    }

    /// Show the current track on the lock-screen surface
    pub fn update_metadata(&self, title: &str) -> Result<(), String> {
        let updater = self.smtc.DisplayUpdater()
            .map_err(|e| format!("Failed to get display updater: {}", e))?;

        updater.SetType(MediaPlaybackType::Music)
            .map_err(|e| format!("Failed to set type: {}", e))?;

        let music_props = updater.MusicProperties()
            .map_err(|e| format!("Failed to get music properties: {}", e))?;

        music_props.SetTitle(&windows::core::HSTRING::from(title))
            .map_err(|e| format!("Failed to set title: {}", e))?;
        music_props.SetArtist(&windows::core::HSTRING::from("Hushaby"))
            .map_err(|e| format!("Failed to set artist: {}", e))?;
        music_props.SetAlbumTitle(&windows::core::HSTRING::from("Sleep Sounds"))
            .map_err(|e| format!("Failed to set album: {}", e))?;

        updater.Update()
            .map_err(|e| format!("Failed to update display: {}", e))?;

        Ok(())
    }

    /// Set playback status (playing or paused)
    pub fn set_playback_status(&self, is_playing: bool) -> Result<(), String> {
        let status = if is_playing {
            MediaPlaybackStatus::Playing
        } else {
            MediaPlaybackStatus::Paused
        };

        self.smtc.SetPlaybackStatus(status)
            .map_err(|e| format!("Failed to set playback status: {}", e))
    }

    /// Set callback for button presses
    pub fn set_button_callback<F>(&self, callback: F) -> Result<(), String>
    where
        F: Fn(SmtcButton) + Send + Sync + 'static,
    {
        let mut guard = self.button_callback.lock()
            .map_err(|e| format!("Failed to lock callback: {}", e))?;
        *guard = Some(Box::new(callback));
        Ok(())
    }
}

// Ensure SmtcManager can be sent between threads
unsafe impl Send for SmtcManager {}
unsafe impl Sync for SmtcManager {}
