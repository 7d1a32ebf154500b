// Application state management
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::audio::Player;
use crate::library::SoundLibrary;
use crate::settings::AppSettings;
use crate::smtc::SmtcManager;
use crate::timer::SleepTimer;
use crate::wakelock::WakeLock;

pub struct AppState {
    pub player: Arc<Player>,
    pub timer: Arc<Mutex<SleepTimer>>,
    pub library: Arc<Mutex<SoundLibrary>>,
    pub settings: Arc<Mutex<AppSettings>>,
    pub smtc: Arc<Mutex<Option<SmtcManager>>>,
    pub wake_lock: Arc<WakeLock>,
    pub app_dir: PathBuf,
}

impl AppState {
    pub fn new(
        player: Player,
        library: SoundLibrary,
        settings: AppSettings,
        smtc: Option<SmtcManager>,
        app_dir: PathBuf,
    ) -> Self {
        Self {
            player: Arc::new(player),
            timer: Arc::new(Mutex::new(SleepTimer::new())),
            library: Arc::new(Mutex::new(library)),
            settings: Arc::new(Mutex::new(settings)),
            smtc: Arc::new(Mutex::new(smtc)),
            wake_lock: Arc::new(WakeLock::new()),
            app_dir,
        }
    }

    /// The sounds directory: the configured override or `<app-data>/sounds`
    pub fn sounds_dir(&self) -> PathBuf {
        self.settings
            .lock()
            .unwrap()
            .sounds_dir
            .clone()
            .unwrap_or_else(|| self.app_dir.join("sounds"))
    }
}
