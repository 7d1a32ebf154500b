// Hushaby - looping ambient-sound player for helping babies fall asleep
// Module declarations
mod audio;
mod commands;
mod library;
mod settings;
mod smtc;
mod state;
mod timer;
mod wakelock;

use std::time::{Duration, Instant};

use audio::Player;
use library::{SoundLibrary, SoundScanner};
use settings::AppSettings;
use smtc::{SmtcButton, SmtcManager};
use state::AppState;
use tauri::{AppHandle, Emitter, Manager};
use timer::TimerEvent;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // Get app data directory
            let app_dir = app.path().app_data_dir()
                .expect("Failed to get app data directory");

            let settings = AppSettings::load(&app_dir);

            // Build the track list from the sounds directory
            let sounds_dir = settings
                .sounds_dir
                .clone()
                .unwrap_or_else(|| app_dir.join("sounds"));
            let tracks = SoundScanner::scan(&sounds_dir).unwrap_or_else(|e| {
                eprintln!("[Library] Initial scan failed: {}", e);
                Vec::new()
            });
            eprintln!("[Library] {} sounds in {:?}", tracks.len(), sounds_dir);
            let library = SoundLibrary::new(tracks);

            // Initialize audio player at the persisted volume
            let player = Player::new(settings.playback.volume)
                .expect("Failed to initialize audio player");

            // Restore the previous selection without starting playback
            if let Some(track_id) = settings.playback.last_track_id {
                if let Some(track) = library.get(track_id) {
                    if let Err(e) = player.select(track.id, &track.path) {
                        eprintln!("[Player] Could not restore last sound: {}", e);
                    }
                }
            }

            // Lock-screen media surface is best effort
            let smtc_manager = match SmtcManager::new() {
                Ok(manager) => Some(manager),
                Err(e) => {
                    eprintln!("[Smtc] Unavailable: {}", e);
                    None
                }
            };

            let app_state = AppState::new(player, library, settings, smtc_manager, app_dir);
            wire_smtc_buttons(&app_state, app.handle().clone());
            app.manage(app_state);

            spawn_timer_driver(app.handle().clone());
            spawn_progress_driver(app.handle().clone());

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::select_and_play,
            commands::toggle_play_pause,
            commands::stop_playback,
            commands::set_volume,
            commands::seek,
            commands::get_player_state,
            commands::arm_sleep_timer,
            commands::cancel_sleep_timer,
            commands::get_timer_state,
            commands::get_tracks,
            commands::rescan_library,
            commands::choose_sounds_dir,
            commands::set_theme,
            commands::set_fade_out_enabled,
            commands::get_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

/// Route media keys into the same controls the on-screen buttons use
fn wire_smtc_buttons(state: &AppState, app: AppHandle) {
    let player = state.player.clone();
    let wake_lock = state.wake_lock.clone();

    let smtc = state.smtc.lock().unwrap();
    if let Some(smtc) = smtc.as_ref() {
        let result = smtc.set_button_callback(move |button| {
            match button {
                SmtcButton::Play => {
                    player.play();
                    wake_lock.acquire();
                }
                SmtcButton::Pause => {
                    player.pause();
                    wake_lock.release();
                }
                SmtcButton::Stop => {
                    player.stop();
                    wake_lock.release();
                }
            }
            let _ = app.emit("playback-changed", ());
        });
        if let Err(e) = result {
            eprintln!("[Smtc] Button callback failed: {}", e);
        }
    }
}

/// 1s tick that drives the sleep timer engine and the countdown display.
/// The countdown payload is pure observation; pause/reset only ever come
/// out of the engine's `Expired` event.
fn spawn_timer_driver(app: AppHandle) {
    tauri::async_runtime::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));

        loop {
            ticker.tick().await;

            let state = app.state::<AppState>();
            let events = state.timer.lock().unwrap().tick(Instant::now());

            for event in events {
                match event {
                    TimerEvent::FadeStep { volume, step, steps } => {
                        // Fade steps hit the live output but are not persisted
                        state.player.set_volume(volume);
                        eprintln!("[Timer] Fade step {}/{} -> {:.2}", step, steps, volume);
                        let _ = app.emit("fade-step", volume);
                    }
                    TimerEvent::Expired { restore_volume } => {
                        if state.player.is_playing() {
                            state.player.stop();
                        }
                        state.wake_lock.release();
                        if let Some(volume) = restore_volume {
                            // Next session starts at the user's normal volume
                            state.player.set_volume(volume);
                        }
                        commands::sync_now_playing(&state, None, false);
                        eprintln!("[Timer] Sleep timer expired, playback stopped");
                        let _ = app.emit("sleep-timer-expired", ());
                    }
                }
            }

            let snapshot = {
                let timer = state.timer.lock().unwrap();
                commands::timer_snapshot(&timer)
            };
            let _ = app.emit("sleep-timer-tick", snapshot);
        }
    });
}

/// Periodic position/duration/state updates for the progress bar
fn spawn_progress_driver(app: AppHandle) {
    tauri::async_runtime::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(500));

        loop {
            ticker.tick().await;

            let state = app.state::<AppState>();
            let _ = app.emit("playback-progress", commands::player_snapshot(&state));
        }
    });
}
