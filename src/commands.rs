// Tauri command handlers
use std::time::Instant;

use tauri::{AppHandle, State};
use tauri_plugin_dialog::DialogExt;

use crate::library::{SoundLibrary, SoundScanner, Track};
use crate::settings::AppSettings;
use crate::state::AppState;
use crate::timer::countdown;
use crate::timer::SleepTimer;

#[derive(serde::Serialize, Clone)]
pub struct PlayerStateResponse {
    pub current_track_id: Option<i64>,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub volume: f32,
}

#[derive(serde::Serialize, Clone)]
pub struct TimerStateResponse {
    pub armed: bool,
    pub fading: bool,
    pub fade_out_enabled: bool,
    pub remaining: Option<String>, // "M:SS" countdown text
    pub remaining_secs: Option<u64>,
    pub ends_at: Option<String>, // wall clock, "21:45"
}

// ===== Playback Commands =====

#[tauri::command]
pub fn select_and_play(track_id: i64, state: State<'_, AppState>) -> Result<(), String> {
    play_track(&state, track_id)
}

#[tauri::command]
pub fn toggle_play_pause(state: State<'_, AppState>) -> Result<(), String> {
    // Nothing selected yet: fall back to the first sound in the list
    if state.player.current_track().is_none() {
        let default_id = state
            .library
            .lock()
            .unwrap()
            .default_track()
            .map(|track| track.id);
        return match default_id {
            Some(id) => play_track(&state, id),
            None => Err("No sounds available to play".to_string()),
        };
    }

    if state.player.is_playing() {
        state.player.pause();
        state.wake_lock.release();
        sync_now_playing(&state, None, false);
    } else {
        state.player.play();
        state.wake_lock.acquire();
        sync_now_playing(&state, None, true);
    }

    Ok(())
}

#[tauri::command]
pub fn stop_playback(state: State<'_, AppState>) -> Result<(), String> {
    state.player.stop();
    state.wake_lock.release();
    sync_now_playing(&state, None, false);
    Ok(())
}

#[tauri::command]
pub fn set_volume(volume: f32, state: State<'_, AppState>) -> Result<f32, String> {
    let applied = state.player.set_volume(volume);

    let mut settings = state.settings.lock().unwrap();
    settings.playback.volume = applied;
    if let Err(e) = settings.save(&state.app_dir) {
        eprintln!("[Settings] {}", e);
    }

    Ok(applied)
}

#[tauri::command]
pub fn seek(percent: f64, state: State<'_, AppState>) -> Result<Option<u64>, String> {
    // None while the duration is still unknown; the slider just snaps back
    Ok(state.player.seek_percent(percent))
}

#[tauri::command]
pub fn get_player_state(state: State<'_, AppState>) -> Result<PlayerStateResponse, String> {
    Ok(player_snapshot(&state))
}

// ===== Sleep Timer Commands =====

#[tauri::command]
pub fn arm_sleep_timer(
    hours: u32,
    minutes: u32,
    fade_out: bool,
    state: State<'_, AppState>,
) -> Result<TimerStateResponse, String> {
    let current_volume = state.player.volume();

    let mut timer = state.timer.lock().unwrap();
    timer
        .arm(Instant::now(), hours, minutes, fade_out, current_volume)
        .map_err(|e| e.to_string())?;

    eprintln!(
        "[Timer] Armed for {}h{:02}m (fade-out: {})",
        hours, minutes, fade_out
    );
    Ok(timer_snapshot(&timer))
}

#[tauri::command]
pub fn cancel_sleep_timer(state: State<'_, AppState>) -> Result<(), String> {
    let restore = state.timer.lock().unwrap().cancel();

    // A cancelled fade puts the volume back where the user had it
    if let Some(volume) = restore {
        state.player.set_volume(volume);
    }

    eprintln!("[Timer] Cancelled");
    Ok(())
}

#[tauri::command]
pub fn get_timer_state(state: State<'_, AppState>) -> Result<TimerStateResponse, String> {
    let timer = state.timer.lock().unwrap();
    Ok(timer_snapshot(&timer))
}

// ===== Library Commands =====

#[tauri::command]
pub fn get_tracks(state: State<'_, AppState>) -> Result<Vec<Track>, String> {
    Ok(state.library.lock().unwrap().tracks().to_vec())
}

#[tauri::command]
pub async fn rescan_library(state: State<'_, AppState>) -> Result<Vec<Track>, String> {
    let sounds_dir = state.sounds_dir();

    // Tag reads go through the filesystem; keep them off the event loop
    let tracks = tokio::task::spawn_blocking(move || {
        SoundScanner::scan(&sounds_dir).map_err(|e| format!("Failed to scan sounds: {}", e))
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))??;

    *state.library.lock().unwrap() = SoundLibrary::new(tracks.clone());
    Ok(tracks)
}

#[tauri::command]
pub async fn choose_sounds_dir(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<Option<Vec<Track>>, String> {
    let picked = tokio::task::spawn_blocking(move || app.dialog().file().blocking_pick_folder())
        .await
        .map_err(|e| format!("Task join error: {}", e))?;

    let Some(folder) = picked else {
        return Ok(None);
    };
    let folder = folder
        .into_path()
        .map_err(|e| format!("Unsupported folder selection: {}", e))?;

    let scan_dir = folder.clone();
    let tracks = tokio::task::spawn_blocking(move || {
        SoundScanner::scan(&scan_dir).map_err(|e| format!("Failed to scan sounds: {}", e))
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))??;

    {
        let mut settings = state.settings.lock().unwrap();
        settings.sounds_dir = Some(folder);
        if let Err(e) = settings.save(&state.app_dir) {
            eprintln!("[Settings] {}", e);
        }
    }

    *state.library.lock().unwrap() = SoundLibrary::new(tracks.clone());
    Ok(Some(tracks))
}

// ===== Preference Commands =====

#[tauri::command]
pub fn set_theme(theme: String, state: State<'_, AppState>) -> Result<(), String> {
    if theme != "light" && theme != "dark" {
        return Err(format!("Unknown theme: {}", theme));
    }

    let mut settings = state.settings.lock().unwrap();
    settings.interface.theme = theme;
    settings.save(&state.app_dir)
}

#[tauri::command]
pub fn set_fade_out_enabled(enabled: bool, state: State<'_, AppState>) -> Result<(), String> {
    let mut settings = state.settings.lock().unwrap();
    settings.timer.fade_out_enabled = enabled;
    settings.save(&state.app_dir)
}

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Result<AppSettings, String> {
    Ok(state.settings.lock().unwrap().clone())
}

// ===== Shared helpers (also used by the drivers in lib.rs) =====

pub(crate) fn play_track(state: &AppState, track_id: i64) -> Result<(), String> {
    let track = state
        .library
        .lock()
        .unwrap()
        .get(track_id)
        .cloned()
        .ok_or_else(|| format!("Unknown track id {}", track_id))?;

    state
        .player
        .select_and_play(track.id, &track.path)
        .map_err(|e| format!("Failed to play {}: {}", track.name, e))?;

    state.wake_lock.acquire();
    sync_now_playing(state, Some(track.name.as_str()), true);

    // Remember the selection for the next session
    let mut settings = state.settings.lock().unwrap();
    settings.playback.last_track_id = Some(track.id);
    if let Err(e) = settings.save(&state.app_dir) {
        eprintln!("[Settings] {}", e);
    }

    Ok(())
}

/// Push metadata/status to the lock-screen surface; failures never matter
pub(crate) fn sync_now_playing(state: &AppState, title: Option<&str>, is_playing: bool) {
    let smtc = state.smtc.lock().unwrap();
    if let Some(smtc) = smtc.as_ref() {
        if let Some(title) = title {
            if let Err(e) = smtc.update_metadata(title) {
                eprintln!("[Smtc] Metadata update failed: {}", e);
            }
        }
        if let Err(e) = smtc.set_playback_status(is_playing) {
            eprintln!("[Smtc] Status update failed: {}", e);
        }
    }
}

pub(crate) fn player_snapshot(state: &AppState) -> PlayerStateResponse {
    PlayerStateResponse {
        current_track_id: state.player.current_track(),
        is_playing: state.player.is_playing(),
        position_ms: state.player.position_ms(),
        duration_ms: state.player.duration_ms(),
        volume: state.player.volume(),
    }
}

pub(crate) fn timer_snapshot(timer: &SleepTimer) -> TimerStateResponse {
    let now = Instant::now();
    let remaining = timer.remaining(now);

    TimerStateResponse {
        armed: timer.is_armed(),
        fading: timer.is_fading(now),
        fade_out_enabled: timer.fade_out_enabled(),
        remaining: remaining.map(countdown::format_remaining),
        remaining_secs: remaining.map(|r| r.as_secs()),
        ends_at: remaining.map(|r| countdown::end_clock(r).format("%H:%M").to_string()),
    }
}
