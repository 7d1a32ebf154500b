// Playback controller
// A dedicated thread owns the output stream, decoder and resampler (the cpal
// stream cannot leave it); the Player handle lives in Tauri-managed state and
// drives the thread over a control channel. Observable state is shared, so
// reads never wait on the audio side.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use thiserror::Error;

use super::decoder::AudioDecoder;
use super::output::AudioOutput;
use super::resampler::RateConverter;

const LOAD_REPLY_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("failed to start playback thread: {0}")]
    Thread(String),
    #[error("playback thread is not responding")]
    Unresponsive,
}

enum PlayerCommand {
    Load {
        path: PathBuf,
        respond_to: Sender<Result<(), PlayerError>>,
    },
    Play,
    Pause,
    Stop,
    SeekMs(u64),
    Shutdown,
}

/// Observable playback state shared between the handle and the thread
struct Shared {
    playing: AtomicBool,
    position_ms: AtomicU64,
    duration_ms: AtomicU64, // 0 while unknown
    volume: Arc<Mutex<f32>>,
    current_track: Mutex<Option<i64>>,
}

pub struct Player {
    commands: Sender<PlayerCommand>,
    shared: Arc<Shared>,
}

impl Player {
    pub fn new(initial_volume: f32) -> Result<Self, PlayerError> {
        let (commands, receiver) = unbounded();
        let shared = Arc::new(Shared {
            playing: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
            volume: Arc::new(Mutex::new(clamp_volume(initial_volume))),
            current_track: Mutex::new(None),
        });

        let thread_shared = shared.clone();
        thread::Builder::new()
            .name("playback".into())
            .spawn(move || playback_thread(receiver, thread_shared))
            .map_err(|e| PlayerError::Thread(e.to_string()))?;

        Ok(Self { commands, shared })
    }

    /// Select and load a track without starting playback (used to restore
    /// the previous session's selection).
    ///
    /// The selection is recorded before the load is attempted, so a failed
    /// load leaves the track selected but paused, and the failure goes back
    /// to the caller for reporting.
    pub fn select(&self, track_id: i64, path: &Path) -> Result<(), PlayerError> {
        *self.shared.current_track.lock() = Some(track_id);

        let (respond_to, response) = bounded(1);
        self.commands
            .send(PlayerCommand::Load {
                path: path.to_path_buf(),
                respond_to,
            })
            .map_err(|_| PlayerError::Unresponsive)?;

        match response.recv_timeout(LOAD_REPLY_TIMEOUT) {
            Ok(result) => result,
            Err(_) => Err(PlayerError::Unresponsive),
        }
    }

    /// Select a track and start looping playback from the beginning
    pub fn select_and_play(&self, track_id: i64, path: &Path) -> Result<(), PlayerError> {
        self.select(track_id, path)?;
        self.play();
        Ok(())
    }

    /// Ask the playback thread to start or resume; the playing flag flips
    /// when it actually does
    pub fn play(&self) {
        let _ = self.commands.send(PlayerCommand::Play);
    }

    pub fn pause(&self) {
        let _ = self.commands.send(PlayerCommand::Pause);
    }

    /// Pause and reset to the start; idempotent when already stopped
    pub fn stop(&self) {
        let _ = self.commands.send(PlayerCommand::Stop);
    }

    /// Clamp to [0,1], apply to the live output, return the stored value
    pub fn set_volume(&self, volume: f32) -> f32 {
        let clamped = clamp_volume(volume);
        *self.shared.volume.lock() = clamped;
        clamped
    }

    pub fn volume(&self) -> f32 {
        *self.shared.volume.lock()
    }

    /// Map a 0-100 progress value onto the track; no-op while the duration
    /// is still unknown
    pub fn seek_percent(&self, percent: f64) -> Option<u64> {
        let target = percent_to_position_ms(percent, self.duration_ms())?;
        self.shared.position_ms.store(target, Ordering::SeqCst);
        let _ = self.commands.send(PlayerCommand::SeekMs(target));
        Some(target)
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::SeqCst)
    }

    pub fn position_ms(&self) -> u64 {
        self.shared.position_ms.load(Ordering::SeqCst)
    }

    pub fn duration_ms(&self) -> u64 {
        self.shared.duration_ms.load(Ordering::SeqCst)
    }

    pub fn current_track(&self) -> Option<i64> {
        *self.shared.current_track.lock()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let _ = self.commands.send(PlayerCommand::Shutdown);
    }
}

struct Session {
    sample_rate: u32,
    channels: usize,
    frames_played: u64,
    converter: RateConverter,
    decoder: AudioDecoder,
}

fn playback_thread(commands: Receiver<PlayerCommand>, shared: Arc<Shared>) {
    let mut output: Option<AudioOutput> = None;
    let mut session: Option<Session> = None;

    loop {
        let feeding = shared.playing.load(Ordering::SeqCst) && session.is_some();

        // Drain control messages; block only when there is nothing to feed
        let command = if feeding {
            match commands.try_recv() {
                Ok(command) => Some(command),
                Err(crossbeam_channel::TryRecvError::Empty) => None,
                Err(crossbeam_channel::TryRecvError::Disconnected) => break,
            }
        } else {
            match commands.recv_timeout(IDLE_POLL) {
                Ok(command) => Some(command),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => None,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        };

        if let Some(command) = command {
            match command {
                PlayerCommand::Load { path, respond_to } => {
                    shared.playing.store(false, Ordering::SeqCst);
                    if let Some(out) = output.as_ref() {
                        out.clear();
                    }

                    match open_session(&mut output, &shared, &path) {
                        Ok(new_session) => {
                            shared.position_ms.store(0, Ordering::SeqCst);
                            shared
                                .duration_ms
                                .store(new_session.decoder.duration_ms().unwrap_or(0), Ordering::SeqCst);
                            session = Some(new_session);
                            let _ = respond_to.send(Ok(()));
                        }
                        Err(err) => {
                            session = None;
                            shared.position_ms.store(0, Ordering::SeqCst);
                            shared.duration_ms.store(0, Ordering::SeqCst);
                            let _ = respond_to.send(Err(err));
                        }
                    }
                }
                PlayerCommand::Play => {
                    if session.is_some() {
                        shared.playing.store(true, Ordering::SeqCst);
                    } else {
                        eprintln!("[Player] Play requested with no loaded track");
                    }
                }
                PlayerCommand::Pause => {
                    shared.playing.store(false, Ordering::SeqCst);
                }
                PlayerCommand::Stop => {
                    shared.playing.store(false, Ordering::SeqCst);
                    if let Some(session) = session.as_mut() {
                        if let Err(e) = session.decoder.rewind() {
                            eprintln!("[Player] Rewind on stop failed: {}", e);
                        }
                        session.converter.reset();
                        session.frames_played = 0;
                    }
                    if let Some(out) = output.as_ref() {
                        out.clear();
                    }
                    shared.position_ms.store(0, Ordering::SeqCst);
                }
                PlayerCommand::SeekMs(target) => {
                    if let Some(session) = session.as_mut() {
                        match session.decoder.seek_ms(target) {
                            Ok(actual) => {
                                session.frames_played =
                                    actual * u64::from(session.sample_rate) / 1000;
                                session.converter.reset();
                                if let Some(out) = output.as_ref() {
                                    out.clear();
                                }
                                shared.position_ms.store(actual, Ordering::SeqCst);
                            }
                            Err(e) => eprintln!("[Player] Seek failed: {}", e),
                        }
                    }
                }
                PlayerCommand::Shutdown => break,
            }
            continue;
        }

        if feeding {
            if let (Some(session), Some(out)) = (session.as_mut(), output.as_ref()) {
                feed_once(session, out, &shared);
            }
        }
    }
}

fn open_session(
    output: &mut Option<AudioOutput>,
    shared: &Arc<Shared>,
    path: &Path,
) -> Result<Session, PlayerError> {
    // The output device is opened lazily on the first load and reused after
    let out = match output {
        Some(out) => out,
        None => {
            let created =
                AudioOutput::new(shared.volume.clone()).map_err(PlayerError::Output)?;
            output.insert(created)
        }
    };

    let decoder = AudioDecoder::open(path).map_err(|reason| PlayerError::Load {
        path: path.display().to_string(),
        reason,
    })?;

    let converter = RateConverter::new(decoder.sample_rate(), out.sample_rate(), decoder.channels())
        .map_err(PlayerError::Output)?;

    Ok(Session {
        sample_rate: decoder.sample_rate(),
        channels: decoder.channels(),
        frames_played: 0,
        converter,
        decoder,
    })
}

fn feed_once(session: &mut Session, output: &AudioOutput, shared: &Shared) {
    match session.decoder.decode_next() {
        Ok(Some(chunk)) => {
            session.frames_played += (chunk.len() / session.channels.max(1)) as u64;

            let converted = match session.converter.process(&chunk) {
                Ok(converted) => converted,
                Err(e) => {
                    eprintln!("[Player] {}", e);
                    return;
                }
            };

            if session.channels == output.channels() as usize {
                output.write_blocking(&converted);
            } else {
                let mapped = map_channels(&converted, session.channels, output.channels() as usize);
                output.write_blocking(&mapped);
            }

            shared.position_ms.store(
                session.frames_played * 1000 / u64::from(session.sample_rate.max(1)),
                Ordering::SeqCst,
            );
        }
        Ok(None) => {
            // Single-track loop is fixed on: wrap back to the start
            session.frames_played = 0;
            session.converter.reset();
            shared.position_ms.store(0, Ordering::SeqCst);
            if let Err(e) = session.decoder.rewind() {
                eprintln!("[Player] Loop rewind failed: {}", e);
                shared.playing.store(false, Ordering::SeqCst);
            }
        }
        Err(e) => {
            eprintln!("[Player] Decode failed: {}", e);
            shared.playing.store(false, Ordering::SeqCst);
        }
    }
}

/// Clamp a requested volume into [0,1]; non-finite input falls to silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Map a 0-100 seek input to an absolute position; `None` while the
/// duration is unknown
pub fn percent_to_position_ms(percent: f64, duration_ms: u64) -> Option<u64> {
    if duration_ms == 0 || !percent.is_finite() {
        return None;
    }
    let clamped = percent.clamp(0.0, 100.0);
    Some((duration_ms as f64 * clamped / 100.0) as u64)
}

fn map_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut mapped = Vec::with_capacity(frames * to);

    for frame in 0..frames {
        let src = &samples[frame * from..(frame + 1) * from];
        if from == 1 {
            // Mono fan-out
            mapped.extend(std::iter::repeat(src[0]).take(to));
        } else if to == 1 {
            mapped.push(src.iter().sum::<f32>() / from as f32);
        } else {
            for ch in 0..to {
                mapped.push(src[ch.min(from - 1)]);
            }
        }
    }

    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_round_trips_in_range() {
        for v in [0.0, 0.25, 0.5, 0.7, 1.0] {
            assert_eq!(clamp_volume(v), v);
        }
    }

    #[test]
    fn volume_clamps_out_of_range() {
        assert_eq!(clamp_volume(-0.5), 0.0);
        assert_eq!(clamp_volume(1.5), 1.0);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
        assert_eq!(clamp_volume(f32::INFINITY), 0.0);
    }

    #[test]
    fn seek_maps_percent_against_duration() {
        assert_eq!(percent_to_position_ms(0.0, 120_000), Some(0));
        assert_eq!(percent_to_position_ms(50.0, 120_000), Some(60_000));
        assert_eq!(percent_to_position_ms(100.0, 120_000), Some(120_000));
    }

    #[test]
    fn seek_is_noop_without_duration() {
        assert_eq!(percent_to_position_ms(50.0, 0), None);
    }

    #[test]
    fn seek_clamps_percent() {
        assert_eq!(percent_to_position_ms(-10.0, 1000), Some(0));
        assert_eq!(percent_to_position_ms(250.0, 1000), Some(1000));
        assert_eq!(percent_to_position_ms(f64::NAN, 1000), None);
    }

    #[test]
    fn mono_fans_out_to_stereo() {
        assert_eq!(map_channels(&[0.5, -0.5], 1, 2), vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn stereo_folds_down_to_mono() {
        assert_eq!(map_channels(&[1.0, 0.0, 0.5, 0.5], 2, 1), vec![0.5, 0.5]);
    }

    #[test]
    fn matching_layout_passes_through() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(map_channels(&samples, 2, 2), samples);
    }
}
