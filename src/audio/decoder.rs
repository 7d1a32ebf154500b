// Audio decoder using Symphonia
// Decodes the selected sound to interleaved f32 samples; the player loops
// a single track forever, so end of stream is handled by rewinding.

use symphonia::core::audio::{AudioBufferRef, AudioPlanes, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use symphonia::core::units::Time;
use std::fs::File;
use std::path::Path;

pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    duration_ms: Option<u64>,
}

impl AudioDecoder {
    /// Open an audio file and prepare for decoding
    pub fn open(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file: {}", e))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Let the probe use the file extension as a hint
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| format!("Failed to probe file format: {}", e))?;

        let format = probed.format;

        let track = format.tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| "No audio track found".to_string())?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

        // Duration is only known when the container reports a frame count
        let duration_ms = track.codec_params.n_frames.map(|frames| {
            (frames as f64 / sample_rate as f64 * 1000.0) as u64
        });

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| format!("Failed to create decoder: {}", e))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            duration_ms,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Duration in milliseconds, if the container reported one
    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Decode the next packet into interleaved f32 samples.
    /// Returns None at end of stream.
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>, String> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(format!("Failed to read packet: {}", e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    return Ok(Some(Self::audio_buf_to_f32(&decoded)));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet, keep going
                    eprintln!("[Decoder] Decode error (skipping): {}", e);
                    continue;
                }
                Err(e) => return Err(format!("Decode failed: {}", e)),
            }
        }
    }

    /// Seek to a position in milliseconds, returning the position actually
    /// reached (coarse seek can land on the previous sync point)
    pub fn seek_ms(&mut self, position_ms: u64) -> Result<u64, String> {
        let seconds = position_ms as f64 / 1000.0;
        let time = Time::new(seconds as u64, seconds.fract());

        let seeked_to = self.format.seek(
            SeekMode::Coarse,
            SeekTo::Time {
                time,
                track_id: Some(self.track_id),
            }
        ).map_err(|e| format!("Seek failed: {}", e))?;

        self.decoder.reset();

        let actual_ms = (seeked_to.actual_ts as f64 / self.sample_rate as f64 * 1000.0) as u64;
        Ok(actual_ms)
    }

    /// Back to the start of the track, used when the loop wraps around
    pub fn rewind(&mut self) -> Result<(), String> {
        self.seek_ms(0).map(|_| ())
    }

    /// Convert any AudioBufferRef to interleaved f32 samples
    fn audio_buf_to_f32(buf: &AudioBufferRef) -> Vec<f32> {
        match buf {
            AudioBufferRef::F32(b) => {
                Self::interleave(b.planes(), b.frames(), |s: f32| s)
            }
            AudioBufferRef::F64(b) => {
                Self::interleave(b.planes(), b.frames(), |s: f64| s as f32)
            }
            AudioBufferRef::S8(b) => {
                let scale = 1.0 / 128.0;
                Self::interleave(b.planes(), b.frames(), move |s: i8| s as f32 * scale)
            }
            AudioBufferRef::S16(b) => {
                let scale = 1.0 / 32768.0;
                Self::interleave(b.planes(), b.frames(), move |s: i16| s as f32 * scale)
            }
            AudioBufferRef::S24(b) => {
                let scale = 1.0 / 8388608.0;
                Self::interleave(b.planes(), b.frames(), move |s| s.inner() as f32 * scale)
            }
            AudioBufferRef::S32(b) => {
                let scale = 1.0 / 2147483648.0;
                Self::interleave(b.planes(), b.frames(), move |s: i32| s as f32 * scale)
            }
            AudioBufferRef::U8(b) => {
                Self::interleave(b.planes(), b.frames(), |s: u8| (s as f32 - 128.0) / 128.0)
            }
            AudioBufferRef::U16(b) => {
                Self::interleave(b.planes(), b.frames(), |s: u16| (s as f32 - 32768.0) / 32768.0)
            }
            AudioBufferRef::U24(b) => {
                Self::interleave(b.planes(), b.frames(), |s| (s.inner() as f32 - 8388608.0) / 8388608.0)
            }
            AudioBufferRef::U32(b) => {
                Self::interleave(b.planes(), b.frames(), |s: u32| (s as f64 - 2147483648.0) as f32 / 2147483648.0)
            }
        }
    }

    fn interleave<T: Sample + Copy, F: Fn(T) -> f32>(
        planes: AudioPlanes<T>,
        frames: usize,
        convert: F,
    ) -> Vec<f32> {
        let num_channels = planes.planes().len();
        if num_channels == 0 || frames == 0 {
            return vec![];
        }

        let mut interleaved = Vec::with_capacity(frames * num_channels);

        for frame in 0..frames {
            for ch in 0..num_channels {
                interleaved.push(convert(planes.planes()[ch][frame]));
            }
        }

        interleaved
    }
}
