// Sample rate conversion between the decoder and the output device
// rubato FastFixedIn fed in fixed-size chunks; straight passthrough when the
// rates already match.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::collections::VecDeque;

const CHUNK_FRAMES: usize = 1024;

pub struct RateConverter {
    inner: Option<FastFixedIn<f32>>,
    pending: VecDeque<f32>,
    channels: usize,
}

impl RateConverter {
    pub fn new(input_rate: u32, output_rate: u32, channels: usize) -> Result<Self, String> {
        let inner = if input_rate == output_rate {
            None
        } else {
            let ratio = output_rate as f64 / input_rate as f64;
            Some(
                FastFixedIn::<f32>::new(ratio, 2.0, PolynomialDegree::Linear, CHUNK_FRAMES, channels)
                    .map_err(|e| format!("Failed to create resampler: {}", e))?,
            )
        };

        Ok(Self {
            inner,
            pending: VecDeque::new(),
            channels,
        })
    }

    /// Convert interleaved input samples, returning whatever complete chunks
    /// produce. Input that does not fill a chunk stays buffered for the next
    /// call; a looping stream keeps the buffer from ever going stale.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, String> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(input.to_vec());
        };

        self.pending.extend(input.iter().copied());

        let mut output = Vec::new();

        loop {
            let needed = resampler.input_frames_next() * self.channels;
            if self.pending.len() < needed {
                break;
            }

            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            let frames = chunk.len() / self.channels;
            let planar = deinterleave(&chunk, self.channels, frames);

            let resampled = resampler
                .process(&planar, None)
                .map_err(|e| format!("Resampling failed: {}", e))?;

            interleave_into(&mut output, &resampled);
        }

        Ok(output)
    }

    /// Drop buffered input and filter state (seek or track change)
    pub fn reset(&mut self) {
        self.pending.clear();
        if let Some(resampler) = self.inner.as_mut() {
            resampler.reset();
        }
    }
}

fn deinterleave(interleaved: &[f32], channels: usize, frames: usize) -> Vec<Vec<f32>> {
    let mut planar = vec![Vec::with_capacity(frames); channels];

    for frame in 0..frames {
        for ch in 0..channels {
            planar[ch].push(interleaved[frame * channels + ch]);
        }
    }

    planar
}

fn interleave_into(output: &mut Vec<f32>, planar: &[Vec<f32>]) {
    if planar.is_empty() {
        return;
    }

    let frames = planar[0].len();
    output.reserve(frames * planar.len());

    for frame in 0..frames {
        for plane in planar {
            output.push(plane[frame]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_rates_match() {
        let mut converter = RateConverter::new(48000, 48000, 2).unwrap();
        let input = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(converter.process(&input).unwrap(), input);
    }

    #[test]
    fn deinterleave_splits_channels() {
        let planar = deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn interleave_round_trips() {
        let interleaved = vec![1.0, 2.0, 3.0, 4.0];
        let planar = deinterleave(&interleaved, 2, 2);
        let mut out = Vec::new();
        interleave_into(&mut out, &planar);
        assert_eq!(out, interleaved);
    }

    #[test]
    fn short_input_stays_buffered() {
        let mut converter = RateConverter::new(44100, 48000, 2).unwrap();
        // Far less than one chunk: nothing comes out yet
        let out = converter.process(&[0.0; 64]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn full_chunks_produce_output_at_the_new_rate() {
        let mut converter = RateConverter::new(44100, 88200, 1).unwrap();
        let input = vec![0.5f32; CHUNK_FRAMES * 4];
        let out = converter.process(&input).unwrap();
        // Doubling the rate roughly doubles the frame count
        assert!(out.len() > input.len());
    }
}
