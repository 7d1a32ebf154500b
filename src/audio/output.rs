// Audio output using cpal
// The device callback pulls samples from a ring buffer and applies the
// shared volume, so volume changes (user or fade-out) take effect without
// touching the stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::{HeapRb, traits::{Consumer, Producer, Split}};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const RING_BUFFER_SIZE: usize = 48000 * 2 / 4; // ~250ms of stereo audio at 48kHz

type RingProducer = ringbuf::HeapProd<f32>;
type RingConsumer = ringbuf::HeapCons<f32>;

pub struct AudioOutput {
    _stream: Stream,
    producer: Mutex<RingProducer>,
    sample_rate: u32,
    channels: u16,
    clear_flag: Arc<AtomicBool>,
}

impl AudioOutput {
    /// Open the default output device.
    ///
    /// `volume` is shared with whoever owns the player state; the callback
    /// reads it on every buffer so writes are heard immediately.
    pub fn new(volume: Arc<Mutex<f32>>) -> Result<Self, String> {
        let host = cpal::default_host();

        let device = host.default_output_device()
            .ok_or("No output device available")?;

        let config = device.default_output_config()
            .map_err(|e| format!("Failed to get default output config: {}", e))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        // Ring buffer between the feeder and the device callback
        let rb = HeapRb::<f32>::new(RING_BUFFER_SIZE);
        let (producer, consumer) = rb.split();
        let consumer = Arc::new(Mutex::new(consumer));

        let clear_flag = Arc::new(AtomicBool::new(false));
        let clear_flag_clone = clear_flag.clone();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config.into(), consumer, volume, clear_flag_clone)?
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config.into(), consumer, volume, clear_flag_clone)?
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config.into(), consumer, volume, clear_flag_clone)?
            }
            format => return Err(format!("Unsupported sample format: {:?}", format)),
        };

        stream.play().map_err(|e| format!("Failed to start stream: {}", e))?;

        Ok(Self {
            _stream: stream,
            producer: Mutex::new(producer),
            sample_rate,
            channels,
            clear_flag,
        })
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        consumer: Arc<Mutex<RingConsumer>>,
        volume: Arc<Mutex<f32>>,
        clear_flag: Arc<AtomicBool>,
    ) -> Result<Stream, String> {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut consumer = consumer.lock();
                let vol = *volume.lock();

                // A pending clear drains everything queued before the seek
                if clear_flag.swap(false, Ordering::SeqCst) {
                    while consumer.try_pop().is_some() {}
                }

                for sample in data.iter_mut() {
                    let value = consumer.try_pop().unwrap_or(0.0) * vol;
                    *sample = T::from_sample(value);
                }
            },
            move |err| {
                eprintln!("[Output] Stream error: {}", err);
            },
            None,
        ).map_err(|e| format!("Failed to build output stream: {}", e))?;

        Ok(stream)
    }

    fn write(&self, samples: &[f32]) -> usize {
        let mut producer = self.producer.lock();
        let mut written = 0;

        for &sample in samples {
            if producer.try_push(sample).is_ok() {
                written += 1;
            } else {
                break;
            }
        }

        written
    }

    /// Write samples, blocking until the ring buffer has taken them all
    pub fn write_blocking(&self, samples: &[f32]) {
        let mut remaining = samples;

        while !remaining.is_empty() {
            let written = self.write(remaining);
            if written > 0 {
                remaining = &remaining[written..];
            } else {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
        }
    }

    /// Drop everything still queued (seek, stop, track change)
    pub fn clear(&self) {
        self.clear_flag.store(true, Ordering::SeqCst);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
