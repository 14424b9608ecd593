//! CPAL-based ring player.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::sync::Arc;
use tracing::debug;

use bf_engine::PlaybackSink;

use crate::ring::SharedRing;
use crate::AudioError;

/// Plays a [`SharedRing`] continuously through the default output
/// device. The ring loops: the callback always advances, even through
/// stale audio — the streaming driver's resync bounds how stale it can
/// get.
pub struct CpalPlayer {
    device: Device,
    stream: Option<Stream>,
    ring: Arc<SharedRing>,
    sample_rate: u32,
}

impl CpalPlayer {
    /// Open the default output device with a one-second ring.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // Force stereo output — the callback assumes 2-channel interleaving
        config.channels = 2;

        let sample_rate = config.sample_rate.0;
        debug!(sample_rate, "opened default output device");
        let ring = Arc::new(SharedRing::new(sample_rate as usize));

        let mut player = Self {
            device,
            stream: None,
            ring,
            sample_rate,
        };
        player.build_stream(&config)?;
        Ok(player)
    }

    fn build_stream(&mut self, config: &StreamConfig) -> Result<(), AudioError> {
        let ring = self.ring.clone();
        let channels = config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for chunk in data.chunks_mut(channels) {
                        if !ring.is_running() {
                            for sample in chunk.iter_mut() {
                                *sample = 0.0;
                            }
                            continue;
                        }
                        let (left, right) = ring.advance();
                        // Write the stereo pair; zero-fill any extra channels
                        for (i, sample) in chunk.iter_mut().enumerate() {
                            *sample = match i {
                                0 => left,
                                1 => right,
                                _ => 0.0,
                            };
                        }
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Playback(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Device sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Start producing audio from the ring.
    pub fn start(&mut self) -> Result<(), AudioError> {
        self.ring.set_running(true);
        if let Some(ref stream) = self.stream {
            stream
                .play()
                .map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    /// Silence the output without tearing the stream down.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        self.ring.set_running(false);
        if let Some(ref stream) = self.stream {
            stream
                .pause()
                .map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}

impl PlaybackSink for CpalPlayer {
    fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    fn playhead(&self) -> usize {
        self.ring.playhead()
    }

    fn write_at(&mut self, offset: usize, samples: &[f32]) {
        self.ring.write_at(offset, samples);
    }

    fn seek(&mut self, offset: usize) {
        self.ring.set_playhead(offset);
    }
}
