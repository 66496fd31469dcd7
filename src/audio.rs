//! Sound effect playback.
//!
//! The session queues named events; the shell drains them into this
//! manager each frame. Effects are short synthesized tones, so there are
//! no sample assets to locate. Audio init failure is not an error: the
//! game runs silently.

use crate::session::SoundEvent;
use rodio::source::SineWave;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::Duration;

const SFX_GAIN: f32 = 0.18;

/// Audio manager handles all sound playback
pub struct AudioManager {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    enabled: bool,
}

impl AudioManager {
    /// Create a new audio manager; None when no output device is available.
    pub fn new(enabled: bool) -> Option<Self> {
        let (stream, stream_handle) = OutputStream::try_default().ok()?;
        Some(Self {
            _stream: stream,
            stream_handle,
            enabled,
        })
    }

    /// Mirror of the persisted sound flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Play a sound effect
    pub fn play(&self, event: SoundEvent) {
        if !self.enabled {
            return;
        }
        let Ok(sink) = Sink::try_new(&self.stream_handle) else {
            return;
        };

        match event {
            SoundEvent::Selected => {
                tone(&sink, 660.0, 35);
            }
            SoundEvent::Placed => {
                tone(&sink, 392.0, 30);
                tone(&sink, 523.0, 45);
            }
            SoundEvent::LinesBroken => {
                tone(&sink, 523.0, 40);
                tone(&sink, 659.0, 40);
                tone(&sink, 784.0, 80);
            }
            SoundEvent::Returned => {
                tone(&sink, 330.0, 40);
                tone(&sink, 220.0, 60);
            }
        }

        // Let it play and clean up automatically
        sink.detach();
    }
}

fn tone(sink: &Sink, freq: f32, ms: u64) {
    sink.append(
        SineWave::new(freq)
            .take_duration(Duration::from_millis(ms))
            .amplify(SFX_GAIN),
    );
}
