//! Audio service boundary
//!
//! The simulation never plays sounds directly. It emits [`GameEvent`]s and the
//! frontend forwards them here. Playback is fire-and-forget; a sink that
//! cannot find a sound simply skips it.

use crate::sim::GameEvent;

/// Sound effect ids understood by the audio service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundEffect {
    /// Agent or player took non-lethal damage
    Pain,
    /// Agent died
    Dead,
    /// Player cycled weapons
    Switch,
    /// Weapon shot, keyed by the weapon's sound id
    Shot(String),
}

impl SoundEffect {
    pub fn id(&self) -> &str {
        match self {
            SoundEffect::Pain => "pain",
            SoundEffect::Dead => "dead",
            SoundEffect::Switch => "switch",
            SoundEffect::Shot(id) => id,
        }
    }
}

/// Backend that actually plays sounds (mixer, web audio, ...)
pub trait AudioSink {
    fn play_sound(&mut self, id: &str);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_sound(&mut self, _id: &str) {}
}

/// Logs every request at debug level (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play_sound(&mut self, id: &str) {
        log::debug!("play sound: {}", id);
    }
}

/// Audio manager for the game
pub struct AudioManager<S: AudioSink> {
    sink: S,
    muted: bool,
}

impl<S: AudioSink> AudioManager<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, muted: false }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn play(&mut self, effect: &SoundEffect) {
        if !self.muted {
            self.sink.play_sound(effect.id());
        }
    }

    /// Forward the sound requests in a tick's event list
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::Sound(effect) = event {
                self.play(effect);
            }
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
