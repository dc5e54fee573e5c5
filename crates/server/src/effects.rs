//! Player-facing feedback: chat lines, title overlays, sounds and particles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Colour class of a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    /// Progress notices.
    Notice,
    /// Completed actions.
    Success,
    /// Rejections and failures.
    Error,
}

/// One chat line sent to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub tone: Tone,
    pub text: String,
}

impl ChatMessage {
    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Notice,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Full-screen title overlay. Timings are in ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub title: String,
    pub subtitle: String,
    pub fade_in: u32,
    pub stay: u32,
    pub fade_out: u32,
}

impl Title {
    /// Overlay shown while a teleport is pending.
    pub fn escaping() -> Self {
        Self {
            title: "Escaping...".to_string(),
            subtitle: "Hold tight!".to_string(),
            fade_in: 10,
            stay: 40,
            fade_out: 10,
        }
    }
}

/// Identifiers for sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundId {
    /// Eerie hum played when a teleport is announced.
    EndermanAmbient,
    /// Whoosh played on arrival.
    EndermanTeleport,
}

/// A sound with its playback parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub sound: SoundId,
    pub volume: f32,
    pub pitch: f32,
}

impl SoundCue {
    pub const ANNOUNCE: Self = Self {
        sound: SoundId::EndermanAmbient,
        volume: 1.2,
        pitch: 0.9,
    };

    pub const ARRIVE: Self = Self {
        sound: SoundId::EndermanTeleport,
        volume: 1.5,
        pitch: 1.0,
    };
}

/// Particle kinds used by the teleport effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    Portal,
    EndRod,
}

/// A burst of particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleBurst {
    pub kind: ParticleKind,
    pub count: u32,
    /// Random spread on each axis.
    pub spread: [f64; 3],
    pub speed: f64,
}

impl ParticleBurst {
    /// The standard 50-particle burst used around a player.
    pub const fn around_player(kind: ParticleKind) -> Self {
        Self {
            kind,
            count: 50,
            spread: [0.5, 1.0, 0.5],
            speed: 0.1,
        }
    }
}
