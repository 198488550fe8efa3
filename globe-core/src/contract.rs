//! Contracts for the collaborators that consume resolved data: speech
//! output and ambient-sound playback. Only the seams live here; playing
//! audio is someone else's job.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{classify::WeatherClass, model::ResolvedRecord};

/// Accepts plain text to be spoken.
#[async_trait]
pub trait SpeechSink: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Hand a record's summary sentence to a speech sink.
pub async fn announce(record: &ResolvedRecord, sink: &dyn SpeechSink) -> Result<()> {
    sink.speak(&record.speech_text()).await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlaybackDirective {
    Play {
        sound: WeatherClass,
        /// Clip names in preference order.
        candidates: Vec<String>,
        looped: bool,
    },
    Stop,
}

/// Turns a weather class (and optional precipitation rate) into a
/// playback instruction.
pub trait AmbientSelector {
    fn select(&self, class: WeatherClass, intensity: Option<f64>) -> PlaybackDirective;
}

/// Picks `<class>.<ext>` clips, falling back to the generic ambient clip.
#[derive(Debug, Clone)]
pub struct LibraryAmbientSelector {
    extensions: Vec<String>,
}

impl Default for LibraryAmbientSelector {
    fn default() -> Self {
        Self { extensions: vec!["wav".to_string(), "mp3".to_string()] }
    }
}

impl LibraryAmbientSelector {
    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self { extensions }
    }
}

impl AmbientSelector for LibraryAmbientSelector {
    fn select(&self, class: WeatherClass, intensity: Option<f64>) -> PlaybackDirective {
        let sound = class.with_intensity(intensity);

        let mut names = vec![sound.as_str()];
        if sound != WeatherClass::Ambient {
            names.push(WeatherClass::Ambient.as_str());
        }

        let candidates = names
            .iter()
            .flat_map(|name| self.extensions.iter().map(move |ext| format!("{name}.{ext}")))
            .collect();

        PlaybackDirective::Play { sound, candidates, looped: true }
    }
}
