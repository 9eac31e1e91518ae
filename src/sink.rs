use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::alarm::AlarmId;

/// The device side of an alarm: something that can start making noise for a
/// given alarm and stop again. The real implementation drives the buzzer and
/// display; `NullSink` stands in everywhere hardware is absent. Callers go
/// through `ActiveSlot`, which guarantees idempotent start/stop ordering, so
/// implementations may assume starts and stops alternate.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Begin ringing for `alarm_id`. `sound` is a resolved file to play, or
    /// `None` for the built-in default tone.
    async fn start(&self, alarm_id: AlarmId, sound: Option<PathBuf>);

    async fn stop(&self);
}

/// Simulation sink: logs instead of ringing.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl OutputSink for NullSink {
    async fn start(&self, alarm_id: AlarmId, sound: Option<PathBuf>) {
        match sound {
            Some(path) => log::info!("ring alarm {alarm_id} with {}", path.display()),
            None => log::info!("ring alarm {alarm_id} with default tone"),
        }
    }

    async fn stop(&self) {
        log::info!("stop ringing");
    }
}

/// Maps an alarm's `sound_ref` to a playable file under the configured
/// sounds directory. Unresolvable refs fall back to the default tone, never
/// to an error: a missing sound file must not silence the alarm.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SoundLibrary { dir: dir.into() }
    }

    pub fn resolve(&self, sound_ref: &str) -> Option<PathBuf> {
        // Refs are bare file names; anything path-like is rejected.
        if sound_ref.is_empty() || sound_ref.contains(['/', '\\']) {
            log::warn!("ignoring suspicious sound ref {sound_ref:?}");
            return None;
        }
        let candidate = self.dir.join(sound_ref);
        if candidate.is_file() {
            Some(candidate)
        } else {
            log::warn!("sound {sound_ref:?} not found in {}", self.dir.display());
            None
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_existing_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rooster.wav"), b"riff").unwrap();
        let library = SoundLibrary::new(dir.path());

        assert_eq!(
            library.resolve("rooster.wav"),
            Some(dir.path().join("rooster.wav"))
        );
        assert_eq!(library.resolve("missing.wav"), None);
    }

    #[test]
    fn rejects_path_like_refs() {
        let dir = tempfile::tempdir().unwrap();
        let library = SoundLibrary::new(dir.path());
        assert_eq!(library.resolve("../etc/passwd"), None);
        assert_eq!(library.resolve(""), None);
    }
}
