//! Track lookup: identifier to metadata and encoded bytes

use std::path::{Component, Path, PathBuf};

use lofty::{Accessor, AudioFile, TaggedFileExt};

use crate::error::ResolveError;
use crate::model::TrackMetadata;

/// Extensions probed, in order, for identifiers given without one.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "m4a", "aac"];

/// Encoded track bytes plus a container hint for the decoder.
#[derive(Clone, Debug)]
pub struct TrackSource {
    pub bytes: Vec<u8>,
    pub extension: Option<String>,
}

/// Maps track identifiers to what the player needs to show and play them.
///
/// Called from the blocking pool, so implementations may do file I/O.
pub trait MetadataResolver: Send + Sync {
    fn resolve(&self, id: &str) -> Result<TrackMetadata, ResolveError>;

    fn open(&self, id: &str) -> Result<TrackSource, ResolveError>;
}

/// Resolves identifiers to files under one music directory.
///
/// `"intro"` matches `intro.mp3`, `intro.flac`, ...; `"intro.wav"` matches only
/// that file. Identifiers may not leave the directory.
#[derive(Clone, Debug)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, id: &str) -> Result<PathBuf, ResolveError> {
        let relative = Path::new(id);
        let escapes = id.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(ResolveError::NotFound(id.to_string()));
        }

        let direct = self.root.join(relative);
        if relative.extension().is_some() && direct.is_file() {
            return Ok(direct);
        }
        AUDIO_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{id}.{ext}")))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ResolveError::NotFound(id.to_string()))
    }
}

impl MetadataResolver for DirectoryResolver {
    fn resolve(&self, id: &str) -> Result<TrackMetadata, ResolveError> {
        let path = self.locate(id)?;
        let tagged = lofty::read_from_path(&path).map_err(|e| ResolveError::Decode {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        let duration_ms = tagged.properties().duration().as_millis() as u64;
        let metadata = match tagged.primary_tag().or_else(|| tagged.first_tag()) {
            Some(tag) => TrackMetadata {
                title: tag.title().map(|s| s.to_string()),
                artist: tag.artist().map(|s| s.to_string()),
                album: tag.album().map(|s| s.to_string()),
                duration_ms,
                cover_art: tag.pictures().first().map(|p| p.data().to_vec()),
            },
            None => TrackMetadata {
                duration_ms,
                ..Default::default()
            },
        };

        tracing::debug!(
            track_id = id,
            path = %path.display(),
            duration_ms,
            has_art = metadata.cover_art.is_some(),
            "Resolved track metadata"
        );
        Ok(metadata)
    }

    fn open(&self, id: &str) -> Result<TrackSource, ResolveError> {
        let path = self.locate(id)?;
        let bytes = std::fs::read(&path).map_err(|source| ResolveError::Io {
            id: id.to_string(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        Ok(TrackSource { bytes, extension })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(dir: &Path, name: &str, sample_rate: u32, frames: u32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(dir.join(name), spec).unwrap();
        for i in 0..frames {
            let s = (i % 64) as i16 * 100;
            writer.write_sample(s).unwrap();
            writer.write_sample(-s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn resolves_bare_id_to_audio_file() {
        let dir = TempDir::new().unwrap();
        write_wav(dir.path(), "tone.wav", 8_000, 4_000);
        let resolver = DirectoryResolver::new(dir.path());

        let metadata = resolver.resolve("tone").unwrap();
        assert!((490..=510).contains(&metadata.duration_ms), "{}", metadata.duration_ms);
        assert!(metadata.title.is_none());
        assert_eq!(metadata.display_title(), "Untitled Audio");

        let source = resolver.open("tone").unwrap();
        assert_eq!(source.extension.as_deref(), Some("wav"));
        assert!(source.bytes.starts_with(b"RIFF"));
    }

    #[test]
    fn explicit_extension_is_honoured() {
        let dir = TempDir::new().unwrap();
        write_wav(dir.path(), "a.wav", 8_000, 800);
        let resolver = DirectoryResolver::new(dir.path());
        assert!(resolver.open("a.wav").is_ok());
        assert!(matches!(resolver.open("a.mp3"), Err(ResolveError::NotFound(_))));
    }

    #[test]
    fn missing_track_is_not_found() {
        let dir = TempDir::new().unwrap();
        let resolver = DirectoryResolver::new(dir.path());
        assert!(matches!(resolver.resolve("nope"), Err(ResolveError::NotFound(id)) if id == "nope"));
    }

    #[test]
    fn ids_cannot_escape_the_music_dir() {
        let dir = TempDir::new().unwrap();
        write_wav(dir.path(), "inside.wav", 8_000, 800);
        let resolver = DirectoryResolver::new(dir.path().join("sub"));
        for id in ["../inside.wav", "/etc/passwd", ""] {
            assert!(matches!(resolver.open(id), Err(ResolveError::NotFound(_))), "{id}");
        }
    }

    #[test]
    fn unreadable_tags_are_a_decode_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("junk.flac"), b"not really a flac stream").unwrap();
        let resolver = DirectoryResolver::new(dir.path());
        assert!(matches!(resolver.resolve("junk"), Err(ResolveError::Decode { .. })));
    }
}
