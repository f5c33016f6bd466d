//! Upload and output directories.

use std::path::{Component, Path, PathBuf};

use podcast_domain::{SessionId, SpeakerSlot};
use tracing::debug;

use crate::error::{IoError, IoErrorExt, Result};

pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "m4a", "ogg"];
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// True when `filename` has an extension from `allowed` (case-insensitive).
pub fn allowed_file(filename: &str, allowed: &[&str]) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, with no directory
/// parts and no leading dots. Returns `None` when nothing usable remains.
pub fn secure_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Check the client's file name against `allowed`, then sanitize it. A name
/// whose stem is lost to sanitizing (`会议.pdf`) becomes `upload.{ext}`.
pub fn accepted_upload_name(filename: &str, allowed: &[&str]) -> Option<String> {
    if !allowed_file(filename, allowed) {
        return None;
    }
    let (_, ext) = filename.rsplit_once('.')?;
    match secure_filename(filename) {
        Some(name) if allowed_file(&name, allowed) => Some(name),
        _ => Some(format!("upload.{}", ext.to_ascii_lowercase())),
    }
}

/// A name with exactly one normal path component.
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[derive(Debug, Clone)]
pub struct Storage {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl Storage {
    pub fn new(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.output_dir] {
            tokio::fs::create_dir_all(dir).await.with_path(dir)?;
        }
        Ok(())
    }

    /// Write an upload under `name` (already sanitized) and return its path.
    pub async fn save_upload(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        if !is_plain_file_name(name) {
            return Err(IoError::InvalidFileName {
                name: name.to_string(),
            }
            .into());
        }
        let path = self.upload_dir.join(name);
        tokio::fs::write(&path, data).await.with_path(&path)?;
        debug!(path = %path.display(), bytes = data.len(), "saved upload");
        Ok(path)
    }

    pub async fn write_output(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.output_path(name)?;
        tokio::fs::write(&path, data).await.with_path(&path)?;
        debug!(path = %path.display(), bytes = data.len(), "wrote output");
        Ok(path)
    }

    /// Resolve a download name inside the output directory.
    pub fn output_path(&self, name: &str) -> Result<PathBuf> {
        if !is_plain_file_name(name) {
            return Err(IoError::InvalidFileName {
                name: name.to_string(),
            }
            .into());
        }
        Ok(self.output_dir.join(name))
    }

    /// Canonicalize `path` and require it to live inside the upload directory.
    pub async fn confine_upload(&self, path: &Path) -> Result<PathBuf> {
        let root = tokio::fs::canonicalize(&self.upload_dir)
            .await
            .with_path(&self.upload_dir)?;
        let resolved = tokio::fs::canonicalize(path).await.with_path(path)?;
        if !resolved.starts_with(&root) {
            return Err(IoError::OutsideUploadDir {
                path: path.to_path_buf(),
            }
            .into());
        }
        Ok(resolved)
    }
}

pub fn pdf_upload_name(session: &SessionId, secure_name: &str) -> String {
    format!("{session}_{secure_name}")
}

pub fn speaker_upload_name(session: &SessionId, slot: SpeakerSlot, secure_name: &str) -> String {
    format!("{session}_{slot}_{secure_name}")
}

/// Name for a browser recording: `{session}_{speaker}_{unix}.wav`.
pub fn recording_name(session: &str, speaker: &str, unix_secs: i64) -> Option<String> {
    secure_filename(&format!("{session}_{speaker}_{unix_secs}.wav"))
}

pub fn podcast_audio_name(session: &SessionId) -> String {
    format!("podcast_{session}.mp3")
}

pub fn script_file_name(session: &SessionId) -> String {
    format!("script_{session}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check() {
        assert!(allowed_file("voice.WAV", AUDIO_EXTENSIONS));
        assert!(allowed_file("a.b.ogg", AUDIO_EXTENSIONS));
        assert!(!allowed_file("voice.exe", AUDIO_EXTENSIONS));
        assert!(!allowed_file("pdf", PDF_EXTENSIONS));
        assert!(allowed_file("paper.pdf", PDF_EXTENSIONS));
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(secure_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(secure_filename("my talk (final).mp3").as_deref(), Some("my_talk_final.mp3"));
        assert_eq!(secure_filename("C:\\Users\\x\\clip.wav").as_deref(), Some("clip.wav"));
        assert_eq!(secure_filename(".hidden").as_deref(), Some("hidden"));
        assert_eq!(secure_filename("会议.pdf").as_deref(), Some("pdf"));
        assert_eq!(secure_filename("..."), None);
    }

    #[test]
    fn accepted_names_keep_their_extension() {
        assert_eq!(
            accepted_upload_name("会议.pdf", PDF_EXTENSIONS).as_deref(),
            Some("upload.pdf")
        );
        assert_eq!(
            accepted_upload_name("录音.WAV", AUDIO_EXTENSIONS).as_deref(),
            Some("upload.wav")
        );
        assert_eq!(
            accepted_upload_name("report 2024.pdf", PDF_EXTENSIONS).as_deref(),
            Some("report_2024.pdf")
        );
        assert_eq!(accepted_upload_name("notes.txt", PDF_EXTENSIONS), None);
        assert_eq!(accepted_upload_name("clip.exe", AUDIO_EXTENSIONS), None);
    }

    #[test]
    fn plain_names_only() {
        assert!(is_plain_file_name("podcast_1.mp3"));
        assert!(!is_plain_file_name("../podcast_1.mp3"));
        assert!(!is_plain_file_name("a/b.mp3"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("/etc/passwd"));
    }

    #[test]
    fn generated_names() {
        let session = SessionId::generate();
        assert_eq!(
            speaker_upload_name(&session, SpeakerSlot::Speaker2, "a.wav"),
            format!("{session}_speaker2_a.wav")
        );
        assert_eq!(podcast_audio_name(&session), format!("podcast_{session}.mp3"));
        assert_eq!(
            recording_name("abc", "speaker1", 1700000000).as_deref(),
            Some("abc_speaker1_1700000000.wav")
        );
        assert_eq!(
            recording_name("../x", "y", 1).as_deref(),
            Some("x_y_1.wav")
        );
    }

    #[tokio::test]
    async fn confinement_rejects_outside_paths() {
        let root = tempfile::tempdir().unwrap();
        let storage = Storage::new(root.path().join("up"), root.path().join("out"));
        storage.ensure_dirs().await.unwrap();

        let inside = storage.save_upload("clip.wav", b"RIFF").await.unwrap();
        assert!(storage.confine_upload(&inside).await.is_ok());

        let outside = root.path().join("secret.wav");
        tokio::fs::write(&outside, b"x").await.unwrap();
        assert!(matches!(
            storage.confine_upload(&outside).await,
            Err(crate::StudioError::Io(IoError::OutsideUploadDir { .. }))
        ));

        let sneaky = storage.upload_dir().join("..").join("secret.wav");
        assert!(storage.confine_upload(&sneaky).await.is_err());

        assert!(matches!(
            storage.confine_upload(&storage.upload_dir().join("missing.wav")).await,
            Err(crate::StudioError::Io(IoError::FileNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn output_names_are_confined() {
        let root = tempfile::tempdir().unwrap();
        let storage = Storage::new(root.path().join("up"), root.path().join("out"));
        storage.ensure_dirs().await.unwrap();
        assert!(storage.write_output("../escape.txt", b"x").await.is_err());
        let path = storage.write_output("script_1.txt", b"x").await.unwrap();
        assert!(path.starts_with(storage.output_dir()));
    }
}
