//! Voice capture payloads and their scoped on-disk staging.
//!
//! The upload endpoint takes a file path, so a recording is written to a
//! temporary file for the duration of one request and removed afterwards,
//! whether or not the request succeeded.

use std::io::Write;
use std::path::{Path, PathBuf};

use jarvis_core::types::MediaBlob;
use tempfile::NamedTempFile;

use crate::error::{ChatError, GatewayError};

/// A completed voice recording. Consumed by exactly one turn.
#[derive(Debug)]
pub struct AudioCapture {
    blob: MediaBlob,
}

impl AudioCapture {
    /// Wrap raw WAV bytes.
    pub fn from_wav_bytes(bytes: Vec<u8>) -> Result<Self, ChatError> {
        if bytes.is_empty() {
            return Err(ChatError::VoiceError("recording is empty".to_string()));
        }
        if !is_wav(&bytes) {
            return Err(ChatError::VoiceError("not a WAV file".to_string()));
        }
        Ok(Self {
            blob: MediaBlob::wav(bytes),
        })
    }

    /// Read a WAV recording from disk.
    pub fn from_wav_file(path: &Path) -> Result<Self, ChatError> {
        let bytes = std::fs::read(path).map_err(|e| {
            ChatError::VoiceError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_wav_bytes(bytes)
    }

    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    pub fn into_media(self) -> MediaBlob {
        self.blob
    }
}

/// RIFF container with a WAVE form type.
fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn suffix_for(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/wav" | "audio/x-wav" | "audio/wave" => ".wav",
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        _ => ".bin",
    }
}

/// A media blob staged in a temporary file. The file is deleted on drop.
#[derive(Debug)]
pub struct ScopedMediaFile {
    file: NamedTempFile,
    mime_type: String,
}

impl ScopedMediaFile {
    pub fn stage(blob: &MediaBlob) -> Result<Self, GatewayError> {
        let mut file = tempfile::Builder::new()
            .prefix("jarvis-voice-")
            .suffix(suffix_for(&blob.mime_type))
            .tempfile()?;
        file.write_all(&blob.bytes)?;
        file.flush()?;
        tracing::debug!(
            path = %file.path().display(),
            bytes = blob.len(),
            "Staged media for upload"
        );
        Ok(Self {
            file,
            mime_type: blob.mime_type.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Delete the file now, reporting failures instead of ignoring them.
    pub fn close(self) {
        let path: PathBuf = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged media");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes() -> Vec<u8> {
        let mut bytes = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
        bytes.extend_from_slice(&[0u8; 24]);
        bytes
    }

    #[test]
    fn test_capture_accepts_wav() {
        let capture = AudioCapture::from_wav_bytes(wav_bytes()).unwrap();
        assert!(!capture.is_empty());
        let blob = capture.into_media();
        assert_eq!(blob.mime_type, "audio/wav");
    }

    #[test]
    fn test_capture_rejects_empty_and_non_wav() {
        let err = AudioCapture::from_wav_bytes(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("empty"));

        let err = AudioCapture::from_wav_bytes(b"ID3\x03not a wav file".to_vec()).unwrap_err();
        assert!(err.to_string().contains("not a WAV"));
    }

    #[test]
    fn test_capture_from_missing_file() {
        let err = AudioCapture::from_wav_file(Path::new("/nonexistent/voice.wav")).unwrap_err();
        assert!(matches!(err, ChatError::VoiceError(_)));
    }

    #[test]
    fn test_capture_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&wav_bytes()).unwrap();
        let capture = AudioCapture::from_wav_file(file.path()).unwrap();
        assert_eq!(capture.len(), wav_bytes().len());
    }

    #[test]
    fn test_staged_file_has_contents_and_suffix() {
        let blob = MediaBlob::wav(wav_bytes());
        let staged = ScopedMediaFile::stage(&blob).unwrap();
        assert_eq!(staged.path().extension().unwrap(), "wav");
        assert_eq!(std::fs::read(staged.path()).unwrap(), wav_bytes());
        assert_eq!(staged.mime_type(), "audio/wav");
    }

    #[test]
    fn test_staged_file_removed_on_close() {
        let staged = ScopedMediaFile::stage(&MediaBlob::wav(wav_bytes())).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        staged.close();
        assert!(!path.exists());
    }

    #[test]
    fn test_staged_file_removed_on_drop() {
        let path = {
            let staged = ScopedMediaFile::stage(&MediaBlob::wav(wav_bytes())).unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_suffix_for_unknown_mime() {
        assert_eq!(suffix_for("application/octet-stream"), ".bin");
        assert_eq!(suffix_for("audio/x-wav"), ".wav");
    }
}
