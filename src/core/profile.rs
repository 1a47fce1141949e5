//! Profile photo encoding.

use crate::core::config::data::path_display;
use crate::core::constants::MAX_PROFILE_PHOTO_BYTES;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum PhotoError {
    TooLarge { size: u64 },
    Read { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::TooLarge { .. } => write!(f, "Image is too large. Max 2MB."),
            PhotoError::Read { path, source } => {
                write!(f, "Failed to read image {}: {}", path_display(path), source)
            }
        }
    }
}

impl std::error::Error for PhotoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PhotoError::TooLarge { .. } => None,
            PhotoError::Read { source, .. } => Some(source),
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Encodes image bytes as a `data:` URL, the form the backend stores.
pub fn photo_data_url(path: &Path, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes))
}

/// Reads an image file and encodes it, refusing files above the size limit.
pub fn load_photo(path: &Path) -> Result<String, PhotoError> {
    let read_err = |source| PhotoError::Read {
        path: path.to_path_buf(),
        source,
    };

    let size = fs::metadata(path).map_err(read_err)?.len();
    if size > MAX_PROFILE_PHOTO_BYTES {
        return Err(PhotoError::TooLarge { size });
    }

    let bytes = fs::read(path).map_err(read_err)?;
    Ok(photo_data_url(path, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn encodes_small_images_as_data_urls() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("me.PNG");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let url = load_photo(&path).unwrap();

        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn rejects_images_over_two_megabytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("huge.jpg");
        fs::write(&path, vec![0_u8; (MAX_PROFILE_PHOTO_BYTES + 1) as usize]).unwrap();

        let err = load_photo(&path).unwrap_err();

        assert!(matches!(err, PhotoError::TooLarge { .. }));
        assert_eq!(err.to_string(), "Image is too large. Max 2MB.");
    }

    #[test]
    fn accepts_images_exactly_at_the_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("edge.jpeg");
        fs::write(&path, vec![0_u8; MAX_PROFILE_PHOTO_BYTES as usize]).unwrap();

        let url = load_photo(&path).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn missing_files_report_a_read_error() {
        let err = load_photo(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, PhotoError::Read { .. }));
    }

    #[test]
    fn unknown_extensions_use_a_generic_type() {
        assert!(photo_data_url(Path::new("photo"), b"x").starts_with("data:application/octet-stream;"));
    }
}
