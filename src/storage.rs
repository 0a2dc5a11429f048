//! Local media storage for uploaded images and videos.

use std::path::{Path, PathBuf};

/// A collision-free name for an upload that keeps its original extension.
pub fn stored_name(original_name: &str) -> String {
    let id = uuid::Uuid::now_v7();
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

/// Writes the upload under `dir` and returns the stored file name.
pub async fn save_upload(dir: &Path, original_name: &str, data: &[u8]) -> std::io::Result<String> {
    tokio::fs::create_dir_all(dir).await?;
    let name = stored_name(original_name);
    tokio::fs::write(dir.join(&name), data).await?;
    tracing::info!("Stored upload {} ({} bytes)", name, data.len());
    Ok(name)
}

/// Maps a requested file name to a path inside `dir`, refusing anything
/// that could escape it.
pub fn resolve(dir: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return None;
    }
    Some(dir.join(name))
}

pub fn content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .as_ref()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_name_keeps_extension() {
        let name = stored_name("Holiday Photo.JPG");
        assert!(name.ends_with(".jpg"));
        let stem = name.trim_end_matches(".jpg");
        assert!(uuid::Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn stored_name_drops_odd_extensions() {
        let name = stored_name("payload.p/hp");
        assert!(uuid::Uuid::parse_str(&name).is_ok());
        let name = stored_name("no_extension");
        assert!(uuid::Uuid::parse_str(&name).is_ok());
    }

    #[test]
    fn stored_names_are_unique() {
        assert_ne!(stored_name("a.png"), stored_name("a.png"));
    }

    #[test]
    fn resolve_rejects_traversal() {
        let dir = Path::new("/srv/uploads");
        assert_eq!(resolve(dir, "a.png"), Some(dir.join("a.png")));
        assert!(resolve(dir, "../secret").is_none());
        assert!(resolve(dir, "sub/a.png").is_none());
        assert!(resolve(dir, "..").is_none());
        assert!(resolve(dir, "").is_none());
    }

    #[test]
    fn content_type_is_guessed_from_extension() {
        assert_eq!(content_type("a.png"), "image/png");
        assert_eq!(content_type("clip.mp4"), "video/mp4");
        assert_eq!(content_type("blob"), "application/octet-stream");
    }

    #[tokio::test]
    async fn save_upload_writes_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("uploads");
        let name = save_upload(&dir, "clip.mp4", b"\x00\x01video").await.unwrap();
        let written = std::fs::read(dir.join(&name)).unwrap();
        assert_eq!(written, b"\x00\x01video");
    }
}
