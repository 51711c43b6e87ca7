use serde::{Deserialize, Serialize};

/// One row of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Zero-size objects are folder markers uploaded next to the real files.
    pub fn is_marker(&self) -> bool {
        self.size == 0
    }

    /// First path segment of a marker key, if it names a folder.
    pub fn marker_folder(&self) -> Option<&str> {
        if !self.is_marker() {
            return None;
        }
        self.key.split('/').next().filter(|folder| !folder.is_empty())
    }
}

/// A key of the form `<folder>/<filename>`, parsed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub folder: String,
    pub filename: String,
    pub stem: String,
    /// Text after the last `.` of the filename, as stored.
    pub extension: Option<String>,
}

impl ObjectKey {
    /// Returns `None` for root-level keys and for keys with an empty filename.
    pub fn parse(key: &str) -> Option<Self> {
        let (folder, filename) = key.split_once('/')?;
        if folder.is_empty() || filename.is_empty() {
            return None;
        }

        let (stem, extension) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext.to_string())),
            _ => (filename, None),
        };

        Some(Self {
            folder: folder.to_string(),
            filename: filename.to_string(),
            stem: stem.to_string(),
            extension,
        })
    }

    /// The key without its extension, e.g. `trip/trip` for `trip/trip.jpg`.
    pub fn base(&self) -> String {
        format!("{}/{}", self.folder, self.stem)
    }

    pub fn kind(&self) -> Option<FileKind> {
        self.extension.as_deref().and_then(FileKind::from_extension)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Media(MediaKind),
    Metadata,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" => Some(Self::Media(MediaKind::Image)),
            "mp4" | "webm" | "mov" | "m4v" => Some(Self::Media(MediaKind::Video)),
            "json" => Some(Self::Metadata),
            _ => None,
        }
    }
}

pub fn guess_content_type(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
