use serde::{Deserialize, Serialize};
use std::fmt;

/// File extensions accepted as photo submissions.
pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// File extensions accepted as video submissions.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

/// Kind of media attached to a verification submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Stable string form used in storage and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw uploaded file as received from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Original filename, used only for extension classification.
    pub filename: String,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    #[must_use]
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }
}

/// Extract the lowercase extension of a filename, if it has one.
#[must_use]
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Classify a filename by its extension against the accept lists.
///
/// Matching is case-insensitive. Returns `None` for unknown or missing
/// extensions.
#[must_use]
pub fn classify(filename: &str) -> Option<MediaKind> {
    let ext = extension_of(filename)?;
    if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
        return Some(MediaKind::Photo);
    }
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return Some(MediaKind::Video);
    }
    None
}

/// Pick the first attachment with a supported extension.
///
/// Submissions may carry several files; only the first supported one is
/// processed and the rest are ignored.
#[must_use]
pub fn select_attachment(attachments: &[Attachment]) -> Option<(&Attachment, MediaKind)> {
    attachments
        .iter()
        .find_map(|att| classify(&att.filename).map(|kind| (att, kind)))
}

/// Human-readable list of every accepted extension, for rejection messages.
#[must_use]
pub fn allowed_extensions_label() -> String {
    let mut all: Vec<&str> = Vec::with_capacity(PHOTO_EXTENSIONS.len() + VIDEO_EXTENSIONS.len());
    all.extend_from_slice(PHOTO_EXTENSIONS);
    all.extend_from_slice(VIDEO_EXTENSIONS);
    all.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(classify("selfie.PNG"), Some(MediaKind::Photo));
        assert_eq!(classify("clip.Mov"), Some(MediaKind::Video));
        assert_eq!(classify("me.JpEg"), Some(MediaKind::Photo));
    }

    #[test]
    fn classify_rejects_unknown_and_missing_extensions() {
        assert_eq!(classify("document.pdf"), None);
        assert_eq!(classify("noextension"), None);
        assert_eq!(classify("trailingdot."), None);
    }

    #[test]
    fn first_supported_attachment_wins() {
        let attachments = vec![
            Attachment::new("readme.txt", vec![1]),
            Attachment::new("face.jpg", vec![2]),
            Attachment::new("clip.mp4", vec![3]),
        ];
        let (att, kind) = select_attachment(&attachments).unwrap();
        assert_eq!(att.filename, "face.jpg");
        assert_eq!(kind, MediaKind::Photo);
    }

    #[test]
    fn no_supported_attachment() {
        let attachments = vec![Attachment::new("malware.exe", vec![0])];
        assert!(select_attachment(&attachments).is_none());
    }

    #[test]
    fn allowed_label_lists_every_extension() {
        let label = allowed_extensions_label();
        for ext in PHOTO_EXTENSIONS.iter().chain(VIDEO_EXTENSIONS) {
            assert!(label.contains(ext), "missing {ext} in {label}");
        }
    }
}
