//! Turns a dropped or selected file into text for the editor. Only plain
//! text gets through; the controller never sees anything else.

use std::path::Path;

use thiserror::Error;

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// How the file reached the app. Only changes the wording of rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSource {
    Dropped,
    Selected,
}

impl FileSource {
    fn verb(self) -> &'static str {
        match self {
            Self::Dropped => "drop",
            Self::Selected => "select",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    #[error("Please {} a valid .txt or .md file.", .0.verb())]
    Unsupported(FileSource),
    #[error("File is not valid UTF-8 text.")]
    NotText,
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// A `text/*` MIME type or a `.txt` / `.md` name (any case) qualifies.
pub fn is_text_file(name: &str, mime: Option<&str>) -> bool {
    if mime.is_some_and(|mime| mime.starts_with("text/")) {
        return true;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TEXT_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

pub fn decode_text(
    name: &str,
    mime: Option<&str>,
    bytes: Vec<u8>,
    source: FileSource,
) -> Result<String, IntakeError> {
    if !is_text_file(name, mime) {
        return Err(IntakeError::Unsupported(source));
    }
    String::from_utf8(bytes).map_err(|_| IntakeError::NotText)
}

/// Contents of a file chosen in the picker, as handed over by the frontend.
pub fn read_selected_file(
    name: &str,
    mime: Option<&str>,
    bytes: Vec<u8>,
) -> Result<String, IntakeError> {
    let mime = mime.filter(|mime| !mime.is_empty());
    decode_text(name, mime, bytes, FileSource::Selected)
}

pub fn read_text_file(path: &Path) -> Result<String, IntakeError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(IntakeError::Unsupported(FileSource::Dropped))?;
    if !is_text_file(name, None) {
        return Err(IntakeError::Unsupported(FileSource::Dropped));
    }

    let bytes = std::fs::read(path).map_err(|err| IntakeError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    decode_text(name, None, bytes, FileSource::Dropped)
}
