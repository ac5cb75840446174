//! Receipt files accepted for extraction.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// File formats a receipt may come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiptKind {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// PDF document.
    Pdf,
}

impl ReceiptKind {
    /// Detect the kind from a file extension, ignoring case.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// The MIME type handed to extractors.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
        }
    }

    /// Leading bytes every file of this kind starts with.
    fn magic(self) -> &'static [u8] {
        match self {
            Self::Png => b"\x89PNG",
            Self::Jpeg => b"\xFF\xD8\xFF",
            Self::Pdf => b"%PDF",
        }
    }
}

impl fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG"),
            Self::Pdf => write!(f, "PDF"),
        }
    }
}

/// A validated receipt file ready to be handed to an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFile {
    path: PathBuf,
    kind: ReceiptKind,
    size: u64,
    hash: String,
}

impl ReceiptFile {
    /// Validate the file at `path` and hash its content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedReceipt`] if the extension is not PNG,
    /// JPEG or PDF, if the path is not a regular file, or if the file is
    /// empty or larger than `max_size` bytes. I/O failures are returned as
    /// [`Error::Io`].
    pub fn open(path: impl AsRef<Path>, max_size: u64) -> Result<Self> {
        let path = path.as_ref();

        let kind = ReceiptKind::from_extension(path).ok_or_else(|| {
            Error::unsupported_receipt(path, "only PNG, JPEG and PDF files are accepted")
        })?;

        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::unsupported_receipt(path, "not a regular file"));
        }
        let size = metadata.len();
        if size == 0 {
            return Err(Error::unsupported_receipt(path, "file is empty"));
        }
        if size > max_size {
            return Err(Error::unsupported_receipt(
                path,
                format!("file is {size} bytes, the limit is {max_size}"),
            ));
        }

        let content = std::fs::read(path)?;
        if !content.starts_with(kind.magic()) {
            warn!(
                path = %path.display(),
                kind = %kind,
                "Receipt content does not look like its extension"
            );
        }
        let hash = blake3::hash(&content).to_hex().to_string();
        debug!(path = %path.display(), size, hash = %hash, "Opened receipt");

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            size,
            hash,
        })
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected file format.
    #[must_use]
    pub fn kind(&self) -> ReceiptKind {
        self.kind
    }

    /// MIME type of the file.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// BLAKE3 hash of the content, hex encoded.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }
}
