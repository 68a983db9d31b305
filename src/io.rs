use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, ImageFormat};
use rfd::FileDialog;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Extensions offered in the open dialogs.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

#[derive(Debug, thiserror::Error)]
pub enum ImageIoError {
    #[error("could not read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{0}' is not a supported image file")]
    NotAnImage(String),
    #[error("malformed data URL")]
    MalformedDataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

// ============================================================================
// DataUrl: `data:<mime>;base64,<payload>`
// ============================================================================

/// An image carried as a base64 data-URL. This is the in-memory format for
/// previews, the mask snapshot and everything exchanged with the generator.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl DataUrl {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime_type, BASE64.encode(bytes)))
    }

    /// Validate the `data:<mime>;base64,` header. The payload is only
    /// decoded on demand.
    pub fn parse(s: impl Into<String>) -> Result<Self, ImageIoError> {
        let s = s.into();
        let (header, _) = s.split_once(',').ok_or(ImageIoError::MalformedDataUrl)?;
        let mime = header
            .strip_prefix("data:")
            .and_then(|h| h.strip_suffix(";base64"))
            .ok_or(ImageIoError::MalformedDataUrl)?;
        if mime.is_empty() {
            return Err(ImageIoError::MalformedDataUrl);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mime_type(&self) -> &str {
        self.0
            .split_once(',')
            .and_then(|(h, _)| h.strip_prefix("data:"))
            .and_then(|h| h.strip_suffix(";base64"))
            .unwrap_or("application/octet-stream")
    }

    /// The base64 body after the comma.
    pub fn payload(&self) -> &str {
        self.0.split_once(',').map(|(_, p)| p).unwrap_or("")
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, ImageIoError> {
        Ok(BASE64.decode(self.payload().as_bytes())?)
    }

    pub fn decode_image(&self) -> Result<DynamicImage, ImageIoError> {
        let bytes = self.decode_bytes()?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

impl fmt::Debug for DataUrl {
    // Payloads are megabytes; never dump them into logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataUrl({}, {} base64 bytes)",
            self.mime_type(),
            self.payload().len()
        )
    }
}

/// Encode an 8-bit buffer as a PNG data-URL.
pub fn png_data_url(
    raw: &[u8],
    width: u32,
    height: u32,
    color: image::ColorType,
) -> Result<DataUrl, ImageIoError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(raw, width, height, color)?;
    Ok(DataUrl::from_bytes("image/png", &buf))
}

fn mime_for_format(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn mime_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    ImageFormat::from_extension(ext).map(mime_for_format)
}

// ============================================================================
// Uploaded images
// ============================================================================

/// A user-supplied photo held in memory for the session.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    pub id: Uuid,
    /// Original file name, for display only.
    pub name: String,
    pub data_url: DataUrl,
    /// Free-text age hint ("34"). Blank means unknown.
    pub age: String,
}

impl UploadedImage {
    pub fn new(name: impl Into<String>, data_url: DataUrl) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            data_url,
            age: String::new(),
        }
    }
}

/// Build an upload from raw file bytes (dialog or drag-and-drop).
/// The MIME type is sniffed from the content; the extension is only a
/// fallback.
pub fn uploaded_image_from_bytes(
    name: &str,
    bytes: &[u8],
) -> Result<UploadedImage, ImageIoError> {
    let mime = match image::guess_format(bytes) {
        Ok(format) => mime_for_format(format),
        Err(_) => mime_for_extension(Path::new(name))
            .ok_or_else(|| ImageIoError::NotAnImage(name.to_string()))?,
    };
    if !mime.starts_with("image/") {
        return Err(ImageIoError::NotAnImage(name.to_string()));
    }
    Ok(UploadedImage::new(name, DataUrl::from_bytes(mime, bytes)))
}

pub fn load_uploaded_image(path: &Path) -> Result<UploadedImage, ImageIoError> {
    let bytes = std::fs::read(path).map_err(|source| ImageIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    uploaded_image_from_bytes(&name, &bytes)
}

/// Load a batch in order. One bad file fails the whole batch so the
/// uploads list is never half-replaced.
pub fn load_uploaded_images(paths: &[PathBuf]) -> Result<Vec<UploadedImage>, ImageIoError> {
    paths.iter().map(|p| load_uploaded_image(p)).collect()
}

// ============================================================================
// Download
// ============================================================================

/// `ai-photostudio-<unix millis>.png`
pub fn download_file_name(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("ai-photostudio-{}.png", millis)
}

/// Write a generated image to disk as PNG, whatever format the service
/// returned it in.
pub fn save_data_url_as_png(url: &DataUrl, path: &Path) -> Result<(), ImageIoError> {
    if url.mime_type() == "image/png" {
        let bytes = url.decode_bytes()?;
        return std::fs::write(path, bytes).map_err(|source| ImageIoError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    let rgba = url.decode_image()?.to_rgba8();
    rgba.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

// ============================================================================
// FileHandler: native dialogs
// ============================================================================

pub struct FileHandler {
    /// Directory the last dialog ended in; the next dialog starts there.
    pub last_directory: Option<PathBuf>,
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            last_directory: None,
        }
    }

    fn dialog(&self) -> FileDialog {
        let dialog = FileDialog::new();
        match &self.last_directory {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }

    fn remember(&mut self, path: &Path) {
        if let Some(parent) = path.parent() {
            self.last_directory = Some(parent.to_path_buf());
        }
    }

    pub fn pick_image(&mut self) -> Option<PathBuf> {
        let path = self
            .dialog()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()?;
        self.remember(&path);
        Some(path)
    }

    pub fn pick_images(&mut self) -> Vec<PathBuf> {
        let paths = self
            .dialog()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_files()
            .unwrap_or_default();
        if let Some(first) = paths.first() {
            self.remember(first);
        }
        paths
    }

    pub fn pick_save_path(&mut self, default_name: &str) -> Option<PathBuf> {
        let path = self
            .dialog()
            .add_filter("PNG", &["png"])
            .set_file_name(default_name)
            .save_file()?;
        self.remember(&path);
        Some(path)
    }
}
