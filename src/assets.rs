use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to decode icon {}: {source}", path.display())]
    IconDecode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to load font {path}: {reason}")]
    FontLoad { path: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AssetError>;

/// Decoded icon bitmap, shared between nodes that use the same file.
#[derive(Debug, Clone)]
pub struct Icon {
    image: Arc<RgbaImage>,
}

impl Icon {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| AssetError::IconDecode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_rgba(decoded.to_rgba8()))
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Catmull-Rom resample to the target size.
    pub fn resampled(&self, width: u32, height: u32) -> RgbaImage {
        if width == self.image.width() && height == self.image.height() {
            return (*self.image).clone();
        }
        imageops::resize(&*self.image, width, height, FilterType::CatmullRom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn resample_changes_size() {
        let icon = Icon::from_rgba(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255])));
        let scaled = icon.resampled(16, 4);
        assert_eq!(scaled.dimensions(), (16, 4));
        // flat input stays flat under resampling
        let px = scaled.get_pixel(7, 2).0;
        for (got, want) in px.iter().zip([10u8, 20, 30, 255]) {
            assert!(got.abs_diff(want) <= 1, "{px:?}");
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Icon::open(Path::new("/nonexistent/icon.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let path = std::env::temp_dir().join("diagram-rs-renderer-garbage-icon.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = Icon::open(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, AssetError::IconDecode { .. }));
    }
}
