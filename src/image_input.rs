use base64::Engine as _;

pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image is empty")]
    Empty,

    #[error("undecodable image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Raw bytes of one uploaded image, checked to decode as a raster image.
#[derive(Clone, Debug)]
pub struct ImageInput {
    bytes: Vec<u8>,
    format: image::ImageFormat,
    media_type: String,
}

impl ImageInput {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, InputError> {
        if bytes.is_empty() {
            return Err(InputError::Empty);
        }
        let format = image::guess_format(&bytes)?;
        image::load_from_memory_with_format(&bytes, format)?;

        Ok(Self {
            bytes,
            format,
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
        })
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }

    /// Overrides the media type declared in the data URI. Uploads are
    /// declared as JPEG regardless of their detected format unless this is
    /// called.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> image::ImageFormat {
        self.format
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, encode_base64(&self.bytes))
    }
}

pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
pub(crate) fn sample_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_fn(8, 8, |x, y| image::Rgb([(x * 30) as u8, (y * 30) as u8, 128]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img).write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}
