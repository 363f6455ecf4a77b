use std::fmt;
use std::io::Read;
use std::time::{Duration, Instant};

use image::{ColorType, ImageFormat};

/// Upper bound on portrait payloads, remote or local.
pub const MAX_PORTRAIT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug)]
pub enum PortraitError {
    EmptyUrl,
    Http(reqwest::Error),
    Status(u16),
    Io(std::io::Error),
    TooLarge(u64),
    Decode(image::ImageError),
    Unsupported(String),
}

impl fmt::Display for PortraitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortraitError::EmptyUrl => write!(f, "no photo URL"),
            PortraitError::Http(e) => write!(f, "request failed: {e}"),
            PortraitError::Status(code) => write!(f, "server answered HTTP {code}"),
            PortraitError::Io(e) => write!(f, "read failed: {e}"),
            PortraitError::TooLarge(len) => {
                write!(f, "image is {len} bytes, limit is {MAX_PORTRAIT_BYTES}")
            }
            PortraitError::Decode(e) => write!(f, "cannot decode image: {e}"),
            PortraitError::Unsupported(msg) => write!(f, "unsupported image: {msg}"),
        }
    }
}

impl std::error::Error for PortraitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PortraitError::Http(e) => Some(e),
            PortraitError::Io(e) => Some(e),
            PortraitError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PortraitError {
    fn from(e: std::io::Error) -> Self {
        PortraitError::Io(e)
    }
}

/// Source of portrait bytes. Called at most once per render.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PortraitError>;
}

/// Fetches `http(s)://` URLs with a bounded blocking request; `file://` URLs and
/// bare paths are read from disk.
pub struct UrlFetcher {
    timeout: Duration,
}

impl UrlFetcher {
    pub fn new(timeout: Duration) -> Self {
        UrlFetcher { timeout }
    }

    fn fetch_http(&self, url: &str) -> Result<Vec<u8>, PortraitError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(PortraitError::Http)?;
        let resp = client.get(url).send().map_err(PortraitError::Http)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PortraitError::Status(status.as_u16()));
        }
        if let Some(len) = resp.content_length()
            && len > MAX_PORTRAIT_BYTES
        {
            return Err(PortraitError::TooLarge(len));
        }
        let mut body = Vec::new();
        resp.take(MAX_PORTRAIT_BYTES + 1).read_to_end(&mut body)?;
        if body.len() as u64 > MAX_PORTRAIT_BYTES {
            return Err(PortraitError::TooLarge(body.len() as u64));
        }
        Ok(body)
    }

    fn fetch_file(&self, path: &str) -> Result<Vec<u8>, PortraitError> {
        let len = std::fs::metadata(path)?.len();
        if len > MAX_PORTRAIT_BYTES {
            return Err(PortraitError::TooLarge(len));
        }
        Ok(std::fs::read(path)?)
    }
}

impl Default for UrlFetcher {
    fn default() -> Self {
        Self::new(crate::options::PortraitOptions::default().timeout)
    }
}

impl ImageFetcher for UrlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PortraitError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(PortraitError::EmptyUrl);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_http(url)
        } else {
            self.fetch_file(url.strip_prefix("file://").unwrap_or(url))
        }
    }
}

pub(crate) enum PixelData {
    /// Original JPEG stream, embedded with DCTDecode.
    Jpeg { data: Vec<u8>, gray: bool },
    /// Decoded 8-bit RGB samples plus an optional alpha channel.
    Raw { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

pub struct Portrait {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub(crate) pixels: PixelData,
}

impl Portrait {
    /// Display size inside a `box_size` square, keeping the aspect ratio.
    pub fn fit(&self, box_size: f32) -> (f32, f32) {
        let (w, h) = (self.pixel_width as f32, self.pixel_height as f32);
        if w >= h {
            (box_size, box_size * h / w)
        } else {
            (box_size * w / h, box_size)
        }
    }
}

pub fn decode_portrait(bytes: &[u8]) -> Result<Portrait, PortraitError> {
    let format = image::guess_format(bytes).map_err(PortraitError::Decode)?;
    let decoded =
        image::load_from_memory_with_format(bytes, format).map_err(PortraitError::Decode)?;
    let (w, h) = (decoded.width(), decoded.height());
    if w == 0 || h == 0 {
        return Err(PortraitError::Unsupported("zero-sized image".into()));
    }

    let pixels = match (format, decoded.color()) {
        (ImageFormat::Jpeg, ColorType::Rgb8) => PixelData::Jpeg {
            data: bytes.to_vec(),
            gray: false,
        },
        (ImageFormat::Jpeg, ColorType::L8) => PixelData::Jpeg {
            data: bytes.to_vec(),
            gray: true,
        },
        _ => {
            let rgba: image::RgbaImage = decoded.to_rgba8();
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let rgb: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
            let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
            PixelData::Raw { rgb, alpha }
        }
    };

    Ok(Portrait {
        pixel_width: w,
        pixel_height: h,
        pixels,
    })
}

/// One bounded attempt at fetching and decoding the photo. Failures are logged and
/// reported as `None`; they never abort the render.
pub(crate) fn load_portrait(fetcher: &dyn ImageFetcher, url: Option<&str>) -> Option<Portrait> {
    let url = url.map(str::trim).filter(|u| !u.is_empty())?;
    let t0 = Instant::now();
    let result = fetcher.fetch(url).and_then(|bytes| decode_portrait(&bytes));
    match result {
        Ok(portrait) => {
            log::debug!(
                "portrait {}x{} loaded in {:.1}ms",
                portrait.pixel_width,
                portrait.pixel_height,
                t0.elapsed().as_secs_f64() * 1000.0,
            );
            Some(portrait)
        }
        Err(e) => {
            log::warn!("Skipping portrait {url}: {e}");
            None
        }
    }
}
