//! Rendering of the computed symbol geometry.
//!
//! No module data exists yet at this stage, so the renderer draws a uniformly filled canvas with
//! one pixel per module and writes it out as a PNG.

use crate::qrcode::Version;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageBuffer, ImageEncoder, ImageError, Rgba, RgbaImage};
use std::io::{self, Write};
use tracing::debug;

/// Options for the placeholder canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Colour of every pixel (default: transparent black).
    pub fill: Rgba<u8>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fill: Rgba([0, 0, 0, 0]),
        }
    }
}

/// Builds the in-memory `side × side` canvas.
///
/// # Example
///
/// ```
/// use qrsize::helper::{placeholder_image_buffer, RenderConfig};
///
/// let img = placeholder_image_buffer(21, &RenderConfig::default());
/// assert_eq!(img.dimensions(), (21, 21));
/// ```
pub fn placeholder_image_buffer(side: u32, config: &RenderConfig) -> RgbaImage {
    ImageBuffer::from_pixel(side, side, config.fill)
}

/// Writes a `side × side` placeholder PNG into `sink` using the default [`RenderConfig`].
///
/// # Errors
///
/// Returns the sink's own `io::Error` if writing fails. Nothing is retried, and bytes written
/// before the failure may or may not have reached the destination.
pub fn render_placeholder<W: Write>(side: u32, sink: W) -> io::Result<()> {
    render_placeholder_with(side, sink, &RenderConfig::default())
}

/// Writes a `side × side` placeholder PNG into `sink`.
pub fn render_placeholder_with<W: Write>(
    side: u32,
    sink: W,
    config: &RenderConfig,
) -> io::Result<()> {
    let img = placeholder_image_buffer(side, config);
    let mut sink = ErrorCapture::new(sink);
    let result =
        PngEncoder::new(&mut sink).write_image(img.as_raw(), side, side, ExtendedColorType::Rgba8);
    // The PNG trailer is written when the encoder drops and its result is discarded there, so
    // a captured sink error wins even over an Ok result. The encoder only ever sees a copy.
    match (sink.error.take(), result) {
        (Some(err), _) => Err(err),
        (None, Ok(())) => {
            debug!(side, "placeholder written");
            Ok(())
        }
        (None, Err(err)) => Err(into_io_error(err)),
    }
}

/// Computes the geometry of `version` and renders its placeholder into `sink`.
///
/// `data` is not encoded yet; only its length is logged.
///
/// # Example
///
/// ```
/// use qrsize::helper::generate;
/// use qrsize::qrcode::Version;
///
/// let mut png = Vec::new();
/// generate(&mut png, "555-2368", Version::new(1)).unwrap();
/// assert!(!png.is_empty());
/// ```
pub fn generate<W: Write>(sink: W, data: &str, version: Version) -> io::Result<()> {
    generate_with(sink, data, version, &RenderConfig::default())
}

pub fn generate_with<W: Write>(
    sink: W,
    data: &str,
    version: Version,
    config: &RenderConfig,
) -> io::Result<()> {
    let side = version.pattern_size();
    debug!(%version, side, data_len = data.len(), "rendering placeholder symbol");
    render_placeholder_with(side, sink, config)
}

fn into_io_error(err: ImageError) -> io::Error {
    match err {
        ImageError::IoError(err) => err,
        other => io::Error::other(other),
    }
}

/// Keeps the first error returned by the wrapped sink.
///
/// The PNG encoder rewraps I/O errors, so the original value is recovered from here.
struct ErrorCapture<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: Write> ErrorCapture<W> {
    fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    fn capture(&mut self, err: io::Error) -> io::Error {
        // write_all retries Interrupted, so it is not a final failure.
        if err.kind() == io::ErrorKind::Interrupted {
            return err;
        }
        let copy = io::Error::new(err.kind(), err.to_string());
        if self.error.is_none() {
            self.error = Some(err);
        }
        copy
    }
}

impl<W: Write> Write for ErrorCapture<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|err| self.capture(err))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|err| self.capture(err))
    }
}
