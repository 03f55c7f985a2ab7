// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decoding with format and size checks, grayscale, and
// contrast adjustment. Operates on in-memory images using the `image` crate.

use image::{DynamicImage, ImageFormat};
use menuscan_core::error::MenuscanError;
use tracing::{debug, info, instrument};

/// Raster formats accepted from callers.
pub const ACCEPTED_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`
/// wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let png = ImageProcessor::from_bytes(&upload, 16 * 1024 * 1024)?
///     .grayscale()
///     .adjust_contrast(1.2)
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, GIF, BMP, TIFF).
    ///
    /// The format is sniffed from the data itself. Buffers above `max_bytes`,
    /// unrecognised data, and formats outside [`ACCEPTED_FORMATS`] are
    /// rejected before any pixel decoding happens.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], max_bytes: usize) -> Result<Self, MenuscanError> {
        if data.len() > max_bytes {
            return Err(MenuscanError::ImageTooLarge {
                size: data.len(),
                max: max_bytes,
            });
        }

        let format = image::guess_format(data).map_err(|err| {
            MenuscanError::Decode(format!("unrecognised image data: {}", err))
        })?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(MenuscanError::UnsupportedFormat(format!("{:?}", format)));
        }

        let img = image::load_from_memory_with_format(data, format).map_err(|err| {
            MenuscanError::Decode(format!("failed to decode {:?} image: {}", format, err))
        })?;
        info!(
            ?format,
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Convert the image to grayscale (luma).
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        debug!("Converting to grayscale");
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Adjust contrast by a factor. Values > 1.0 increase contrast; values
    /// < 1.0 decrease it. A value of 1.0 is a no-op.
    ///
    /// Grayscale images stay grayscale.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        if (factor - 1.0).abs() < f32::EPSILON {
            return self;
        }
        debug!(factor, "Adjusting contrast");

        let adjust = |channel: u8| -> u8 {
            let val = factor * (channel as f32 - 128.0) + 128.0;
            val.clamp(0.0, 255.0) as u8
        };

        let image = match self.image {
            DynamicImage::ImageLuma8(mut gray) => {
                for pixel in gray.pixels_mut() {
                    pixel.0[0] = adjust(pixel.0[0]);
                }
                DynamicImage::ImageLuma8(gray)
            }
            other => {
                let mut rgba = other.to_rgba8();
                for pixel in rgba.pixels_mut() {
                    let image::Rgba([r, g, b, a]) = *pixel;
                    *pixel = image::Rgba([adjust(r), adjust(g), adjust(b), a]);
                }
                DynamicImage::ImageRgba8(rgba)
            }
        };
        Self { image }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, MenuscanError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, MenuscanError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        MenuscanError::Image(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
