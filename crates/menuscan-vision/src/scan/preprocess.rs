// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Menu photo preprocessing: grayscale conversion, optional contrast boost,
// Gaussian denoise, and adaptive binarization, producing a PNG ready for the
// recognition engine.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use menuscan_core::config::PreprocessConfig;
use menuscan_core::error::MenuscanError;
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;

/// A normalised, binarized menu image.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    pub width: u32,
    pub height: u32,
    /// PNG encoding of the binarized image.
    pub png: Vec<u8>,
}

/// Turns raw uploaded bytes into a [`PreprocessedImage`].
///
/// Stateless apart from its settings; one instance can serve any number of
/// requests, and clones are cheap.
#[derive(Debug, Clone)]
pub struct MenuPreprocessor {
    config: PreprocessConfig,
}

impl MenuPreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Decode and normalise an uploaded menu photo.
    ///
    /// # Errors
    ///
    /// [`MenuscanError::Decode`], [`MenuscanError::UnsupportedFormat`] or
    /// [`MenuscanError::ImageTooLarge`] when the bytes are not an acceptable
    /// image; [`MenuscanError::Image`] if re-encoding fails.
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub fn preprocess(&self, data: &[u8]) -> Result<PreprocessedImage, MenuscanError> {
        let decoded = ImageProcessor::from_bytes(data, self.config.max_image_bytes)?;
        let binary = self.enhance(decoded.into_dynamic());
        let (width, height) = binary.dimensions();

        let png = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(binary)).to_png_bytes()?;
        info!(width, height, png_len = png.len(), "Menu image preprocessed");
        Ok(PreprocessedImage { width, height, png })
    }

    /// Run the enhancement pipeline on an already-decoded image:
    ///
    /// 1. Convert to grayscale
    /// 2. Adjust contrast (skipped at factor 1.0)
    /// 3. Gaussian blur to suppress sensor noise and paper texture
    /// 4. Adaptive local-mean binarization
    pub fn enhance(&self, image: DynamicImage) -> GrayImage {
        let gray = ImageProcessor::from_dynamic(image)
            .grayscale()
            .adjust_contrast(self.config.contrast_factor)
            .into_dynamic()
            .to_luma8();

        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);
        debug!(sigma = self.config.blur_sigma, "Gaussian blur applied");

        binarize(
            &blurred,
            self.config.block_radius,
            self.config.threshold_offset,
        )
    }
}

/// Adaptive local-mean threshold.
///
/// A pixel turns black when it is darker than the mean of its
/// `(2 * block_radius + 1)` square neighbourhood, clipped at the image
/// borders, minus `offset`. Everything else turns white.
pub fn binarize(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    debug!(block_radius, offset, "Applying adaptive binarization");

    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }
    let sums = integral_image::<_, u64>(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let (left, right) = window(x, block_radius, width);
        let (top, bottom) = window(y, block_radius, height);
        let area = u64::from(right - left + 1) * u64::from(bottom - top + 1);
        let mean = sum_image_pixels(&sums, left, top, right, bottom)[0] / area;

        let threshold = (mean as i32 - offset).clamp(0, 255);
        if i32::from(gray.get_pixel(x, y).0[0]) < threshold {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Inclusive span `centre ± radius`, clipped to `0..len`.
fn window(centre: u32, radius: u32, len: u32) -> (u32, u32) {
    (
        centre.saturating_sub(radius),
        centre.saturating_add(radius).min(len - 1),
    )
}
