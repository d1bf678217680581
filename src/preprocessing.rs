// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image preprocessing for YOLO pose inference.
//!
//! Letterbox resize (aspect-preserving, gray padding), normalization to [0, 1],
//! and HWC to NCHW layout. The transform parameters are kept so model-space
//! coordinates can be mapped back to the original image.

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use half::f16;
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

use crate::error::{RecorderError, Result};

/// Normalized letterbox padding color (114/255).
const LETTERBOX_NORM: f32 = 114.0 / 255.0;

/// Reciprocal of 255 for normalization.
const INV_255: f32 = 1.0 / 255.0;

/// Result of preprocessing an image, containing the tensor and transform info.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Preprocessed image tensor in NCHW format, normalized to [0, 1].
    pub tensor: Array4<f32>,
    /// FP16 copy of the tensor for half-precision models.
    pub tensor_f16: Option<Array4<f16>>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

/// Letterbox an image into a `(1, 3, H, W)` tensor.
///
/// # Arguments
///
/// * `image` - Input image.
/// * `target_size` - Target size as (height, width).
/// * `half` - Also produce an FP16 tensor.
///
/// # Errors
///
/// Returns an error if the image is empty or cannot be resized.
pub fn preprocess_image(
    image: &DynamicImage,
    target_size: (usize, usize),
    half: bool,
) -> Result<PreprocessResult> {
    let (orig_width, orig_height) = image.dimensions();
    if orig_width == 0 || orig_height == 0 {
        return Err(RecorderError::ImageError(format!(
            "Image has zero size ({orig_width}x{orig_height})"
        )));
    }

    let (new_width, new_height, pad_left, pad_top, scale) =
        calculate_letterbox_params(orig_width, orig_height, target_size);

    let rgb = image.to_rgb8();
    let resized = if (new_width, new_height) == (orig_width, orig_height) {
        rgb.into_raw()
    } else {
        resize_rgb(rgb.into_raw(), (orig_width, orig_height), (new_width, new_height))?
    };

    let tensor = letterbox_to_tensor(
        &resized,
        (new_width as usize, new_height as usize),
        target_size,
        (pad_top as usize, pad_left as usize),
    );
    let tensor_f16 = half.then(|| tensor.mapv(f16::from_f32));

    Ok(PreprocessResult {
        tensor,
        tensor_f16,
        orig_shape: (orig_height, orig_width),
        scale,
        #[allow(clippy::cast_precision_loss)]
        padding: (pad_top as f32, pad_left as f32),
    })
}

/// Bilinear resize of packed RGB8 pixels.
fn resize_rgb(pixels: Vec<u8>, src: (u32, u32), dst: (u32, u32)) -> Result<Vec<u8>> {
    let src_image = Image::from_vec_u8(src.0, src.1, pixels, PixelType::U8x3)
        .map_err(|e| RecorderError::ImageError(format!("Failed to wrap image buffer: {e}")))?;
    let mut dst_image = Image::new(dst.0, dst.1, PixelType::U8x3);

    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| RecorderError::ImageError(format!("Failed to resize image: {e}")))?;

    Ok(dst_image.into_vec())
}

/// Place resized RGB pixels into a gray-padded, normalized NCHW tensor.
fn letterbox_to_tensor(
    pixels: &[u8],
    (width, height): (usize, usize),
    (dst_h, dst_w): (usize, usize),
    (pad_top, pad_left): (usize, usize),
) -> Array4<f32> {
    let mut tensor = Array4::from_elem((1, 3, dst_h, dst_w), LETTERBOX_NORM);

    for (i, px) in pixels.chunks_exact(3).enumerate() {
        let y = pad_top + i / width;
        let x = pad_left + i % width;
        if y >= dst_h || x >= dst_w || i / width >= height {
            continue;
        }
        for c in 0..3 {
            tensor[[0, c, y, x]] = f32::from(px[c]) * INV_255;
        }
    }

    tensor
}

/// Calculate letterbox parameters for resizing.
///
/// Returns `(new_width, new_height, pad_left, pad_top, (scale_y, scale_x))`.
/// Padding is split evenly on both sides.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn calculate_letterbox_params(
    orig_width: u32,
    orig_height: u32,
    target_size: (usize, usize),
) -> (u32, u32, u32, u32, (f32, f32)) {
    let (target_h, target_w) = (target_size.0 as f32, target_size.1 as f32);
    let (orig_h, orig_w) = (orig_height as f32, orig_width as f32);

    let scale = (target_h / orig_h).min(target_w / orig_w);

    let new_w = ((orig_w * scale).round() as u32).max(1);
    let new_h = ((orig_h * scale).round() as u32).max(1);

    let pad_left = (target_size.1 as u32).saturating_sub(new_w) / 2;
    let pad_top = (target_size.0 as u32).saturating_sub(new_h) / 2;

    let scale_x = new_w as f32 / orig_w;
    let scale_y = new_h as f32 / orig_h;

    (new_w, new_h, pad_left, pad_top, (scale_y, scale_x))
}

/// Map a point from letterboxed model space back to original image space.
#[must_use]
pub fn scale_point(x: f32, y: f32, scale: (f32, f32), padding: (f32, f32)) -> (f32, f32) {
    let (scale_y, scale_x) = scale;
    let (pad_top, pad_left) = padding;
    ((x - pad_left) / scale_x, (y - pad_top) / scale_y)
}

/// Scale box coordinates `[x1, y1, x2, y2]` back to original image space.
#[must_use]
pub fn scale_coords(coords: &[f32; 4], scale: (f32, f32), padding: (f32, f32)) -> [f32; 4] {
    let (x1, y1) = scale_point(coords[0], coords[1], scale, padding);
    let (x2, y2) = scale_point(coords[2], coords[3], scale, padding);
    [x1, y1, x2, y2]
}

/// Clip box coordinates to image bounds given as (height, width).
#[must_use]
pub const fn clip_coords(coords: &[f32; 4], shape: (u32, u32)) -> [f32; 4] {
    #[allow(clippy::cast_precision_loss)]
    let (h, w) = (shape.0 as f32, shape.1 as f32);
    [
        coords[0].clamp(0.0, w),
        coords[1].clamp(0.0, h),
        coords[2].clamp(0.0, w),
        coords[3].clamp(0.0, h),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_params_square() {
        let (new_w, new_h, pad_left, pad_top, _scale) =
            calculate_letterbox_params(640, 640, (640, 640));

        assert_eq!((new_w, new_h), (640, 640));
        assert_eq!((pad_left, pad_top), (0, 0));
    }

    #[test]
    fn test_letterbox_params_wide() {
        let (new_w, new_h, pad_left, pad_top, scale) =
            calculate_letterbox_params(1280, 720, (640, 640));

        assert_eq!((new_w, new_h), (640, 360));
        assert_eq!(pad_left, 0);
        assert_eq!(pad_top, 140);
        assert!((scale.0 - 0.5).abs() < 1e-6);
        assert!((scale.1 - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_scale_point_roundtrip() {
        let (_, _, pad_left, pad_top, scale) = calculate_letterbox_params(1280, 720, (640, 640));
        #[allow(clippy::cast_precision_loss)]
        let padding = (pad_top as f32, pad_left as f32);

        // Center of a 1280x720 image lands at the center of the 640x640 canvas
        let (x, y) = scale_point(320.0, 320.0, scale, padding);
        assert!((x - 640.0).abs() < 1e-3);
        assert!((y - 360.0).abs() < 1e-3);
    }

    #[test]
    fn test_clip_coords() {
        let clipped = clip_coords(&[-10.0, -20.0, 700.0, 500.0], (480, 640));
        assert_eq!(clipped, [0.0, 0.0, 640.0, 480.0]);
    }

    #[test]
    fn test_preprocess_pads_with_gray() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            64,
            32,
            image::Rgb([255, 0, 0]),
        ));
        let result = preprocess_image(&img, (64, 64), true).unwrap();

        assert_eq!(result.tensor.shape(), &[1, 3, 64, 64]);
        assert_eq!(result.orig_shape, (32, 64));
        assert_eq!(result.padding, (16.0, 0.0));
        assert!(result.tensor_f16.is_some());

        // Top padding row is gray
        assert!((result.tensor[[0, 0, 0, 0]] - LETTERBOX_NORM).abs() < 1e-6);
        // Image region keeps the red channel
        assert!((result.tensor[[0, 0, 32, 32]] - 1.0).abs() < 1e-6);
        assert!(result.tensor[[0, 1, 32, 32]].abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_rejects_empty_image() {
        let img = DynamicImage::new_rgb8(0, 0);
        assert!(preprocess_image(&img, (64, 64), false).is_err());
    }
}
