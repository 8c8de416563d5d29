use std::path::Path;

use image::{DynamicImage, ImageReader};
use ndarray::{Array3, Axis};

use super::resample::{self, Alignment};
use super::tensor::NormalizedTensor;
use crate::config::{ChannelOrder, RasterConfig, RasterLayout};
use crate::error::PredictionError;

pub fn load_image(path: &Path) -> Result<DynamicImage, PredictionError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| PredictionError::Decode(format!("Failed to read image: {e}")))?
        .decode()
        .map_err(|e| PredictionError::Decode(format!("Failed to decode image: {e}")))
}

/// Resizes to the configured `[height, width]` with bilinear interpolation,
/// requantizes to 8 bits and scales by 1/255.
pub fn normalize_image(
    image: &DynamicImage,
    config: &RasterConfig,
) -> Result<NormalizedTensor, PredictionError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(PredictionError::Shape(format!(
            "Image has degenerate size {width}x{height}"
        )));
    }

    let channel_map: [usize; 3] = match config.channel_order {
        ChannelOrder::Rgb => [0, 1, 2],
        ChannelOrder::Bgr => [2, 1, 0],
    };
    let pixels = Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
        f32::from(rgb.get_pixel(x as u32, y as u32)[channel_map[c]])
    });

    let [target_h, target_w] = config.size;
    let resized = resample::resample(
        pixels,
        &[(Axis(0), target_h), (Axis(1), target_w)],
        Alignment::HalfPixel,
    );
    let scaled = resized.mapv(|v| v.round().clamp(0.0, 255.0) / 255.0);

    let laid_out = match config.layout {
        RasterLayout::Nhwc => scaled,
        RasterLayout::Nchw => scaled.permuted_axes([2, 0, 1]),
    };
    Ok(NormalizedTensor::new(laid_out.insert_axis(Axis(0)).into_dyn()))
}

pub fn preprocess_raster(path: &Path, config: &RasterConfig) -> Result<NormalizedTensor, PredictionError> {
    let image = load_image(path)?;
    log::debug!(
        "Decoded raster {}x{} ({:?})",
        image.width(),
        image.height(),
        image.color()
    );
    normalize_image(&image, config)
}
