use std::path::Path;

use ndarray::{Array3, Axis};
use nifti::{NiftiObject, NiftiVolume, RandomAccessNiftiVolume, ReaderOptions};

use super::resample::{self, Alignment};
use super::tensor::NormalizedTensor;
use crate::config::{ChannelAxis, VolumetricConfig};
use crate::error::PredictionError;

/// Reads a NIfTI file into a `(depth, height, width)` array, i.e. the
/// file's `(k, j, i)` axes. Scaling from the header is applied.
pub fn load_volume(path: &Path) -> Result<Array3<f32>, PredictionError> {
    let object = ReaderOptions::new()
        .read_file(path)
        .map_err(|e| PredictionError::Decode(format!("Failed to read NIfTI volume: {e}")))?;
    let volume = object.volume();

    let dims = volume.dim();
    if dims.len() < 3 || dims[3..].iter().any(|&d| d != 1) {
        return Err(PredictionError::Shape(format!(
            "Expected a 3D volume, got dimensions {dims:?}"
        )));
    }
    let (nx, ny, nz) = (dims[0], dims[1], dims[2]);
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(PredictionError::Shape(format!("Volume has an empty axis: {dims:?}")));
    }

    let mut coords = vec![0u16; dims.len()];
    let mut voxels = Vec::with_capacity(nx as usize * ny as usize * nz as usize);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                coords[0] = x;
                coords[1] = y;
                coords[2] = z;
                let value = volume
                    .get_f32(&coords)
                    .map_err(|e| PredictionError::Decode(format!("Failed to read voxel: {e}")))?;
                voxels.push(value);
            }
        }
    }

    Array3::from_shape_vec((nz as usize, ny as usize, nx as usize), voxels)
        .map_err(|e| PredictionError::Shape(e.to_string()))
}

/// Rescales the volume so its global minimum is 0 and maximum is 1.
pub fn min_max_normalize(volume: &mut Array3<f32>) -> Result<(), PredictionError> {
    if volume.is_empty() {
        return Err(PredictionError::Shape("Volume is empty".to_string()));
    }
    if volume.iter().any(|v| !v.is_finite()) {
        return Err(PredictionError::Shape(
            "Volume contains non-finite intensities".to_string(),
        ));
    }
    let (min, max) = volume
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max == min {
        return Err(PredictionError::Shape(format!(
            "Volume has no usable intensity range (min {min}, max {max})"
        )));
    }
    // f64 keeps the span finite for intensities near f32::MAX.
    let (min, range) = (f64::from(min), f64::from(max) - f64::from(min));
    volume.mapv_inplace(|v| ((f64::from(v) - min) / range) as f32);
    Ok(())
}

/// Min-max normalizes, resamples to the configured grid and adds the batch
/// (and optional channel) axes.
pub fn normalize_volume(
    mut volume: Array3<f32>,
    config: &VolumetricConfig,
) -> Result<NormalizedTensor, PredictionError> {
    min_max_normalize(&mut volume)?;

    let [depth, height, width] = config.shape;
    let mut resized = resample::resample(
        volume,
        &[(Axis(0), depth), (Axis(1), height), (Axis(2), width)],
        Alignment::Corners,
    );
    resized.mapv_inplace(|v| v.clamp(0.0, 1.0));

    let batched = resized.insert_axis(Axis(0)).into_dyn();
    let tensor = match config.channel_axis {
        ChannelAxis::None => batched,
        ChannelAxis::First => batched.insert_axis(Axis(1)),
        ChannelAxis::Last => batched.insert_axis(Axis(4)),
    };
    Ok(NormalizedTensor::new(tensor))
}

pub fn preprocess_volume(
    path: &Path,
    config: &VolumetricConfig,
) -> Result<NormalizedTensor, PredictionError> {
    let volume = load_volume(path)?;
    log::debug!("Decoded volume with shape {:?}", volume.shape());
    normalize_volume(volume, config)
}
