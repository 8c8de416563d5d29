//! Turns a saved upload into the tensor the classifier was trained on.
//!
//! Two paths exist: 2D raster images are resized bilinearly and scaled by
//! 1/255, NIfTI volumes are min-max normalized and linearly resampled.
//! Both must reproduce the training-time transform exactly; a mismatch does
//! not fail, it only degrades predictions.

pub mod raster;
pub mod resample;
pub mod tensor;
pub mod volume;

use std::path::Path;

use crate::config::{PreprocessingConfig, RasterConfig, RasterLayout, VolumetricConfig, ChannelAxis};
use crate::error::PredictionError;
use crate::modality::Modality;

pub use tensor::NormalizedTensor;

#[derive(Debug, Clone)]
pub struct Preprocessor {
    raster: RasterConfig,
    volumetric: VolumetricConfig,
}

impl Preprocessor {
    pub fn new(config: &PreprocessingConfig) -> Self {
        Self {
            raster: config.raster.clone(),
            volumetric: config.volumetric.clone(),
        }
    }

    pub fn modality_for(&self, filename: &str) -> Modality {
        Modality::from_filename(filename, &self.volumetric.extensions)
    }

    pub fn preprocess(&self, path: &Path, modality: Modality) -> Result<NormalizedTensor, PredictionError> {
        modality.verify_content(path)?;
        match modality {
            Modality::Raster => raster::preprocess_raster(path, &self.raster),
            Modality::Volumetric => volume::preprocess_volume(path, &self.volumetric),
        }
    }

    /// Shape every tensor of `modality` will have.
    pub fn output_shape(&self, modality: Modality) -> Vec<usize> {
        match modality {
            Modality::Raster => {
                let [h, w] = self.raster.size;
                match self.raster.layout {
                    RasterLayout::Nhwc => vec![1, h, w, 3],
                    RasterLayout::Nchw => vec![1, 3, h, w],
                }
            }
            Modality::Volumetric => {
                let [d, h, w] = self.volumetric.shape;
                match self.volumetric.channel_axis {
                    ChannelAxis::None => vec![1, d, h, w],
                    ChannelAxis::First => vec![1, 1, d, h, w],
                    ChannelAxis::Last => vec![1, d, h, w, 1],
                }
            }
        }
    }
}
