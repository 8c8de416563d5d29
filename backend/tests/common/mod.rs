//! Fixture builders shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use flate2::Compression;
use flate2::write::GzEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use screening_backend::config::{ModelOutput, ServingConfig};
use screening_backend::inference::{InferenceService, ScoreResult, Scorer};
use screening_backend::{NormalizedTensor, Predictor};

/// Config with small targets so tests stay fast.
pub fn test_config(upload_dir: &Path) -> ServingConfig {
    let mut config = ServingConfig::default();
    config.server.upload_dir = upload_dir.to_path_buf();
    config.preprocessing.raster.size = [32, 32];
    config.preprocessing.volumetric.shape = [8, 12, 10];
    config
}

/// Returns a fixed score and records the shape of every tensor it sees.
#[derive(Clone)]
pub struct RecordingScorer {
    score: f32,
    fail: bool,
    seen: Arc<Mutex<Vec<Vec<usize>>>>,
}

impl RecordingScorer {
    pub fn returning(score: f32) -> Self {
        Self {
            score,
            fail: false,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(0.0)
        }
    }

    pub fn seen(&self) -> Vec<Vec<usize>> {
        self.seen.lock().unwrap().clone()
    }
}

impl Scorer for RecordingScorer {
    fn score(&self, input: &NormalizedTensor) -> ScoreResult {
        assert!(input.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
        self.seen.lock().unwrap().push(input.shape().to_vec());
        if self.fail {
            Err("forward pass failed".into())
        } else {
            Ok(self.score)
        }
    }
}

pub fn predictor_with(config: &ServingConfig, scorer: RecordingScorer) -> Predictor {
    Predictor::new(config, InferenceService::loaded(scorer, ModelOutput::Probability))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Single-file little-endian NIfTI-1 volume of `float32` voxels with
/// `dims = [nx, ny, nz]`, filled from `voxel(x, y, z)`.
pub fn nifti_bytes(dims: [u16; 3], voxel: impl Fn(u16, u16, u16) -> f32) -> Vec<u8> {
    let mut header = vec![0u8; 348];
    let put_i16 = |buf: &mut [u8], offset: usize, value: i16| {
        buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes())
    };
    let put_f32 = |buf: &mut [u8], offset: usize, value: f32| {
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes())
    };

    header[0..4].copy_from_slice(&348i32.to_le_bytes());
    header[38] = b'r';
    let dim = [3, dims[0] as i16, dims[1] as i16, dims[2] as i16, 1, 1, 1, 1];
    for (i, d) in dim.iter().enumerate() {
        put_i16(&mut header, 40 + 2 * i, *d);
    }
    put_i16(&mut header, 70, 16); // FLOAT32
    put_i16(&mut header, 72, 32);
    for i in 0..8 {
        put_f32(&mut header, 76 + 4 * i, 1.0);
    }
    put_f32(&mut header, 108, 352.0);
    put_f32(&mut header, 112, 1.0);
    put_f32(&mut header, 116, 0.0);
    header[344..348].copy_from_slice(b"n+1\0");

    let mut bytes = header;
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    for z in 0..dims[2] {
        for y in 0..dims[1] {
            for x in 0..dims[0] {
                bytes.extend_from_slice(&voxel(x, y, z).to_le_bytes());
            }
        }
    }
    bytes
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn ramp(x: u16, y: u16, z: u16) -> f32 {
    f32::from(x) * 3.0 + f32::from(y) * 7.0 - f32::from(z) * 11.0 + 0.25
}

/// True when `dir` is missing or holds no entries.
pub fn is_empty_dir(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}
