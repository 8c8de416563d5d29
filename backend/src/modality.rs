use std::fmt;
use std::path::Path;

use crate::error::PredictionError;

/// Which preprocessing path an upload takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// 2D photographic image (JPEG, PNG, ...).
    Raster,
    /// 3D NIfTI volume.
    Volumetric,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Raster => f.write_str("raster"),
            Modality::Volumetric => f.write_str("volumetric"),
        }
    }
}

impl Modality {
    /// Case-insensitive suffix match against `volumetric_suffixes`;
    /// anything unmatched is a raster image.
    pub fn from_filename<S: AsRef<str>>(filename: &str, volumetric_suffixes: &[S]) -> Self {
        let lower = filename.to_ascii_lowercase();
        let is_volume = volumetric_suffixes
            .iter()
            .any(|suffix| lower.ends_with(&suffix.as_ref().to_ascii_lowercase()));
        if is_volume {
            Modality::Volumetric
        } else {
            Modality::Raster
        }
    }

    /// Checks that the file's header agrees with the modality picked from
    /// its name.
    pub fn verify_content(self, path: &Path) -> Result<(), PredictionError> {
        match self {
            Modality::Raster => {
                let head = read_head(path, 64)?;
                image::guess_format(&head).map(|_| ()).map_err(|_| {
                    PredictionError::Decode("File content is not a recognized image format".to_string())
                })
            }
            Modality::Volumetric => nifti::NiftiHeader::from_file(path)
                .map(|_| ())
                .map_err(|e| PredictionError::Decode(format!("File content is not a NIfTI volume: {e}"))),
        }
    }
}

fn read_head(path: &Path, len: usize) -> Result<Vec<u8>, PredictionError> {
    use std::io::Read;

    let file = std::fs::File::open(path)
        .map_err(|e| PredictionError::Decode(format!("Failed to open upload: {e}")))?;
    let mut head = Vec::with_capacity(len);
    file.take(len as u64)
        .read_to_end(&mut head)
        .map_err(|e| PredictionError::Decode(format!("Failed to read upload: {e}")))?;
    Ok(head)
}
