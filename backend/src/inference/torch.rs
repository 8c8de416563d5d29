use std::path::Path;

use tch::{CModule, Device, Kind, Tensor};

use super::service::{ScoreResult, Scorer};
use crate::config::DeviceChoice;
use crate::preprocess::NormalizedTensor;

/// TorchScript classifier whose first output element is the
/// positive-class score.
pub struct TorchScorer {
    module: CModule,
    device: Device,
}

impl TorchScorer {
    pub fn load(model_path: &Path, device: DeviceChoice) -> Result<Self, tch::TchError> {
        let device = match device {
            DeviceChoice::Cpu => Device::Cpu,
            DeviceChoice::CudaIfAvailable => Device::cuda_if_available(),
        };
        let mut module = CModule::load_on_device(model_path, device)?;
        module.set_eval();
        Ok(Self { module, device })
    }
}

impl Scorer for TorchScorer {
    fn score(&self, input: &NormalizedTensor) -> ScoreResult {
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let tensor = Tensor::from_slice(input.as_slice())
            .view(shape.as_slice())
            .to_device(self.device);
        let output = tch::no_grad(|| self.module.forward_ts(&[tensor]))?;
        let output_flat = output.to_kind(Kind::Float).view([-1]);
        if output_flat.size()[0] == 0 {
            return Err("Model returned an empty output".into());
        }
        Ok(output_flat.f_double_value(&[0])? as f32)
    }
}
