// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Hardware device selection.
use std::fmt;
use std::str::FromStr;

/// Hardware device for inference.
///
/// Anything other than [`Device::Cpu`] needs the matching Cargo feature; without
/// it the model falls back to the CPU execution provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Device {
    /// CPU.
    #[default]
    Cpu,
    /// NVIDIA CUDA, by device index.
    Cuda(usize),
    /// NVIDIA `TensorRT`, by device index.
    TensorRt(usize),
    /// Apple `CoreML`.
    CoreMl,
    /// Intel `OpenVINO`.
    OpenVino,
    /// `DirectML` on Windows, by device index.
    DirectMl(usize),
}

impl Device {
    /// Human-readable accelerator name for startup diagnostics.
    #[must_use]
    pub fn accelerator(&self) -> String {
        match self {
            Self::Cpu => "CPU".to_string(),
            Self::Cuda(i) => format!("CUDA:{i}"),
            Self::TensorRt(i) => format!("TensorRT:{i}"),
            Self::CoreMl => "CoreML".to_string(),
            Self::OpenVino => "OpenVINO".to_string(),
            Self::DirectMl(i) => format!("DirectML:{i}"),
        }
    }

    /// Cargo feature that enables this device, if any.
    #[must_use]
    pub const fn feature(&self) -> Option<&'static str> {
        match self {
            Self::Cpu => None,
            Self::Cuda(_) => Some("cuda"),
            Self::TensorRt(_) => Some("tensorrt"),
            Self::CoreMl => Some("coreml"),
            Self::OpenVino => Some("openvino"),
            Self::DirectMl(_) => Some("directml"),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(i) => write!(f, "cuda:{i}"),
            Self::TensorRt(i) => write!(f, "tensorrt:{i}"),
            Self::CoreMl => write!(f, "coreml"),
            Self::OpenVino => write!(f, "openvino"),
            Self::DirectMl(i) => write!(f, "directml:{i}"),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        let (name, index) = match s.split_once(':') {
            Some((name, rest)) => {
                let index = rest
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid device index in '{s}'"))?;
                (name, index)
            }
            None => (s.as_str(), 0),
        };

        match name {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda(index)),
            "tensorrt" => Ok(Self::TensorRt(index)),
            "coreml" | "mps" => Ok(Self::CoreMl),
            "openvino" => Ok(Self::OpenVino),
            "directml" => Ok(Self::DirectMl(index)),
            _ => Err(format!("Unknown device: {s}")),
        }
    }
}
