//! Compute device pre-flight (CPU / Metal / CUDA).
//!
//! [`probe_capabilities`] is called once by the orchestrating caller before any model is
//! built. It picks the first usable accelerator enabled at compile time and falls back to
//! the CPU.

use candle_core::Device;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::info;

#[cfg(not(any(feature = "metal", feature = "cuda")))]
use tracing::debug;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("{device} device unavailable: {reason}")]
    Unavailable { device: String, reason: String },
}

/// Kind of device training will run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Metal,
    Cuda,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Metal => write!(f, "metal"),
            DeviceKind::Cuda => write!(f, "cuda"),
        }
    }
}

/// Result of the pre-flight check.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Kind of the selected device.
    pub kind: DeviceKind,
    /// Number of accelerators that answered the probe (0 when running on CPU).
    pub accelerator_count: usize,
    /// Why no accelerator was selected, if any.
    pub fallback_reason: Option<String>,
    device: Device,
}

impl DeviceCapabilities {
    /// CPU-only capabilities (used by tests and when no accelerator is wanted).
    pub fn cpu() -> Self {
        Self {
            kind: DeviceKind::Cpu,
            accelerator_count: 0,
            fallback_reason: None,
            device: Device::Cpu,
        }
    }

    /// The selected device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns `true` if training will run on an accelerator.
    pub fn has_accelerator(&self) -> bool {
        self.kind != DeviceKind::Cpu
    }
}

/// Probes enabled backends and returns the device to train on (falls back to CPU).
pub fn probe_capabilities() -> Result<DeviceCapabilities, DeviceError> {
    #[cfg(any(feature = "metal", feature = "cuda"))]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    let failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU acceleration");
                return Ok(DeviceCapabilities {
                    kind: DeviceKind::Metal,
                    accelerator_count: 1,
                    fallback_reason: None,
                    device,
                });
            }
            Err(e) => {
                let msg = e.to_string();
                if cfg!(feature = "cuda") {
                    warn!(error = %msg, "Metal device unavailable, trying CUDA");
                } else {
                    warn!(error = %msg, "Metal device unavailable");
                }
                failures.push(format!("metal failed: {msg}"));
            }
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                let accelerator_count = count_cuda_devices();
                info!(accelerator_count, "Using CUDA GPU acceleration");
                return Ok(DeviceCapabilities {
                    kind: DeviceKind::Cuda,
                    accelerator_count,
                    fallback_reason: None,
                    device,
                });
            }
            Err(e) => {
                let msg = e.to_string();
                warn!(error = %msg, "CUDA device unavailable");
                failures.push(format!("cuda failed: {msg}"));
            }
        }
    }

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    {
        debug!("No GPU features enabled");
    }

    let reason = if !cfg!(any(feature = "metal", feature = "cuda")) {
        "no GPU backend compiled".to_string()
    } else if failures.is_empty() {
        "no GPU device available".to_string()
    } else {
        failures.join("; ")
    };

    warn!(reason = %reason, "Falling back to CPU device");
    Ok(DeviceCapabilities {
        fallback_reason: Some(reason),
        ..DeviceCapabilities::cpu()
    })
}

#[cfg(feature = "cuda")]
fn count_cuda_devices() -> usize {
    (0..16)
        .take_while(|&ordinal| Device::new_cuda(ordinal).is_ok())
        .count()
        .max(1)
}
