//! Device selection for the Burn backend.
//!
//! The trainer itself is backend-generic; this module only decides which
//! device to report and hand to the backend at startup.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Compute device for model construction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Device {
    /// CPU backend
    Cpu,
    /// GPU backend (when available)
    Gpu(usize),
}

impl Default for Device {
    fn default() -> Self {
        if is_gpu_available() {
            Device::Gpu(0)
        } else {
            Device::Cpu
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "CPU"),
            Device::Gpu(id) => write!(f, "GPU:{}", id),
        }
    }
}

/// Select the best available device, logging the outcome.
pub fn select_device(requested: Device) -> Device {
    let device = match requested {
        Device::Cpu => Device::Cpu,
        Device::Gpu(id) if is_gpu_available() => Device::Gpu(id),
        Device::Gpu(_) => {
            info!("GPU requested but not available, falling back to CPU");
            Device::Cpu
        }
    };
    info!("Using device: {}", device);
    device
}

/// Check if GPU acceleration is available
pub fn is_gpu_available() -> bool {
    has_nvidia_gpu()
}

fn has_nvidia_gpu() -> bool {
    #[cfg(target_os = "linux")]
    {
        std::path::Path::new("/proc/driver/nvidia/version").exists()
            || std::path::Path::new("/dev/nvidia0").exists()
            || std::env::var("CUDA_VISIBLE_DEVICES").is_ok()
    }

    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
