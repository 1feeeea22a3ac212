//! Backend type aliases and device management
//!
//! This module provides a convenient type alias for the Burn backend used
//! by the simulator and trainer, plus a helper for device creation.
//!
//! NdArray (CPU) is sufficient for the Snake environment given its small
//! observation size. GPU support (via the Wgpu backend) could be added later
//! if needed for larger-scale training.

use burn::backend::ndarray::{NdArray, NdArrayDevice};

/// Default backend for observation tensors and Q-value batches
pub type DefaultBackend = NdArray<f32>;

/// Get the default device for computation
///
/// Returns the default NdArray device (CPU). This can be called multiple
/// times safely as it uses Burn's device management.
///
/// # Example
///
/// ```rust
/// use snake_dqn::rl::default_device;
///
/// let device = default_device();
/// // Use device with Burn tensors and modules
/// ```
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device() {
        let device = default_device();
        let _device_copy = device.clone();
    }
}
