//! Configuration structures for the classifier trainer.

use crate::error::{Result, TrainerError};
use crate::types::{ArchitectureKind, ImageShape, LossKind, OptimizerKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options for a single training run.
///
/// Constructed externally (typically deserialized from a TOML file) and
/// handed to the trainer, which treats it as immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOptions {
    /// Target image dimensions; every loaded image is resized to this shape
    pub image_shape: ImageShape,
    /// Number of output classes
    pub output_classes: usize,
    /// Number of fully-connected layers between backbone and output
    pub num_fc_layers: usize,
    /// Width of each fully-connected layer
    pub fc_neurones: usize,
    /// Optimizer identifier
    pub optimiser: OptimizerKind,
    /// Loss function identifier
    pub loss_function: LossKind,
    /// Enable random horizontal flips during training
    pub horizontal_flip: bool,
    /// Enable random vertical flips during training
    pub vertical_flip: bool,
    /// Random rotation range in degrees during training
    pub rotation_angle: f32,
    /// Batch size
    pub batch_size: usize,
    /// Directory holding one subdirectory of images per class
    pub training_dir: Option<PathBuf>,
    /// Optional validation directory with the same layout
    pub validation_dir: Option<PathBuf>,
    /// Backbone architecture selector
    pub architecture: ArchitectureKind,
    /// Path to pre-trained backbone weights (ImageNet record)
    pub pretrained: Option<PathBuf>,
    /// Learning rate handed to the optimizer
    pub learning_rate: f64,
    /// Random seed for reproducible shuffling
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            image_shape: ImageShape::imagenet(),
            output_classes: 2,
            num_fc_layers: 1,
            fc_neurones: 256,
            optimiser: OptimizerKind::Adam,
            loss_function: LossKind::CrossEntropy,
            horizontal_flip: false,
            vertical_flip: false,
            rotation_angle: 0.0,
            batch_size: 32,
            training_dir: None,
            validation_dir: None,
            architecture: ArchitectureKind::ResNet50,
            pretrained: None,
            learning_rate: 0.001,
            seed: 42,
        }
    }
}

impl TrainingOptions {
    /// Validates numeric option values.
    ///
    /// Directory presence is not checked here; the data-flow builders check
    /// the directory relevant to the split they bind.
    pub fn validate(&self) -> Result<()> {
        if self.output_classes == 0 {
            return Err(TrainerError::Config(
                "output_classes must be greater than 0".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(TrainerError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.num_fc_layers > 0 && self.fc_neurones == 0 {
            return Err(TrainerError::Config(
                "fc_neurones must be greater than 0 when fully-connected layers are requested"
                    .to_string(),
            ));
        }
        // Backbones reduce spatial dimensions by a factor of 32.
        if self.image_shape.width < 32 || self.image_shape.height < 32 {
            return Err(TrainerError::Config(format!(
                "image shape {}x{} is too small; both dimensions must be at least 32",
                self.image_shape.width, self.image_shape.height
            )));
        }
        if self.rotation_angle < 0.0 {
            return Err(TrainerError::Config(format!(
                "rotation_angle must not be negative, got {}",
                self.rotation_angle
            )));
        }
        if self.learning_rate <= 0.0 {
            return Err(TrainerError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}
