//! Core type definitions for the classifier trainer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of colour channels every model input carries.
pub const CHANNELS: usize = 3;

/// Target image dimensions (width x height)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageShape {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageShape {
    /// Creates a new image shape
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Standard ImageNet dimensions (224x224)
    pub fn imagenet() -> Self {
        Self::new(224, 224)
    }

    /// Number of values in one preprocessed image (CHW)
    pub fn num_values(&self) -> usize {
        CHANNELS * self.width as usize * self.height as usize
    }
}

/// Pre-trained backbone architecture selector.
///
/// These are the keys of the architecture registry: each variant maps to
/// exactly one backbone constructor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArchitectureKind {
    /// ResNet-50
    #[serde(rename = "resnet50")]
    ResNet50,
    /// VGG-16
    #[serde(rename = "vgg16")]
    Vgg16,
    /// MobileNet-V2
    #[serde(rename = "mobilenet_v2")]
    MobileNetV2,
}

impl ArchitectureKind {
    /// All registered architectures
    pub fn all() -> [ArchitectureKind; 3] {
        [
            ArchitectureKind::ResNet50,
            ArchitectureKind::Vgg16,
            ArchitectureKind::MobileNetV2,
        ]
    }
}

impl std::fmt::Display for ArchitectureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchitectureKind::ResNet50 => write!(f, "resnet50"),
            ArchitectureKind::Vgg16 => write!(f, "vgg16"),
            ArchitectureKind::MobileNetV2 => write!(f, "mobilenet_v2"),
        }
    }
}

/// Optimizer type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OptimizerKind {
    /// SGD with momentum
    #[serde(rename = "sgd")]
    Sgd,
    /// Adam optimizer
    #[serde(rename = "adam")]
    Adam,
    /// AdamW optimizer
    #[serde(rename = "adamw")]
    AdamW,
    /// RMSprop optimizer
    #[serde(rename = "rmsprop")]
    RmsProp,
}

impl std::fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizerKind::Sgd => write!(f, "sgd"),
            OptimizerKind::Adam => write!(f, "adam"),
            OptimizerKind::AdamW => write!(f, "adamw"),
            OptimizerKind::RmsProp => write!(f, "rmsprop"),
        }
    }
}

/// Loss function type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LossKind {
    /// Categorical cross-entropy over softmax outputs
    #[serde(rename = "cross_entropy")]
    CrossEntropy,
}

impl std::fmt::Display for LossKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LossKind::CrossEntropy => write!(f, "cross_entropy"),
        }
    }
}

/// Data split type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataSplit {
    /// Training data (augmentation applies)
    Train,
    /// Validation data (preprocessing only)
    Validation,
}

impl std::fmt::Display for DataSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSplit::Train => write!(f, "train"),
            DataSplit::Validation => write!(f, "validation"),
        }
    }
}

/// An image file with its class label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label (index)
    pub label: usize,
}

impl ImageSample {
    /// Creates a new image sample
    pub fn new(path: PathBuf, label: usize) -> Self {
        Self { path, label }
    }
}
