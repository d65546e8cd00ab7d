//! Model assembly and training orchestration.
//!
//! This crate provides:
//! - Pre-trained backbone architectures (ResNet-50, VGG-16, MobileNet-V2)
//!   and their registry
//! - Transfer-learning classifier assembly (backbone + fully-connected head)
//! - Model compilation (optimizer, loss, tracked metrics)
//! - The Trainer orchestration object

pub mod model;
pub mod trainer;

pub use model::{Backbone, CompiledModel, Metric, OptimizerSetup, TransferClassifier};
pub use trainer::Trainer;
