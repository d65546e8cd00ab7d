//! Dataset loading, preprocessing, and augmentation for the classifier
//! trainer.
//!
//! This crate provides directory scanning (one subdirectory per class),
//! architecture-specific pixel preprocessing, the augmentation generator,
//! and the batched data flow bound to a dataset directory.

pub mod datagen;
pub mod flow;
pub mod loader;
pub mod preprocess;

pub use datagen::DataGenerator;
pub use flow::{DirectoryFlow, ImageBatch};
pub use loader::{ClassListing, DirectoryScanner};
pub use preprocess::{PixelTransform, Preprocessor};
