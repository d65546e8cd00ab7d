//! Batched data flows bound to dataset directories.
//!
//! A [`DirectoryFlow`] scans a class-per-subdirectory dataset once, then
//! yields preprocessed batches lazily and indefinitely: when the sample
//! list is exhausted the order is reshuffled and iteration restarts, so a
//! flow behaves as an effectively infinite epoch stream.

use crate::datagen::DataGenerator;
use crate::loader::DirectoryScanner;
use classifier_core::{ImageSample, ImageShape, Result, TrainerError, CHANNELS};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use tracing::debug;

/// One batch of preprocessed images and their labels
#[derive(Debug, Clone)]
pub struct ImageBatch {
    /// Image values, N * C * H * W, CHW per image
    pub images: Vec<f32>,
    /// Class label per image
    pub labels: Vec<usize>,
    /// Tensor shape [batch, channels, height, width]
    pub shape: [usize; 4],
}

impl ImageBatch {
    /// Number of images in the batch
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Lazy, restartable batch source over one dataset directory
pub struct DirectoryFlow {
    scanner: DirectoryScanner,
    samples: Vec<ImageSample>,
    classes: Vec<String>,
    generator: DataGenerator,
    target: ImageShape,
    batch_size: usize,
    cursor: usize,
    rng: StdRng,
}

impl DirectoryFlow {
    /// Binds a generator to a dataset directory.
    ///
    /// The directory is scanned once here; image files are only read when
    /// batches are requested.
    pub fn from_directory(
        dir: &Path,
        generator: DataGenerator,
        target: ImageShape,
        batch_size: usize,
        seed: u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(TrainerError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        let scanner = DirectoryScanner::new(dir);
        let listing = scanner.scan_classes()?;

        if listing.samples.is_empty() {
            return Err(TrainerError::Dataset(format!(
                "No image samples found under {}",
                dir.display()
            )));
        }

        debug!(
            "Bound data flow to {}: {} samples across {} classes",
            dir.display(),
            listing.samples.len(),
            listing.classes.len()
        );

        let mut flow = Self {
            scanner,
            samples: listing.samples,
            classes: listing.classes,
            generator,
            target,
            batch_size,
            cursor: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        flow.samples.shuffle(&mut flow.rng);

        Ok(flow)
    }

    /// Class names in label order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Number of samples in one pass over the directory
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Number of batches in one pass over the directory
    pub fn batches_per_epoch(&self) -> usize {
        self.samples.len().div_ceil(self.batch_size)
    }

    /// Produces the next batch, wrapping around (and reshuffling) when the
    /// sample list is exhausted.
    pub fn next_batch(&mut self) -> Result<ImageBatch> {
        let width = self.target.width as usize;
        let height = self.target.height as usize;

        let mut images = Vec::with_capacity(self.batch_size * CHANNELS * width * height);
        let mut labels = Vec::with_capacity(self.batch_size);

        for _ in 0..self.batch_size {
            if self.cursor >= self.samples.len() {
                self.samples.shuffle(&mut self.rng);
                self.cursor = 0;
            }

            let sample = self.samples[self.cursor].clone();
            self.cursor += 1;

            let image = self.scanner.load_image(&sample.path)?;
            images.extend(self.generator.process(&image, &mut self.rng));
            labels.push(sample.label);
        }

        let len = labels.len();
        Ok(ImageBatch {
            images,
            labels,
            shape: [len, CHANNELS, height, width],
        })
    }
}
