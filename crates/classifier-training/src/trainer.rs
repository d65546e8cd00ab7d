//! Training orchestration.
//!
//! The [`Trainer`] translates a [`TrainingOptions`] value into framework
//! objects: a compiled model, augmentation generators, and directory-bound
//! data flows. It holds no state beyond the options; every builder is a
//! pure translation from configuration to a constructed object.

use burn::tensor::backend::Backend;
use classifier_core::{DataSplit, Result, TrainerError, TrainingOptions};
use classifier_dataset::{DataGenerator, DirectoryFlow, Preprocessor};
use tracing::{info, warn};

use crate::model::{self, CompiledModel};

/// Orchestrates model and data-pipeline assembly for one training run
pub struct Trainer {
    opts: TrainingOptions,
}

impl Trainer {
    /// Create a trainer for the given options
    pub fn new(opts: TrainingOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &TrainingOptions {
        &self.opts
    }

    /// Assembles and compiles the configured transfer-learning classifier
    pub fn build_model<B: Backend>(&self, device: &B::Device) -> Result<CompiledModel<B>> {
        model::build_model(&self.opts, device)
    }

    /// Looks up the preprocessing function for the configured architecture.
    ///
    /// Fails for architectures without an entry in the preprocessing table.
    pub fn preprocess_input_fn(&self) -> Result<Preprocessor> {
        Preprocessor::for_architecture(self.opts.architecture, self.opts.image_shape)
    }

    /// Builds the augmentation generator for a data split.
    ///
    /// The validation generator applies the architecture's preprocessing
    /// only; the training generator additionally applies the configured
    /// flips and rotation.
    pub fn build_datagen(&self, split: DataSplit) -> Result<DataGenerator> {
        let preprocessor = self.preprocess_input_fn()?;

        Ok(match split {
            DataSplit::Validation => DataGenerator::validation(preprocessor),
            DataSplit::Train => DataGenerator::training(
                preprocessor,
                self.opts.horizontal_flip,
                self.opts.vertical_flip,
                self.opts.rotation_angle,
            ),
        })
    }

    /// Binds a generator to the directory configured for a data split.
    ///
    /// Fails with a configuration error, before any directory access, when
    /// the relevant directory option is not set.
    pub fn build_dataflow(
        &self,
        generator: DataGenerator,
        split: DataSplit,
    ) -> Result<DirectoryFlow> {
        let dir = match split {
            DataSplit::Train => self.opts.training_dir.as_deref().ok_or_else(|| {
                TrainerError::Config("training directory not set".to_string())
            })?,
            DataSplit::Validation => self.opts.validation_dir.as_deref().ok_or_else(|| {
                TrainerError::Config("validation directory not set".to_string())
            })?,
        };

        DirectoryFlow::from_directory(
            dir,
            generator,
            self.opts.image_shape,
            self.opts.batch_size,
            self.opts.seed,
        )
    }

    /// Assembles the model and the data generators for a run.
    ///
    /// Data flows are not bound and no fit step is invoked here; the
    /// training loop itself is not wired up yet, so this stops after
    /// construction without touching the dataset directories.
    pub fn run<B: Backend>(&self, device: &B::Device) -> Result<()> {
        self.opts.validate()?;

        info!(
            "Assembling {} classifier with {} output classes",
            self.opts.architecture, self.opts.output_classes
        );

        let _model = self.build_model::<B>(device)?;
        let _training_datagen = self.build_datagen(DataSplit::Train)?;

        let _validation_datagen = if self.opts.validation_dir.is_some() {
            Some(self.build_datagen(DataSplit::Validation)?)
        } else {
            None
        };

        warn!(
            "model and generators assembled; data flows are not bound and \
             no fit step is invoked yet"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use classifier_core::{ArchitectureKind, ImageShape};
    use std::path::PathBuf;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    fn small_options() -> TrainingOptions {
        TrainingOptions {
            architecture: ArchitectureKind::Vgg16,
            image_shape: ImageShape::new(32, 32),
            output_classes: 3,
            num_fc_layers: 1,
            fc_neurones: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_dataflow_requires_training_dir() {
        let trainer = Trainer::new(TrainingOptions {
            training_dir: None,
            ..small_options()
        });

        let generator = trainer.build_datagen(DataSplit::Train).unwrap();
        let result = trainer.build_dataflow(generator, DataSplit::Train);

        match result {
            Err(TrainerError::Config(msg)) => assert!(msg.contains("training directory")),
            other => panic!("expected configuration error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_dataflow_requires_validation_dir() {
        let trainer = Trainer::new(TrainingOptions {
            validation_dir: None,
            ..small_options()
        });

        let generator = trainer.build_datagen(DataSplit::Validation).unwrap();
        let result = trainer.build_dataflow(generator, DataSplit::Validation);

        match result {
            Err(TrainerError::Config(msg)) => assert!(msg.contains("validation directory")),
            other => panic!("expected configuration error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_validation_datagen_ignores_augmentation_options() {
        // Augmentation options are all truthy...
        let trainer = Trainer::new(TrainingOptions {
            horizontal_flip: true,
            vertical_flip: true,
            rotation_angle: 30.0,
            ..small_options()
        });

        // ...but must not reach the validation generator.
        let validation = trainer.build_datagen(DataSplit::Validation).unwrap();
        assert!(!validation.horizontal_flip());
        assert!(!validation.vertical_flip());
        assert_eq!(validation.rotation_range(), 0.0);

        // The training generator propagates the exact values.
        let training = trainer.build_datagen(DataSplit::Train).unwrap();
        assert!(training.horizontal_flip());
        assert!(training.vertical_flip());
        assert_eq!(training.rotation_range(), 30.0);
    }

    #[test]
    fn test_preprocess_lookup_per_architecture() {
        let resnet = Trainer::new(TrainingOptions {
            architecture: ArchitectureKind::ResNet50,
            ..small_options()
        });
        let vgg = Trainer::new(small_options());

        let resnet_fn = resnet.preprocess_input_fn().unwrap();
        let vgg_fn = vgg.preprocess_input_fn().unwrap();
        assert_ne!(resnet_fn.transform(), vgg_fn.transform());

        // MobileNet-V2 is registered as an architecture but has no entry
        // in the preprocessing table.
        let mobilenet = Trainer::new(TrainingOptions {
            architecture: ArchitectureKind::MobileNetV2,
            ..small_options()
        });
        assert!(matches!(
            mobilenet.preprocess_input_fn(),
            Err(TrainerError::Preprocess(_))
        ));
    }

    #[test]
    fn test_run_does_not_touch_dataset_directories() {
        let temp_dir = TempDir::new().unwrap();
        let training_dir = temp_dir.path().join("train");
        let validation_dir = temp_dir.path().join("val");

        // Neither directory exists; run() must still succeed because it
        // only assembles the model and generators.
        let trainer = Trainer::new(TrainingOptions {
            training_dir: Some(training_dir.clone()),
            validation_dir: Some(validation_dir.clone()),
            ..small_options()
        });

        let device = Default::default();
        trainer.run::<TestBackend>(&device).unwrap();

        assert!(!training_dir.exists());
        assert!(!validation_dir.exists());
    }

    #[test]
    fn test_run_without_validation_dir() {
        let trainer = Trainer::new(TrainingOptions {
            training_dir: Some(PathBuf::from("/data/train")),
            validation_dir: None,
            ..small_options()
        });

        let device = Default::default();
        assert!(trainer.run::<TestBackend>(&device).is_ok());
    }

    #[test]
    fn test_run_rejects_invalid_options() {
        let trainer = Trainer::new(TrainingOptions {
            output_classes: 0,
            ..small_options()
        });

        let device = Default::default();
        assert!(matches!(
            trainer.run::<TestBackend>(&device),
            Err(TrainerError::Config(_))
        ));
    }

    #[test]
    fn test_dataflow_binds_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let class_dir = temp_dir.path().join("class_a");
        std::fs::create_dir(&class_dir).unwrap();
        let img = image::ImageBuffer::from_fn(8, 8, |_, _| image::Rgb([42u8, 42u8, 42u8]));
        img.save(class_dir.join("sample.png")).unwrap();

        let trainer = Trainer::new(TrainingOptions {
            training_dir: Some(temp_dir.path().to_path_buf()),
            batch_size: 2,
            ..small_options()
        });

        let generator = trainer.build_datagen(DataSplit::Train).unwrap();
        let mut flow = trainer.build_dataflow(generator, DataSplit::Train).unwrap();

        assert_eq!(flow.num_classes(), 1);
        let batch = flow.next_batch().unwrap();
        assert_eq!(batch.shape, [2, 3, 32, 32]);
    }
}
