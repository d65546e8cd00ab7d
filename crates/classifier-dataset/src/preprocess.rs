//! Architecture-specific pixel preprocessing.
//!
//! Each pre-trained backbone expects its inputs in the pixel distribution
//! its weights were trained on. The table in [`Preprocessor::for_architecture`]
//! maps a backbone selector to the matching transform; architectures without
//! an entry are rejected.

use classifier_core::{ArchitectureKind, ImageShape, Result, TrainerError, CHANNELS};
use image::{DynamicImage, ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};

/// ImageNet channel means for [0, 1]-scaled RGB input
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations for [0, 1]-scaled RGB input
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
/// ImageNet channel means in raw BGR pixel space
const IMAGENET_BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

/// Pixel-space transform applied after resizing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PixelTransform {
    /// Scale to [0, 1], subtract channel means, divide by channel
    /// standard deviations (RGB order)
    Standardize { mean: [f32; 3], std: [f32; 3] },
    /// Reverse channels to BGR and subtract per-channel means, without
    /// scaling
    MeanCenterBgr { mean: [f32; 3] },
}

/// Preprocessing function for one backbone architecture
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessor {
    transform: PixelTransform,
    target: ImageShape,
}

impl Preprocessor {
    /// Looks up the preprocessing function for an architecture.
    ///
    /// The table covers ResNet-50 and VGG-16; any other registered
    /// architecture fails the lookup.
    pub fn for_architecture(arch: ArchitectureKind, target: ImageShape) -> Result<Self> {
        let transform = match arch {
            ArchitectureKind::ResNet50 => PixelTransform::Standardize {
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
            },
            ArchitectureKind::Vgg16 => PixelTransform::MeanCenterBgr {
                mean: IMAGENET_BGR_MEAN,
            },
            other => {
                return Err(TrainerError::Preprocess(format!(
                    "no preprocessing function registered for architecture {other}"
                )))
            }
        };

        Ok(Self { transform, target })
    }

    /// The pixel transform this preprocessor applies
    pub fn transform(&self) -> PixelTransform {
        self.transform
    }

    /// Target dimensions every image is resized to
    pub fn target(&self) -> ImageShape {
        self.target
    }

    /// Resizes an image to the target shape and converts it to a CHW
    /// float tensor buffer.
    pub fn process(&self, image: &DynamicImage) -> Vec<f32> {
        let rgb = image.to_rgb8();
        let resized = self.resize(&rgb);
        let (width, height) = resized.dimensions();

        let mut values = Vec::with_capacity(self.target.num_values());

        match self.transform {
            PixelTransform::Standardize { mean, std } => {
                for channel in 0..CHANNELS {
                    for y in 0..height {
                        for x in 0..width {
                            let pixel = resized.get_pixel(x, y);
                            let value = pixel[channel] as f32 / 255.0;
                            values.push((value - mean[channel]) / std[channel]);
                        }
                    }
                }
            }
            PixelTransform::MeanCenterBgr { mean } => {
                for channel in 0..CHANNELS {
                    // Channel 0 of the output is blue, channel 2 red.
                    let source = CHANNELS - 1 - channel;
                    for y in 0..height {
                        for x in 0..width {
                            let pixel = resized.get_pixel(x, y);
                            values.push(pixel[source] as f32 - mean[channel]);
                        }
                    }
                }
            }
        }

        values
    }

    fn resize(&self, image: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
        let (width, height) = image.dimensions();
        if width == self.target.width && height == self.target.height {
            return image.clone();
        }

        image::imageops::resize(
            image,
            self.target.width,
            self.target.height,
            image::imageops::FilterType::Lanczos3,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_image(r: u8, g: u8, b: u8) -> DynamicImage {
        let img = ImageBuffer::from_pixel(8, 8, Rgb([r, g, b]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_table_covers_resnet_and_vgg() {
        let target = ImageShape::new(32, 32);
        let resnet = Preprocessor::for_architecture(ArchitectureKind::ResNet50, target).unwrap();
        let vgg = Preprocessor::for_architecture(ArchitectureKind::Vgg16, target).unwrap();

        // The two supported architectures get distinct transforms.
        assert_ne!(resnet.transform(), vgg.transform());
        assert!(matches!(
            resnet.transform(),
            PixelTransform::Standardize { .. }
        ));
        assert!(matches!(
            vgg.transform(),
            PixelTransform::MeanCenterBgr { .. }
        ));
    }

    #[test]
    fn test_table_rejects_uncovered_architecture() {
        let target = ImageShape::new(32, 32);
        let result = Preprocessor::for_architecture(ArchitectureKind::MobileNetV2, target);
        assert!(matches!(result, Err(TrainerError::Preprocess(_))));
    }

    #[test]
    fn test_process_output_length_and_resize() {
        let target = ImageShape::new(32, 32);
        let pre = Preprocessor::for_architecture(ArchitectureKind::ResNet50, target).unwrap();

        // Input is 8x8; the preprocessor resizes to the target.
        let values = pre.process(&solid_image(128, 128, 128));
        assert_eq!(values.len(), 3 * 32 * 32);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_standardize_values() {
        let target = ImageShape::new(8, 8);
        let pre = Preprocessor::for_architecture(ArchitectureKind::ResNet50, target).unwrap();

        let values = pre.process(&solid_image(128, 128, 128));
        let expected_r = (128.0 / 255.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        assert!((values[0] - expected_r).abs() < 1e-5);
    }

    #[test]
    fn test_bgr_channel_order() {
        let target = ImageShape::new(8, 8);
        let pre = Preprocessor::for_architecture(ArchitectureKind::Vgg16, target).unwrap();

        // Pure red input: the first output channel is blue.
        let values = pre.process(&solid_image(255, 0, 0));
        let plane = 8 * 8;
        assert!((values[0] - (0.0 - IMAGENET_BGR_MEAN[0])).abs() < 1e-5);
        assert!((values[2 * plane] - (255.0 - IMAGENET_BGR_MEAN[2])).abs() < 1e-5);
    }
}
