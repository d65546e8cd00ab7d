//! Image discovery for class-per-subdirectory datasets.
//!
//! A dataset directory holds one subdirectory per class; class labels are
//! assigned from the subdirectory names in sorted order.

use classifier_core::{ImageSample, Result, TrainerError};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Classes and samples discovered in a dataset directory
#[derive(Debug, Clone)]
pub struct ClassListing {
    /// Class names, sorted; the index of a name is its label
    pub classes: Vec<String>,
    /// All image samples found, labelled by class index
    pub samples: Vec<ImageSample>,
}

/// Scanner for a dataset directory
pub struct DirectoryScanner {
    root: PathBuf,
}

impl DirectoryScanner {
    /// Creates a scanner rooted at the given dataset directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Discovers classes (immediate subdirectories, sorted by name) and
    /// their image files.
    pub fn scan_classes(&self) -> Result<ClassListing> {
        if !self.root.exists() {
            return Err(TrainerError::Dataset(format!(
                "Dataset directory not found: {}",
                self.root.display()
            )));
        }
        if !self.root.is_dir() {
            return Err(TrainerError::Dataset(format!(
                "Dataset path is not a directory: {}",
                self.root.display()
            )));
        }

        let mut class_dirs = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    class_dirs.push((name.to_string(), path));
                }
            }
        }
        class_dirs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut classes = Vec::with_capacity(class_dirs.len());
        let mut samples = Vec::new();

        for (label, (name, dir)) in class_dirs.into_iter().enumerate() {
            let mut images = scan_images(&dir)?;
            images.sort();
            samples.extend(
                images
                    .into_iter()
                    .map(|path| ImageSample::new(path, label)),
            );
            classes.push(name);
        }

        Ok(ClassListing { classes, samples })
    }

    /// Loads a single image from disk
    pub fn load_image(&self, path: &Path) -> Result<DynamicImage> {
        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        image::open(&full_path).map_err(|e| {
            TrainerError::Image(format!("Failed to load image {}: {}", full_path.display(), e))
        })
    }
}

/// Collects image files (by extension) directly inside a directory.
fn scan_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                if matches!(ext_lower.as_str(), "jpg" | "jpeg" | "png" | "bmp" | "gif") {
                    images.push(path);
                }
            }
        }
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_image(path: &Path) {
        let img = image::ImageBuffer::from_fn(10, 10, |_, _| image::Rgb([255u8, 0u8, 0u8]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_scan_missing_directory() {
        let scanner = DirectoryScanner::new("/nonexistent/dataset");
        let result = scanner.scan_classes();
        assert!(matches!(result, Err(TrainerError::Dataset(_))));
    }

    #[test]
    fn test_classes_sorted_into_labels() {
        let temp_dir = TempDir::new().unwrap();

        // Create class directories out of alphabetical order.
        for class in ["dogs", "cats", "birds"] {
            fs::create_dir(temp_dir.path().join(class)).unwrap();
            create_test_image(&temp_dir.path().join(class).join("img.jpg"));
        }

        let scanner = DirectoryScanner::new(temp_dir.path());
        let listing = scanner.scan_classes().unwrap();

        assert_eq!(listing.classes, vec!["birds", "cats", "dogs"]);
        assert_eq!(listing.samples.len(), 3);

        let bird_sample = listing
            .samples
            .iter()
            .find(|s| s.path.to_string_lossy().contains("birds"))
            .unwrap();
        assert_eq!(bird_sample.label, 0);
    }

    #[test]
    fn test_non_image_files_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let class_dir = temp_dir.path().join("cats");
        fs::create_dir(&class_dir).unwrap();

        create_test_image(&class_dir.join("cat1.jpg"));
        create_test_image(&class_dir.join("cat2.png"));
        fs::write(class_dir.join("labels.txt"), "not an image").unwrap();

        let scanner = DirectoryScanner::new(temp_dir.path());
        let listing = scanner.scan_classes().unwrap();

        assert_eq!(listing.samples.len(), 2);
    }

    #[test]
    fn test_load_image_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = DirectoryScanner::new(temp_dir.path());
        let result = scanner.load_image(Path::new("missing.jpg"));
        assert!(matches!(result, Err(TrainerError::Image(_))));
    }

    #[test]
    fn test_load_image() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(&temp_dir.path().join("test.jpg"));

        let scanner = DirectoryScanner::new(temp_dir.path());
        let image = scanner.load_image(Path::new("test.jpg")).unwrap();
        assert_eq!(image.width(), 10);
        assert_eq!(image.height(), 10);
    }
}
