//! Pixel sources for the input tensor

use crate::tensor::{ImageTensor, CHANNELS, HEIGHT, WIDTH};
use crate::PrepError;
use image::imageops::FilterType;
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// ImageNet per-channel mean (RGB)
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet per-channel standard deviation (RGB)
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Produces an [`ImageTensor`] for a given image path
pub trait TensorSource {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Build the input tensor. Implementations may ignore `path`.
    fn load(&self, path: &Path) -> Result<ImageTensor, PrepError>;
}

/// Which tensor source to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Uniform random pixels; the image file is never read
    #[default]
    Synthetic,
    /// Decode, resize and normalize the actual image
    Decode,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Synthetic => "synthetic",
            SourceKind::Decode => "decode",
        }
    }
}

impl FromStr for SourceKind {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "synthetic" => Ok(SourceKind::Synthetic),
            "decode" => Ok(SourceKind::Decode),
            other => Err(PrepError::UnknownSource(other.to_string())),
        }
    }
}

/// Create the source selected by `kind`
pub fn build_source(kind: SourceKind, seed: Option<u64>) -> Box<dyn TensorSource> {
    match kind {
        SourceKind::Synthetic => Box::new(SyntheticSource::new(seed)),
        SourceKind::Decode => Box::new(DecodedImageSource),
    }
}

/// Fills the tensor with uniform `[0, 1)` noise
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    seed: Option<u64>,
}

impl SyntheticSource {
    /// A `Some` seed makes the output reproducible
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }
}

impl TensorSource for SyntheticSource {
    fn name(&self) -> &'static str {
        SourceKind::Synthetic.as_str()
    }

    fn load(&self, path: &Path) -> Result<ImageTensor, PrepError> {
        debug!(path = %path.display(), seed = ?self.seed, "Generating synthetic pixels");

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let data = Array4::from_shape_simple_fn((1, CHANNELS, HEIGHT, WIDTH), || rng.gen::<f32>());

        ImageTensor::new(data)
    }
}

/// Decodes the image file and converts it to a normalized NCHW tensor
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodedImageSource;

impl TensorSource for DecodedImageSource {
    fn name(&self) -> &'static str {
        SourceKind::Decode.as_str()
    }

    fn load(&self, path: &Path) -> Result<ImageTensor, PrepError> {
        let img = image::open(path)?.to_rgb8();
        info!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "Decoded image"
        );

        let resized = image::imageops::resize(&img, WIDTH as u32, HEIGHT as u32, FilterType::Triangle);

        let mut data = Array4::<f32>::zeros((1, CHANNELS, HEIGHT, WIDTH));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..CHANNELS {
                let value = pixel[c] as f32 / 255.0;
                data[[0, c, y as usize, x as usize]] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }

        ImageTensor::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::INPUT_SHAPE;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn temp_png(name: &str, img: &RgbImage) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tensor-prep-{}-{}.png", std::process::id(), name));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_synthetic_shape_and_range() {
        let source = SyntheticSource::new(Some(7));
        let tensor = source.load(Path::new("does-not-exist.jpg")).unwrap();

        assert_eq!(tensor.shape(), INPUT_SHAPE.to_vec());
        assert!(tensor.flatten().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_synthetic_seed_is_reproducible() {
        let a = SyntheticSource::new(Some(42)).load(Path::new("x")).unwrap();
        let b = SyntheticSource::new(Some(42)).load(Path::new("x")).unwrap();
        let c = SyntheticSource::new(Some(43)).load(Path::new("x")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_decode_normalizes_channels() {
        let img = RgbImage::from_pixel(32, 16, Rgb([255, 0, 0]));
        let path = temp_png("red", &img);

        let tensor = DecodedImageSource.load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let array = tensor.as_array();
        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!((array[[0, 0, 100, 100]] - red).abs() < 1e-4);
        assert!((array[[0, 1, 0, 0]] - green).abs() < 1e-4);
        assert_eq!(tensor.len(), 3 * 224 * 224);
    }

    #[test]
    fn test_decode_missing_file_fails() {
        let result = DecodedImageSource.load(Path::new("/nonexistent/probe/image.jpg"));
        assert!(matches!(result, Err(PrepError::ImageDecode(_))));
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!("synthetic".parse::<SourceKind>().unwrap(), SourceKind::Synthetic);
        assert_eq!("Decode".parse::<SourceKind>().unwrap(), SourceKind::Decode);
        assert!("webcam".parse::<SourceKind>().is_err());
        assert_eq!(build_source(SourceKind::Decode, None).name(), "decode");
    }
}
