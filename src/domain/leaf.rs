//! Maize leaf disease classification: input preprocessing and result shaping.

use image::imageops::FilterType;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub const INPUT_SIZE: u32 = 224;

/// Output classes, in the order the model emits them.
pub const CLASS_LABELS: [&str; 4] = [
    "Cercospora_leaf_spot Gray_leaf_spot",
    "Common_rust",
    "Northern_Leaf_Blight",
    "healthy",
];

#[derive(Debug, Error)]
#[error("Error processing image: {0}")]
pub struct PreprocessError(#[from] image::ImageError);

#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("expected {expected} probabilities, got {actual}")]
    Shape { expected: usize, actual: usize },
    #[error("probabilities contain a non-finite value")]
    NonFinite,
}

/// RGB pixels of a resized leaf image, channels scaled to `[0, 1]`,
/// stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafTensor {
    pixels: Vec<[f32; 3]>,
}

impl LeafTensor {
    /// Decode, convert to RGB, resize to the model's input size and normalise.
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, PreprocessError> {
        let img = image::load_from_memory(bytes)?;
        let rgb = img
            .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
            .to_rgb8();
        let pixels = rgb
            .pixels()
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                ]
            })
            .collect();
        Ok(Self { pixels })
    }

    /// Height x width x channel nesting, as model servers expect.
    pub fn rows(&self) -> Vec<&[[f32; 3]]> {
        self.pixels.chunks(INPUT_SIZE as usize).collect()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prediction {
    pub prediction: String,
    pub confidence: f32,
    pub probabilities: BTreeMap<String, f32>,
}

impl Prediction {
    pub fn from_probabilities(probabilities: &[f32]) -> Result<Self, PredictionError> {
        if probabilities.len() != CLASS_LABELS.len() {
            return Err(PredictionError::Shape {
                expected: CLASS_LABELS.len(),
                actual: probabilities.len(),
            });
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(PredictionError::NonFinite);
        }

        let (best, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, p)| if p > acc.1 { (i, p) } else { acc });

        Ok(Self {
            prediction: CLASS_LABELS[best].to_string(),
            confidence,
            probabilities: CLASS_LABELS
                .iter()
                .zip(probabilities)
                .map(|(label, p)| (label.to_string(), *p))
                .collect(),
        })
    }
}
