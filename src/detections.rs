/// Detection manifest parser and batch annotation
///
/// A manifest lists detections per image file:
/// {"images": [{"file_name": "a.jpg", "detections": [{"bbox": [x1, y1, x2, y2], "category": "License_Plate", "score": 0.93}]}]}
/// Bbox values are kept as raw JSON so that malformed entries reach the
/// annotator, which skips them without failing the image.
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::annotate::{AnnotateStyle, Annotator, ColorInput, Coord, MarkerStyle};
use crate::categories::Category;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionManifest {
    pub images: Vec<ManifestImage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestImage {
    pub file_name: String,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Detection {
    pub bbox: Vec<serde_json::Value>,  // [x1, y1, x2, y2] in pixels
    pub category: String,
    #[serde(default)]
    pub score: Option<f32>,
}

impl Detection {
    pub fn coords(&self) -> Vec<Coord> {
        self.bbox.iter().cloned().map(Coord::from).collect()
    }

    pub fn category(&self) -> Option<Category> {
        Category::from_key(&self.category)
    }

    /// Label text: localized category name, raw key for unknown categories
    pub fn label(&self, show_score: bool) -> String {
        let name = self
            .category()
            .map(|c| c.display_name().to_string())
            .unwrap_or_else(|| self.category.clone());
        match (show_score, self.score) {
            (true, Some(score)) => format!("{} {:.2}", name, score),
            _ => name,
        }
    }
}

impl DetectionManifest {
    /// Parse a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read manifest: {}", e))?;

        Self::from_str(&content)
    }

    /// Parse a manifest from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, String> {
        serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse manifest JSON: {}", e))
    }

    /// Drop detections whose bbox does not have four entries.
    /// Returns number of skipped detections and warnings
    pub fn validate_and_clean(&mut self) -> (usize, Vec<String>) {
        let mut warnings = Vec::new();
        let mut skipped = 0;

        if self.images.is_empty() {
            warnings.push("Manifest has no images".to_string());
        }

        for image in &mut self.images {
            let before = image.detections.len();
            image.detections.retain(|det| {
                if det.bbox.len() != 4 {
                    warnings.push(format!(
                        "Skipping detection in {}: invalid bbox format (expected 4 values, got {})",
                        image.file_name, det.bbox.len()
                    ));
                    return false;
                }
                true
            });
            skipped += before - image.detections.len();

            for det in &image.detections {
                if det.category().is_none() {
                    warnings.push(format!(
                        "Unknown category '{}' in {}, labelling with the raw name",
                        det.category, image.file_name
                    ));
                }
            }
        }

        (skipped, warnings)
    }

    pub fn detection_count(&self) -> usize {
        self.images.iter().map(|img| img.detections.len()).sum()
    }
}

/// How a batch run draws each detection
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub style: AnnotateStyle,
    pub marker: MarkerStyle,
    pub show_scores: bool,
    /// Color each box by its category instead of `style.color`
    pub category_colors: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            style: AnnotateStyle::default(),
            marker: MarkerStyle::FilledBox,
            show_scores: true,
            category_colors: true,
        }
    }
}

impl BatchOptions {
    pub fn style_for(&self, detection: &Detection) -> AnnotateStyle {
        let mut style = self.style.clone().with_label(detection.label(self.show_scores));
        if self.category_colors {
            if let Some(category) = detection.category() {
                style.color = ColorInput::from(category.color());
            }
        }
        style
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub written: usize,
    pub failed: Vec<(String, String)>,
}

/// Draw every detection of one image, one annotator call per detection
pub fn annotate_image(
    annotator: &Annotator<'_>,
    image: image::RgbImage,
    detections: &[Detection],
    options: &BatchOptions,
) -> image::RgbImage {
    detections.iter().fold(image, |current, det| {
        let style = options.style_for(det);
        annotator
            .annotate(Some(&current), Some(&det.coords()), &style, options.marker)
            .unwrap_or(current)
    })
}

/// Annotate all images of a manifest in parallel. A failing image is reported
/// in the summary and does not stop the others.
pub fn annotate_manifest(
    manifest: &DetectionManifest,
    input_dir: &Path,
    output_dir: &Path,
    options: &BatchOptions,
) -> BatchSummary {
    let annotator = Annotator::new();

    let results: Vec<(String, Result<PathBuf, String>)> = manifest
        .images
        .par_iter()
        .map(|entry| {
            let result = process_one(&annotator, entry, input_dir, output_dir, options);
            (entry.file_name.clone(), result)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (file_name, result) in results {
        match result {
            Ok(path) => {
                debug!("Wrote {:?}", path);
                summary.written += 1;
            }
            Err(e) => {
                warn!("{}: {}", file_name, e);
                summary.failed.push((file_name, e));
            }
        }
    }
    info!("Annotated {} images, {} failed", summary.written, summary.failed.len());
    summary
}

fn process_one(
    annotator: &Annotator<'_>,
    entry: &ManifestImage,
    input_dir: &Path,
    output_dir: &Path,
    options: &BatchOptions,
) -> Result<PathBuf, String> {
    let input_path = input_dir.join(&entry.file_name);
    let image = image::open(&input_path)
        .map_err(|e| format!("Failed to open {:?}: {}", input_path, e))?
        .into_rgb8();

    let annotated = annotate_image(annotator, image, &entry.detections, options);

    let output_path = output_dir.join(&entry.file_name);
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {:?}: {}", parent, e))?;
    }
    annotated
        .save(&output_path)
        .map_err(|e| format!("Failed to save {:?}: {}", output_path, e))?;
    Ok(output_path)
}
