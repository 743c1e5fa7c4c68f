/// Training launcher
///
/// Training itself belongs to the external detector tool; this module prepares
/// the dataset descriptor and builds the tool's command line.
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use clap::ValueEnum;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::dataset::{self, DatasetError, DEFAULT_DATASET};

pub const DEFAULT_EPOCHS: u32 = 120;
pub const DEFAULT_IMAGE_SIZE: u32 = 640;
pub const DEFAULT_BATCH: u32 = 8;
pub const DEFAULT_WORKERS: u32 = 1;
pub const DEFAULT_EXECUTABLE: &str = "yolo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModelVersion {
    V5,
    #[default]
    V8,
}

impl ModelVersion {
    pub fn weights(self) -> PathBuf {
        match self {
            ModelVersion::V5 => PathBuf::from("weights/yolov5nu.pt"),
            ModelVersion::V8 => PathBuf::from("weights/yolov8n.pt"),
        }
    }

    pub fn run_name(self, dataset: &str) -> String {
        match self {
            ModelVersion::V5 => format!("train_v5_{}", dataset),
            ModelVersion::V8 => format!("train_v8_{}", dataset),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("failed to start {executable}: {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainPlan {
    pub executable: String,
    pub dataset: String,
    pub descriptor: PathBuf,
    pub model: ModelVersion,
    /// `None` leaves device selection to the trainer, which prefers a GPU
    pub device: Option<String>,
    pub epochs: u32,
    pub image_size: u32,
    pub batch: u32,
    pub workers: u32,
}

impl TrainPlan {
    pub fn new(model: ModelVersion) -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            descriptor: dataset::descriptor_path(DEFAULT_DATASET),
            model,
            device: None,
            epochs: DEFAULT_EPOCHS,
            image_size: DEFAULT_IMAGE_SIZE,
            batch: DEFAULT_BATCH,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn run_name(&self) -> String {
        self.model.run_name(&self.dataset)
    }

    /// Arguments for the detector tool's `detect train` command
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "detect".to_string(),
            "train".to_string(),
            format!("data={}", self.descriptor.to_string_lossy().replace('\\', "/")),
            format!("model={}", self.model.weights().to_string_lossy().replace('\\', "/")),
        ];
        if let Some(device) = &self.device {
            args.push(format!("device={}", device));
        }
        args.extend([
            format!("workers={}", self.workers),
            format!("imgsz={}", self.image_size),
            format!("epochs={}", self.epochs),
            format!("batch={}", self.batch),
            format!("name={}", self.run_name()),
        ]);
        args
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.executable.clone()];
        parts.extend(self.args());
        parts.join(" ")
    }

    /// Rewrite the descriptor path, then run training and wait for it
    pub fn launch(&self) -> Result<ExitStatus, TrainError> {
        dataset::prepare_descriptor(&self.descriptor)?;
        info!(
            "Training {:?} on {} ({})",
            self.model,
            self.dataset,
            self.device.as_deref().unwrap_or("auto device")
        );
        debug!("{}", self.command_line());

        Command::new(&self.executable)
            .args(self.args())
            .status()
            .map_err(|source| TrainError::Spawn {
                executable: self.executable.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_pick_matching_weights() {
        assert_eq!(ModelVersion::V8.weights(), PathBuf::from("weights/yolov8n.pt"));
        assert_eq!(ModelVersion::V5.weights(), PathBuf::from("weights/yolov5nu.pt"));
        assert_eq!(ModelVersion::V5.run_name("VehicleLicense"), "train_v5_VehicleLicense");
        assert_eq!(ModelVersion::default(), ModelVersion::V8);
    }

    #[test]
    fn test_args() {
        let plan = TrainPlan::new(ModelVersion::V8);
        assert_eq!(
            plan.args(),
            vec![
                "detect",
                "train",
                "data=datasets/VehicleLicense/VehicleLicense.yaml",
                "model=weights/yolov8n.pt",
                "workers=1",
                "imgsz=640",
                "epochs=120",
                "batch=8",
                "name=train_v8_VehicleLicense",
            ]
        );
        assert!(plan.command_line().starts_with("yolo detect train "));
    }

    #[test]
    fn test_device_left_to_trainer_unless_given() {
        let auto = TrainPlan::new(ModelVersion::V5);
        assert_eq!(auto.device, None);
        assert!(!auto.args().iter().any(|a| a.starts_with("device=")));

        let pinned = TrainPlan {
            device: Some("cpu".to_string()),
            ..TrainPlan::new(ModelVersion::V5)
        };
        let args = pinned.args();
        assert_eq!(args[4], "device=cpu");
        assert_eq!(args[5], "workers=1");
    }

    #[test]
    fn test_launch_without_descriptor_fails_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let plan = TrainPlan {
            descriptor: dir.path().join("missing.yaml"),
            executable: "definitely-not-a-real-trainer".to_string(),
            ..TrainPlan::new(ModelVersion::V5)
        };
        assert!(matches!(plan.launch(), Err(TrainError::Dataset(_))));
    }

    #[test]
    fn test_launch_reports_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = dir.path().join("VehicleLicense.yaml");
        std::fs::write(&descriptor, "path: somewhere\n").unwrap();
        let plan = TrainPlan {
            descriptor,
            executable: "definitely-not-a-real-trainer".to_string(),
            ..TrainPlan::new(ModelVersion::V8)
        };
        assert!(matches!(plan.launch(), Err(TrainError::Spawn { .. })));
    }
}
