//! Classifier inference over the loaded artifact.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use thiserror::Error;
use tracing::{debug, info};

use crate::feature_extractor::FeatureVector;
use crate::models::loader::{LoadedModel, ModelLoader};

/// Class label the model assigns to "will leave".
pub const POSITIVE_CLASS: i64 = 1;

/// Calibrated decision threshold. This is an operating point chosen during
/// training, not the naive 0.5; changing it requires re-calibration.
pub const DECISION_THRESHOLD: f64 = 0.125930;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("feature encoding manifest unreadable: {0}")]
    Encoding(String),
    #[error("positive class {POSITIVE_CLASS} absent from model output")]
    PositiveClassAbsent,
    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),
    #[error("model lock poisoned")]
    Poisoned,
}

/// Binary attrition classifier.
pub trait Classifier: Send + Sync {
    /// Probability assigned to the positive class for one feature mapping.
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Binary label obtained by applying the fixed decision threshold.
    fn predict_label(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        let proba = self.predict_proba(features)?;
        Ok(u8::from(proba >= DECISION_THRESHOLD))
    }
}

/// ONNX-backed prediction engine with a lazily-loaded artifact.
///
/// The artifact handle is process-wide shared state; the mutex guarantees
/// concurrent first predictions load it at most once and all callers see
/// the same loaded instance afterwards.
pub struct PredictionEngine {
    loader: ModelLoader,
    model: Mutex<Option<LoadedModel>>,
}

impl PredictionEngine {
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            loader,
            model: Mutex::new(None),
        }
    }

    /// Load the artifact now instead of on the first prediction.
    pub fn load_eager(&self) -> Result<(), ModelError> {
        let mut guard = self.lock()?;
        if guard.is_none() {
            *guard = Some(self.loader.load()?);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<LoadedModel>>, ModelError> {
        self.model.lock().map_err(|_| ModelError::Poisoned)
    }

    fn run_session(model: &mut LoadedModel, features: &FeatureVector) -> Result<f64, ModelError> {
        let input = model.encoding.encode(features);
        let shape = vec![1_i64, input.len() as i64];
        let input_tensor = Tensor::from_array((shape, input))?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        extract_positive_proba(&outputs, &model.output_name)
    }
}

impl Classifier for PredictionEngine {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let mut guard = self.lock()?;
        let model = match guard.as_mut() {
            Some(model) => model,
            None => {
                info!("classifier not loaded yet, loading on first prediction");
                guard.insert(self.loader.load()?)
            }
        };
        Self::run_session(model, features)
    }
}

/// Locate the positive-class probability in the session outputs.
///
/// Handles both plain tensor outputs (`[1, n_classes]`) and the
/// `seq(map(int64, float))` shape produced by sklearn-style ZipMap exports.
fn extract_positive_proba(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
) -> Result<f64, ModelError> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(proba) = proba_from_value(output)? {
            return Ok(proba);
        }
    }

    // Fallback: iterate all outputs, skipping the label tensor.
    for (name, output) in outputs.iter() {
        if name == output_name || name.contains("label") {
            continue;
        }
        if let Some(proba) = proba_from_value(&output)? {
            debug!(output = %name, "probability extracted from fallback output");
            return Ok(proba);
        }
    }

    Err(ModelError::PositiveClassAbsent)
}

fn proba_from_value(output: &DynValue) -> Result<Option<f64>, ModelError> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        return proba_from_tensor(&shape, data).map(Some);
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return proba_from_sequence_map(output).map(Some);
    }

    Ok(None)
}

/// Probability of the positive class from a `[batch, n_classes]` tensor.
/// Class columns are ordered by label, so the positive class sits at
/// index 1; a single-column output is already the positive probability.
fn proba_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> Result<f64, ModelError> {
    let dims: Vec<i64> = shape.iter().copied().collect();

    let num_classes = match dims.as_slice() {
        [_, n] => *n as usize,
        [n] => *n as usize,
        _ => return Err(ModelError::PositiveClassAbsent),
    };

    match num_classes {
        n if n >= 2 => Ok(data[POSITIVE_CLASS as usize] as f64),
        1 => Ok(data[0] as f64),
        _ => Err(ModelError::PositiveClassAbsent),
    }
}

/// Probability of the positive class from a `seq(map(int64, float))`
/// output. The map carries explicit class labels; the positive label must
/// be present or the artifact is incompatible.
fn proba_from_sequence_map(output: &DynValue) -> Result<f64, ModelError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(ModelError::Runtime)?;
    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    let Some(map_value) = maps.first() else {
        return Err(ModelError::PositiveClassAbsent);
    };

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
    for (class_id, proba) in &kv_pairs {
        if *class_id == POSITIVE_CLASS {
            return Ok(*proba as f64);
        }
    }

    Err(ModelError::PositiveClassAbsent)
}
