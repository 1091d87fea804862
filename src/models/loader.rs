//! ONNX artifact loader

use std::path::{Path, PathBuf};

use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::info;

use crate::models::encoding::FeatureEncoding;
use crate::models::engine::ModelError;

/// Loaded classifier artifact with its metadata.
pub struct LoadedModel {
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for probabilities
    pub output_name: String,
    /// Feature encoding manifest exported at training time
    pub encoding: FeatureEncoding,
}

/// Loader for the classifier artifact and its encoding manifest.
pub struct ModelLoader {
    model_path: PathBuf,
    encoding_path: PathBuf,
    intra_threads: usize,
}

impl ModelLoader {
    pub fn new<P: AsRef<Path>>(model_path: P, encoding_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            encoding_path: encoding_path.as_ref().to_path_buf(),
            intra_threads: 1,
        }
    }

    /// Set the number of threads for ONNX inference.
    pub fn with_threads(mut self, intra_threads: usize) -> Self {
        self.intra_threads = intra_threads;
        self
    }

    /// Load the artifact and its encoding manifest.
    ///
    /// The path check runs before any runtime initialization so a missing
    /// artifact surfaces as a plain not-found error.
    pub fn load(&self) -> Result<LoadedModel, ModelError> {
        if !self.model_path.exists() {
            return Err(ModelError::NotFound(self.model_path.clone()));
        }

        let encoding = FeatureEncoding::from_file(&self.encoding_path)?;

        ort::init().commit()?;

        info!(
            path = %self.model_path.display(),
            threads = self.intra_threads,
            "Loading ONNX model"
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.intra_threads)?
            .commit_from_file(&self.model_path)?;

        // Get input/output names
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("output"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        info!(
            input = %input_name,
            output = %output_name,
            input_width = encoding.input_width(),
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            session,
            input_name,
            output_name,
            encoding,
        })
    }
}
