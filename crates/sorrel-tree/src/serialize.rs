//! Model serialization and deserialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::TreeError;
use crate::forest::PatternForest;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Number of trees in the forest.
    n_trees: usize,
    /// Number of classes.
    n_classes: usize,
    /// The serialized forest.
    forest: PatternForest,
}

impl PatternForest {
    /// Save the model to a binary file.
    ///
    /// Uses bincode encoding wrapped in a versioned envelope for
    /// forward-compatibility checking.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::SerializeModel`] | bincode encoding failed |
    /// | [`TreeError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            n_classes: self.n_classes,
            forest: self.clone(),
        };

        let bytes =
            bincode::serialize(&envelope).map_err(|e| TreeError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| TreeError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(bytes = bytes.len(), "model saved");
        Ok(())
    }

    /// Load a model from a binary file written by [`PatternForest::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ReadModel`] | file read failed |
    /// | [`TreeError::DeserializeModel`] | bincode decoding failed |
    /// | [`TreeError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<PatternForest, TreeError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| TreeError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| TreeError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(TreeError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(
            n_trees = envelope.n_trees,
            n_classes = envelope.n_classes,
            "model loaded"
        );
        Ok(envelope.forest)
    }
}
