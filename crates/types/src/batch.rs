//! Batch declaration types
//!
//! A batch declaration is the configuration-side shape of a group of
//! parameters collected together. Declarations with an `array_size` expand
//! into one concrete batch per index.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder replaced by the array index when expanding a declaration
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Problems found while validating a batch declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("batch declaration has an empty name")]
    EmptyName,
    #[error("batch {0} declares no parameters")]
    NoParameters(String),
    #[error("batch {batch}: invalid parameter path {path:?}")]
    InvalidPath { batch: String, path: String },
    #[error("batch {0} declares an array size of zero")]
    ZeroArraySize(String),
}

/// A parameter path is valid when it is non-empty and has no whitespace
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && !path.chars().any(char::is_whitespace)
}

/// Declared group of parameter path templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeclaration {
    /// Batch name, used in logs and as the prefix of expanded batch names
    pub name: String,

    /// Parameter path templates
    #[serde(default, alias = "datarefs")]
    pub parameters: Vec<String>,

    /// When set, the declaration expands into one batch per index
    #[serde(default, alias = "array-size")]
    pub array_size: Option<usize>,
}

/// A concrete batch after array expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSpec {
    pub name: String,
    pub parameters: Vec<String>,
}

impl BatchDeclaration {
    /// Declaration of a plain batch
    pub fn new(name: impl Into<String>, parameters: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parameters,
            array_size: None,
        }
    }

    /// Declaration of an array family expanded over `0..size`
    pub fn array(name: impl Into<String>, parameters: Vec<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            parameters,
            array_size: Some(size),
        }
    }

    /// Check the declaration, reporting the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.parameters.is_empty() {
            return Err(ConfigError::NoParameters(self.name.clone()));
        }
        if self.array_size == Some(0) {
            return Err(ConfigError::ZeroArraySize(self.name.clone()));
        }
        if let Some(path) = self
            .parameters
            .iter()
            .find(|p| !is_valid_path(&p.replace(INDEX_PLACEHOLDER, "0")))
        {
            return Err(ConfigError::InvalidPath {
                batch: self.name.clone(),
                path: path.clone(),
            });
        }
        Ok(())
    }

    /// Expand into concrete batches.
    ///
    /// Without an array size this yields a single batch with the templates
    /// used verbatim. With `array_size = n` it yields `n` batches named
    /// `"<name> <i>"`, where each template either has its `{index}`
    /// placeholder substituted or gets `[i]` appended.
    pub fn expand(&self) -> Vec<BatchSpec> {
        match self.array_size {
            None => vec![BatchSpec {
                name: self.name.clone(),
                parameters: self.parameters.clone(),
            }],
            Some(size) => (0..size)
                .map(|i| BatchSpec {
                    name: format!("{} {}", self.name, i),
                    parameters: self
                        .parameters
                        .iter()
                        .map(|template| expand_template(template, i))
                        .collect(),
                })
                .collect(),
        }
    }
}

fn expand_template(template: &str, index: usize) -> String {
    if template.contains(INDEX_PLACEHOLDER) {
        template.replace(INDEX_PLACEHOLDER, &index.to_string())
    } else {
        format!("{}[{}]", template, index)
    }
}
