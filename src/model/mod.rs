//! Serialized class model - the analysis input
//!
//! The bytecode parser lives outside this tool; what it hands over is a
//! JSON description of each compiled class: methods with their signatures,
//! line ranges and call sites, fields, and the suppression annotations
//! users attached at class, field, method, parameter, or package level.
//! Nested classes use the `Outer$Inner` naming convention.

use crate::callgraph::MethodId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One model file: the classes it describes plus package-level entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectModel {
    #[serde(default)]
    pub classes: Vec<ClassModel>,
    #[serde(default)]
    pub packages: Vec<PackageModel>,
}

impl ProjectModel {
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load and merge several model files. Files are parsed in parallel;
    /// the merged class order follows the given path order, so identical
    /// inputs always produce an identical model.
    pub fn load_all(paths: &[PathBuf]) -> Result<Self, ModelError> {
        let parsed: Result<Vec<Self>, ModelError> = paths
            .par_iter()
            .map(|path| Self::from_file(path))
            .collect();

        let mut merged = Self::default();
        for model in parsed? {
            merged.classes.extend(model.classes);
            merged.packages.extend(model.packages);
        }
        Ok(merged)
    }

    /// Names of every class described in this model.
    pub fn class_names(&self) -> HashSet<&str> {
        self.classes.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassModel {
    /// Dotted fully-qualified name, `Outer$Inner` for nested classes.
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldModel>,
    #[serde(default)]
    pub methods: Vec<MethodModel>,
    /// Class-level suppression pattern expressions.
    #[serde(default)]
    pub suppress: Vec<String>,
}

impl ClassModel {
    /// Call-graph identity of one of this class's methods.
    pub fn method_id(&self, method: &MethodModel) -> MethodId {
        MethodId::new(&self.name, &method.name, &method.signature)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldModel {
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub suppress: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodModel {
    pub name: String,
    pub signature: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub start_line: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub calls: Vec<CallModel>,
    #[serde(default)]
    pub params: Vec<ParamModel>,
    #[serde(default)]
    pub suppress: Vec<String>,
}

/// One call site inside a method body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallModel {
    pub class: String,
    pub method: String,
    pub signature: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub pc: u32,
}

impl CallModel {
    pub fn method_id(&self) -> MethodId {
        MethodId::new(&self.class, &self.method, &self.signature)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamModel {
    pub name: String,
    /// Parameter slot ordinal.
    pub register: u16,
    #[serde(default)]
    pub suppress: Vec<String>,
}

/// Package-level entry carrying package-scoped suppressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageModel {
    pub name: String,
    #[serde(default)]
    pub suppress: Vec<String>,
}
