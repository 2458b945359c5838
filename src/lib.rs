//! classlint - defect-pattern analysis for compiled class models
//!
//! This library provides the orchestration core of a static-analysis
//! engine: given a set of compiled class descriptions, it schedules
//! detectors under their ordering constraints, links call sites into a
//! call graph, and routes every finding through a filtering, suppression,
//! and deduplication pipeline before it reaches the output sink.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Discovery** - Find serialized class-model files
//! 2. **Model Loading** - Parse class models (classes, methods, call sites)
//! 3. **Call Graph** - Intern methods and link call sites
//! 4. **Execution Plan** - Order enabled detectors under their constraints
//! 5. **Detector Passes** - Visit each class with each planned detector
//! 6. **Report Pipeline** - Filter, suppress, deduplicate, and emit findings

pub mod analysis;
pub mod callgraph;
pub mod config;
pub mod defect;
pub mod discovery;
pub mod filter;
pub mod model;
pub mod plan;
pub mod registry;
pub mod report;
pub mod suppress;

pub use analysis::{build_call_graph, collect_suppressions, AnalysisEngine, ClassContext};
pub use callgraph::{CallGraph, CallSite, MethodId, NodeHandle};
pub use config::Config;
pub use defect::{Defect, RANK_LEAST_SEVERE, RANK_MOST_SEVERE};
pub use discovery::ModelFinder;
pub use model::ProjectModel;
pub use plan::{ExecutionPlan, PlanError};
pub use registry::{ConfigChooser, DetectorChooser, DetectorDescriptor, DetectorRegistry};
pub use report::{ExitStatus, ReportPipeline, ReportSink, RunCounters};
pub use suppress::{Suppression, SuppressionMatcher};
