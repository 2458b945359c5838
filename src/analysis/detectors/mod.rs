// Built-in detectors
// The interesting machinery is the scheduling and reporting around them;
// these stay deliberately small.
#![allow(dead_code)]

mod large_class;
mod recursion;
mod uncalled_method;

pub use large_class::LargeClassDetector;
pub use recursion::RecursionDetector;
pub use uncalled_method::UncalledMethodDetector;

use super::{AnalysisError, ClassContext};
use crate::registry::{DetectorDescriptor, DetectorRegistry};
use crate::report::ReportSink;

/// Trait for defect detectors
pub trait Detector {
    /// Inspect one class and report findings into the pipeline.
    fn visit_class(
        &mut self,
        ctx: &ClassContext<'_>,
        sink: &mut dyn ReportSink,
    ) -> Result<(), AnalysisError>;

    /// End-of-run hook for detectors that accumulate across classes.
    fn finish(&mut self, _sink: &mut dyn ReportSink) {}
}

/// Registry of the built-in detectors with their ordering constraints.
pub fn builtin_registry() -> DetectorRegistry {
    let mut registry = DetectorRegistry::new();
    let descriptors = [
        DetectorDescriptor::new("RecursionDetector")
            .with_category("interprocedural")
            .with_builder(|| Box::new(RecursionDetector::new())),
        DetectorDescriptor::new("UncalledMethodDetector")
            .with_category("interprocedural")
            .runs_after("RecursionDetector")
            .with_builder(|| Box::new(UncalledMethodDetector::new())),
        DetectorDescriptor::new("LargeClassDetector")
            .with_builder(|| Box::new(LargeClassDetector::new())),
    ];
    for descriptor in descriptors {
        registry
            .register(descriptor)
            .expect("built-in detector ids are unique");
    }
    registry
}
