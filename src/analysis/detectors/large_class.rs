//! Large class detector
//!
//! Per-class structural check: flags classes declaring more methods than
//! the configured limit.

use super::Detector;
use crate::analysis::{AnalysisError, ClassContext};
use crate::defect::{ClassAnnotation, Defect};
use crate::report::ReportSink;

pub const OVERSIZED_CLASS: &str = "LC_OVERSIZED_CLASS";

const RANK: u8 = 14;
const DEFAULT_MAX_METHODS: usize = 30;

/// Detector for classes with too many methods
pub struct LargeClassDetector {
    max_methods: usize,
}

impl LargeClassDetector {
    pub fn new() -> Self {
        Self {
            max_methods: DEFAULT_MAX_METHODS,
        }
    }

    pub fn with_max_methods(mut self, max_methods: usize) -> Self {
        self.max_methods = max_methods;
        self
    }
}

impl Default for LargeClassDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for LargeClassDetector {
    fn visit_class(
        &mut self,
        ctx: &ClassContext<'_>,
        sink: &mut dyn ReportSink,
    ) -> Result<(), AnalysisError> {
        let count = ctx.class.methods.len();
        if count <= self.max_methods {
            return Ok(());
        }
        sink.report(
            Defect::new(OVERSIZED_CLASS, RANK)
                .with_message(format!(
                    "Class {} declares {} methods (limit {})",
                    ctx.class.name, count, self.max_methods
                ))
                .with_class(ClassAnnotation::new(&ctx.class.name)),
        );
        Ok(())
    }
}
