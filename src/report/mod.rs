//! Bug-report pipeline
//!
//! Every discovered defect, logged error, and missing-dependency report
//! flows through an ordered list of stages before reaching the output
//! sink. A stage may intercept, filter, or forward each event; the
//! pipeline is the single composed handle the engine and detectors talk
//! to. Canonical stage order: include/exclude filter, suppression filter,
//! counting/deduplication, rank threshold + serialization.
//!
//! The pipeline is not internally synchronized. If detectors run
//! concurrently the host must serialize calls into it.

mod stages;
mod status;

pub use stages::{CountingStage, FilterStage, ReportFormat, SuppressionStage, ThresholdStage};
pub use status::{
    ExitStatus, RunCounters, BUGS_FOUND_FLAG, ERROR_FLAG, MISSING_CLASS_FLAG,
};

use crate::defect::Defect;

/// What a stage decided about one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the event to the next stage inward.
    Forward,
    /// Swallow the event; later stages never see it.
    Drop,
}

/// One stage of the report pipeline.
///
/// Default implementations forward everything; a stage overrides only the
/// events it intercepts. `finish` may return synthesized defects, which
/// re-enter the pipeline at this stage's own position and pass through all
/// later stages like organically discovered defects.
pub trait ReportStage {
    fn defect(&mut self, _defect: &Defect) -> Disposition {
        Disposition::Forward
    }

    fn error(&mut self, _message: &str) -> Disposition {
        Disposition::Forward
    }

    fn missing_dependency(&mut self, _name: &str) -> Disposition {
        Disposition::Forward
    }

    fn finish(&mut self) -> Vec<Defect> {
        Vec::new()
    }
}

/// Capability detectors use to report; implemented by the pipeline.
pub trait ReportSink {
    fn report(&mut self, defect: Defect);
    fn log_error(&mut self, message: &str);
    fn report_missing_dependency(&mut self, name: &str);
}

/// The composed pipeline handle.
pub struct ReportPipeline {
    stages: Vec<Box<dyn ReportStage>>,
    finished: bool,
}

impl ReportPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    fn dispatch_defect(&mut self, from: usize, defect: &Defect) {
        for stage in self.stages[from..].iter_mut() {
            if stage.defect(defect) == Disposition::Drop {
                return;
            }
        }
    }

    /// End-of-run processing, outermost stage first. Each stage's
    /// synthesized defects are re-injected at that stage before the next
    /// stage's `finish` runs. Calling this twice is a no-op.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        for i in 0..self.stages.len() {
            let synthesized = self.stages[i].finish();
            for defect in synthesized {
                self.dispatch_defect(i, &defect);
            }
        }
    }
}

impl ReportSink for ReportPipeline {
    fn report(&mut self, defect: Defect) {
        self.dispatch_defect(0, &defect);
    }

    fn log_error(&mut self, message: &str) {
        for stage in self.stages.iter_mut() {
            if stage.error(message) == Disposition::Drop {
                return;
            }
        }
    }

    fn report_missing_dependency(&mut self, name: &str) {
        for stage in self.stages.iter_mut() {
            if stage.missing_dependency(name) == Disposition::Drop {
                return;
            }
        }
    }
}

/// Builds the pipeline from its stages, outermost first.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn ReportStage>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: impl ReportStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn build(self) -> ReportPipeline {
        ReportPipeline {
            stages: self.stages,
            finished: false,
        }
    }
}
