//! Recursive call cycle detector
//!
//! Interprocedural: consults the call graph's strongly connected
//! components and flags every analyzed method that sits on a call cycle,
//! including direct self-recursion.

use super::Detector;
use crate::analysis::{AnalysisError, ClassContext};
use crate::callgraph::NodeHandle;
use crate::defect::{ClassAnnotation, Defect, MethodAnnotation, SourceLineAnnotation};
use crate::report::ReportSink;
use std::collections::HashSet;

pub const RECURSIVE_CALL_CYCLE: &str = "RC_RECURSIVE_CALL_CYCLE";

const RANK: u8 = 11;

/// Detector for methods participating in recursive call cycles
pub struct RecursionDetector {
    // Computed from the run's call graph on first visit; the graph does
    // not change between classes within a run.
    recursive: Option<HashSet<NodeHandle>>,
}

impl RecursionDetector {
    pub fn new() -> Self {
        Self { recursive: None }
    }
}

impl Default for RecursionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for RecursionDetector {
    fn visit_class(
        &mut self,
        ctx: &ClassContext<'_>,
        sink: &mut dyn ReportSink,
    ) -> Result<(), AnalysisError> {
        let recursive = self.recursive.get_or_insert_with(|| {
            ctx.call_graph
                .recursive_components()
                .into_iter()
                .flatten()
                .collect()
        });

        for method in &ctx.class.methods {
            let Some(node) = ctx.call_graph.find_node(&ctx.class.method_id(method)) else {
                continue;
            };
            if !recursive.contains(&node) {
                continue;
            }

            let annotation = MethodAnnotation::new(
                &ctx.class.name,
                &method.name,
                &method.signature,
                method.is_static,
            );
            let mut defect = Defect::new(RECURSIVE_CALL_CYCLE, RANK)
                .with_message(format!(
                    "Method {} participates in a recursive call cycle",
                    annotation.short_form()
                ))
                .with_class(ClassAnnotation::new(&ctx.class.name))
                .with_method(annotation);
            if method.start_line > 0 {
                defect = defect.with_source_line(SourceLineAnnotation::new(
                    &ctx.class.name,
                    method.start_line,
                    method.end_line,
                ));
            }
            sink.report(defect);
        }
        Ok(())
    }
}
