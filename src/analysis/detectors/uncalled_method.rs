//! Uncalled method detector
//!
//! Interprocedural: a method with no incoming call edges anywhere in the
//! call graph is never invoked by analyzed code. Entry points
//! (constructors, static initializers, `main`) are exempt - the host
//! invokes them, not analyzed code.

use super::Detector;
use crate::analysis::{AnalysisError, ClassContext};
use crate::defect::{ClassAnnotation, Defect, MethodAnnotation, SourceLineAnnotation};
use crate::model::MethodModel;
use crate::report::ReportSink;

pub const UNCALLED_METHOD: &str = "UM_UNCALLED_METHOD";

const RANK: u8 = 8;

/// Detector for methods no call site ever targets
pub struct UncalledMethodDetector;

impl UncalledMethodDetector {
    pub fn new() -> Self {
        Self
    }

    fn is_entry_point(method: &MethodModel) -> bool {
        method.name == "main" || method.name == "<init>" || method.name == "<clinit>"
    }
}

impl Default for UncalledMethodDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for UncalledMethodDetector {
    fn visit_class(
        &mut self,
        ctx: &ClassContext<'_>,
        sink: &mut dyn ReportSink,
    ) -> Result<(), AnalysisError> {
        for method in &ctx.class.methods {
            if Self::is_entry_point(method) {
                continue;
            }
            let Some(node) = ctx.call_graph.find_node(&ctx.class.method_id(method)) else {
                continue;
            };
            if ctx.call_graph.edges_to(node).next().is_some() {
                continue;
            }

            let annotation = MethodAnnotation::new(
                &ctx.class.name,
                &method.name,
                &method.signature,
                method.is_static,
            );
            let mut defect = Defect::new(UNCALLED_METHOD, RANK)
                .with_message(format!(
                    "Method {} is never called",
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
