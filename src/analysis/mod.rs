// Analysis engine - builds the call graph and plan, then drives detectors
#![allow(dead_code)]

pub mod detectors;

use crate::callgraph::{CallGraph, CallSite};
use crate::defect::{ClassAnnotation, FieldAnnotation, MethodAnnotation};
use crate::filter::{FilterError, PatternExpr};
use crate::model::{ClassModel, ProjectModel};
use crate::plan::{ExecutionPlan, PlanError};
use crate::registry::{DetectorChooser, DetectorRegistry};
use crate::report::{ExitStatus, ReportPipeline, ReportSink, RunCounters};
use crate::suppress::{Suppression, SuppressionMatcher};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Failure of one detector on one class. Recoverable: the engine logs it
/// through the pipeline and moves on.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AnalysisError {
    message: String,
}

impl AnalysisError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Everything a detector sees when visiting one class.
pub struct ClassContext<'a> {
    pub class: &'a ClassModel,
    pub call_graph: &'a CallGraph,
}

/// Platform namespaces whose absence from the model is expected.
fn is_platform_class(name: &str) -> bool {
    name.starts_with("java.") || name.starts_with("javax.")
}

/// Intern every declared method and add one edge per call site.
pub fn build_call_graph(model: &ProjectModel) -> CallGraph {
    let mut graph = CallGraph::new();
    for class in &model.classes {
        for method in &class.methods {
            let caller = graph.node(class.method_id(method));
            for call in &method.calls {
                let callee = graph.node(call.method_id());
                graph.add_edge(caller, callee, CallSite::new(call.line, call.pc));
            }
        }
    }
    graph
}

/// Translate the model's suppression annotations into matcher entries.
pub fn collect_suppressions(model: &ProjectModel) -> Result<SuppressionMatcher, FilterError> {
    let mut matcher = SuppressionMatcher::new();
    for class in &model.classes {
        let class_annotation = ClassAnnotation::new(&class.name);
        for expr in &class.suppress {
            matcher.add(Suppression::on_class(
                PatternExpr::parse(expr)?,
                class_annotation.clone(),
            ));
        }
        for field in &class.fields {
            for expr in &field.suppress {
                matcher.add(Suppression::on_field(
                    PatternExpr::parse(expr)?,
                    class_annotation.clone(),
                    FieldAnnotation::new(&class.name, &field.name, &field.signature, field.is_static),
                ));
            }
        }
        for method in &class.methods {
            let method_annotation = MethodAnnotation::new(
                &class.name,
                &method.name,
                &method.signature,
                method.is_static,
            );
            for expr in &method.suppress {
                matcher.add(Suppression::on_method(
                    PatternExpr::parse(expr)?,
                    class_annotation.clone(),
                    method_annotation.clone(),
                ));
            }
            for param in &method.params {
                for expr in &param.suppress {
                    matcher.add(Suppression::on_parameter(
                        PatternExpr::parse(expr)?,
                        class_annotation.clone(),
                        method_annotation.clone(),
                        param.register,
                    ));
                }
            }
        }
    }
    for package in &model.packages {
        for expr in &package.suppress {
            matcher.add(Suppression::on_package(PatternExpr::parse(expr)?, &package.name));
        }
    }
    Ok(matcher)
}

/// Drives one analysis run over a loaded project model.
pub struct AnalysisEngine<'a> {
    registry: &'a DetectorRegistry,
    model: &'a ProjectModel,
}

impl<'a> AnalysisEngine<'a> {
    pub fn new(registry: &'a DetectorRegistry, model: &'a ProjectModel) -> Self {
        Self { registry, model }
    }

    /// Run the full analysis: call graph, missing-dependency checks,
    /// execution plan, detector passes, end-of-run pipeline processing.
    /// Only plan construction can fail; per-unit detector failures are
    /// logged through the pipeline and the run continues.
    pub fn run(
        &self,
        chooser: &mut dyn DetectorChooser,
        pipeline: &mut ReportPipeline,
        counters: &Arc<RunCounters>,
    ) -> Result<ExitStatus, PlanError> {
        let call_graph = build_call_graph(self.model);
        debug!(
            "Call graph: {} methods, {} call sites",
            call_graph.node_count(),
            call_graph.edge_count()
        );

        self.report_missing_superclasses(pipeline);

        let plan = ExecutionPlan::build(self.registry, chooser)?;
        info!(
            "Execution plan: {} of {} detectors enabled",
            plan.len(),
            self.registry.len()
        );

        for &ix in plan.indices() {
            let descriptor = self.registry.descriptor(ix);
            let Some(mut detector) = descriptor.instantiate() else {
                continue;
            };
            debug!("Running detector {}", descriptor.id());
            for class in &self.model.classes {
                let ctx = ClassContext {
                    class,
                    call_graph: &call_graph,
                };
                if let Err(e) = detector.visit_class(&ctx, pipeline) {
                    pipeline.log_error(&format!(
                        "Detector {} failed on {}: {}",
                        descriptor.id(),
                        class.name,
                        e
                    ));
                }
            }
            detector.finish(pipeline);
        }

        pipeline.finish();
        Ok(ExitStatus::from_counters(counters))
    }

    /// A superclass that is neither analyzed nor a platform class is a
    /// missing analysis dependency.
    fn report_missing_superclasses(&self, pipeline: &mut ReportPipeline) {
        let known = self.model.class_names();
        for class in &self.model.classes {
            if let Some(superclass) = &class.superclass {
                if !known.contains(superclass.as_str()) && !is_platform_class(superclass) {
                    pipeline.report_missing_dependency(superclass);
                }
            }
        }
    }
}
