//! Integration tests for the report pipeline
//!
//! Stage composition, deduplication, thresholding, and the end-of-run
//! useless-suppression flow.

use classlint::defect::{ClassAnnotation, Defect};
use classlint::filter::{PatternExpr, PatternSetMatcher};
use classlint::report::{
    CountingStage, ExitStatus, FilterStage, PipelineBuilder, ReportFormat, ReportPipeline,
    ReportSink, RunCounters, SuppressionStage, ThresholdStage,
};
use classlint::suppress::{Suppression, SuppressionMatcher};
use std::sync::Arc;

fn full_pipeline(
    suppressions: SuppressionMatcher,
    rank_threshold: u8,
) -> (ReportPipeline, Arc<RunCounters>) {
    let counters = Arc::new(RunCounters::default());
    let pipeline = PipelineBuilder::new()
        .stage(SuppressionStage::new(suppressions))
        .stage(CountingStage::new(counters.clone()))
        .stage(
            ThresholdStage::new(Box::new(std::io::sink()), counters.clone())
                .with_rank_threshold(rank_threshold),
        )
        .build();
    (pipeline, counters)
}

fn defect_on(class: &str, pattern: &str, rank: u8) -> Defect {
    Defect::new(pattern, rank).with_class(ClassAnnotation::new(class))
}

#[test]
fn test_error_logged_twice_counts_once() {
    let (mut pipeline, counters) = full_pipeline(SuppressionMatcher::new(), 20);

    pipeline.log_error("detector exploded");
    pipeline.log_error("detector exploded");

    assert_eq!(counters.errors(), 1);

    pipeline.log_error("another failure");
    assert_eq!(counters.errors(), 2);
}

#[test]
fn test_missing_dependency_dedup_and_noise_filtering() {
    let (mut pipeline, counters) = full_pipeline(SuppressionMatcher::new(), 20);

    pipeline.report_missing_dependency("com.vendor.Widget");
    pipeline.report_missing_dependency("com.vendor.Widget");
    pipeline.report_missing_dependency("[Lcom.vendor.Widget;");
    pipeline.report_missing_dependency("java.lang.Synthetic");

    assert_eq!(counters.missing(), 1);
}

#[test]
fn test_rank_threshold_drops_less_severe_defects() {
    let (mut pipeline, counters) = full_pipeline(SuppressionMatcher::new(), 10);

    pipeline.report(defect_on("com.example.A", "SEVERE_ONE", 1));
    pipeline.report(defect_on("com.example.A", "AT_THRESHOLD", 10));
    pipeline.report(defect_on("com.example.A", "TOO_MILD", 11));

    assert_eq!(counters.delivered(), 2);
}

#[test]
fn test_suppressed_defect_is_not_delivered_or_counted() {
    let mut suppressions = SuppressionMatcher::new();
    suppressions.add(Suppression::on_class(
        PatternExpr::parse("UUF_UNUSED_FIELD").unwrap(),
        ClassAnnotation::new("com.example.Quiet"),
    ));
    let (mut pipeline, counters) = full_pipeline(suppressions, 20);

    pipeline.report(defect_on("com.example.Quiet", "UUF_UNUSED_FIELD", 5));
    pipeline.report(defect_on("com.example.Loud", "UUF_UNUSED_FIELD", 5));

    assert_eq!(counters.delivered(), 1);
}

#[test]
fn test_useless_suppression_flows_through_downstream_stages() {
    let mut suppressions = SuppressionMatcher::new();
    suppressions.add(Suppression::on_class(
        PatternExpr::parse("NEVER_EMITTED").unwrap(),
        ClassAnnotation::new("com.example.Quiet"),
    ));
    let (mut pipeline, counters) = full_pipeline(suppressions, 20);

    pipeline.finish();

    // The synthetic useless-suppression defect was delivered and counted
    // exactly like an organic one.
    assert_eq!(counters.delivered(), 1);
    let status = ExitStatus::from_counters(&counters);
    assert_eq!(status.label(), "BUGS FOUND");
}

#[test]
fn test_useless_suppression_respects_rank_threshold() {
    let mut suppressions = SuppressionMatcher::new();
    suppressions.add(Suppression::on_class(
        PatternExpr::parse("NEVER_EMITTED").unwrap(),
        ClassAnnotation::new("com.example.Quiet"),
    ));
    // Threshold stricter than the synthetic defect's rank.
    let (mut pipeline, counters) = full_pipeline(suppressions, 5);

    pipeline.finish();
    assert_eq!(counters.delivered(), 0);
}

#[test]
fn test_include_filter_keeps_only_matching_patterns() {
    let counters = Arc::new(RunCounters::default());
    let matcher = PatternSetMatcher::parse_all(&["~^UM_.*".to_string()]).unwrap();
    let mut pipeline = PipelineBuilder::new()
        .stage(FilterStage::include(matcher))
        .stage(ThresholdStage::new(Box::new(std::io::sink()), counters.clone()))
        .build();

    pipeline.report(defect_on("com.example.A", "UM_UNCALLED_METHOD", 8));
    pipeline.report(defect_on("com.example.A", "LC_OVERSIZED_CLASS", 14));

    assert_eq!(counters.delivered(), 1);
}

#[test]
fn test_filtered_defect_is_a_policy_outcome_not_an_error() {
    let counters = Arc::new(RunCounters::default());
    let matcher = PatternSetMatcher::parse_all(&["NOISY".to_string()]).unwrap();
    let mut pipeline = PipelineBuilder::new()
        .stage(FilterStage::exclude(matcher))
        .stage(CountingStage::new(counters.clone()))
        .stage(ThresholdStage::new(Box::new(std::io::sink()), counters.clone()))
        .build();

    pipeline.report(defect_on("com.example.A", "NOISY", 5));

    assert_eq!(counters.delivered(), 0);
    assert_eq!(counters.errors(), 0);
}

#[test]
fn test_json_format_serializes_delivered_defects() {
    let counters = Arc::new(RunCounters::default());
    let buffer: Vec<u8> = Vec::new();
    // Shared buffer so the test can inspect what the stage wrote.
    struct SharedWriter(Arc<std::sync::Mutex<Vec<u8>>>);
    impl std::io::Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    let shared = Arc::new(std::sync::Mutex::new(buffer));
    let mut pipeline = PipelineBuilder::new()
        .stage(
            ThresholdStage::new(Box::new(SharedWriter(shared.clone())), counters.clone())
                .with_format(ReportFormat::Json),
        )
        .build();

    pipeline.report(defect_on("com.example.A", "UM_UNCALLED_METHOD", 8));
    pipeline.finish();

    let written = String::from_utf8(shared.lock().unwrap().clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
    assert_eq!(value["pattern"], "UM_UNCALLED_METHOD");
    assert_eq!(value["rank"], 8);
}

#[test]
fn test_exit_status_table() {
    assert_eq!(ExitStatus::from_counts(0, 0, 3).flags(), 1);
    assert_eq!(ExitStatus::from_counts(0, 0, 3).label(), "BUGS FOUND");
    assert_eq!(ExitStatus::from_counts(2, 0, 0).flags(), 4);
    assert_eq!(ExitStatus::from_counts(2, 0, 0).label(), "ERROR");
    assert_eq!(ExitStatus::from_counts(0, 0, 0).flags(), 0);
    assert_eq!(ExitStatus::from_counts(0, 0, 0).label(), "SUCCESS");
    assert_eq!(ExitStatus::from_counts(1, 1, 1).flags(), 7);
    assert_eq!(
        ExitStatus::from_counts(1, 1, 1).label(),
        "ERROR,MISSING CLASS,BUGS FOUND"
    );
}
