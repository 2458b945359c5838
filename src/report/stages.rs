//! The concrete pipeline stages
//!
//! Composition order is filter, suppression, counting, threshold. The
//! counting stage deduplicates errors and missing dependencies; the
//! threshold stage drops low-rank defects and serializes the rest.

use super::status::RunCounters;
use super::{Disposition, ReportStage};
use crate::defect::{Annotation, Defect};
use crate::filter::Matcher;
use crate::suppress::SuppressionMatcher;
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

/// Marker type the class loader substitutes for unresolvable synthetic
/// references; never worth reporting as missing.
const SYNTHETIC_MARKER_TYPE: &str = "java.lang.Synthetic";

/// Generic include/exclude filter around a `Matcher` capability.
///
/// A defect is forwarded iff `include == matcher.matches(defect)`: an
/// include filter keeps what the matcher covers, an exclude filter drops
/// it.
pub struct FilterStage {
    matcher: Box<dyn Matcher>,
    include: bool,
}

impl FilterStage {
    pub fn include(matcher: impl Matcher + 'static) -> Self {
        Self {
            matcher: Box::new(matcher),
            include: true,
        }
    }

    pub fn exclude(matcher: impl Matcher + 'static) -> Self {
        Self {
            matcher: Box::new(matcher),
            include: false,
        }
    }
}

impl ReportStage for FilterStage {
    fn defect(&mut self, defect: &Defect) -> Disposition {
        if self.include == self.matcher.matches(defect) {
            Disposition::Forward
        } else {
            Disposition::Drop
        }
    }
}

/// Suppression filter: the specialized exclude filter over the run's
/// suppression set. Tracks which suppressions ever matched a real defect
/// and synthesizes one useless-suppression defect per unused entry at
/// finish; the synthetics re-enter the pipeline at this stage and are
/// forwarded unexamined.
pub struct SuppressionStage {
    matcher: SuppressionMatcher,
}

impl SuppressionStage {
    pub fn new(matcher: SuppressionMatcher) -> Self {
        Self { matcher }
    }
}

impl ReportStage for SuppressionStage {
    fn defect(&mut self, defect: &Defect) -> Disposition {
        if defect.synthetic {
            return Disposition::Forward;
        }
        if self.matcher.match_and_mark(defect) {
            Disposition::Drop
        } else {
            Disposition::Forward
        }
    }

    fn finish(&mut self) -> Vec<Defect> {
        self.matcher.validate_usage()
    }
}

/// Deduplicating counter for errors and missing dependencies.
///
/// Errors are deduplicated by exact message text; only the first
/// occurrence travels on, but the count is of distinct messages, not
/// calls. Missing-dependency names are deduplicated by qualified name
/// after discarding array types (leading `[`) and the synthetic marker
/// type.
pub struct CountingStage {
    counters: Arc<RunCounters>,
    seen_errors: HashSet<String>,
    seen_missing: HashSet<String>,
}

impl CountingStage {
    pub fn new(counters: Arc<RunCounters>) -> Self {
        Self {
            counters,
            seen_errors: HashSet::new(),
            seen_missing: HashSet::new(),
        }
    }
}

impl ReportStage for CountingStage {
    fn error(&mut self, message: &str) -> Disposition {
        if self.seen_errors.insert(message.to_string()) {
            self.counters.count_error();
            Disposition::Forward
        } else {
            Disposition::Drop
        }
    }

    fn missing_dependency(&mut self, name: &str) -> Disposition {
        if name.starts_with('[') || name == SYNTHETIC_MARKER_TYPE {
            return Disposition::Drop;
        }
        if self.seen_missing.insert(name.to_string()) {
            self.counters.count_missing();
            Disposition::Forward
        } else {
            Disposition::Drop
        }
    }
}

/// Serialization format of the terminal stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// One line per defect, annotations appended in long mode.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Terminal stage: rank threshold, verbosity toggle, output sink.
///
/// Defects ranked less severe than the threshold are dropped; the rest are
/// serialized and counted as delivered through the injected counter
/// handle.
pub struct ThresholdStage {
    rank_threshold: u8,
    long_report: bool,
    format: ReportFormat,
    writer: Box<dyn Write + Send>,
    counters: Arc<RunCounters>,
}

impl ThresholdStage {
    pub fn new(writer: Box<dyn Write + Send>, counters: Arc<RunCounters>) -> Self {
        Self {
            rank_threshold: crate::defect::RANK_LEAST_SEVERE,
            long_report: false,
            format: ReportFormat::Text,
            writer,
            counters,
        }
    }

    pub fn with_rank_threshold(mut self, threshold: u8) -> Self {
        self.rank_threshold = threshold;
        self
    }

    pub fn with_long_report(mut self, long_report: bool) -> Self {
        self.long_report = long_report;
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    fn write_defect(&mut self, defect: &Defect) {
        let result = match self.format {
            ReportFormat::Json => serde_json::to_string(defect)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
                .and_then(|line| writeln!(self.writer, "{}", line)),
            ReportFormat::Text => {
                let mut line = format!("{}", defect);
                if let Some(class) = defect.primary_class() {
                    line.push_str(&format!("  At {}", class.class_name));
                }
                if let Some(src) = defect.primary_source_line() {
                    line.push_str(&format!(":{}", src.start_line));
                }
                let written = writeln!(self.writer, "{}", line);
                if self.long_report && written.is_ok() {
                    self.write_annotations(defect)
                } else {
                    written
                }
            }
        };
        if let Err(e) = result {
            warn!("report sink write failed: {}", e);
        }
    }

    fn write_annotations(&mut self, defect: &Defect) -> std::io::Result<()> {
        for annotation in &defect.annotations {
            match annotation {
                Annotation::Class(c) => writeln!(self.writer, "    class  {}", c.class_name)?,
                Annotation::Method(m) => {
                    writeln!(self.writer, "    method {}.{}{}", m.class_name, m.method_name, m.signature)?
                }
                Annotation::Field(f) => {
                    writeln!(self.writer, "    field  {}.{}", f.class_name, f.field_name)?
                }
                Annotation::LocalVariable(v) => {
                    writeln!(self.writer, "    local  {} (slot {})", v.name, v.register)?
                }
                Annotation::SourceLine(s) => writeln!(
                    self.writer,
                    "    lines  {}:{}-{}",
                    s.class_name, s.start_line, s.end_line
                )?,
            }
        }
        Ok(())
    }
}

impl ReportStage for ThresholdStage {
    fn defect(&mut self, defect: &Defect) -> Disposition {
        if defect.rank > self.rank_threshold {
            return Disposition::Drop;
        }
        self.write_defect(defect);
        self.counters.count_delivered();
        Disposition::Forward
    }

    fn error(&mut self, message: &str) -> Disposition {
        if let Err(e) = writeln!(self.writer, "ERROR: {}", message) {
            warn!("report sink write failed: {}", e);
        }
        Disposition::Forward
    }

    fn missing_dependency(&mut self, name: &str) -> Disposition {
        if let Err(e) = writeln!(self.writer, "MISSING: {}", name) {
            warn!("report sink write failed: {}", e);
        }
        Disposition::Forward
    }

    fn finish(&mut self) -> Vec<Defect> {
        if let Err(e) = self.writer.flush() {
            warn!("report sink flush failed: {}", e);
        }
        Vec::new()
    }
}
