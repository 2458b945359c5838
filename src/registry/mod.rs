//! Detector registry - descriptors for every known detector
//!
//! The registry is an immutable arena built once at startup. Which
//! detectors actually run is decided per run by a `DetectorChooser` and the
//! execution plan; descriptors themselves are never mutated, so one
//! registry can back any number of runs without cross-run contamination.

use crate::analysis::detectors::Detector;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("detector '{0}' registered twice")]
    DuplicateId(String),
}

/// Constructs a fresh detector instance for one run.
pub type DetectorBuilder = fn() -> Box<dyn Detector>;

/// Identity and scheduling metadata for one detector.
///
/// Ordering constraints name either another detector id or a category tag;
/// a category expands to all registered members when the plan is built.
#[derive(Clone)]
pub struct DetectorDescriptor {
    id: String,
    category: Option<String>,
    run_before: BTreeSet<String>,
    run_after: BTreeSet<String>,
    enabled_by_default: bool,
    build: Option<DetectorBuilder>,
}

impl DetectorDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: None,
            run_before: BTreeSet::new(),
            run_after: BTreeSet::new(),
            enabled_by_default: true,
            build: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Declare that this detector must run before `target` (id or category).
    pub fn runs_before(mut self, target: impl Into<String>) -> Self {
        self.run_before.insert(target.into());
        self
    }

    /// Declare that this detector must run after `target` (id or category).
    /// The target's output is treated as a structural dependency: the plan
    /// builder cascade-enables it if the chooser left it out.
    pub fn runs_after(mut self, target: impl Into<String>) -> Self {
        self.run_after.insert(target.into());
        self
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    pub fn with_builder(mut self, build: DetectorBuilder) -> Self {
        self.build = Some(build);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn run_before(&self) -> &BTreeSet<String> {
        &self.run_before
    }

    pub fn run_after(&self) -> &BTreeSet<String> {
        &self.run_after
    }

    pub fn enabled_by_default(&self) -> bool {
        self.enabled_by_default
    }

    /// Instantiate the detector, or `None` for descriptor-only entries
    /// (registry fixtures in tests have no runnable detector behind them).
    pub fn instantiate(&self) -> Option<Box<dyn Detector>> {
        self.build.map(|build| build())
    }
}

impl std::fmt::Debug for DetectorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorDescriptor")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("run_before", &self.run_before)
            .field("run_after", &self.run_after)
            .field("enabled_by_default", &self.enabled_by_default)
            .finish()
    }
}

/// Arena of detector descriptors with id lookup.
#[derive(Debug, Default)]
pub struct DetectorRegistry {
    descriptors: Vec<DetectorDescriptor>,
    by_id: HashMap<String, usize>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: DetectorDescriptor) -> Result<(), RegistryError> {
        if self.by_id.contains_key(descriptor.id()) {
            return Err(RegistryError::DuplicateId(descriptor.id().to_string()));
        }
        self.by_id
            .insert(descriptor.id().to_string(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&DetectorDescriptor> {
        self.by_id.get(id).map(|&ix| &self.descriptors[ix])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn descriptor(&self, index: usize) -> &DetectorDescriptor {
        &self.descriptors[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectorDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Resolve a constraint endpoint to descriptor indices: an exact id
    /// match wins, otherwise every member of the named category.
    pub fn resolve(&self, name: &str) -> Vec<usize> {
        if let Some(&ix) = self.by_id.get(name) {
            return vec![ix];
        }
        self.descriptors
            .iter()
            .enumerate()
            .filter(|(_, d)| d.category() == Some(name))
            .map(|(ix, _)| ix)
            .collect()
    }
}

/// Predicate deciding which detectors are active for a run.
///
/// `enable` is invoked by the plan builder when constraint resolution
/// cascade-enables a rejected detector. `was_enabled` reports whether the
/// original predicate chose a descriptor; the default implementation
/// returns true, so callers must not assume an enabled descriptor was also
/// chosen rather than cascaded.
pub trait DetectorChooser {
    fn choose(&self, descriptor: &DetectorDescriptor) -> bool;

    fn enable(&mut self, _descriptor: &DetectorDescriptor) {}

    fn was_enabled(&self, _descriptor: &DetectorDescriptor) -> bool {
        true
    }
}

/// Chooser built from the run configuration's enable/disable lists.
///
/// Disables win over enables; with neither list naming a detector, its
/// default-enabled flag decides. Cascade-enablement is recorded so
/// `was_enabled` answers for the original predicate only.
#[derive(Debug, Default)]
pub struct ConfigChooser {
    enable: BTreeSet<String>,
    disable: BTreeSet<String>,
    cascaded: BTreeSet<String>,
}

impl ConfigChooser {
    pub fn new(enable: &[String], disable: &[String]) -> Self {
        Self {
            enable: enable.iter().cloned().collect(),
            disable: disable.iter().cloned().collect(),
            cascaded: BTreeSet::new(),
        }
    }

    /// Ids the plan builder enabled past the original predicate.
    pub fn cascaded(&self) -> impl Iterator<Item = &str> {
        self.cascaded.iter().map(String::as_str)
    }
}

impl DetectorChooser for ConfigChooser {
    fn choose(&self, descriptor: &DetectorDescriptor) -> bool {
        if self.disable.contains(descriptor.id()) {
            return false;
        }
        if !self.enable.is_empty() {
            return self.enable.contains(descriptor.id());
        }
        descriptor.enabled_by_default()
    }

    fn enable(&mut self, descriptor: &DetectorDescriptor) {
        self.cascaded.insert(descriptor.id().to_string());
    }

    fn was_enabled(&self, descriptor: &DetectorDescriptor) -> bool {
        !self.cascaded.contains(descriptor.id()) && self.choose(descriptor)
    }
}
