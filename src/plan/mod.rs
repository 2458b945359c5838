//! Execution plan - deterministic, constraint-satisfying detector order
//!
//! Plan construction runs once per analysis, single-threaded:
//!
//! 1. Apply the chooser to every registered descriptor.
//! 2. Cascade: a `run_after` target is a structural dependency, so a
//!    rejected detector whose output an enabled detector consumes is
//!    re-enabled (the chooser is told via `enable`), repeated to a fixed
//!    point.
//! 3. Restrict the ordering constraints to the enabled set and
//!    topologically sort it, breaking ties by detector id so the same
//!    registry and chooser always produce the same plan.
//!
//! A cycle among enabled detectors is a fatal configuration error naming
//! every participating detector id. The finished plan is read-only.

use crate::registry::{DetectorChooser, DetectorRegistry};
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    /// A constraint names something that is neither a detector id nor a
    /// category with registered members.
    #[error("unknown target '{target}' in ordering constraint of detector '{detector}'")]
    UnknownConstraintTarget { detector: String, target: String },

    /// The enabled-detector constraint graph contains a cycle. Fatal.
    #[error("ordering-constraint cycle among detectors: {}", ids.join(", "))]
    ConstraintCycle { ids: Vec<String> },
}

/// Ordered sequence of enabled detectors for one run.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    order: Vec<usize>,
}

impl ExecutionPlan {
    /// Build the plan for `registry` as filtered by `chooser`.
    pub fn build(
        registry: &DetectorRegistry,
        chooser: &mut dyn DetectorChooser,
    ) -> Result<Self, PlanError> {
        let mut enabled: Vec<bool> = registry.iter().map(|d| chooser.choose(d)).collect();

        cascade_enable(registry, chooser, &mut enabled)?;

        let edges = constraint_edges(registry, &enabled)?;
        let order = topological_order(registry, &enabled, &edges)?;

        Ok(Self { order })
    }

    /// Registry indices in execution order.
    pub fn indices(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Detector ids in execution order.
    pub fn ids(&self, registry: &DetectorRegistry) -> Vec<String> {
        self.order
            .iter()
            .map(|&ix| registry.descriptor(ix).id().to_string())
            .collect()
    }
}

/// Re-enable structural dependencies until nothing changes.
fn cascade_enable(
    registry: &DetectorRegistry,
    chooser: &mut dyn DetectorChooser,
    enabled: &mut [bool],
) -> Result<(), PlanError> {
    loop {
        let mut changed = false;
        for ix in 0..registry.len() {
            if !enabled[ix] {
                continue;
            }
            let descriptor = registry.descriptor(ix);
            for target in descriptor.run_after() {
                let deps = resolve_target(registry, descriptor.id(), target)?;
                for dep in deps {
                    if !enabled[dep] {
                        chooser.enable(registry.descriptor(dep));
                        enabled[dep] = true;
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return Ok(());
        }
    }
}

fn resolve_target(
    registry: &DetectorRegistry,
    detector: &str,
    target: &str,
) -> Result<Vec<usize>, PlanError> {
    let resolved = registry.resolve(target);
    if resolved.is_empty() {
        return Err(PlanError::UnknownConstraintTarget {
            detector: detector.to_string(),
            target: target.to_string(),
        });
    }
    Ok(resolved)
}

/// Earlier-to-later edges among enabled detectors. `run_before` constraints
/// whose target is disabled simply do not apply; `run_after` targets are
/// always enabled by the time this runs, thanks to the cascade.
fn constraint_edges(
    registry: &DetectorRegistry,
    enabled: &[bool],
) -> Result<BTreeSet<(usize, usize)>, PlanError> {
    let mut edges = BTreeSet::new();
    for ix in 0..registry.len() {
        if !enabled[ix] {
            continue;
        }
        let descriptor = registry.descriptor(ix);
        for target in descriptor.run_before() {
            for later in resolve_target(registry, descriptor.id(), target)? {
                if enabled[later] && later != ix {
                    edges.insert((ix, later));
                }
            }
        }
        for target in descriptor.run_after() {
            for earlier in resolve_target(registry, descriptor.id(), target)? {
                if enabled[earlier] && earlier != ix {
                    edges.insert((earlier, ix));
                }
            }
        }
    }
    Ok(edges)
}

/// Kahn's algorithm with a ready-queue ordered by detector id.
fn topological_order(
    registry: &DetectorRegistry,
    enabled: &[bool],
    edges: &BTreeSet<(usize, usize)>,
) -> Result<Vec<usize>, PlanError> {
    let mut in_degree = vec![0usize; registry.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); registry.len()];
    for &(earlier, later) in edges {
        in_degree[later] += 1;
        successors[earlier].push(later);
    }

    let mut ready: BinaryHeap<Reverse<(&str, usize)>> = (0..registry.len())
        .filter(|&ix| enabled[ix] && in_degree[ix] == 0)
        .map(|ix| Reverse((registry.descriptor(ix).id(), ix)))
        .collect();

    let enabled_count = enabled.iter().filter(|&&e| e).count();
    let mut order = Vec::with_capacity(enabled_count);

    while let Some(Reverse((_, ix))) = ready.pop() {
        order.push(ix);
        for &later in &successors[ix] {
            in_degree[later] -= 1;
            if in_degree[later] == 0 {
                ready.push(Reverse((registry.descriptor(later).id(), later)));
            }
        }
    }

    if order.len() < enabled_count {
        return Err(PlanError::ConstraintCycle {
            ids: cycle_participants(registry, enabled, edges),
        });
    }
    Ok(order)
}

/// Ids on non-trivial strongly connected components (or self-loops) of the
/// enabled-constraint graph, sorted for stable error messages.
fn cycle_participants(
    registry: &DetectorRegistry,
    enabled: &[bool],
    edges: &BTreeSet<(usize, usize)>,
) -> Vec<String> {
    let mut graph = DiGraph::<usize, ()>::new();
    let indices: Vec<_> = (0..registry.len())
        .map(|ix| {
            if enabled[ix] {
                Some(graph.add_node(ix))
            } else {
                None
            }
        })
        .collect();
    for &(earlier, later) in edges {
        if let (Some(a), Some(b)) = (indices[earlier], indices[later]) {
            graph.add_edge(a, b, ());
        }
    }

    let mut ids: Vec<String> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(|node| registry.descriptor(graph[node]).id().to_string())
        .collect();
    ids.sort();
    ids
}
