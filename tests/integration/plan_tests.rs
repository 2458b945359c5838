//! Integration tests for execution plan construction
//!
//! Covers constraint satisfaction, determinism, cascade re-enablement,
//! and cycle reporting.

use classlint::plan::{ExecutionPlan, PlanError};
use classlint::registry::{ConfigChooser, DetectorChooser, DetectorDescriptor, DetectorRegistry};

fn registry_from(descriptors: Vec<DetectorDescriptor>) -> DetectorRegistry {
    let mut registry = DetectorRegistry::new();
    for descriptor in descriptors {
        registry.register(descriptor).expect("unique test ids");
    }
    registry
}

fn plan(registry: &DetectorRegistry) -> Result<ExecutionPlan, PlanError> {
    let mut chooser = ConfigChooser::default();
    ExecutionPlan::build(registry, &mut chooser)
}

/// Every declared earlier/later pair must appear in that order.
fn assert_topological(registry: &DetectorRegistry, ids: &[String]) {
    let position = |id: &str| {
        ids.iter()
            .position(|x| x == id)
            .unwrap_or_else(|| panic!("{id} missing from plan"))
    };
    for descriptor in registry.iter() {
        for later in descriptor.run_before() {
            assert!(
                position(descriptor.id()) < position(later),
                "{} must precede {}",
                descriptor.id(),
                later
            );
        }
        for earlier in descriptor.run_after() {
            assert!(
                position(earlier) < position(descriptor.id()),
                "{} must follow {}",
                descriptor.id(),
                earlier
            );
        }
    }
}

#[test]
fn test_dag_constraints_produce_valid_topological_order() {
    let registry = registry_from(vec![
        DetectorDescriptor::new("E").runs_after("C"),
        DetectorDescriptor::new("D").runs_after("B"),
        DetectorDescriptor::new("C").runs_after("A"),
        DetectorDescriptor::new("B").runs_before("C"),
        DetectorDescriptor::new("A"),
    ]);

    let ids = plan(&registry).unwrap().ids(&registry);
    assert_eq!(ids.len(), 5);
    assert_topological(&registry, &ids);
}

#[test]
fn test_identical_inputs_yield_identical_plans() {
    let registry = registry_from(vec![
        DetectorDescriptor::new("Zeta"),
        DetectorDescriptor::new("Alpha").runs_before("Zeta"),
        DetectorDescriptor::new("Mid").runs_after("Alpha"),
        DetectorDescriptor::new("Other"),
    ]);

    let first = plan(&registry).unwrap().ids(&registry);
    for _ in 0..10 {
        assert_eq!(plan(&registry).unwrap().ids(&registry), first);
    }
}

#[test]
fn test_unconstrained_ties_break_by_id() {
    let registry = registry_from(vec![
        DetectorDescriptor::new("Charlie"),
        DetectorDescriptor::new("Alpha"),
        DetectorDescriptor::new("Bravo"),
    ]);

    let ids = plan(&registry).unwrap().ids(&registry);
    assert_eq!(ids, vec!["Alpha", "Bravo", "Charlie"]);
}

#[test]
fn test_cycle_fails_and_names_every_participant() {
    let registry = registry_from(vec![
        DetectorDescriptor::new("First").runs_before("Second"),
        DetectorDescriptor::new("Second").runs_before("Third"),
        DetectorDescriptor::new("Third").runs_before("First"),
        DetectorDescriptor::new("Bystander"),
    ]);

    let err = plan(&registry).unwrap_err();
    let PlanError::ConstraintCycle { ids } = err else {
        panic!("expected a cycle error");
    };
    assert_eq!(ids, vec!["First", "Second", "Third"]);

    // The message names the participants too.
    let rendered = PlanError::ConstraintCycle { ids }.to_string();
    for id in ["First", "Second", "Third"] {
        assert!(rendered.contains(id), "message should mention {id}");
    }
    assert!(!rendered.contains("Bystander"));
}

#[test]
fn test_two_node_cycle_via_mixed_constraints() {
    let registry = registry_from(vec![
        DetectorDescriptor::new("A").runs_before("B").runs_after("B"),
        DetectorDescriptor::new("B"),
    ]);

    assert!(matches!(
        plan(&registry),
        Err(PlanError::ConstraintCycle { .. })
    ));
}

#[test]
fn test_cascade_enables_structural_dependency() {
    let registry = registry_from(vec![
        DetectorDescriptor::new("Provider").disabled_by_default(),
        DetectorDescriptor::new("Consumer").runs_after("Provider"),
    ]);

    let mut chooser = ConfigChooser::default();
    let plan = ExecutionPlan::build(&registry, &mut chooser).unwrap();

    assert_eq!(plan.ids(&registry), vec!["Provider", "Consumer"]);
    // The provider was cascaded, not chosen.
    assert!(!chooser.was_enabled(registry.get("Provider").unwrap()));
    assert!(chooser.was_enabled(registry.get("Consumer").unwrap()));
    assert_eq!(chooser.cascaded().collect::<Vec<_>>(), vec!["Provider"]);
}

#[test]
fn test_disabled_consumer_does_not_cascade() {
    let registry = registry_from(vec![
        DetectorDescriptor::new("Provider").disabled_by_default(),
        DetectorDescriptor::new("Consumer")
            .disabled_by_default()
            .runs_after("Provider"),
    ]);

    let plan = plan(&registry).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_default_chooser_reports_every_descriptor_as_chosen() {
    // A chooser that does not track cascades must answer `was_enabled`
    // with true.
    struct ChooseEverything;
    impl DetectorChooser for ChooseEverything {
        fn choose(&self, _descriptor: &DetectorDescriptor) -> bool {
            true
        }
    }

    let registry = registry_from(vec![DetectorDescriptor::new("A")]);
    let chooser = ChooseEverything;
    assert!(chooser.was_enabled(registry.get("A").unwrap()));
}
