//! Suppression matching - user annotations that silence defects
//!
//! A suppression pairs a defect-pattern expression with a scope: a whole
//! class, one field, one method, one parameter slot, or a package-name
//! prefix. Matching checks the pattern first, then narrows by scope. The
//! first suppression to match a real defect is marked used; suppressions
//! that never fire are themselves reported as defects at end of run.
//!
//! Package scope is a plain string prefix on the qualified class name, so
//! `com.foo` also covers `com.foobar.X`. Kept for compatibility.

use crate::defect::{
    ClassAnnotation, Defect, FieldAnnotation, LocalVariableAnnotation, MethodAnnotation,
};
use crate::filter::PatternExpr;

pub const USELESS_SUPPRESSION_ON_CLASS: &str = "US_USELESS_SUPPRESSION_ON_CLASS";
pub const USELESS_SUPPRESSION_ON_FIELD: &str = "US_USELESS_SUPPRESSION_ON_FIELD";
pub const USELESS_SUPPRESSION_ON_METHOD: &str = "US_USELESS_SUPPRESSION_ON_METHOD";
pub const USELESS_SUPPRESSION_ON_METHOD_PARAMETER: &str =
    "US_USELESS_SUPPRESSION_ON_METHOD_PARAMETER";
pub const USELESS_SUPPRESSION_ON_PACKAGE: &str = "US_USELESS_SUPPRESSION_ON_PACKAGE";

/// Rank assigned to synthesized useless-suppression defects.
pub const USELESS_SUPPRESSION_RANK: u8 = 12;

/// Code element a suppression covers.
#[derive(Debug, Clone)]
pub enum SuppressionScope {
    Class {
        class: ClassAnnotation,
    },
    Field {
        class: ClassAnnotation,
        field: FieldAnnotation,
    },
    Method {
        class: ClassAnnotation,
        method: MethodAnnotation,
    },
    Parameter {
        class: ClassAnnotation,
        method: MethodAnnotation,
        register: u16,
    },
    Package {
        prefix: String,
    },
}

impl SuppressionScope {
    /// Lower value = more specific; the matcher consults specific scopes
    /// first so a field-level suppression shadows a class-level one.
    fn specificity(&self) -> u8 {
        match self {
            SuppressionScope::Parameter { .. } => 0,
            SuppressionScope::Field { .. } => 1,
            SuppressionScope::Method { .. } => 2,
            SuppressionScope::Class { .. } => 3,
            SuppressionScope::Package { .. } => 4,
        }
    }
}

/// One user-declared suppression with its usage flag.
#[derive(Debug, Clone)]
pub struct Suppression {
    pattern: PatternExpr,
    scope: SuppressionScope,
    used: bool,
}

impl Suppression {
    pub fn new(pattern: PatternExpr, scope: SuppressionScope) -> Self {
        Self {
            pattern,
            scope,
            used: false,
        }
    }

    pub fn on_class(pattern: PatternExpr, class: ClassAnnotation) -> Self {
        Self::new(pattern, SuppressionScope::Class { class })
    }

    pub fn on_field(pattern: PatternExpr, class: ClassAnnotation, field: FieldAnnotation) -> Self {
        Self::new(pattern, SuppressionScope::Field { class, field })
    }

    pub fn on_method(
        pattern: PatternExpr,
        class: ClassAnnotation,
        method: MethodAnnotation,
    ) -> Self {
        Self::new(pattern, SuppressionScope::Method { class, method })
    }

    pub fn on_parameter(
        pattern: PatternExpr,
        class: ClassAnnotation,
        method: MethodAnnotation,
        register: u16,
    ) -> Self {
        Self::new(
            pattern,
            SuppressionScope::Parameter {
                class,
                method,
                register,
            },
        )
    }

    pub fn on_package(pattern: PatternExpr, prefix: impl Into<String>) -> Self {
        Self::new(
            pattern,
            SuppressionScope::Package {
                prefix: prefix.into(),
            },
        )
    }

    pub fn used(&self) -> bool {
        self.used
    }

    pub fn scope(&self) -> &SuppressionScope {
        &self.scope
    }

    /// Whether this suppression covers `defect`: pattern expression first,
    /// then the scope narrowing. A defect lacking the annotation a scope
    /// needs to disambiguate (e.g. no primary method for a method scope)
    /// never matches.
    pub fn matches(&self, defect: &Defect) -> bool {
        if !self.pattern.matches(&defect.pattern) {
            return false;
        }
        match &self.scope {
            SuppressionScope::Class { class } => defect
                .primary_class()
                .is_some_and(|c| class.contains(c)),
            SuppressionScope::Field { class, field } => {
                defect.primary_class().is_some_and(|c| class.contains(c))
                    && defect.primary_field() == Some(field)
            }
            SuppressionScope::Method { class, method } => {
                defect.primary_class().is_some_and(|c| class.contains(c))
                    && defect.primary_method() == Some(method)
            }
            SuppressionScope::Parameter {
                class,
                method,
                register,
            } => {
                defect.primary_class().is_some_and(|c| class.contains(c))
                    && defect.primary_method() == Some(method)
                    && defect
                        .primary_local_variable()
                        .is_some_and(|v| v.register == *register)
            }
            SuppressionScope::Package { prefix } => defect
                .primary_class()
                .is_some_and(|c| c.class_name.starts_with(prefix.as_str())),
        }
    }

    /// Synthesize the defect reporting this suppression as never used.
    pub fn useless_suppression_defect(&self) -> Defect {
        let what = match self.pattern.describe() {
            Some(p) => format!("suppression of {}", p),
            None => "suppression".to_string(),
        };
        match &self.scope {
            SuppressionScope::Class { class } => {
                Defect::new(USELESS_SUPPRESSION_ON_CLASS, USELESS_SUPPRESSION_RANK)
                    .with_message(format!(
                        "Useless {} on class {}",
                        what, class.class_name
                    ))
                    .with_class(class.clone())
                    .as_synthetic()
            }
            SuppressionScope::Field { class, field } => {
                Defect::new(USELESS_SUPPRESSION_ON_FIELD, USELESS_SUPPRESSION_RANK)
                    .with_message(format!(
                        "Useless {} on field {}.{}",
                        what, field.class_name, field.field_name
                    ))
                    .with_class(class.clone())
                    .with_field(field.clone())
                    .as_synthetic()
            }
            SuppressionScope::Method { class, method } => {
                Defect::new(USELESS_SUPPRESSION_ON_METHOD, USELESS_SUPPRESSION_RANK)
                    .with_message(format!(
                        "Useless {} on method {}",
                        what,
                        method.short_form()
                    ))
                    .with_class(class.clone())
                    .with_method(method.clone())
                    .as_synthetic()
            }
            SuppressionScope::Parameter {
                class,
                method,
                register,
            } => Defect::new(
                USELESS_SUPPRESSION_ON_METHOD_PARAMETER,
                USELESS_SUPPRESSION_RANK,
            )
            .with_message(format!(
                "Useless {} on parameter {} of method {}",
                what,
                register + 1,
                method.short_form()
            ))
            .with_class(class.clone())
            .with_method(method.clone())
            .with_local_variable(LocalVariableAnnotation::new("?", *register))
            .as_synthetic(),
            SuppressionScope::Package { prefix } => {
                Defect::new(USELESS_SUPPRESSION_ON_PACKAGE, USELESS_SUPPRESSION_RANK)
                    .with_message(format!("Useless {} on package {}", what, prefix))
                    .with_class(ClassAnnotation::new(prefix.clone()))
                    .as_synthetic()
            }
        }
    }
}

/// All suppressions for a run, consulted per discovered defect.
#[derive(Debug, Default)]
pub struct SuppressionMatcher {
    suppressions: Vec<Suppression>,
    validated: bool,
}

impl SuppressionMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, suppression: Suppression) {
        self.suppressions.push(suppression);
    }

    pub fn len(&self) -> usize {
        self.suppressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppressions.is_empty()
    }

    /// Whether any suppression covers `defect`. The most specific matching
    /// suppression (and only that one) is marked used. Synthetic defects
    /// never match and never mark anything used.
    pub fn match_and_mark(&mut self, defect: &Defect) -> bool {
        if defect.synthetic {
            return false;
        }
        let mut levels: Vec<u8> = self
            .suppressions
            .iter()
            .map(|s| s.scope.specificity())
            .collect();
        levels.sort_unstable();
        levels.dedup();

        for level in levels {
            for suppression in &mut self.suppressions {
                if suppression.scope.specificity() == level && suppression.matches(defect) {
                    suppression.used = true;
                    return true;
                }
            }
        }
        false
    }

    /// Defects for suppressions that never matched. Emits each at most
    /// once per run; later calls return nothing.
    pub fn validate_usage(&mut self) -> Vec<Defect> {
        if self.validated {
            return Vec::new();
        }
        self.validated = true;
        self.suppressions
            .iter()
            .filter(|s| !s.used)
            .map(Suppression::useless_suppression_defect)
            .collect()
    }
}
