// Defect model - the findings detectors emit and the report pipeline carries
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Most severe rank a defect can carry.
pub const RANK_MOST_SEVERE: u8 = 1;
/// Least severe rank; also the default threshold (report everything).
pub const RANK_LEAST_SEVERE: u8 = 20;

/// Reference to a class by its dotted fully-qualified name.
///
/// Nested classes use the `Outer$Inner` convention, so containment
/// checks reduce to string comparisons on the qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassAnnotation {
    pub class_name: String,
}

impl ClassAnnotation {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    /// True if `other` is this class or nested within it.
    pub fn contains(&self, other: &ClassAnnotation) -> bool {
        other.class_name == self.class_name
            || other
                .class_name
                .strip_prefix(&self.class_name)
                .is_some_and(|rest| rest.starts_with('$'))
    }

    /// Simple (unqualified) name, for short display.
    pub fn simple_name(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.class_name)
    }
}

/// Reference to a method by owning class, name, and signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodAnnotation {
    pub class_name: String,
    pub method_name: String,
    pub signature: String,
    pub is_static: bool,
}

impl MethodAnnotation {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        signature: impl Into<String>,
        is_static: bool,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            signature: signature.into(),
            is_static,
        }
    }

    /// Short `Class.method()` form used in messages.
    pub fn short_form(&self) -> String {
        let class = self.class_name.rsplit('.').next().unwrap_or(&self.class_name);
        format!("{}.{}()", class, self.method_name)
    }
}

/// Reference to a field by owning class and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldAnnotation {
    pub class_name: String,
    pub field_name: String,
    pub signature: String,
    pub is_static: bool,
}

impl FieldAnnotation {
    pub fn new(
        class_name: impl Into<String>,
        field_name: impl Into<String>,
        signature: impl Into<String>,
        is_static: bool,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            field_name: field_name.into(),
            signature: signature.into(),
            is_static,
        }
    }
}

/// Reference to a local variable or parameter slot within a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalVariableAnnotation {
    pub name: String,
    /// Register (parameter slot ordinal) the variable occupies.
    pub register: u16,
}

impl LocalVariableAnnotation {
    pub fn new(name: impl Into<String>, register: u16) -> Self {
        Self {
            name: name.into(),
            register,
        }
    }
}

/// Source-line range attached to a defect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLineAnnotation {
    pub class_name: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl SourceLineAnnotation {
    pub fn new(class_name: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Self {
            class_name: class_name.into(),
            start_line,
            end_line,
        }
    }
}

/// One annotation in a defect's ordered annotation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Class(ClassAnnotation),
    Method(MethodAnnotation),
    Field(FieldAnnotation),
    LocalVariable(LocalVariableAnnotation),
    SourceLine(SourceLineAnnotation),
}

/// A defect discovered by a detector.
///
/// Immutable once built; constructed with the builder-style `with_*`
/// methods and handed to the report pipeline. The first annotation of each
/// kind is the "primary" one - scope matching and display both key off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    /// Stable defect-pattern id (e.g. `UM_UNCALLED_METHOD`).
    pub pattern: String,
    /// Rank from 1 (most severe) to 20 (least severe).
    pub rank: u8,
    /// Human-readable description of this occurrence.
    pub message: String,
    /// Ordered annotations; first of each kind is primary.
    pub annotations: Vec<Annotation>,
    /// Set on defects the engine manufactures itself (useless-suppression
    /// reports); synthetic defects never interact with suppressions.
    #[serde(default)]
    pub synthetic: bool,
}

impl Defect {
    pub fn new(pattern: impl Into<String>, rank: u8) -> Self {
        let pattern = pattern.into();
        Self {
            message: pattern.clone(),
            pattern,
            rank,
            annotations: Vec::new(),
            synthetic: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_class(mut self, class: ClassAnnotation) -> Self {
        self.annotations.push(Annotation::Class(class));
        self
    }

    pub fn with_method(mut self, method: MethodAnnotation) -> Self {
        self.annotations.push(Annotation::Method(method));
        self
    }

    pub fn with_field(mut self, field: FieldAnnotation) -> Self {
        self.annotations.push(Annotation::Field(field));
        self
    }

    pub fn with_local_variable(mut self, var: LocalVariableAnnotation) -> Self {
        self.annotations.push(Annotation::LocalVariable(var));
        self
    }

    pub fn with_source_line(mut self, line: SourceLineAnnotation) -> Self {
        self.annotations.push(Annotation::SourceLine(line));
        self
    }

    pub fn as_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn primary_class(&self) -> Option<&ClassAnnotation> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Class(c) => Some(c),
            _ => None,
        })
    }

    pub fn primary_method(&self) -> Option<&MethodAnnotation> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Method(m) => Some(m),
            _ => None,
        })
    }

    pub fn primary_field(&self) -> Option<&FieldAnnotation> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Field(f) => Some(f),
            _ => None,
        })
    }

    pub fn primary_local_variable(&self) -> Option<&LocalVariableAnnotation> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::LocalVariable(v) => Some(v),
            _ => None,
        })
    }

    pub fn primary_source_line(&self) -> Option<&SourceLineAnnotation> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::SourceLine(s) => Some(s),
            _ => None,
        })
    }
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:2}] {}: {}", self.rank, self.pattern, self.message)
    }
}
