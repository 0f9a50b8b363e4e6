use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::AttainError;
use crate::model::{Assessment, ReferenceData, SubOutcome, TopOutcome};

/// Upper bound on a single edge weight. Keeps `w_assessment * w_sub_outcome`
/// and its sums well inside the finite `f64` range.
pub const MAX_EDGE_WEIGHT: f64 = 1e9;

/// One weighted edge as seen from its target side: `source` contributes to
/// the node the edge list is filed under.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEdge {
    pub source: String,
    pub weight: f64,
}

/// Immutable two-stage adjacency snapshot:
/// top outcome -> sub outcomes -> assessments.
///
/// Built once per computation batch by [`MappingGraph::load`]. Edge lists keep
/// the order of the input so traversal (and floating point accumulation) is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct MappingGraph {
    top_outcomes: Vec<TopOutcome>,
    top_index: HashMap<String, usize>,
    sub_outcomes: HashMap<String, SubOutcome>,
    assessments: HashMap<String, Assessment>,
    sub_outcomes_by_top: HashMap<String, Vec<WeightedEdge>>,
    assessments_by_sub: HashMap<String, Vec<WeightedEdge>>,
}

impl MappingGraph {
    pub fn load(data: &ReferenceData) -> Result<Self, AttainError> {
        let mut graph = Self::default();

        let mut courses = HashSet::new();
        for course in &data.courses {
            if !courses.insert(course.code.as_str()) {
                return Err(AttainError::integrity(format!(
                    "duplicate course {}",
                    course.code
                )));
            }
        }

        let mut top_outcomes = data.top_outcomes.clone();
        top_outcomes.sort_by(|a, b| a.code.cmp(&b.code));
        for (idx, po) in top_outcomes.iter().enumerate() {
            if graph.top_index.insert(po.code.clone(), idx).is_some() {
                return Err(AttainError::integrity(format!(
                    "duplicate top outcome {}",
                    po.code
                )));
            }
        }
        graph.top_outcomes = top_outcomes;

        let mut course_codes = HashSet::new();
        for so in &data.sub_outcomes {
            if !courses.contains(so.course.as_str()) {
                return Err(AttainError::integrity(format!(
                    "sub outcome {} references unknown course {}",
                    so.id, so.course
                )));
            }
            if !course_codes.insert((so.course.as_str(), so.code.as_str())) {
                return Err(AttainError::integrity(format!(
                    "sub outcome code {} is not unique within course {}",
                    so.code, so.course
                )));
            }
            if graph
                .sub_outcomes
                .insert(so.id.clone(), so.clone())
                .is_some()
            {
                return Err(AttainError::integrity(format!(
                    "duplicate sub outcome {}",
                    so.id
                )));
            }
        }

        for a in &data.assessments {
            if !courses.contains(a.course.as_str()) {
                return Err(AttainError::integrity(format!(
                    "assessment {} references unknown course {}",
                    a.id, a.course
                )));
            }
            if !a.total_points.is_finite() {
                return Err(AttainError::integrity(format!(
                    "assessment {} has invalid capacity {}",
                    a.id, a.total_points
                )));
            }
            if graph.assessments.insert(a.id.clone(), a.clone()).is_some() {
                return Err(AttainError::integrity(format!(
                    "duplicate assessment {}",
                    a.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for edge in &data.sub_outcome_edges {
            check_weight(edge.weight, &edge.sub_outcome, &edge.top_outcome)?;
            if !graph.sub_outcomes.contains_key(&edge.sub_outcome) {
                return Err(AttainError::integrity(format!(
                    "edge {} -> {} references unknown sub outcome",
                    edge.sub_outcome, edge.top_outcome
                )));
            }
            if !graph.top_index.contains_key(&edge.top_outcome) {
                return Err(AttainError::integrity(format!(
                    "edge {} -> {} references unknown top outcome",
                    edge.sub_outcome, edge.top_outcome
                )));
            }
            if !seen.insert((edge.sub_outcome.as_str(), edge.top_outcome.as_str())) {
                return Err(AttainError::integrity(format!(
                    "more than one edge {} -> {}",
                    edge.sub_outcome, edge.top_outcome
                )));
            }
            graph
                .sub_outcomes_by_top
                .entry(edge.top_outcome.clone())
                .or_default()
                .push(WeightedEdge {
                    source: edge.sub_outcome.clone(),
                    weight: edge.weight,
                });
        }

        let mut seen = HashSet::new();
        for edge in &data.assessment_edges {
            check_weight(edge.weight, &edge.assessment, &edge.sub_outcome)?;
            if !graph.assessments.contains_key(&edge.assessment) {
                return Err(AttainError::integrity(format!(
                    "edge {} -> {} references unknown assessment",
                    edge.assessment, edge.sub_outcome
                )));
            }
            if !graph.sub_outcomes.contains_key(&edge.sub_outcome) {
                return Err(AttainError::integrity(format!(
                    "edge {} -> {} references unknown sub outcome",
                    edge.assessment, edge.sub_outcome
                )));
            }
            if !seen.insert((edge.assessment.as_str(), edge.sub_outcome.as_str())) {
                return Err(AttainError::integrity(format!(
                    "more than one edge {} -> {}",
                    edge.assessment, edge.sub_outcome
                )));
            }
            graph
                .assessments_by_sub
                .entry(edge.sub_outcome.clone())
                .or_default()
                .push(WeightedEdge {
                    source: edge.assessment.clone(),
                    weight: edge.weight,
                });
        }

        debug!(
            top_outcomes = graph.top_outcomes.len(),
            sub_outcomes = graph.sub_outcomes.len(),
            assessments = graph.assessments.len(),
            sub_outcome_edges = data.sub_outcome_edges.len(),
            assessment_edges = data.assessment_edges.len(),
            "mapping graph loaded"
        );

        Ok(graph)
    }

    /// Top outcomes ordered by code.
    pub fn top_outcomes(&self) -> &[TopOutcome] {
        &self.top_outcomes
    }

    pub fn top_outcome(&self, code: &str) -> Option<&TopOutcome> {
        self.top_index
            .get(code)
            .and_then(|&idx| self.top_outcomes.get(idx))
    }

    pub fn sub_outcome(&self, id: &str) -> Option<&SubOutcome> {
        self.sub_outcomes.get(id)
    }

    pub fn assessment(&self, id: &str) -> Option<&Assessment> {
        self.assessments.get(id)
    }

    pub fn assessments(&self) -> impl Iterator<Item = &Assessment> + '_ {
        self.assessments.values()
    }

    /// Sub outcomes contributing to `top_outcome`, with their weights.
    pub fn sub_outcome_edges(&self, top_outcome: &str) -> &[WeightedEdge] {
        self.sub_outcomes_by_top
            .get(top_outcome)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Assessments contributing to `sub_outcome`, with their weights.
    pub fn assessment_edges(&self, sub_outcome: &str) -> &[WeightedEdge] {
        self.assessments_by_sub
            .get(sub_outcome)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of (assessment, sub outcome) paths reaching `top_outcome`.
    pub fn path_count(&self, top_outcome: &str) -> usize {
        self.sub_outcome_edges(top_outcome)
            .iter()
            .map(|so| self.assessment_edges(&so.source).len())
            .sum()
    }
}

fn check_weight(weight: f64, from: &str, to: &str) -> Result<(), AttainError> {
    if (0.0..=MAX_EDGE_WEIGHT).contains(&weight) {
        Ok(())
    } else {
        Err(AttainError::integrity(format!(
            "edge {from} -> {to} has invalid weight {weight}"
        )))
    }
}
