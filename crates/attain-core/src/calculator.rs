use serde::{Deserialize, Serialize};

use crate::error::AttainError;
use crate::graph::MappingGraph;
use crate::resolver::ScoreResolver;

/// Weighted, normalised attainment of one subject for one top outcome.
///
/// `score` keeps full precision. A score of 0 with `has_data == false` means
/// there was no evidence at all, which is not the same as a computed 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Attainment {
    pub score: f64,
    pub has_data: bool,
    /// Paths (assessment, sub outcome) that had a grade.
    pub contributing_paths: usize,
    /// Sum of `w_assessment * w_sub_outcome` over contributing paths.
    pub weight_base: f64,
}

impl Attainment {
    pub const NO_EVIDENCE: Self = Self {
        score: 0.0,
        has_data: false,
        contributing_paths: 0,
        weight_base: 0.0,
    };

    pub fn rounded_score(&self) -> f64 {
        round2(self.score)
    }
}

/// Presentation rounding to two decimal digits.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes the attainment of `subject` for `top_outcome`.
///
/// Paths without a recorded grade are skipped entirely: they add neither to
/// the numerator nor to the weight base.
pub fn attainment<R>(
    graph: &MappingGraph,
    resolver: &R,
    subject: &str,
    top_outcome: &str,
) -> Result<Attainment, AttainError>
where
    R: ScoreResolver + ?Sized,
{
    if graph.top_outcome(top_outcome).is_none() {
        return Err(AttainError::UnknownOutcome(top_outcome.to_string()));
    }
    Ok(walk(graph, resolver, subject, top_outcome))
}

/// Traversal for an outcome already known to exist in `graph`.
pub(crate) fn walk<R>(
    graph: &MappingGraph,
    resolver: &R,
    subject: &str,
    top_outcome: &str,
) -> Attainment
where
    R: ScoreResolver + ?Sized,
{
    let mut numerator = 0.0_f64;
    let mut denominator = 0.0_f64;
    let mut contributing_paths = 0_usize;

    for so in graph.sub_outcome_edges(top_outcome) {
        for a in graph.assessment_edges(&so.source) {
            let Some(score) = resolver.resolve(subject, &a.source) else {
                continue;
            };
            let weight = a.weight * so.weight;
            numerator += score * weight;
            denominator += weight;
            contributing_paths += 1;
        }
    }

    if denominator > 0.0 {
        Attainment {
            score: numerator / denominator,
            has_data: true,
            contributing_paths,
            weight_base: denominator,
        }
    } else {
        Attainment {
            contributing_paths,
            ..Attainment::NO_EVIDENCE
        }
    }
}
