use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calculator::{round2, walk, Attainment};
use crate::error::AttainError;
use crate::graph::MappingGraph;
use crate::resolver::ScoreResolver;

/// Average attainment of a cohort for one top outcome.
///
/// Only subjects with evidence are counted. With `contributing_count == 0`
/// the average is reported as 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CohortAttainment {
    pub average_score: f64,
    pub contributing_count: usize,
    pub cohort_size: usize,
}

impl CohortAttainment {
    pub fn has_data(&self) -> bool {
        self.contributing_count > 0
    }

    pub fn rounded_average(&self) -> f64 {
        round2(self.average_score)
    }
}

/// Reduces per-subject attainments in the order given.
pub fn reduce(attainments: &[Attainment]) -> CohortAttainment {
    let mut total = 0.0_f64;
    let mut contributing_count = 0_usize;
    for a in attainments.iter().filter(|a| a.has_data) {
        total += a.score;
        contributing_count += 1;
    }

    let average_score = if contributing_count > 0 {
        total / contributing_count as f64
    } else {
        0.0
    };

    CohortAttainment {
        average_score,
        contributing_count,
        cohort_size: attainments.len(),
    }
}

/// First occurrence of every subject id, in input order.
pub fn unique_subjects<S: AsRef<str>>(subjects: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    subjects
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| seen.insert(*s))
        .collect()
}

/// Cohort average for `top_outcome` over `subjects`. A repeated id counts
/// once.
///
/// With `parallel` set, subjects are evaluated on the rayon pool. Results are
/// collected in subject order and reduced sequentially, so the outcome is
/// bit-identical to a serial run.
pub fn cohort_attainment<R, S>(
    graph: &MappingGraph,
    resolver: &R,
    subjects: &[S],
    top_outcome: &str,
    parallel: bool,
) -> Result<CohortAttainment, AttainError>
where
    R: ScoreResolver + ?Sized,
    S: AsRef<str> + Sync,
{
    if graph.top_outcome(top_outcome).is_none() {
        return Err(AttainError::UnknownOutcome(top_outcome.to_string()));
    }

    let subjects = unique_subjects(subjects);
    let attainments: Vec<Attainment> = if parallel {
        subjects
            .par_iter()
            .map(|s| walk(graph, resolver, s, top_outcome))
            .collect()
    } else {
        subjects
            .iter()
            .map(|s| walk(graph, resolver, s, top_outcome))
            .collect()
    };

    Ok(reduce(&attainments))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_data(score: f64) -> Attainment {
        Attainment {
            score,
            has_data: true,
            contributing_paths: 1,
            weight_base: 1.0,
        }
    }

    #[test]
    fn excludes_subjects_without_evidence() {
        let out = reduce(&[with_data(68.0), with_data(90.0), Attainment::NO_EVIDENCE]);
        assert!((out.average_score - 79.0).abs() < 1e-9);
        assert_eq!(out.contributing_count, 2);
        assert_eq!(out.cohort_size, 3);
    }

    #[test]
    fn computed_zero_counts_but_no_evidence_does_not() {
        let out = reduce(&[with_data(0.0), with_data(50.0), Attainment::NO_EVIDENCE]);
        assert!((out.average_score - 25.0).abs() < 1e-9);
        assert_eq!(out.contributing_count, 2);
    }

    #[test]
    fn empty_cohort_reports_zero_with_zero_count() {
        let out = reduce(&[Attainment::NO_EVIDENCE, Attainment::NO_EVIDENCE]);
        assert_eq!(out.average_score, 0.0);
        assert_eq!(out.contributing_count, 0);
        assert!(!out.has_data());

        let out = reduce(&[]);
        assert_eq!(out.cohort_size, 0);
    }

    #[test]
    fn unique_subjects_keeps_first_occurrence_order() {
        let ids = ["s2", "s1", "s2", "s3", "s1"];
        assert_eq!(unique_subjects(&ids), vec!["s2", "s1", "s3"]);
    }
}
