use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculator::{attainment, walk, Attainment};
use crate::cohort::{cohort_attainment, reduce, unique_subjects, CohortAttainment};
use crate::error::AttainError;
use crate::graph::MappingGraph;
use crate::model::{Grade, ReferenceData};
use crate::resolver::{GradeBook, ScoreResolver};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Evaluate cohort subjects on the rayon pool.
    pub parallel: bool,
    /// Upper bound on `subjects x paths` per cohort request. `None` is unbounded.
    pub max_path_evaluations: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_path_evaluations: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeAttainment {
    pub code: String,
    pub description: String,
    pub attainment: Attainment,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeCohortAttainment {
    pub code: String,
    pub description: String,
    pub cohort: CohortAttainment,
}

/// Single entry point for single-subject and cohort scoring over one
/// immutable snapshot.
pub struct AttainmentEngine {
    graph: Arc<MappingGraph>,
    resolver: Arc<dyn ScoreResolver>,
    subjects: Vec<String>,
    config: EngineConfig,
}

impl AttainmentEngine {
    /// Repeated subject ids are dropped; the first occurrence keeps its place.
    pub fn new(
        graph: Arc<MappingGraph>,
        resolver: Arc<dyn ScoreResolver>,
        subjects: Vec<String>,
        config: EngineConfig,
    ) -> Self {
        let subjects = unique_subjects(&subjects)
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            graph,
            resolver,
            subjects,
            config,
        }
    }

    /// Loads the graph and grade book from bulk reads in one pass.
    pub fn from_snapshot(
        reference: &ReferenceData,
        grades: &[Grade],
        subjects: Vec<String>,
        config: EngineConfig,
    ) -> Result<Self, AttainError> {
        let graph = MappingGraph::load(reference)?;
        let book = GradeBook::build(grades, &graph)?;
        Ok(Self::new(Arc::new(graph), Arc::new(book), subjects, config))
    }

    pub fn graph(&self) -> &MappingGraph {
        &self.graph
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn attainment(&self, subject: &str, top_outcome: &str) -> Result<Attainment, AttainError> {
        attainment(&*self.graph, &*self.resolver, subject, top_outcome)
    }

    /// Every top outcome for one subject, in code order.
    pub fn subject_report(&self, subject: &str) -> Vec<OutcomeAttainment> {
        self.graph
            .top_outcomes()
            .iter()
            .map(|po| OutcomeAttainment {
                code: po.code.clone(),
                description: po.description.clone(),
                attainment: walk(&*self.graph, &*self.resolver, subject, &po.code),
            })
            .collect()
    }

    pub fn cohort_attainment(&self, top_outcome: &str) -> Result<CohortAttainment, AttainError> {
        self.check_budget(self.graph.path_count(top_outcome))?;
        let out = cohort_attainment(
            &*self.graph,
            &*self.resolver,
            &self.subjects,
            top_outcome,
            self.config.parallel,
        )?;
        info!(
            top_outcome,
            cohort_size = out.cohort_size,
            contributing = out.contributing_count,
            "cohort attainment computed"
        );
        Ok(out)
    }

    /// Cohort attainment for every top outcome, in code order.
    pub fn cohort_report(&self) -> Result<Vec<OutcomeCohortAttainment>, AttainError> {
        let total_paths = self
            .graph
            .top_outcomes()
            .iter()
            .map(|po| self.graph.path_count(&po.code))
            .sum();
        self.check_budget(total_paths)?;

        let per_subject: Vec<Vec<OutcomeAttainment>> = if self.config.parallel {
            use rayon::prelude::*;
            self.subjects
                .par_iter()
                .map(|s| self.subject_report(s))
                .collect()
        } else {
            self.subjects.iter().map(|s| self.subject_report(s)).collect()
        };

        let report: Vec<OutcomeCohortAttainment> = self
            .graph
            .top_outcomes()
            .iter()
            .enumerate()
            .map(|(idx, po)| {
                let column: Vec<Attainment> = per_subject
                    .iter()
                    .filter_map(|row| row.get(idx).map(|o| o.attainment))
                    .collect();
                OutcomeCohortAttainment {
                    code: po.code.clone(),
                    description: po.description.clone(),
                    cohort: reduce(&column),
                }
            })
            .collect();

        info!(
            outcomes = report.len(),
            cohort_size = self.subjects.len(),
            "cohort report computed"
        );
        Ok(report)
    }

    fn check_budget(&self, paths: usize) -> Result<(), AttainError> {
        let Some(limit) = self.config.max_path_evaluations else {
            return Ok(());
        };
        let requested = paths.saturating_mul(self.subjects.len());
        if requested > limit {
            return Err(AttainError::BatchTooLarge { requested, limit });
        }
        Ok(())
    }
}
