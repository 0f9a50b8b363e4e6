use std::collections::HashSet;

use attain_core::{AttainmentEngine, Scope};
use attain_storage::SnapshotSource;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ReportConfig;
use crate::error::ReportError;

/// How many of the lowest-scoring outcomes the narration context flags.
const WEAKEST_OUTCOMES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeScore {
    pub code: String,
    pub description: String,
    pub score: f64,
    pub has_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentReport {
    pub subject: String,
    pub outcomes: Vec<OutcomeScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeStat {
    pub code: String,
    pub description: String,
    pub average_score: f64,
    pub student_count: usize,
    pub cohort_size: usize,
}

/// Structured cohort summary handed to a downstream narration assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeContext {
    pub scope: Scope,
    pub cohort_size: usize,
    pub outcomes: Vec<OutcomeStat>,
    /// Codes of the lowest averages among outcomes with evidence, lowest first.
    pub weakest: Vec<String>,
}

pub struct ReportService {
    engine: AttainmentEngine,
    scope: Scope,
    known_subjects: HashSet<String>,
}

impl ReportService {
    /// Reads one consistent batch from `source` and builds the engine over it.
    pub fn load(source: &dyn SnapshotSource, config: &ReportConfig) -> Result<Self, ReportError> {
        let reference = source.reference_data(&config.scope)?;
        let subjects: Vec<String> = source
            .subjects(&config.scope)
            .into_iter()
            .map(|s| s.id)
            .collect();
        let grades = source.grades(&subjects);

        info!(
            subjects = subjects.len(),
            grades = grades.len(),
            top_outcomes = reference.top_outcomes.len(),
            "loading attainment snapshot"
        );

        let known_subjects = subjects.iter().cloned().collect();
        let engine =
            AttainmentEngine::from_snapshot(&reference, &grades, subjects, config.engine.clone())?;
        Ok(Self {
            engine,
            scope: config.scope.clone(),
            known_subjects,
        })
    }

    pub fn engine(&self) -> &AttainmentEngine {
        &self.engine
    }

    pub fn student_report(&self, subject: &str) -> Result<StudentReport, ReportError> {
        if !self.known_subjects.contains(subject) {
            return Err(ReportError::UnknownSubject(subject.to_string()));
        }
        let outcomes = self
            .engine
            .subject_report(subject)
            .into_iter()
            .map(|o| OutcomeScore {
                score: o.attainment.rounded_score(),
                has_data: o.attainment.has_data,
                code: o.code,
                description: o.description,
            })
            .collect();
        Ok(StudentReport {
            subject: subject.to_string(),
            outcomes,
        })
    }

    pub fn outcome_stats(&self) -> Result<Vec<OutcomeStat>, ReportError> {
        Ok(self
            .engine
            .cohort_report()?
            .into_iter()
            .map(|o| OutcomeStat {
                average_score: o.cohort.rounded_average(),
                student_count: o.cohort.contributing_count,
                cohort_size: o.cohort.cohort_size,
                code: o.code,
                description: o.description,
            })
            .collect())
    }

    pub fn outcome_context(&self) -> Result<OutcomeContext, ReportError> {
        let outcomes = self.outcome_stats()?;

        let mut ranked: Vec<&OutcomeStat> =
            outcomes.iter().filter(|o| o.student_count > 0).collect();
        ranked.sort_by(|a, b| {
            a.average_score
                .total_cmp(&b.average_score)
                .then_with(|| a.code.cmp(&b.code))
        });
        let weakest = ranked
            .into_iter()
            .take(WEAKEST_OUTCOMES)
            .map(|o| o.code.clone())
            .collect();

        Ok(OutcomeContext {
            scope: self.scope.clone(),
            cohort_size: self.engine.subjects().len(),
            outcomes,
            weakest,
        })
    }
}
