use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::AttainError;
use crate::graph::MappingGraph;
use crate::model::Grade;

/// Looks up a subject's percentage score for one assessment.
///
/// `None` means no grade is recorded. That is ordinary control flow, never an
/// error.
pub trait ScoreResolver: Send + Sync {
    fn resolve(&self, subject: &str, assessment: &str) -> Option<f64>;
}

/// Grade snapshot indexed by subject, then assessment. Scores are derived once
/// at build time from the assessment capacity in the graph.
#[derive(Debug, Clone, Default)]
pub struct GradeBook {
    scores: HashMap<String, HashMap<String, f64>>,
}

impl GradeBook {
    pub fn build(grades: &[Grade], graph: &MappingGraph) -> Result<Self, AttainError> {
        for a in graph.assessments() {
            if a.total_points <= 0.0 {
                warn!(
                    assessment = %a.id,
                    total_points = a.total_points,
                    "assessment has no positive capacity; its scores count as 0"
                );
            }
        }

        let mut scores: HashMap<String, HashMap<String, f64>> = HashMap::new();
        let mut ignored = 0_usize;
        for grade in grades {
            let Some(assessment) = graph.assessment(&grade.assessment) else {
                ignored += 1;
                continue;
            };
            let score = assessment.percentage(grade.points);
            if !grade.points.is_finite() || !score.is_finite() {
                return Err(AttainError::integrity(format!(
                    "grade for subject {} on assessment {} has invalid points {}",
                    grade.subject, grade.assessment, grade.points
                )));
            }
            let by_assessment = scores.entry(grade.subject.clone()).or_default();
            if by_assessment.insert(grade.assessment.clone(), score).is_some() {
                return Err(AttainError::integrity(format!(
                    "more than one grade for subject {} on assessment {}",
                    grade.subject, grade.assessment
                )));
            }
        }

        debug!(
            grades = grades.len(),
            ignored,
            subjects = scores.len(),
            "grade book built"
        );
        Ok(Self { scores })
    }

    pub fn subject_count(&self) -> usize {
        self.scores.len()
    }
}

impl ScoreResolver for GradeBook {
    fn resolve(&self, subject: &str, assessment: &str) -> Option<f64> {
        self.scores.get(subject)?.get(assessment).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assessment, AssessmentKind, Course, ReferenceData};

    fn graph() -> MappingGraph {
        let data = ReferenceData {
            courses: vec![Course {
                code: "CSE311".to_string(),
                name: "Algorithms".to_string(),
                semester: String::new(),
                department: "CSE".to_string(),
            }],
            assessments: vec![
                Assessment {
                    id: "mid".to_string(),
                    course: "CSE311".to_string(),
                    name: "Midterm".to_string(),
                    kind: AssessmentKind::Midterm,
                    total_points: 80.0,
                },
                Assessment {
                    id: "broken".to_string(),
                    course: "CSE311".to_string(),
                    name: "Broken quiz".to_string(),
                    kind: AssessmentKind::Quiz,
                    total_points: 0.0,
                },
            ],
            ..ReferenceData::default()
        };
        MappingGraph::load(&data).expect("load")
    }

    fn grade(assessment: &str, subject: &str, points: f64) -> Grade {
        Grade {
            assessment: assessment.to_string(),
            subject: subject.to_string(),
            points,
        }
    }

    #[test]
    fn resolves_percentage_and_absent() {
        let book = GradeBook::build(&[grade("mid", "s1", 60.0)], &graph()).expect("build");
        assert_eq!(book.resolve("s1", "mid"), Some(75.0));
        assert_eq!(book.resolve("s2", "mid"), None);
        assert_eq!(book.resolve("s1", "final"), None);
    }

    #[test]
    fn keeps_scores_above_one_hundred() {
        let book = GradeBook::build(&[grade("mid", "s1", 100.0)], &graph()).expect("build");
        assert_eq!(book.resolve("s1", "mid"), Some(125.0));
    }

    #[test]
    fn degenerate_capacity_scores_zero() {
        let book = GradeBook::build(&[grade("broken", "s1", 10.0)], &graph()).expect("build");
        assert_eq!(book.resolve("s1", "broken"), Some(0.0));
    }

    #[test]
    fn ignores_grades_outside_the_graph() {
        let book = GradeBook::build(&[grade("other-course", "s1", 10.0)], &graph())
            .expect("build");
        assert_eq!(book.resolve("s1", "other-course"), None);
        assert_eq!(book.subject_count(), 0);
    }

    #[test]
    fn rejects_duplicate_grade() {
        let err = GradeBook::build(
            &[grade("mid", "s1", 10.0), grade("mid", "s1", 20.0)],
            &graph(),
        )
        .unwrap_err();
        assert!(matches!(err, AttainError::DataIntegrity(_)));
    }

    #[test]
    fn rejects_non_finite_points() {
        for points in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = GradeBook::build(&[grade("mid", "s1", points)], &graph()).unwrap_err();
            assert!(matches!(err, AttainError::DataIntegrity(_)));
        }
    }

    #[test]
    fn rejects_points_that_overflow_the_percentage() {
        let err = GradeBook::build(&[grade("mid", "s1", f64::MAX)], &graph()).unwrap_err();
        assert!(err.to_string().contains("invalid points"));
    }

    #[test]
    fn non_finite_points_on_degenerate_capacity_are_still_rejected() {
        assert!(GradeBook::build(&[grade("broken", "s1", f64::NAN)], &graph()).is_err());
    }
}
