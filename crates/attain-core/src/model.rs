use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::AttainError;
use crate::graph::MappingGraph;

/// Program-level competency, e.g. `PO1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopOutcome {
    pub code: String,
    pub description: String,
}

/// Course-level learning objective feeding one or more top outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubOutcome {
    pub id: String,
    pub course: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    /// Weight inside the course. Not used by attainment scoring.
    #[serde(default = "default_sub_outcome_weight")]
    pub weight: f64,
}

fn default_sub_outcome_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    #[default]
    Quiz,
    Midterm,
    Final,
    Project,
    Homework,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub id: String,
    pub course: String,
    pub name: String,
    #[serde(default)]
    pub kind: AssessmentKind,
    pub total_points: f64,
}

impl Assessment {
    /// Percentage score for `points`. Not clamped; a capacity of zero or less
    /// yields 0.
    pub fn percentage(&self, points: f64) -> f64 {
        if self.total_points > 0.0 {
            points / self.total_points * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub semester: String,
    pub department: String,
}

/// Sub outcome -> top outcome contribution on an unbounded relative scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubOutcomeEdge {
    pub sub_outcome: String,
    pub top_outcome: String,
    pub weight: f64,
}

/// Assessment -> sub outcome contribution, nominally a 0-100 percentage.
/// Weights of one assessment are not required to sum to 100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssessmentEdge {
    pub assessment: String,
    pub sub_outcome: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    pub id: String,
    #[serde(default)]
    pub department: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrollment {
    pub subject: String,
    pub course: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grade {
    pub assessment: String,
    pub subject: String,
    pub points: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scope {
    pub department: Option<String>,
    pub course: Option<String>,
}

impl Scope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.department.is_none() && self.course.is_none()
    }

    pub fn admits_course(&self, course: &Course) -> bool {
        let department_ok = self
            .department
            .as_deref()
            .is_none_or(|d| d == course.department);
        let course_ok = self.course.as_deref().is_none_or(|c| c == course.code);
        department_ok && course_ok
    }
}

/// Everything the mapping graph loader reads in one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReferenceData {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub top_outcomes: Vec<TopOutcome>,
    #[serde(default)]
    pub sub_outcomes: Vec<SubOutcome>,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
    #[serde(default)]
    pub sub_outcome_edges: Vec<SubOutcomeEdge>,
    #[serde(default)]
    pub assessment_edges: Vec<AssessmentEdge>,
}

impl ReferenceData {
    /// Restricts the data to courses admitted by `scope`. Top outcomes are
    /// program wide and always kept; edges survive only if both endpoints do.
    ///
    /// The full data is checked first, so a dangling reference outside the
    /// scope still fails the batch instead of being filtered away.
    pub fn scoped(&self, scope: &Scope) -> Result<Self, AttainError> {
        if scope.is_unrestricted() {
            return Ok(self.clone());
        }
        MappingGraph::load(self)?;

        let courses: Vec<Course> = self
            .courses
            .iter()
            .filter(|c| scope.admits_course(c))
            .cloned()
            .collect();
        let kept_courses: HashSet<&str> = courses.iter().map(|c| c.code.as_str()).collect();

        let sub_outcomes: Vec<SubOutcome> = self
            .sub_outcomes
            .iter()
            .filter(|so| kept_courses.contains(so.course.as_str()))
            .cloned()
            .collect();
        let assessments: Vec<Assessment> = self
            .assessments
            .iter()
            .filter(|a| kept_courses.contains(a.course.as_str()))
            .cloned()
            .collect();

        let kept_subs: HashSet<&str> = sub_outcomes.iter().map(|so| so.id.as_str()).collect();
        let kept_assessments: HashSet<&str> = assessments.iter().map(|a| a.id.as_str()).collect();

        let sub_outcome_edges = self
            .sub_outcome_edges
            .iter()
            .filter(|e| kept_subs.contains(e.sub_outcome.as_str()))
            .cloned()
            .collect();
        let assessment_edges = self
            .assessment_edges
            .iter()
            .filter(|e| {
                kept_assessments.contains(e.assessment.as_str())
                    && kept_subs.contains(e.sub_outcome.as_str())
            })
            .cloned()
            .collect();

        Ok(Self {
            courses,
            top_outcomes: self.top_outcomes.clone(),
            sub_outcomes,
            assessments,
            sub_outcome_edges,
            assessment_edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str, department: &str) -> Course {
        Course {
            code: code.to_string(),
            name: String::new(),
            semester: "2024-Fall".to_string(),
            department: department.to_string(),
        }
    }

    fn sub_outcome(id: &str, course: &str) -> SubOutcome {
        SubOutcome {
            id: id.to_string(),
            course: course.to_string(),
            code: "LO1".to_string(),
            description: String::new(),
            weight: 1.0,
        }
    }

    fn assessment(id: &str, course: &str, total_points: f64) -> Assessment {
        Assessment {
            id: id.to_string(),
            course: course.to_string(),
            name: id.to_string(),
            kind: AssessmentKind::Midterm,
            total_points,
        }
    }

    #[test]
    fn percentage_is_not_clamped_and_degenerate_capacity_is_zero() {
        assert_eq!(assessment("a", "c", 50.0).percentage(60.0), 120.0);
        assert_eq!(assessment("a", "c", 0.0).percentage(60.0), 0.0);
        assert_eq!(assessment("a", "c", -5.0).percentage(60.0), 0.0);
    }

    #[test]
    fn scoping_by_course_drops_foreign_entities_and_edges() {
        let data = ReferenceData {
            courses: vec![course("CSE311", "CSE"), course("CSE321", "CSE")],
            top_outcomes: vec![TopOutcome {
                code: "PO1".to_string(),
                description: "apply knowledge".to_string(),
            }],
            sub_outcomes: vec![sub_outcome("lo-a", "CSE311"), sub_outcome("lo-b", "CSE321")],
            assessments: vec![
                assessment("mid-a", "CSE311", 100.0),
                assessment("mid-b", "CSE321", 100.0),
            ],
            sub_outcome_edges: vec![
                SubOutcomeEdge {
                    sub_outcome: "lo-a".to_string(),
                    top_outcome: "PO1".to_string(),
                    weight: 3.0,
                },
                SubOutcomeEdge {
                    sub_outcome: "lo-b".to_string(),
                    top_outcome: "PO1".to_string(),
                    weight: 4.0,
                },
            ],
            assessment_edges: vec![
                AssessmentEdge {
                    assessment: "mid-a".to_string(),
                    sub_outcome: "lo-a".to_string(),
                    weight: 60.0,
                },
                AssessmentEdge {
                    assessment: "mid-b".to_string(),
                    sub_outcome: "lo-b".to_string(),
                    weight: 40.0,
                },
            ],
        };

        let scoped = data
            .scoped(&Scope {
                department: None,
                course: Some("CSE311".to_string()),
            })
            .expect("scoped");

        assert_eq!(scoped.courses.len(), 1);
        assert_eq!(scoped.top_outcomes.len(), 1);
        assert_eq!(scoped.sub_outcomes.len(), 1);
        assert_eq!(scoped.assessments[0].id, "mid-a");
        assert_eq!(scoped.sub_outcome_edges.len(), 1);
        assert_eq!(scoped.assessment_edges[0].assessment, "mid-a");
    }

    #[test]
    fn department_scope_with_no_match_keeps_only_top_outcomes() {
        let data = ReferenceData {
            courses: vec![course("CSE311", "CSE")],
            top_outcomes: vec![TopOutcome {
                code: "PO1".to_string(),
                description: String::new(),
            }],
            sub_outcomes: vec![sub_outcome("lo-a", "CSE311")],
            ..ReferenceData::default()
        };
        let scoped = data
            .scoped(&Scope {
                department: Some("EEE".to_string()),
                course: None,
            })
            .expect("scoped");
        assert!(scoped.courses.is_empty());
        assert!(scoped.sub_outcomes.is_empty());
        assert_eq!(scoped.top_outcomes.len(), 1);
    }

    #[test]
    fn scoping_still_rejects_dangling_references_outside_the_scope() {
        let mut data = ReferenceData {
            courses: vec![course("CSE311", "CSE"), course("CSE321", "CSE")],
            top_outcomes: vec![TopOutcome {
                code: "PO1".to_string(),
                description: String::new(),
            }],
            sub_outcomes: vec![sub_outcome("lo-a", "CSE311"), sub_outcome("lo-b", "CSE321")],
            assessments: vec![assessment("mid-b", "CSE321", 100.0)],
            assessment_edges: vec![AssessmentEdge {
                assessment: "mid-b".to_string(),
                sub_outcome: "lo-missing".to_string(),
                weight: 100.0,
            }],
            ..ReferenceData::default()
        };
        let cse311 = Scope {
            department: None,
            course: Some("CSE311".to_string()),
        };
        assert!(matches!(
            data.scoped(&cse311),
            Err(AttainError::DataIntegrity(_))
        ));

        data.assessment_edges.clear();
        data.assessments.push(assessment("quiz-x", "CSE999", 10.0));
        assert!(matches!(
            data.scoped(&cse311),
            Err(AttainError::DataIntegrity(_))
        ));
    }
}
