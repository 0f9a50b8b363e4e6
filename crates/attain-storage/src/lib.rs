use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use attain_core::{AttainError, Enrollment, Grade, ReferenceData, Scope, Subject};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Everything the engine reads for one computation batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(flatten)]
    pub reference: ReferenceData,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub grades: Vec<Grade>,
}

/// Bulk reads the engine needs from the record store. Implementations must
/// hand out consistent data for the duration of one batch.
pub trait SnapshotSource: Send + Sync {
    fn reference_data(&self, scope: &Scope) -> Result<ReferenceData, StorageError>;
    fn subjects(&self, scope: &Scope) -> Vec<Subject>;
    fn grades(&self, subjects: &[String]) -> Vec<Grade>;
    fn stats(&self) -> serde_json::Value;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Integrity(#[from] AttainError),
}

/// Snapshot read from a JSON file. Never written back.
pub struct JsonSnapshotStore {
    path: Option<PathBuf>,
    snapshot: Snapshot,
}

impl JsonSnapshotStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(StorageError::InvalidInput(format!(
                "snapshot file not found: {}",
                path.display()
            )));
        }
        let snapshot = read_snapshot(&path)?;
        Ok(Self {
            path: Some(path),
            snapshot,
        })
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            path: None,
            snapshot,
        }
    }

    pub fn parse(json: &str) -> Result<Self, StorageError> {
        Ok(Self::from_snapshot(serde_json::from_str(json)?))
    }

    /// Re-reads the backing file, replacing the whole snapshot at once.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Err(StorageError::InvalidInput(
                "in-memory snapshot has no backing file".to_string(),
            ));
        };
        self.snapshot = read_snapshot(path)?;
        Ok(())
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl SnapshotSource for JsonSnapshotStore {
    fn reference_data(&self, scope: &Scope) -> Result<ReferenceData, StorageError> {
        Ok(self.snapshot.reference.scoped(scope)?)
    }

    fn subjects(&self, scope: &Scope) -> Vec<Subject> {
        scoped_subjects(&self.snapshot, scope)
    }

    fn grades(&self, subjects: &[String]) -> Vec<Grade> {
        let wanted: HashSet<&str> = subjects.iter().map(String::as_str).collect();
        self.snapshot
            .grades
            .iter()
            .filter(|g| wanted.contains(g.subject.as_str()))
            .cloned()
            .collect()
    }

    fn stats(&self) -> serde_json::Value {
        let r = &self.snapshot.reference;
        serde_json::json!({
            "path": self.path,
            "courses": r.courses.len(),
            "top_outcomes": r.top_outcomes.len(),
            "sub_outcomes": r.sub_outcomes.len(),
            "assessments": r.assessments.len(),
            "sub_outcome_edges": r.sub_outcome_edges.len(),
            "assessment_edges": r.assessment_edges.len(),
            "subjects": self.snapshot.subjects.len(),
            "grades": self.snapshot.grades.len(),
        })
    }
}

/// Cohort for `scope`: students enrolled in an admitted course when a course
/// is named, students of the department when only a department is named,
/// everyone otherwise. Snapshot order is kept and duplicates dropped.
pub fn scoped_subjects(snapshot: &Snapshot, scope: &Scope) -> Vec<Subject> {
    let mut seen = HashSet::new();
    let unique = snapshot
        .subjects
        .iter()
        .filter(|s| seen.insert(s.id.as_str()));

    if scope.course.is_some() {
        let admitted: HashSet<&str> = snapshot
            .reference
            .courses
            .iter()
            .filter(|c| scope.admits_course(c))
            .map(|c| c.code.as_str())
            .collect();
        let enrolled: HashSet<&str> = snapshot
            .enrollments
            .iter()
            .filter(|e| admitted.contains(e.course.as_str()))
            .map(|e| e.subject.as_str())
            .collect();
        return unique
            .filter(|s| enrolled.contains(s.id.as_str()))
            .cloned()
            .collect();
    }

    match scope.department.as_deref() {
        Some(dept) => unique.filter(|s| s.department == dept).cloned().collect(),
        None => unique.cloned().collect(),
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, StorageError> {
    let bytes = fs::read(path)?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    debug!(
        path = %path.display(),
        subjects = snapshot.subjects.len(),
        grades = snapshot.grades.len(),
        "snapshot read"
    );
    Ok(snapshot)
}
