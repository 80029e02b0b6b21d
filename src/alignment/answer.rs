//! Graded judgments about candidate matches

use serde::Serialize;
use std::fmt;

/// Strength of evidence for or against a match, worst first so that
/// `Grade::HeckYes > Grade::No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    HeckNo,
    No,
    WeakNo,
    NoInfo,
    WeakYes,
    Yes,
    HeckYes,
}

impl Grade {
    /// -3 for `HeckNo` up to 3 for `HeckYes`
    pub fn value(self) -> i8 {
        self as i8 - Grade::NoInfo as i8
    }

    pub fn is_positive(self) -> bool {
        self > Grade::NoInfo
    }

    /// `No` or worse permanently rules a pair out
    pub fn is_rejection(self) -> bool {
        self <= Grade::No
    }
}

/// A judgment: grade, reason tag and optional diagnostic witness
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub grade: Grade,
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<String>,
}

impl Answer {
    pub fn new(grade: Grade, reason: &'static str) -> Self {
        Self {
            grade,
            reason,
            witness: None,
        }
    }

    pub fn heck_yes(reason: &'static str) -> Self {
        Self::new(Grade::HeckYes, reason)
    }

    pub fn yes(reason: &'static str) -> Self {
        Self::new(Grade::Yes, reason)
    }

    pub fn weak_yes(reason: &'static str) -> Self {
        Self::new(Grade::WeakYes, reason)
    }

    pub fn heck_no(reason: &'static str) -> Self {
        Self::new(Grade::HeckNo, reason)
    }

    pub fn no(reason: &'static str) -> Self {
        Self::new(Grade::No, reason)
    }

    pub fn no_info() -> Self {
        Self::new(Grade::NoInfo, "no-info")
    }

    pub fn with_witness(mut self, witness: impl Into<String>) -> Self {
        self.witness = Some(witness.into());
        self
    }

    pub fn is_positive(&self) -> bool {
        self.grade.is_positive()
    }

    pub fn is_rejection(&self) -> bool {
        self.grade.is_rejection()
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.grade, self.reason)?;
        if let Some(w) = &self.witness {
            write!(f, " ({})", w)?;
        }
        Ok(())
    }
}
