//! Produce intake models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded delivery of raw produce awaiting sorting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeRecord {
    pub id: Uuid,
    /// Farmer or supplier the delivery came from
    pub source: String,
    pub produce: Option<String>,
    pub total_gross_weight_kg: Decimal,
    pub status: IntakeStatus,
    pub received_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl IntakeRecord {
    pub fn new(source: impl Into<String>, total_gross_weight_kg: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            produce: None,
            total_gross_weight_kg,
            status: IntakeStatus::Pending,
            received_at: Utc::now(),
            notes: None,
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.status == IntakeStatus::Sorted
    }
}

/// Intake lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStatus {
    /// Received, no allocation accepted yet
    #[default]
    Pending,
    /// A balanced allocation has been recorded
    Sorted,
}

impl IntakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeStatus::Pending => "pending",
            IntakeStatus::Sorted => "sorted",
        }
    }
}

impl std::str::FromStr for IntakeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(IntakeStatus::Pending),
            "sorted" => Ok(IntakeStatus::Sorted),
            other => Err(format!("Unknown intake status: {}", other)),
        }
    }
}

impl std::fmt::Display for IntakeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
