use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::factor::FactorKind;

/// Every mutation of the composition model returns an Event.
///
/// `dependents` lists the same-kind factors inserted after the changed one,
/// whose stacked curves sit on top of it and need redrawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FactorAdded {
        id: Uuid,
        kind: FactorKind,
        index: usize,
        time: DateTime<Utc>,
        amount: f64,
    },
    FactorRemoved {
        id: Uuid,
        kind: FactorKind,
        dependents: Vec<Uuid>,
    },
    FactorTimeChanged {
        id: Uuid,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
        dependents: Vec<Uuid>,
    },
    FactorAmountChanged {
        id: Uuid,
        previous: f64,
        current: f64,
        dependents: Vec<Uuid>,
    },
}

impl Event {
    /// Id of the factor the event is about.
    pub fn factor_id(&self) -> Uuid {
        match self {
            Self::FactorAdded { id, .. }
            | Self::FactorRemoved { id, .. }
            | Self::FactorTimeChanged { id, .. }
            | Self::FactorAmountChanged { id, .. } => *id,
        }
    }

    /// Factors whose derived views are stale after this event, the changed
    /// factor first.
    pub fn stale_factors(&self) -> Vec<Uuid> {
        let mut ids = vec![self.factor_id()];
        match self {
            Self::FactorAdded { .. } => {}
            Self::FactorRemoved { dependents, .. }
            | Self::FactorTimeChanged { dependents, .. }
            | Self::FactorAmountChanged { dependents, .. } => {
                ids.extend(dependents.iter().copied())
            }
        }
        ids
    }
}
