//! # Finalisation Checklist
//!
//! Fixed pre-declaration checks and a countdown to the reporting
//! deadline of the current compliance period.

use crate::PlaybookError;
use crate::assessment::percentage;
use crate::fiscal::{FiscalYearEnd, TimeRemaining, declaration_period, time_remaining};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

/// A checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub label: &'static str,
}

/// The fixed checklist, in display order.
pub const CHECKLIST_ITEMS: [ChecklistItem; 8] = [
    ChecklistItem {
        id: "material-controls-confirmed",
        label: "Material controls list confirmed by the board",
    },
    ChecklistItem {
        id: "testing-complete",
        label: "Control testing complete for the period",
    },
    ChecklistItem {
        id: "deficiencies-assessed",
        label: "Deficiencies assessed and remediation tracked",
    },
    ChecklistItem {
        id: "assurance-evidence",
        label: "Assurance evidence filed and indexed",
    },
    ChecklistItem {
        id: "audit-committee-review",
        label: "Audit committee review held",
    },
    ChecklistItem {
        id: "declaration-drafted",
        label: "Declaration wording drafted",
    },
    ChecklistItem {
        id: "auditor-briefed",
        label: "External auditor briefed",
    },
    ChecklistItem {
        id: "board-sign-off",
        label: "Board sign-off minuted",
    },
];

fn item(id: &str) -> Option<&'static ChecklistItem> {
    CHECKLIST_ITEMS.iter().find(|i| i.id == id)
}

/// Checklist state, `item id -> done`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistState(BTreeMap<String, bool>);

impl ChecklistState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick or untick an item.
    pub fn set_item(&mut self, id: &str, done: bool) -> Result<(), PlaybookError> {
        let item = item(id)
            .ok_or_else(|| PlaybookError::NotFound(format!("Checklist item '{}'", id)))?;
        self.0.insert(item.id.to_string(), done);
        Ok(())
    }

    #[must_use]
    pub fn is_done(&self, id: &str) -> bool {
        self.0.get(id).copied().unwrap_or(false)
    }

    /// Items with their state, in display order.
    pub fn items(&self) -> impl Iterator<Item = (&'static ChecklistItem, bool)> + '_ {
        CHECKLIST_ITEMS.iter().map(|i| (i, self.is_done(i.id)))
    }

    /// Ticked known items. Stale ids in stored data are not counted.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.items().filter(|(_, done)| *done).count()
    }

    /// Completion percentage, rounded down.
    #[must_use]
    pub fn percent(&self) -> u8 {
        percentage(self.completed() as u32, CHECKLIST_ITEMS.len() as u32)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed() == CHECKLIST_ITEMS.len()
    }
}

/// Time left until the next reporting deadline not yet passed on `today`.
pub fn declaration_countdown(
    fye: FiscalYearEnd,
    today: Date,
) -> Result<TimeRemaining, PlaybookError> {
    let deadline = declaration_period(fye, today)?.reporting_deadline()?;
    time_remaining(deadline, today)
}
