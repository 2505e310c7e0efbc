//! Maintenance and calibration log entries

use super::{optional_date, require, Document, SortDirection};
use serde::{Deserialize, Serialize};

/// A maintenance or calibration record for one item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaintenanceEntry {
    /// Serviced item
    pub item: String,
    /// Last service date, `YYYY-MM-DD`
    pub last_service: String,
    /// Next due date, `YYYY-MM-DD`
    pub next_due: String,
    /// Free text
    pub notes: String,
}

impl MaintenanceEntry {
    /// New entry for an item
    #[must_use]
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            ..Self::default()
        }
    }

    /// With service window
    #[inline]
    #[must_use]
    pub fn serviced(
        mut self,
        last_service: impl Into<String>,
        next_due: impl Into<String>,
    ) -> Self {
        self.last_service = last_service.into();
        self.next_due = next_due.into();
        self
    }

    /// With notes
    #[inline]
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl Document for MaintenanceEntry {
    const COLLECTION: &'static str = "maintenance";
    const NOUN: &'static str = "Maintenance entry";
    const LOAD_LABEL: &'static str = "maintenance log";
    const DATE_FIELD: &'static str = "nextDue";
    const NAME_FIELD: &'static str = "item";
    const ORDER: SortDirection = SortDirection::Ascending;

    fn defaults() -> Vec<Self> {
        vec![
            Self::new("Multimeter (Fluke 117)")
                .serviced("2025-01-15", "2026-01-15")
                .with_notes("Internal calibration check."),
            Self::new("Soldering Iron (Weller WES51)")
                .serviced("2024-12-01", "2025-12-01")
                .with_notes("Tip replacement and station cleaning."),
            Self::new("Air Compressor (20 Gallon)")
                .serviced("2025-01-20", "2025-07-20")
                .with_notes("Oil change and filter inspection."),
            Self::new("MIG Welder (120V)")
                .serviced("2025-06-20", "2025-09-20")
                .with_notes("Contact tip and nozzle inspection/replacement."),
            Self::new("Torque Wrench (1/2\" Drive)")
                .serviced("2024-10-01", "2026-10-01")
                .with_notes("Annual calibration check."),
        ]
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.item, "Item is required.")?;
        optional_date(&self.last_service, "Invalid Last Service Date format.")?;
        optional_date(&self.next_due, "Invalid Next Due Date format.")
    }

    fn display_name(&self) -> &str {
        &self.item
    }

    fn delete_prompt(&self) -> String {
        format!(
            "Are you sure you want to delete the maintenance record for \"{}\"?",
            self.item
        )
    }
}
