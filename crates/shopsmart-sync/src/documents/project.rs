//! Workshop projects

use super::{optional_date, require, Document, SortDirection};
use serde::{Deserialize, Serialize};

/// Project statuses
pub const PROJECT_STATUSES: [&str; 5] =
    ["Planning", "In Progress", "On Hold", "Completed", "Canceled"];

/// A workshop project
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    /// Project name
    pub name: String,
    /// One of [`PROJECT_STATUSES`]
    pub status: String,
    /// Optional due date, `YYYY-MM-DD`
    pub due_date: String,
    /// Tools the project needs
    pub required_tools: String,
    /// Hardware / parts list
    pub hardware: String,
    /// What is holding it up
    pub blockers: String,
    /// Free text
    pub notes: String,
}

impl Project {
    /// New project in planning
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "Planning".to_string(),
            ..Self::default()
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// With due date
    #[inline]
    #[must_use]
    pub fn due_on(mut self, date: impl Into<String>) -> Self {
        self.due_date = date.into();
        self
    }

    /// Check if work is underway
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == "In Progress"
    }
}

impl Document for Project {
    const COLLECTION: &'static str = "projects";
    const NOUN: &'static str = "Project";
    const LOAD_LABEL: &'static str = "projects";
    const DATE_FIELD: &'static str = "dueDate";
    const NAME_FIELD: &'static str = "name";
    const ORDER: SortDirection = SortDirection::Ascending;

    fn defaults() -> Vec<Self> {
        vec![
            Self {
                name: "DIY Laptop Oscilloscope Build".into(),
                status: "In Progress".into(),
                due_date: "2025-07-30".into(),
                required_tools: "Soldering Iron, Multimeter, Breadboard".into(),
                hardware: "ESP32, Op-Amps, Resistors".into(),
                blockers: "Waiting for custom PCB fabrication".into(),
                notes: "Primary project for test bench enhancement.".into(),
            },
            Self {
                name: "Smart Power Strip Integration".into(),
                status: "Planning".into(),
                due_date: "2025-08-15".into(),
                required_tools: "Screwdriver Set, Wire Strippers".into(),
                hardware: "ESP8266, Relays, Current Sensors".into(),
                blockers: "Component sourcing pending".into(),
                notes: "Automate power for specific test bench areas.".into(),
            },
            Self {
                name: "Welding Cart Fabrication".into(),
                status: "Completed".into(),
                due_date: "2025-05-20".into(),
                required_tools: "MIG Welder, Angle Grinder, Clamps".into(),
                hardware: "Steel Square Tubing, Casters".into(),
                blockers: "None".into(),
                notes: "Improved workshop organization.".into(),
            },
        ]
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "Project Name is required.")?;
        require(&self.status, "Status is required.")?;
        optional_date(&self.due_date, "Invalid Due Date format.")
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
