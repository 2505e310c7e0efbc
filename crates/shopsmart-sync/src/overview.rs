//! Shop overview metrics derived from the current views

use crate::dates::parse_date;
use crate::documents::{Equipment, MaintenanceEntry, Project};
use crate::view::TypedView;
use chrono::NaiveDate;
use serde::Serialize;

/// Categories that never count as planned acquisitions
pub const NON_ACQUISITION_CATEGORIES: [&str; 2] = ["Consumable (General)", "Salvaged Component"];

const NEEDED: &str = "Needed";

/// Headline numbers for the overview screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopOverview {
    /// Equipment items tracked
    pub equipment_total: usize,
    /// Projects with status "In Progress"
    pub active_projects: usize,
    /// Equipment with status "Needed"
    pub low_stock_items: usize,
    /// Needed equipment that is worth buying, by name
    pub upcoming_acquisitions: Vec<String>,
    /// Maintenance items whose next due date has passed, by item
    pub overdue_maintenance: Vec<String>,
}

impl ShopOverview {
    /// Compute metrics as of `today`
    #[must_use]
    pub fn compute(
        equipment: &TypedView<Equipment>,
        maintenance: &TypedView<MaintenanceEntry>,
        projects: &TypedView<Project>,
        today: NaiveDate,
    ) -> Self {
        let needed: Vec<&Equipment> = equipment
            .documents()
            .filter(|e| e.status == NEEDED)
            .collect();

        Self {
            equipment_total: equipment.len(),
            active_projects: projects.documents().filter(|p| p.is_active()).count(),
            low_stock_items: needed.len(),
            upcoming_acquisitions: needed
                .iter()
                .filter(|e| !NON_ACQUISITION_CATEGORIES.contains(&e.category.as_str()))
                .map(|e| e.name.clone())
                .collect(),
            overdue_maintenance: maintenance
                .documents()
                .filter(|m| parse_date(&m.next_due).is_some_and(|due| due.date() < today))
                .map(|m| m.item.clone())
                .collect(),
        }
    }
}
