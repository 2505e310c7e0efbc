//! Equipment inventory documents

use super::{optional_date, require, Document, SortDirection};
use serde::{Deserialize, Serialize};

/// Equipment categories offered by the inventory form, alphabetical
pub const EQUIPMENT_CATEGORIES: [&str; 20] = [
    "Air Tool",
    "Consumable (General)",
    "Cutting & Measuring Tool",
    "Fastening & Driving Tool",
    "General Hand Tool",
    "General Mechanic/Fabricator/Home Specialist",
    "Lighting/Optics",
    "Measurement Tool",
    "Metal Work Tool",
    "Non-Consumable (General)",
    "Other",
    "Painting/Finishing Tool",
    "Power Supply",
    "Prototyping",
    "Safety Gear",
    "Salvaged Component",
    "Signal Generator",
    "Soldering",
    "Tape & Adhesive",
    "Welding Tool",
];

/// Equipment lifecycle statuses
pub const EQUIPMENT_STATUSES: [&str; 5] =
    ["Needed", "In Progress", "Operational", "Repair", "Discarded"];

/// A piece of workshop equipment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Equipment {
    /// Item name
    pub name: String,
    /// One of [`EQUIPMENT_CATEGORIES`]
    pub category: String,
    /// One of [`EQUIPMENT_STATUSES`]
    pub status: String,
    /// `YYYY-MM-DD`
    pub acquisition_date: String,
    /// Free text
    pub notes: String,
}

impl Equipment {
    /// New item, operational and acquired today
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            status: "Operational".to_string(),
            acquisition_date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            notes: String::new(),
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// With acquisition date
    #[inline]
    #[must_use]
    pub fn acquired_on(mut self, date: impl Into<String>) -> Self {
        self.acquisition_date = date.into();
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

fn entry(name: &str, category: &str, status: &str, date: &str, notes: &str) -> Equipment {
    Equipment {
        name: name.to_string(),
        category: category.to_string(),
        status: status.to_string(),
        acquisition_date: date.to_string(),
        notes: notes.to_string(),
    }
}

impl Document for Equipment {
    const COLLECTION: &'static str = "equipment";
    const NOUN: &'static str = "Equipment";
    const LOAD_LABEL: &'static str = "equipment";
    const DATE_FIELD: &'static str = "acquisitionDate";
    const NAME_FIELD: &'static str = "name";
    const ORDER: SortDirection = SortDirection::Descending;

    // One row per item: name, category, status, acquired, notes
    #[rustfmt::skip]
    fn defaults() -> Vec<Self> {
        vec![
            entry("Fluke 117 Digital Multimeter", "Measurement Tool", "Operational", "2024-01-15", "Essential for basic electrical measurements."),
            entry("Weller WES51 Soldering Station", "Soldering", "Operational", "2024-05-01", "Temperature-controlled for precise soldering."),
            entry("DIY Laptop Oscilloscope (ESP32)", "Measurement Tool", "In Progress", "2025-06-22", "Building Analog Front-End for signal visualization."),
            entry("MIG Welder (120V)", "Welding Tool", "Operational", "2025-03-15", "Capable of flux core and MIG welding for fabrication."),
            entry("Metric Socket Set (1/2\" Drive)", "Fastening & Driving Tool", "Operational", "2024-09-01", "Comprehensive set for various mechanical tasks."),
            entry("Shop Rags (Bulk Pack)", "Consumable (General)", "Operational", "2025-06-01", "50-count pack for general cleaning and spills."),
            entry("Safety Glasses (Clear)", "Safety Gear", "Operational", "2024-02-10", "ANSI Z87.1 certified for eye protection."),
            entry("Bench Vice (6-inch)", "Metal Work Tool", "Operational", "2024-11-01", "Heavy-duty with swivel base for secure workholding."),
            entry("Old Laptop PSU (Salvaged)", "Salvaged Component", "Operational", "2025-05-20", "Provides 19V DC. Useful for prototyping power supply projects."),
            entry("Wire Strippers (Multi-gauge)", "General Hand Tool", "Operational", "2024-03-01", "Auto-stripping feature for various wire sizes."),
            entry("Duct Tape (Silver)", "Tape & Adhesive", "Operational", "2024-07-05", "Heavy-duty general-purpose tape."),
            entry("Air Compressor (20 Gallon)", "Air Tool", "Operational", "2025-01-20", "Powers air tools and painting equipment."),
            entry("ESD Mat & Wrist Strap", "Safety Gear", "Operational", "2024-02-10", "Protects sensitive electronics from static discharge."),
            entry("Hex Key Set (Metric & SAE)", "Fastening & Driving Tool", "Operational", "2024-10-10", "Fold-out style for easy access."),
        ]
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "Item Name is required.")?;
        require(&self.category, "Category is required.")?;
        require(&self.status, "Status is required.")?;
        optional_date(&self.acquisition_date, "Invalid Acquisition Date format.")
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
