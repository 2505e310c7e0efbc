//! Text and JSON output

use crate::commands::SimulationReport;
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use shopsmart_sync::{Document, Equipment, MaintenanceEntry, Project, ShopOverview, TypedView};
use std::fmt::Write as _;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Text,
    Json,
}

impl Format {
    pub(crate) fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Columns shown for a document in text output
pub(crate) trait Row: Document {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl Row for Equipment {
    const HEADERS: &'static [&'static str] = &["Name", "Category", "Status", "Acquired"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.category.clone(),
            self.status.clone(),
            self.acquisition_date.clone(),
        ]
    }
}

impl Row for MaintenanceEntry {
    const HEADERS: &'static [&'static str] = &["Item", "Last Service", "Next Due"];

    fn cells(&self) -> Vec<String> {
        vec![self.item.clone(), self.last_service.clone(), self.next_due.clone()]
    }
}

impl Row for Project {
    const HEADERS: &'static [&'static str] = &["Name", "Status", "Due", "Blockers"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.status.clone(),
            self.due_date.clone(),
            self.blockers.clone(),
        ]
    }
}

/// Render a typed view
pub(crate) fn view<D: Row>(view: &TypedView<D>, format: Format) -> Result<String> {
    match format {
        Format::Json => {
            let mut rows = Vec::with_capacity(view.len());
            for entry in view.entries() {
                let mut row = Map::new();
                row.insert("id".into(), json!(entry.id));
                row.extend(entry.document.to_attributes()?);
                rows.push(Value::Object(row));
            }
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        Format::Text => {
            let rows: Vec<Vec<String>> = view.documents().map(Row::cells).collect();
            Ok(table(D::HEADERS, &rows))
        }
    }
}

/// Render overview metrics
pub(crate) fn overview(
    overview: &ShopOverview,
    today: NaiveDate,
    format: Format,
) -> Result<String> {
    if format == Format::Json {
        return Ok(serde_json::to_string_pretty(overview)?);
    }

    let mut out = String::new();
    writeln!(out, "Shop Overview ({today})")?;
    writeln!(out, "  Equipment tracked:       {}", overview.equipment_total)?;
    writeln!(out, "  Active projects:         {}", overview.active_projects)?;
    writeln!(out, "  Low stock items:         {}", overview.low_stock_items)?;
    writeln!(out, "  Upcoming acquisitions:   {}", overview.upcoming_acquisitions.len())?;
    for name in &overview.upcoming_acquisitions {
        writeln!(out, "    - {name}")?;
    }
    write!(out, "  Overdue maintenance:     {}", overview.overdue_maintenance.len())?;
    for item in &overview.overdue_maintenance {
        write!(out, "\n    - {item}")?;
    }
    Ok(out)
}

/// Print a simulation report
pub(crate) fn simulation(report: &SimulationReport, format: Format) -> Result<()> {
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Seeding simulation");
    println!("  Listeners:   {}", report.listeners);
    println!("  Latency:     {}ms", report.latency_ms);
    println!("  Strategy:    {}", report.strategy);
    println!("  Coordinator: {}", if report.isolated { "isolated" } else { "shared" });
    println!("  Expected:    {}", report.expected);
    println!("  Stored:      {}", report.stored);
    println!("  Views:       {:?}", report.listener_views);
    println!("  Status:      {}", if report.passed() { "PASSED" } else { "FAILED" });
    Ok(())
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = vec![line(headers.iter().copied(), &widths)];
    lines.push(
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(line(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
