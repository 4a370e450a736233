//! Output rendering and formatting

use crate::report::{CommandResult, ComparisonReport, ScanReport};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use cscan_reconcile::view;
use cscan_types::{BackendHealth, CatalogEntry, ColorChoice, Severity, VulnerabilityRecord};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    fn render_json(&self, result: &CommandResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    fn render_table(&self, result: &CommandResult) -> io::Result<()> {
        match result {
            CommandResult::Scan(report) => self.render_scan_report(report),
            CommandResult::Catalog(entries) => self.render_catalog(entries),
            CommandResult::Comparison(report) => self.render_comparison(report),
            CommandResult::Health(health) => self.render_health(health),
        }
    }

    fn render_scan_report(&self, report: &ScanReport) -> io::Result<()> {
        let result = &report.result;
        println!("{}", self.bold(&format!("Scan results for {}", result.image_reference)));
        if let Some(timestamp) = result.scan_timestamp {
            println!("Scanned on: {}", timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        if let Some(duration) = result.scan_duration_secs {
            println!("Duration:   {duration:.1}s");
        }
        println!();

        let mut summary = self.table();
        summary.set_header(vec![
            Cell::new("Severity").add_attribute(Attribute::Bold),
            Cell::new("Count").add_attribute(Attribute::Bold),
        ]);
        for (severity, count) in result.severity_counts.iter() {
            summary.add_row(vec![self.severity_cell(severity), Cell::new(count)]);
        }
        summary.add_row(vec![
            Cell::new("TOTAL").add_attribute(Attribute::Bold),
            Cell::new(result.total_vulnerability_count).add_attribute(Attribute::Bold),
        ]);
        println!("{summary}");

        if !report.consistency.is_consistent() {
            println!();
            println!("{}", self.warn("Summary and detailed list disagree:"));
            for line in report.consistency.describe() {
                println!("  - {line}");
            }
        }

        let limited = view(result, report.severity_filter, report.limit);
        println!();
        if limited.count == 0 {
            match report.severity_filter {
                Some(severity) => println!("No {severity} vulnerabilities in the detailed list."),
                None => println!("No vulnerabilities in the detailed list."),
            }
            return Ok(());
        }

        self.render_vulnerabilities(&limited.records);
        if limited.omitted > 0 {
            println!(
                "... and {} more (showing {} of {})",
                limited.omitted,
                limited.shown(),
                limited.count
            );
        }
        Ok(())
    }

    fn render_vulnerabilities(&self, records: &[&VulnerabilityRecord]) {
        let mut table = self.table();
        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Severity").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Installed").add_attribute(Attribute::Bold),
            Cell::new("Fixed").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
        ]);

        for record in records {
            let fixed = if record.fixed_version.is_available() {
                Cell::new(&record.fixed_version).fg(Color::Green)
            } else {
                Cell::new(&record.fixed_version).fg(Color::DarkGrey)
            };
            table.add_row(vec![
                Cell::new(&record.id),
                self.severity_cell(record.severity),
                Cell::new(&record.affected_package),
                Cell::new(&record.installed_version),
                fixed,
                Cell::new(&record.title),
            ]);
        }

        println!("{table}");
    }

    fn render_catalog(&self, entries: &[CatalogEntry]) -> io::Result<()> {
        if entries.is_empty() {
            println!("No example images available.");
            return Ok(());
        }

        let mut table = self.table();
        table.set_header(vec![
            Cell::new("Image").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
        ]);
        for entry in entries {
            table.add_row(vec![Cell::new(&entry.name), Cell::new(&entry.description)]);
        }

        println!("{table}");
        Ok(())
    }

    fn render_comparison(&self, report: &ComparisonReport) -> io::Result<()> {
        let comparison = &report.comparison;
        println!(
            "{}",
            self.bold(&format!(
                "{} vs {}",
                comparison.baseline_image, comparison.candidate_image
            ))
        );
        println!();

        let mut table = self.table();
        table.set_header(vec![
            Cell::new("Severity").add_attribute(Attribute::Bold),
            Cell::new(&comparison.baseline_image).add_attribute(Attribute::Bold),
            Cell::new(&comparison.candidate_image).add_attribute(Attribute::Bold),
            Cell::new("Reduction").add_attribute(Attribute::Bold),
        ]);
        for (severity, delta) in &comparison.severity_deltas {
            table.add_row(vec![
                self.severity_cell(*severity),
                Cell::new(report.baseline.severity_counts.get(*severity)),
                Cell::new(report.candidate.severity_counts.get(*severity)),
                delta_cell(*delta),
            ]);
        }
        table.add_row(vec![
            Cell::new("TOTAL").add_attribute(Attribute::Bold),
            Cell::new(report.baseline.total_vulnerability_count),
            Cell::new(report.candidate.total_vulnerability_count),
            delta_cell(comparison.total_reduction),
        ]);
        println!("{table}");
        println!();

        let headline = format!(
            "{} fewer vulnerabilities ({}% improvement)",
            comparison.total_reduction, comparison.improvement_percent
        );
        if comparison.candidate_is_better {
            println!("{}", self.good(&headline));
        } else {
            println!("{headline}");
        }
        println!("Recommendation: {}", comparison.recommendation);
        Ok(())
    }

    fn render_health(&self, health: &BackendHealth) -> io::Result<()> {
        if health.is_healthy() {
            println!("{} Backend healthy", self.good("[OK]"));
        } else {
            println!("{} Backend reports status '{}'", self.warn("[WARN]"), health.status);
        }
        if !health.message.is_empty() {
            println!("{}", health.message);
        }
        Ok(())
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.supports_color() {
            table.force_no_tty();
        }
        table
    }

    fn severity_cell(&self, severity: Severity) -> Cell {
        let cell = Cell::new(severity.as_str());
        match severity {
            Severity::Critical => cell.fg(Color::Red).add_attribute(Attribute::Bold),
            Severity::High => cell.fg(Color::Red),
            Severity::Medium => cell.fg(Color::Yellow),
            Severity::Low => cell.fg(Color::Blue),
            Severity::Unknown => cell.fg(Color::DarkGrey),
        }
    }

    fn bold(&self, text: &str) -> String {
        self.styled(Style::new().bold(), text)
    }

    fn warn(&self, text: &str) -> String {
        self.styled(Style::new().yellow(), text)
    }

    fn good(&self, text: &str) -> String {
        self.styled(Style::new().green(), text)
    }

    fn styled(&self, style: Style, text: &str) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn delta_cell(delta: i64) -> Cell {
    let cell = Cell::new(delta);
    match delta.signum() {
        1 => cell.fg(Color::Green),
        -1 => cell.fg(Color::Red),
        _ => cell,
    }
}
