//! Plain-text rendering of soil records

use storage::SoilRecord;

const HEADERS: [&str; 8] = [
    "Record No",
    "Farm Location",
    "Test Date",
    "Nitrogen Level",
    "Phosphorus Level",
    "Potassium Level",
    "pH Level",
    "Moisture Content",
];

fn cells(record: &SoilRecord) -> [String; 8] {
    [
        record.record_no.to_string(),
        record.farm_location.clone(),
        record
            .test_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        format!("{:.4}", record.nitrogen_level),
        format!("{:.4}", record.phosphorus_level),
        format!("{:.4}", record.potassium_level),
        format!("{:.4}", record.ph_level),
        format!("{:.4}", record.moisture_content),
    ]
}

/// Render a titled, column-aligned table. Numbers are right-aligned.
pub fn render(title: &str, records: &[SoilRecord]) -> String {
    let rows: Vec<[String; 8]> = records.iter().map(cells).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');

    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths.iter())
        .map(|(h, w)| format!("{:<w$}", h, w = *w))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(i, (cell, w))| match i {
                1 | 2 => format!("{:<w$}", cell, w = *w),
                _ => format!("{:>w$}", cell, w = *w),
            })
            .collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
    }

    if rows.is_empty() {
        out.push_str("(no records)\n");
    }
    out
}
