//! Plain-text rendering of documents and pages

use archivist_api::{location_line, non_empty};
use archivist_core::{Capsule, DocumentRecord, Page};
use std::fmt::Write;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// One table row per document, then a "N of M" line and the page position
pub fn page(page: &Page) -> String {
    let mut out = String::new();
    if page.items.is_empty() {
        out.push_str("No documents found\n");
    } else {
        let _ = writeln!(
            out,
            "{:>6}  {:<32}  {:<16}  {:<20}  {}",
            "ID", "TITLE", "DEPARTMENT", "LOCATION", "REGISTERED"
        );
        for record in &page.items {
            let _ = writeln!(
                out,
                "{:>6}  {:<32}  {:<16}  {:<20}  {}",
                record.id,
                truncate(&record.title, 32),
                truncate(or_dash(record.department()), 16),
                truncate(&record.location_line(), 20),
                record.date_registered.format(DATE_FORMAT)
            );
        }
    }
    let _ = writeln!(
        out,
        "Showing {} of {} documents (page {}/{})",
        page.filtered_count, page.total_count, page.page_index, page.page_count
    );
    out
}

/// Every field of one document
pub fn record(record: &DocumentRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Document #{}: {}", record.id, record.title);
    let _ = writeln!(out, "  Description:   {}", or_dash(record.description()));
    let _ = writeln!(out, "  Department:    {}", or_dash(record.department()));
    let _ = writeln!(out, "  Owner:         {}", or_dash(record.owner_name()));
    let _ = writeln!(out, "  Contact:       {}", or_dash(record.owner_contact()));
    let _ = writeln!(out, "  Location:      {}", record.location_line());
    let _ = writeln!(
        out,
        "  Registered:    {}",
        record.date_registered.format(DATE_FORMAT)
    );
    out
}

/// Fields carried by a scanned capsule; the date may be missing
pub fn capsule(capsule: &Capsule) -> String {
    let registered = capsule
        .date_registered
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Document #{}: {}", capsule.id, capsule.title);
    let _ = writeln!(
        out,
        "  Description:   {}",
        or_dash(non_empty(capsule.description.as_deref()))
    );
    let _ = writeln!(
        out,
        "  Department:    {}",
        or_dash(non_empty(capsule.department.as_deref()))
    );
    let _ = writeln!(
        out,
        "  Owner:         {}",
        or_dash(non_empty(capsule.owner_name.as_deref()))
    );
    let _ = writeln!(
        out,
        "  Contact:       {}",
        or_dash(non_empty(capsule.owner_contact.as_deref()))
    );
    let _ = writeln!(
        out,
        "  Location:      {}",
        location_line(
            capsule.shelf_code.as_deref(),
            capsule.box_number.as_deref(),
            capsule.folder_number.as_deref(),
        )
    );
    let _ = writeln!(out, "  Registered:    {}", registered);
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
