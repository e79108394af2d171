//! Plain-text views of the estimate book for the terminal.

use std::fmt::Write;

use comfy_table::{Cell, CellAlignment, Table};
use vet_core::{Company, DailyMetrics, Estimate};

use crate::utils::{format_date, format_money, format_number};

fn right(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).set_alignment(CellAlignment::Right)
}

/// One row per estimate, in the order given.
pub fn estimates_table(estimates: &[Estimate]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Date"),
        Cell::new("Owner"),
        Cell::new("Pet"),
        Cell::new("Status"),
        right("Total"),
    ]);

    for estimate in estimates {
        table.add_row(vec![
            Cell::new(&estimate.id),
            Cell::new(format_date(estimate.created_at)),
            Cell::new(&estimate.owner.name),
            Cell::new(&estimate.pet.name),
            Cell::new(estimate.status),
            right(format_money(estimate.totals().total)),
        ]);
    }

    table
}

/// The printable estimate: clinic header, owner and pet, line items and
/// totals, then the clinic disclaimer.
pub fn estimate_detail(
    estimate: &Estimate,
    company: Option<&Company>,
) -> String {
    let mut out = String::new();

    if let Some(company) = company {
        let _ = writeln!(out, "{}", company.name);
        let _ = writeln!(out, "{}", company.address);
        if !company.contact_info.is_empty() {
            let _ = writeln!(out, "{}", company.contact_info);
        }
        if !company.tax_id.is_empty() {
            let _ = writeln!(out, "Tax ID: {}", company.tax_id);
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Estimate {}  ({}, {})",
        estimate.id,
        format_date(estimate.created_at),
        estimate.status
    );
    let owner = &estimate.owner;
    let _ = writeln!(out, "Owner: {} <{}>, {}", owner.name, owner.email, owner.phone);
    let _ = writeln!(out, "       {}", owner.address);
    if let Some(cedula) = &owner.cedula {
        let _ = writeln!(out, "       ID: {cedula}");
    }
    let pet = &estimate.pet;
    let _ = writeln!(
        out,
        "Pet:   {} ({}, {}, {})",
        pet.name, pet.breed, pet.age, pet.gender
    );
    out.push('\n');

    let mut items = Table::new();
    items.set_header(vec![
        Cell::new("Service"),
        Cell::new("Description"),
        right("Qty"),
        right("Price"),
        right("Amount"),
    ]);
    for item in &estimate.line_items {
        items.add_row(vec![
            Cell::new(&item.service),
            Cell::new(&item.description),
            right(format_number(item.quantity)),
            right(format_money(item.price)),
            right(format_money(item.amount())),
        ]);
    }
    let _ = writeln!(out, "{items}");

    let totals = estimate.totals();
    let _ = writeln!(out, "Subtotal: {:>14}", format_money(totals.subtotal));
    let _ = writeln!(
        out,
        "Tax ({}%): {:>13}",
        format_number(estimate.tax_rate),
        format_money(totals.tax_amount)
    );
    let _ = writeln!(out, "Total: {:>17}", format_money(totals.total));

    if let Some(company) = company.filter(|c| !c.disclaimer.is_empty()) {
        let _ = write!(out, "\n{}\n", company.disclaimer);
    }

    out
}

pub fn company_details(company: &Company) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    for (field, value) in [
        ("Name", &company.name),
        ("Address", &company.address),
        ("Contact", &company.contact_info),
        ("Tax ID", &company.tax_id),
        ("Logo URL", &company.logo_url),
        ("Disclaimer", &company.disclaimer),
        ("Accent color", &company.accent_color),
    ] {
        table.add_row(vec![field, value.as_str()]);
    }
    table.to_string()
}

/// Dashboard figures for one day.
pub fn metrics_report(metrics: &DailyMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Activity for {}", metrics.day);
    let _ = writeln!(out, "  Estimates:      {}", metrics.estimate_count);
    let _ = writeln!(out, "  Total income:   {}", format_money(metrics.total_income));
    let _ = writeln!(out, "  Average ticket: {}", format_money(metrics.average_ticket));
    let _ = writeln!(out, "  Line items:     {}", metrics.line_item_count);

    if metrics.top_services.is_empty() {
        let _ = writeln!(out, "\nNo services quoted.");
        return out;
    }

    let mut table = Table::new();
    table.set_header(vec![Cell::new("Top services"), right("Quantity")]);
    for entry in &metrics.top_services {
        table.add_row(vec![
            Cell::new(&entry.service),
            right(format_number(entry.quantity)),
        ]);
    }
    let _ = write!(out, "\n{table}\n");
    out
}
