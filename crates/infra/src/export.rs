//! CSV reports.

use std::collections::HashMap;

use thiserror::Error;

use homestock_budgeting::{Budget, BudgetId, BudgetSummary, Expense};
use homestock_inventory::InventoryItem;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer could not be finalised: {0}")]
    Finish(String),
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Finish(e.error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Finish(e.to_string()))
}

fn date_cell(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

pub fn inventory_csv(items: &[InventoryItem]) -> Result<String, ExportError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "id",
        "name",
        "category",
        "quantity",
        "unit",
        "low_stock_threshold",
        "status",
        "manufacture_date",
        "expiry_date",
        "storage_temperature",
        "barcode",
    ])?;
    for item in items {
        w.write_record([
            item.id_typed().to_string(),
            item.name().to_string(),
            item.category().to_string(),
            item.quantity().to_string(),
            item.unit().unwrap_or_default().to_string(),
            item.low_stock_threshold().to_string(),
            item.status().to_string(),
            date_cell(item.manufacture_date()),
            date_cell(item.expiry_date()),
            item.storage_temperature().unwrap_or_default().to_string(),
            item.barcode().unwrap_or_default().to_string(),
        ])?;
    }
    finish(w)
}

/// `budgets` resolves each expense's budget name; unknown ids leave it blank.
pub fn expenses_csv(expenses: &[Expense], budgets: &[Budget]) -> Result<String, ExportError> {
    let names: HashMap<BudgetId, &str> = budgets.iter().map(|b| (b.id, b.name.as_str())).collect();

    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(["id", "budget_id", "budget", "date", "description", "amount"])?;
    for e in expenses {
        w.write_record([
            e.id.to_string(),
            e.budget_id.to_string(),
            names.get(&e.budget_id).copied().unwrap_or_default().to_string(),
            e.spent_on.to_string(),
            e.description.clone().unwrap_or_default(),
            e.amount.to_string(),
        ])?;
    }
    finish(w)
}

pub fn budgets_csv(summaries: &[BudgetSummary]) -> Result<String, ExportError> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "budget_id",
        "name",
        "allocated",
        "spent",
        "remaining",
        "utilization_percent",
        "over_budget",
        "expense_count",
    ])?;
    for s in summaries {
        w.write_record([
            s.budget_id.to_string(),
            s.name.clone(),
            s.allocated.to_string(),
            s.spent.to_string(),
            signed_amount(s.remaining),
            s.utilization_percent.map(|p| format!("{p:.1}")).unwrap_or_default(),
            s.over_budget.to_string(),
            s.expense_count.to_string(),
        ])?;
    }
    finish(w)
}

fn signed_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
