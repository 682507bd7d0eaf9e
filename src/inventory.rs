//! Grocery inventory fetched from a Google Sheet.
//!
//! The sheet is a flat purchase log; one row per bought item. The reader is
//! deliberately tolerant: short rows, blank cells, and unparseable dates
//! degrade to missing fields instead of failing the run.

use crate::error::SheetError;
use chrono::NaiveDate;
use serde::Deserialize;

/// Sheets API base URL
const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Column layout of the grocery log sheet
mod col {
    pub const DATE: usize = 0;
    pub const ITEM: usize = 1;
    pub const CATEGORY: usize = 3;
    pub const QTY: usize = 4;
    pub const UNIT: usize = 5;
}

/// One purchased grocery item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    /// Item name
    pub name: String,
    /// Quantity as it appears in the sheet (may be empty)
    pub quantity: String,
    /// Unit as it appears in the sheet (may be empty)
    pub unit: String,
    /// Category label (e.g. "Vegetables")
    pub category: String,
    /// Purchase date, if the cell parsed
    pub purchased: Option<NaiveDate>,
}

impl InventoryItem {
    /// One-line summary for the kitchen state report
    pub fn summary(&self) -> String {
        let mut line = self.name.clone();
        if !self.quantity.is_empty() {
            let amount = format!("{} {}", self.quantity, self.unit);
            line.push_str(&format!(" ({})", amount.trim()));
        }
        if let Some(date) = self.purchased {
            line.push_str(&format!(" bought on {}", date.format("%Y-%m-%d")));
        }
        line
    }
}

/// Client for the Sheets values endpoint
pub struct SheetsClient {
    client: reqwest::Client,
    api_key: String,
    spreadsheet_id: String,
    range: String,
}

impl SheetsClient {
    /// Create a new client for a spreadsheet range
    pub fn new(
        api_key: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
        }
    }

    /// Fetch the configured range and parse it into inventory items.
    /// The first row is assumed to be a header and skipped.
    pub async fn fetch_items(&self) -> Result<Vec<InventoryItem>, SheetError> {
        let response = self
            .client
            .get(format!(
                "{}/{}/values/{}",
                API_BASE, self.spreadsheet_id, self.range
            ))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SheetError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(SheetError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetError::Parse(e.to_string()))?;

        Ok(parse_rows(&value_range.values))
    }
}

/// Response shape of the Sheets values endpoint
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Parse raw sheet rows into items, skipping the header row.
/// Rows without an item name are dropped; everything else is best-effort.
pub fn parse_rows(rows: &[Vec<String>]) -> Vec<InventoryItem> {
    rows.iter()
        .skip(1)
        .filter_map(|row| {
            let name = cell(row, col::ITEM);
            if name.is_empty() {
                return None;
            }
            Some(InventoryItem {
                name,
                quantity: cell(row, col::QTY),
                unit: cell(row, col::UNIT),
                category: cell(row, col::CATEGORY),
                purchased: parse_date(&cell(row, col::DATE)),
            })
        })
        .collect()
}

/// Items bought within the trailing window whose category looks like a
/// vegetable. Category matching is a substring check so "Vegetables",
/// "Veggies" and "Fresh Veg" all qualify.
pub fn available_produce(
    items: &[InventoryItem],
    window_days: i64,
    as_of: NaiveDate,
) -> Vec<InventoryItem> {
    let earliest = as_of - chrono::Duration::days(window_days);
    items
        .iter()
        .filter(|item| {
            item.category.to_lowercase().contains("veg")
                && item
                    .purchased
                    .map(|d| d >= earliest && d <= as_of)
                    .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// The sheet mixes ISO and day-first dates
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}
