//! Human-readable table output for customer rows.

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;

use super::models::Customer;

/// Column headers, matching the selected column names.
pub const HEADERS: [&str; 3] = ["Codigo", "Nombre", "FechaAlta"];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders customers as a table. No rows renders the header alone.
#[must_use]
pub fn render(customers: &[Customer]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(HEADERS.to_vec());

    customers.iter().for_each(|customer| {
        table.add_row(vec![
            customer.code.clone(),
            customer.name.clone().unwrap_or_default(),
            customer
                .created_at
                .map(|ts| ts.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        ]);
    });

    table.to_string()
}
