//! # Stage Definition: Order Feasibility Check
//!
//! This stage is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: Resolved BOM rows, an order multiplier and an
//!   [`InventoryProvider`].
//! - **Outputs**: A [`FeasibilityReport`] with one line per row stating
//!   whether `quantity * multiplier` can be covered from stock.
//! - **Logging**: Warnings for inventory lookup failures.
//! - **Invariants**:
//!     - Unresolved rows and rows without a readable quantity are infeasible,
//!       never silently skipped.
//!     - An inventory lookup failure marks the line infeasible instead of
//!       failing the batch; the report always covers every row.
//!     - A feasible line still carries a warning when fulfilling it would dip
//!       the stock below the part's minimum threshold.

use crate::core::traits::InventoryProvider;
use crate::domain::{FeasibilityLine, FeasibilityReport, ResolvedRow};

/// Checks one resolved row against current stock. `multiplier` is the number
/// of assemblies ordered.
pub fn check_line(
    row: &ResolvedRow,
    multiplier: f64,
    inventory: &dyn InventoryProvider,
) -> FeasibilityLine {
    let Some(quantity) = row.row.quantity else {
        return FeasibilityLine {
            row: row.clone(),
            required_total: 0.0,
            in_stock: 0.0,
            min_stock: 0.0,
            feasible: false,
            warning: Some("no readable quantity on this row".to_string()),
        };
    };
    let required_total = quantity * multiplier;

    let Some(catalog_id) = row.matched_id else {
        return FeasibilityLine {
            row: row.clone(),
            required_total,
            in_stock: 0.0,
            min_stock: 0.0,
            feasible: false,
            warning: Some("row is not resolved to a catalog entry".to_string()),
        };
    };

    let level = match inventory.stock_level(catalog_id) {
        Ok(level) => level,
        Err(err) => {
            tracing::warn!(
                catalog_id,
                error = %err,
                "inventory lookup failed; treating line as infeasible"
            );
            return FeasibilityLine {
                row: row.clone(),
                required_total,
                in_stock: 0.0,
                min_stock: 0.0,
                feasible: false,
                warning: Some(format!("inventory lookup failed: {err}")),
            };
        }
    };

    let feasible = level.stock >= required_total;
    let warning = if !feasible {
        Some(format!(
            "short by {:.2}: required {:.2}, in stock {:.2}",
            required_total - level.stock,
            required_total,
            level.stock
        ))
    } else if level.stock - required_total < level.min_stock {
        Some(format!(
            "fulfilling leaves {:.2} in stock, below the minimum of {:.2}",
            level.stock - required_total,
            level.min_stock
        ))
    } else {
        None
    };

    FeasibilityLine {
        row: row.clone(),
        required_total,
        in_stock: level.stock,
        min_stock: level.min_stock,
        feasible,
        warning,
    }
}

/// Checks every row and aggregates the per-line results. The report is
/// feasible only when every line is.
pub fn analyze(
    rows: &[ResolvedRow],
    multiplier: f64,
    inventory: &dyn InventoryProvider,
) -> FeasibilityReport {
    let lines: Vec<FeasibilityLine> = rows
        .iter()
        .map(|row| check_line(row, multiplier, inventory))
        .collect();
    let feasible = lines.iter().all(|line| line.feasible);
    FeasibilityReport { lines, feasible }
}
