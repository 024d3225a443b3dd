//! Trade cost model and position sizing.
//!
//! Round-trip costs are charged on both legs' notional:
//! `(entry + exit) * shares * (commission_rate + slippage_rate)`.
//! Tax applies to the net result only when it is positive.

/// Per-trade friction parameters. Rates are fractions, not percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub tax_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            commission_rate: 0.00015,
            slippage_rate: 0.0005,
            tax_rate: 0.15,
        }
    }
}

impl CostModel {
    /// No commission, slippage, or tax.
    pub fn frictionless() -> Self {
        CostModel {
            commission_rate: 0.0,
            slippage_rate: 0.0,
            tax_rate: 0.0,
        }
    }
}

/// Breakdown of a closed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub gross_pnl: f64,
    pub costs: f64,
    pub tax: f64,
    pub net_pnl: f64,
}

pub fn round_trip_cost(entry_price: f64, exit_price: f64, share_count: i64, model: &CostModel) -> f64 {
    (entry_price + exit_price) * share_count as f64 * (model.commission_rate + model.slippage_rate)
}

/// Settle a long round trip: gross P&L, minus round-trip costs, minus tax on
/// a positive remainder. Losses are not tax-sheltered.
pub fn settle(entry_price: f64, exit_price: f64, share_count: i64, model: &CostModel) -> Settlement {
    let gross_pnl = (exit_price - entry_price) * share_count as f64;
    let costs = round_trip_cost(entry_price, exit_price, share_count, model);
    let pre_tax = gross_pnl - costs;
    let tax = if pre_tax > 0.0 {
        pre_tax * model.tax_rate
    } else {
        0.0
    };

    Settlement {
        gross_pnl,
        costs,
        tax,
        net_pnl: pre_tax - tax,
    }
}

/// `clamp(win_rate - offset, 0, cap)`.
pub fn kelly_fraction(win_rate: f64, offset: f64, cap: f64) -> f64 {
    (win_rate - offset).clamp(0.0, cap)
}

/// Whole lots affordable with `capital * fraction` at `price`.
///
/// Returns 0 when the result would be negative or the inputs are degenerate.
pub fn position_size(capital: f64, fraction: f64, price: f64, lot_size: i64) -> i64 {
    if price <= 0.0 || lot_size <= 0 {
        return 0;
    }
    let lots = (capital * fraction / price / lot_size as f64).floor();
    if lots.is_finite() && lots > 0.0 {
        lots as i64 * lot_size
    } else {
        0
    }
}
