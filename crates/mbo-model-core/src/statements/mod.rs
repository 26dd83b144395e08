//! Yearly financial statements derived from the operating plan and the debt schedule.

pub mod balance_sheet;
pub mod cashflow;
pub mod pnl;
