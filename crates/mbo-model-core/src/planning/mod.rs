//! Operating plan: revenue capacity and cost drivers, run once per snapshot.

pub mod costs;
pub mod revenue;
