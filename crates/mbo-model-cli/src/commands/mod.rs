pub mod debt;
pub mod irr;
pub mod model;
pub mod scenarios;
