pub mod debt;
