use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use mbo_model_core::financing::debt::{self, AmortizationType, FinancingAssumptions};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Amortization {
    Linear,
    Bullet,
}

impl From<Amortization> for AmortizationType {
    fn from(a: Amortization) -> Self {
        match a {
            Amortization::Linear => AmortizationType::Linear,
            Amortization::Bullet => AmortizationType::Bullet,
        }
    }
}

/// Arguments for a stand-alone debt schedule
#[derive(Args)]
pub struct DebtArgs {
    /// Path to a JSON or YAML file with financing assumptions (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal drawn at close
    #[arg(long)]
    pub initial_debt: Option<Decimal>,

    /// Annual interest rate (0.05 = 5%)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Amortisation profile
    #[arg(long, value_enum, default_value = "linear")]
    pub amortization: Amortization,

    /// Amortisation period in years
    #[arg(long, default_value_t = 5)]
    pub period: u32,

    /// Years before linear repayment begins
    #[arg(long, default_value_t = 0)]
    pub grace: u32,

    /// Year index of a one-off special repayment
    #[arg(long)]
    pub special_year: Option<u32>,

    /// Amount of the special repayment
    #[arg(long)]
    pub special_amount: Option<Decimal>,

    /// Minimum DSCR covenant
    #[arg(long)]
    pub min_dscr: Option<Decimal>,
}

pub fn run_debt(args: DebtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let financing: FinancingAssumptions = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::file::read_piped()? {
        piped
    } else {
        let initial_debt = args
            .initial_debt
            .ok_or("--initial-debt is required (or provide --input)")?;
        let interest_rate = args
            .interest_rate
            .ok_or("--interest-rate is required (or provide --input)")?;

        let mut financing = FinancingAssumptions::new(initial_debt, interest_rate);
        financing.amortization_type = args.amortization.into();
        financing.amortization_period_years = args.period;
        financing.grace_period_years = args.grace;
        financing.special_repayment_year = args.special_year;
        financing.special_repayment_amount = args.special_amount.unwrap_or(Decimal::ZERO);
        if let Some(min_dscr) = args.min_dscr {
            financing.minimum_dscr = min_dscr;
        }
        financing
    };

    let schedule = debt::build_debt_schedule(&financing, None);
    Ok(serde_json::to_value(schedule)?)
}
