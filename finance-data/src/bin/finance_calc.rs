use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use finance_core::calculations::{TaxAssessor, amortization_schedule, compute_tax, simulate};
use finance_core::{CategoryIncome, Debt, PayoffStrategy, SimulationScenario};
use finance_data::{
    RulesConfig, SlabLoaderError, SlabTableLoader, compare_regimes, compare_strategies,
    debt_loader, logging, parse_money, report,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// Progressive tax and debt payoff calculator.
///
/// Tax rates come from a TOML rules file (regimes plus income category
/// rules) or a CSV slab table; debts come from a CSV file with columns
/// id, principal, outstanding_balance, annual_rate_percent, minimum_payment.
#[derive(Parser, Debug)]
#[command(name = "finance-calc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level or EnvFilter directive; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Append log output to this file as well as stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute tax on a salary, plus category incomes when using a rules file
    Tax(TaxArgs),
    /// Assess the same incomes under two regimes
    CompareRegimes(CompareRegimesArgs),
    /// Simulate paying off a set of debts
    Debt(DebtArgs),
    /// Print the month-by-month schedule for a single debt
    Amortize(AmortizeArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["rules", "slabs"])))]
struct TaxArgs {
    /// TOML rules file with regimes and category rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// CSV slab table file (regime,lower_bound,upper_bound,rate)
    #[arg(long)]
    slabs: Option<PathBuf>,

    /// Regime name, e.g. "new"
    #[arg(long)]
    regime: String,

    /// Tax year; defaults to the latest year defined for the regime
    #[arg(long, requires = "rules")]
    year: Option<i32>,

    /// Salary or other slab-taxed income
    #[arg(long, value_parser = parse_money)]
    salary: Decimal,

    /// Category income as CATEGORY=AMOUNT; may be repeated
    #[arg(long = "income", value_parser = parse_category_income, conflicts_with = "slabs")]
    incomes: Vec<CategoryIncome>,
}

#[derive(Args, Debug)]
struct CompareRegimesArgs {
    /// TOML rules file with regimes and category rules
    #[arg(long)]
    rules: PathBuf,

    /// First regime name
    #[arg(long)]
    first: String,

    /// Second regime name
    #[arg(long)]
    second: String,

    /// Tax year; defaults to the latest year defined for each regime
    #[arg(long)]
    year: Option<i32>,

    #[arg(long, value_parser = parse_money)]
    salary: Decimal,

    /// Category income as CATEGORY=AMOUNT; may be repeated
    #[arg(long = "income", value_parser = parse_category_income)]
    incomes: Vec<CategoryIncome>,
}

#[derive(Args, Debug)]
struct DebtArgs {
    /// CSV file of debts
    #[arg(long)]
    debts: PathBuf,

    /// Extra amount paid every month on top of the minimums
    #[arg(long, value_parser = parse_money, default_value = "0")]
    extra: Decimal,

    /// snowball or avalanche; compares both when omitted
    #[arg(long)]
    strategy: Option<PayoffStrategy>,
}

#[derive(Args, Debug)]
struct AmortizeArgs {
    #[arg(long, default_value = "debt")]
    id: String,

    /// Outstanding balance
    #[arg(long, value_parser = parse_money)]
    balance: Decimal,

    /// Annual interest rate in percent, e.g. 18
    #[arg(long)]
    rate: Decimal,

    /// Fixed monthly payment
    #[arg(long, value_parser = parse_money)]
    payment: Decimal,
}

fn parse_category_income(s: &str) -> Result<CategoryIncome, String> {
    let (category, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=AMOUNT, got '{s}'"))?;
    let category = category.trim();
    if category.is_empty() {
        return Err(format!("missing category in '{s}'"));
    }
    let amount = parse_money(amount).map_err(|e| e.to_string())?;
    Ok(CategoryIncome::new(category, amount))
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    render: impl FnOnce(&T) -> String,
) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", render(value)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn run_tax(
    args: TaxArgs,
    format: OutputFormat,
) -> Result<()> {
    if let Some(path) = &args.slabs {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let tables = SlabTableLoader::load(file)
            .with_context(|| format!("Failed to load slab tables: {}", path.display()))?;
        info!(tables = tables.len(), path = %path.display(), "loaded slab tables");

        let slabs = tables
            .get(&args.regime)
            .ok_or_else(|| SlabLoaderError::UnknownRegime(args.regime.clone()))?;
        let result = compute_tax(args.salary, slabs).context("Failed to compute tax")?;
        return emit(format, &result, report::render_tax_result);
    }

    let path = args
        .rules
        .as_ref()
        .context("either --rules or --slabs is required")?;
    let config = RulesConfig::load(path)
        .with_context(|| format!("Failed to load rules: {}", path.display()))?;
    let regime = config.regime(&args.regime, args.year)?;
    info!(regime = %regime.name, tax_year = regime.tax_year, "assessing income");

    let assessment = TaxAssessor::new(regime, &config.categories)
        .assess(args.salary, &args.incomes)
        .context("Failed to assess income")?;
    emit(format, &assessment, report::render_assessment)
}

fn run_compare_regimes(
    args: CompareRegimesArgs,
    format: OutputFormat,
) -> Result<()> {
    let config = RulesConfig::load(&args.rules)
        .with_context(|| format!("Failed to load rules: {}", args.rules.display()))?;
    let first = config.regime(&args.first, args.year)?;
    let second = config.regime(&args.second, args.year)?;

    let comparison = compare_regimes(first, second, &config.categories, args.salary, &args.incomes)
        .context("Failed to compare regimes")?;
    info!(cheaper = %comparison.cheaper, savings = %comparison.savings, "compared regimes");
    emit(format, &comparison, report::render_regime_comparison)
}

fn run_debt(
    args: DebtArgs,
    format: OutputFormat,
) -> Result<()> {
    let debts = debt_loader::load_from_file(&args.debts)
        .with_context(|| format!("Failed to load debts: {}", args.debts.display()))?;
    info!(debts = debts.len(), extra = %args.extra, "loaded debts");

    match args.strategy {
        Some(strategy) => {
            let scenario = SimulationScenario {
                debts,
                extra_monthly_payment: args.extra,
                strategy,
            };
            let result = simulate(&scenario).context("Failed to simulate payoff")?;
            emit(format, &result.rounded(), report::render_payoff)
        }
        None => {
            let comparison =
                compare_strategies(&debts, args.extra).context("Failed to simulate payoff")?;
            emit(format, &comparison, report::render_comparison)
        }
    }
}

fn run_amortize(
    args: AmortizeArgs,
    format: OutputFormat,
) -> Result<()> {
    let debt = Debt::new(args.id, args.balance, args.rate, args.payment);
    let rows =
        amortization_schedule(&debt, args.payment).context("Failed to build schedule")?;
    info!(months = rows.len(), "built amortization schedule");
    emit(format, &rows, |rows| report::render_schedule(rows))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_file.as_deref())?;

    match cli.command {
        Command::Tax(args) => run_tax(args, cli.format),
        Command::CompareRegimes(args) => run_compare_regimes(args, cli.format),
        Command::Debt(args) => run_debt(args, cli.format),
        Command::Amortize(args) => run_amortize(args, cli.format),
    }
}
