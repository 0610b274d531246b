use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use livingfit::config::{Config, ConfigOverrides};
use livingfit::fit::scorer::compute_qualitative_fit;
use livingfit::fit::QualitativeResult;
use livingfit::input::{parse_fit_form, parse_loan_form, RawFitForm, RawLoanForm};
use livingfit::loan::engine::LoanEligibilityEngine;
use livingfit::loan::whatif::simulate_whatif;
use livingfit::loan::{LoanField, LoanInputs, LoanResult, WhatIfResult};
use livingfit::output::csv::{fit_to_csv, loan_to_csv, policy_diff_to_csv, regions_to_csv};
use livingfit::output::json::render_json;
use livingfit::output::table::{
    render_fit_table, render_loan_table, render_policy_diff_table, render_presets_table,
    render_regions_table, render_whatif_table,
};
use livingfit::policy::{build_policy_diff, PolicyDiff, PolicyPreset, PolicyTable};
use livingfit::server::run_server;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "livingfit",
    about = "Seoul mortgage budget and relocation fit calculator"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Policy preset: baseline-2025, stress-weighted, oct-2025
    #[arg(short, long)]
    preset: Option<String>,
    /// TOML policy table replacing the preset
    #[arg(long = "policy-file")]
    policy_file: Option<String>,
    /// Reject malformed or negative numbers instead of treating them as 0
    #[arg(long)]
    strict: bool,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone)]
struct LoanArgs {
    /// House price in 억
    #[arg(long, default_value = "")]
    price: String,
    /// Annual income in 만원
    #[arg(long, default_value = "")]
    income: String,
    /// Existing annual debt service in 만원
    #[arg(long, default_value = "")]
    existing: String,
    /// Loan term in years
    #[arg(long, default_value = "")]
    term: String,
    /// Interest rate in percent
    #[arg(long, default_value = "")]
    rate: String,
    /// Cash on hand in 만원
    #[arg(long, default_value = "")]
    cash: String,
    #[arg(long = "loan-type")]
    loan_type: Option<String>,
    #[arg(long)]
    ownership: String,
    #[arg(long)]
    region: String,
}

impl From<LoanArgs> for RawLoanForm {
    fn from(value: LoanArgs) -> Self {
        Self {
            house_price_uk: value.price,
            annual_income_man: value.income,
            existing_annual_debt_service_man: value.existing,
            loan_term_years: value.term,
            interest_rate_pct: value.rate,
            cash_on_hand_man: value.cash,
            loan_type: value.loan_type,
            ownership: value.ownership,
            region: value.region,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Maximum loan and total purchasing power
    Loan {
        #[command(flatten)]
        loan: LoanArgs,
    },
    /// Qualitative relocation fit score
    Fit {
        #[arg(long)]
        current: String,
        #[arg(long)]
        destination: String,
        #[arg(long)]
        disposition: String,
        #[arg(long = "job-here")]
        job_here: String,
        #[arg(long)]
        stay: String,
        #[arg(long)]
        subscription: String,
    },
    /// Recompute the loan with some inputs changed
    Whatif {
        #[command(flatten)]
        loan: LoanArgs,
        #[arg(long = "set-income")]
        set_income: Option<f64>,
        #[arg(long = "set-rate")]
        set_rate: Option<f64>,
        #[arg(long = "set-term")]
        set_term: Option<f64>,
        #[arg(long = "set-existing")]
        set_existing: Option<f64>,
        #[arg(long = "set-price")]
        set_price: Option<f64>,
        #[arg(long = "set-cash")]
        set_cash: Option<f64>,
    },
    Presets,
    /// Rule-level differences between two presets
    PolicyDiff {
        from: String,
        to: String,
    },
    /// Districts and their regulation status under the active policy
    Regions,
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        preset: cli.preset.clone(),
        policy_file: cli.policy_file.clone(),
        strict: cli.strict.then_some(true),
    });
    init_tracing(&config.logging.filter);

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        let host = host.clone().unwrap_or_else(|| config.server.host.clone());
        let port = port.unwrap_or(config.server.port);
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    let policy = config.resolve_policy()?;
    let mode = config.parse_mode();
    debug!(policy = %policy.id, ?mode, "resolved policy");

    match cli.command {
        Commands::Loan { loan } => {
            let form: RawLoanForm = loan.into();
            let inputs = parse_loan_form(&form, mode)?;
            let result = LoanEligibilityEngine::new(&policy).compute(&inputs);
            print_loan(&inputs, &result, &policy, cli.output)?;
        }
        Commands::Fit {
            current,
            destination,
            disposition,
            job_here,
            stay,
            subscription,
        } => {
            let inputs = parse_fit_form(&RawFitForm {
                current_region: current,
                destination_region: destination,
                disposition,
                job_or_school_in_destination: job_here,
                stay_period: stay,
                has_subscription_account: subscription,
            })?;
            let result = compute_qualitative_fit(&inputs, &policy)?;
            print_fit(&result, cli.output)?;
        }
        Commands::Whatif {
            loan,
            set_income,
            set_rate,
            set_term,
            set_existing,
            set_price,
            set_cash,
        } => {
            let form: RawLoanForm = loan.into();
            let inputs = parse_loan_form(&form, mode)?;
            let changes = [
                (LoanField::AnnualIncome, set_income),
                (LoanField::InterestRate, set_rate),
                (LoanField::LoanTerm, set_term),
                (LoanField::ExistingDebtService, set_existing),
                (LoanField::HousePrice, set_price),
                (LoanField::CashOnHand, set_cash),
            ]
            .into_iter()
            .filter_map(|(field, to)| to.map(|to| (field, to)))
            .collect::<Vec<_>>();
            if changes.is_empty() {
                return Err(anyhow!(
                    "at least one --set-<field> change is required for whatif"
                ));
            }
            let engine = LoanEligibilityEngine::new(&policy);
            let result = simulate_whatif(&engine, &inputs, &changes);
            print_whatif(&result, cli.output)?;
        }
        Commands::Presets => {
            let tables = PolicyPreset::ALL.map(|p| p.table());
            match cli.output {
                OutputFormat::Table => println!("{}", render_presets_table(&tables, &policy.id)),
                OutputFormat::Json => println!("{}", render_json(&tables)?),
                OutputFormat::Csv => {
                    warn!("CSV output for presets not implemented, using JSON");
                    println!("{}", render_json(&tables)?);
                }
            }
        }
        Commands::PolicyDiff { from, to } => {
            let old = PolicyPreset::from_str(&from)?.table();
            let new = PolicyPreset::from_str(&to)?.table();
            match build_policy_diff(&old, &new) {
                Some(diff) => print_policy_diff(&diff, cli.output)?,
                None => println!("{} and {} carry identical rules", old.id, new.id),
            }
        }
        Commands::Regions => match cli.output {
            OutputFormat::Table => println!("{}", render_regions_table(&policy)),
            OutputFormat::Json => println!("{}", render_json(&policy.region_statuses())?),
            OutputFormat::Csv => println!("{}", regions_to_csv(&policy.region_statuses())?),
        },
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

/// RUST_LOG takes precedence over the configured filter.
fn init_tracing(configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &Path) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn print_loan(
    inputs: &LoanInputs,
    result: &LoanResult,
    policy: &PolicyTable,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_loan_table(inputs, result, policy)),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => println!("{}", loan_to_csv(result)?),
    }
    Ok(())
}

fn print_fit(result: &QualitativeResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_fit_table(result)),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => println!("{}", fit_to_csv(result)?),
    }
    Ok(())
}

fn print_whatif(result: &WhatIfResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_whatif_table(result)),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => {
            warn!("CSV output for whatif not implemented, using JSON");
            println!("{}", render_json(result)?);
        }
    }
    Ok(())
}

fn print_policy_diff(diff: &PolicyDiff, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_policy_diff_table(diff)),
        OutputFormat::Json => println!("{}", render_json(diff)?),
        OutputFormat::Csv => println!("{}", policy_diff_to_csv(diff)?),
    }
    Ok(())
}
