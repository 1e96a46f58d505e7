//! Plantledger
//!
//! Monthly indirect-cost accounting for a small workshop: electricity,
//! depreciation and manual expenses, kept in a directory of YAML files.

mod config;
mod plotting;
mod report;
mod store;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use plantledger_core::{
    events::{EventBus, LedgerEvent, Topic},
    export,
    plan::{PlanTree, SubtaskPatch},
    service::ExpenseService,
    store::LedgerStore,
    LedgerError, Period,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;
use crate::store::YamlStore;

#[derive(Parser)]
#[command(name = "plantledger")]
#[command(about = "Monthly cost rollups for a small manufacturing shop")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "plantledger.yaml")]
    config: PathBuf,

    /// Overrides the data directory from the configuration
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stored (or blank) month with freshly computed costs
    Show {
        year: i32,
        /// Calendar month, 1-12
        month: u32,

        /// Print the rollup as JSON instead of a report
        #[arg(long)]
        json: bool,

        /// Also draw the energy breakdown chart
        #[arg(long)]
        chart: bool,
    },

    /// Compute a month with overridden inputs without saving anything
    Rollup {
        year: i32,
        /// Calendar month, 1-12
        month: u32,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        income: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// Recompute a month and store it; unspecified fields keep their stored values
    Save {
        year: i32,
        /// Calendar month, 1-12
        month: u32,

        #[arg(long)]
        rent: Option<f64>,

        #[arg(long)]
        supplies: Option<f64>,

        #[arg(long)]
        cleaning: Option<f64>,

        #[arg(long)]
        repairs: Option<f64>,

        /// Water and other utilities
        #[arg(long)]
        water: Option<f64>,

        /// Price per kWh
        #[arg(long)]
        price: Option<f64>,

        /// Total income for the month
        #[arg(long)]
        income: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Print a table of every stored month in a year
    Summary {
        year: i32,

        /// Also draw the yearly expense chart
        #[arg(long)]
        chart: bool,
    },

    /// Write every stored month to a CSV file
    Export {
        /// Output path; defaults to `<output_dir>/expenses.csv`
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Inspect or edit strategic plans
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// List every plan with its progress
    List,

    /// Show one plan as a tree
    Show { plan_id: String },

    /// Add a subtask
    Add {
        plan_id: String,
        title: String,

        /// Parent subtask; top level when omitted
        #[arg(long)]
        parent: Option<String>,

        /// Position among the siblings; appended when omitted
        #[arg(long)]
        index: Option<usize>,
    },

    /// Mark a subtask done (or not done with --undo)
    Done {
        plan_id: String,
        subtask_id: String,

        #[arg(long)]
        undo: bool,
    },

    /// Rename a subtask
    Rename {
        plan_id: String,
        subtask_id: String,
        title: String,
    },

    /// Remove a subtask and everything beneath it
    Remove { plan_id: String, subtask_id: String },

    /// Move a subtask (with its subtree) under another parent
    Move {
        plan_id: String,
        subtask_id: String,

        /// New parent subtask; top level when omitted
        #[arg(long)]
        parent: Option<String>,

        #[arg(long)]
        index: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    init_tracing(&config);

    let store = YamlStore::open(&config.data_dir)?;
    let bus = EventBus::new();
    let saved_events = bus.subscribe(Topic::Expenses);
    let plan_events = bus.subscribe(Topic::Plans);
    let mut service = ExpenseService::new(store)
        .with_event_bus(bus.clone())
        .with_default_price_per_kwh(config.default_price_per_kwh);

    match cli.command {
        Commands::Show {
            year,
            month,
            json,
            chart,
        } => {
            let period = calendar_period(year, month)?;
            let (record, rollup) = service.load_monthly_expense(period)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rollup)?);
            } else {
                let text = render(|out| {
                    report::write_monthly_report(out, &record, &rollup, &config.currency)
                })?;
                print!("{}", text);
            }
            if chart {
                let dir = ensure_output_dir(&config)?;
                let path = plotting::plot_energy_breakdown(&dir, &rollup)?;
                println!("Chart written to {}", path.display());
            }
        }

        Commands::Rollup {
            year,
            month,
            price,
            income,
            json,
        } => {
            let period = calendar_period(year, month)?;
            let (mut record, _) = service.load_monthly_expense(period)?;
            if price.is_some() {
                record.price_per_kwh = price;
            }
            if income.is_some() {
                record.total_income = income;
            }
            let rollup = service.refresh(&mut record)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rollup)?);
            } else {
                let text = render(|out| {
                    report::write_monthly_report(out, &record, &rollup, &config.currency)
                })?;
                print!("{}", text);
                println!("(preview only, nothing was saved)");
            }
        }

        Commands::Save {
            year,
            month,
            rent,
            supplies,
            cleaning,
            repairs,
            water,
            price,
            income,
            notes,
        } => {
            let period = calendar_period(year, month)?;
            let (mut draft, _) = service.load_monthly_expense(period)?;
            let fields = [
                (&mut draft.rent, rent),
                (&mut draft.supplies, supplies),
                (&mut draft.cleaning, cleaning),
                (&mut draft.repairs, repairs),
                (&mut draft.water_utilities, water),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    *field = value;
                }
            }
            if price.is_some() {
                draft.price_per_kwh = price;
            }
            if income.is_some() {
                draft.total_income = income;
            }
            if notes.is_some() {
                draft.notes = notes;
            }

            match service.save_monthly_expense(&mut draft) {
                Ok(saved) => {
                    let (_, rollup) = service.load_monthly_expense(period)?;
                    let text = render(|out| {
                        report::write_monthly_report(out, &saved, &rollup, &config.currency)
                    })?;
                    print!("{}", text);
                    println!("Saved {}.", saved.id);
                }
                Err(e @ LedgerError::SaveFailed { .. }) => {
                    warn!(period = %draft.id, error = %e, "save failed; showing unsaved values");
                    println!(
                        "Unsaved totals for {}: {:.2} kWh, electricity {:.2}, depreciation {:.2}, total {:.2} {}",
                        draft.id,
                        draft.total_electricity_kwh,
                        draft.electricity_cost,
                        draft.depreciation,
                        draft.total_expenses,
                        config.currency
                    );
                    return Err(e).with_context(|| format!("Failed to save {}", draft.id));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Summary { year, chart } => {
            let summary = service.yearly_summary(year)?;
            let text = render(|out| {
                report::write_yearly_summary(out, &summary, &config.currency)
            })?;
            print!("{}", text);
            if chart && !summary.months.is_empty() {
                let dir = ensure_output_dir(&config)?;
                let path = plotting::plot_yearly_expenses(&dir, &summary)?;
                println!("Chart written to {}", path.display());
            }
        }

        Commands::Export { out } => {
            let path = match out {
                Some(path) => path,
                None => ensure_output_dir(&config)?.join("expenses.csv"),
            };
            let mut records = service.store().fetch_monthly_expenses()?;
            for record in &mut records {
                service.refresh(record)?;
            }
            let written = export::export_expenses(&path, &records)?;
            info!(path = %path.display(), rows = written, "exported monthly expenses");
            println!("Exported {} months to {}", written, path.display());
        }

        Commands::Plan { action } => run_plan_action(service.store(), &bus, action)?,
    }

    for event in saved_events.try_iter().chain(plan_events.try_iter()) {
        debug!(event = %event.to_json()?, "ledger event");
    }
    Ok(())
}

fn run_plan_action(store: &YamlStore, bus: &EventBus, action: PlanAction) -> Result<()> {
    let plans = store.plans()?;
    let load = |plan_id: &str| -> Result<PlanTree> {
        let Some(plan) = plans.get(plan_id) else {
            bail!("No plan with id '{}'", plan_id);
        };
        Ok(PlanTree::from_plan(plan)?)
    };

    let plan_id = match &action {
        PlanAction::List => {
            if plans.is_empty() {
                println!("No plans found.");
            }
            for (plan_id, plan) in &plans {
                let progress = PlanTree::from_plan(plan)?
                    .progress()
                    .map_or_else(|| "-".to_string(), |p| format!("{:.0}%", p * 100.0));
                println!("{:<16} {:>5}  {}", plan_id, progress, plan.title);
            }
            return Ok(());
        }
        PlanAction::Show { plan_id } => {
            let tree = load(plan_id)?;
            print!("{}", render(|out| report::write_plan(out, &tree))?);
            return Ok(());
        }
        PlanAction::Add { plan_id, .. }
        | PlanAction::Done { plan_id, .. }
        | PlanAction::Rename { plan_id, .. }
        | PlanAction::Remove { plan_id, .. }
        | PlanAction::Move { plan_id, .. } => plan_id.clone(),
    };
    let mut tree = load(&plan_id)?;

    match action {
        PlanAction::Add {
            title,
            parent,
            index,
            ..
        } => {
            let id = tree.insert(parent.as_deref(), index, &title)?;
            println!("Added subtask {}", id);
        }
        PlanAction::Done {
            subtask_id, undo, ..
        } => {
            let patch = SubtaskPatch {
                completed: Some(!undo),
                ..Default::default()
            };
            tree.update(&subtask_id, patch)?;
        }
        PlanAction::Rename {
            subtask_id, title, ..
        } => {
            let patch = SubtaskPatch {
                title: Some(title),
                ..Default::default()
            };
            tree.update(&subtask_id, patch)?;
        }
        PlanAction::Remove { subtask_id, .. } => {
            let removed = tree.remove(&subtask_id)?;
            println!("Removed {} subtask(s)", removed.len());
        }
        PlanAction::Move {
            subtask_id,
            parent,
            index,
            ..
        } => tree.move_to(&subtask_id, parent.as_deref(), index)?,
        PlanAction::List | PlanAction::Show { .. } => return Ok(()),
    }

    let path = store.save_plan(&tree.to_plan())?;
    info!(plan = %tree.plan_id(), path = %path.display(), "plan updated");
    bus.publish(LedgerEvent::PlanChanged {
        plan_id: tree.plan_id().to_string(),
    });
    print!("{}", render(|out| report::write_plan(out, &tree))?);
    Ok(())
}

/// Collects the output of a report writer.
fn render(write: impl FnOnce(&mut String) -> std::fmt::Result) -> Result<String> {
    let mut text = String::new();
    write(&mut text)?;
    Ok(text)
}

/// Converts a 1-based calendar month from the command line into a `Period`.
fn calendar_period(year: i32, month: u32) -> Result<Period> {
    let Some(index) = month.checked_sub(1) else {
        bail!("month must be between 1 and 12, got {}", month);
    };
    Ok(Period::new(year, index)?)
}

fn ensure_output_dir(config: &AppConfig) -> Result<PathBuf> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory: {:?}", config.output_dir)
    })?;
    Ok(config.output_dir.clone())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
