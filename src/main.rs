mod logging;

use std::{path::PathBuf, process};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::Parser;
use tracing::info;
use zmanim_dsl::{
    CalculationContext, Compilation, FormulaRegistry, RegistrySnapshot, batch::evaluate_all, check,
    config::ZmanimConfig, evaluate, validate_named,
};

/// zmanim evaluates formulas for daily times of Jewish law at a date and
/// place.
#[derive(Parser, Debug)]
#[command(name = "zmanim", version, about, long_about = None)]
struct Args {
    /// TOML file with engine settings and named formulas.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Adds or replaces a named formula, e.g. `-D alos="solar(16.1, before_sunrise)"`.
    #[arg(short = 'D', long = "define", value_name = "NAME=SRC", value_parser = parse_define)]
    defines: Vec<(String, String)>,

    /// Calculation date (YYYY-MM-DD).
    #[arg(long)]
    date: NaiveDate,

    /// Latitude in degrees, north positive.
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in degrees, east positive.
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Elevation in meters above sea level.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    elevation: f64,

    /// IANA time zone the results are reported in.
    #[arg(long, default_value = "UTC", value_parser = parse_timezone)]
    tz: Tz,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Formulas to evaluate; `@name` evaluates a named formula. Without
    /// targets every named formula is evaluated.
    targets: Vec<String>,
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (name, source) = raw.split_once('=')
                            .ok_or_else(|| format!("expected NAME=SRC, found `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing formula name in `{raw}`"));
    }
    Ok((name.to_string(), source.to_string()))
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.parse().map_err(|_| format!("unknown time zone `{raw}`"))
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let ZmanimConfig { engine, formulas } = match &args.config {
        Some(path) => ZmanimConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => ZmanimConfig::default(),
    };

    let registry: FormulaRegistry = formulas.into_iter().chain(args.defines).collect();
    let snapshot = registry.snapshot();
    info!(formulas = snapshot.len(), depth_budget = engine.depth_budget, "registry loaded");

    let context = CalculationContext::new(args.date, args.lat, args.lon, args.elevation, args.tz)
        .context("invalid calculation context")?;

    let mut rejected = report_registry(&snapshot);

    if args.targets.is_empty() {
        for (name, result) in evaluate_all(&context, &snapshot, &engine) {
            match result {
                Ok(time) => println!("{name}: {time}"),
                Err(error) => println!("{name}: unavailable ({error})"),
            }
        }
    }

    for target in &args.targets {
        let compilation = check(target, &snapshot);
        if !report(target, target, &compilation) {
            rejected += 1;
            continue;
        }
        let Some(ast) = &compilation.ast else { continue };

        match evaluate(ast, &context, &snapshot, engine.depth_budget) {
            Ok(time) => println!("{target}: {time}"),
            Err(error) => println!("{target}: unavailable ({error})"),
        }
    }

    if rejected > 0 {
        bail!("{rejected} formula(s) rejected");
    }
    Ok(())
}

/// Prints the diagnostics of every named formula and returns how many were
/// rejected.
fn report_registry(snapshot: &RegistrySnapshot) -> usize {
    let mut rejected = 0;
    for name in snapshot.names() {
        let Some(entry) = snapshot.get(name) else { continue };
        let mut compilation = entry.compilation().clone();
        if let Some(ast) = &compilation.ast {
            compilation.diagnostics.extend(validate_named(name, ast, snapshot));
        }
        if !report(&format!("@{name}"), entry.source(), &compilation) {
            rejected += 1;
        }
    }
    rejected
}

/// Prints the diagnostics of `compilation` and returns whether it was
/// accepted.
fn report(label: &str, source: &str, compilation: &Compilation) -> bool {
    for diagnostic in &compilation.diagnostics {
        eprintln!("in {label}:\n{}", diagnostic.render(source));
    }
    compilation.is_accepted()
}
