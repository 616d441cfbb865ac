//! Fleet charging entry point — CLI wiring and config-driven engine runs.

use std::path::Path;
use std::process;

use fleet_charge::baseline::{off_peak_fleet, plug_and_charge_fleet};
use fleet_charge::config::ScenarioConfig;
use fleet_charge::engine::{BestResponseEngine, EngineReport};
use fleet_charge::grid::{DispatchModel, GenerationStack};
use fleet_charge::io::export::{export_schedule_csv, export_trace_csv};
use fleet_charge::io::load::{read_fixed_load_csv, read_sessions_csv};
use fleet_charge::report::RunReport;
use fleet_charge::schedule::FleetSchedule;
use fleet_charge::session::SLOTS_PER_DAY;
use fleet_charge::solver::{LinearProgram, MeritOrderMilp, Strategy, WaterFilling};

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    strategy_override: Option<String>,
    seed_override: Option<u64>,
    sessions_csv: Option<String>,
    schedule_out: Option<String>,
    trace_out: Option<String>,
}

fn print_help() {
    eprintln!("fleet-charge — EV fleet charging against a merit-order emissions model");
    eprintln!();
    eprintln!("Usage: fleet-charge [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline)");
    eprintln!("  --strategy <name>        Override solver strategy (water-filling, lp, milp)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --sessions <path>        Load vehicle sessions from CSV");
    eprintln!("  --schedule-out <path>    Export final fleet schedule to CSV");
    eprintln!("  --trace-out <path>       Export iteration trace to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        strategy_override: None,
        seed_override: None,
        sessions_csv: None,
        schedule_out: None,
        trace_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--strategy" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --strategy requires a name argument");
                    process::exit(1);
                }
                cli.strategy_override = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--sessions" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --sessions requires a path argument");
                    process::exit(1);
                }
                cli.sessions_csv = Some(args[i].clone());
            }
            "--schedule-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --schedule-out requires a path argument");
                    process::exit(1);
                }
                cli.schedule_out = Some(args[i].clone());
            }
            "--trace-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --trace-out requires a path argument");
                    process::exit(1);
                }
                cli.trace_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Runs the configured scenario and returns the engine report.
fn run_scenario(scenario: &ScenarioConfig, fixed_load_kw: Vec<f64>) -> EngineReport {
    let model = DispatchModel::new(GenerationStack::french_2019());
    let sessions = scenario.sessions();
    let initial = FleetSchedule::random(sessions.len(), scenario.engine.seed);
    let e = &scenario.engine;

    match scenario.strategy() {
        Strategy::WaterFilling => {
            let solver = match scenario.charging.power_increment_kw {
                Some(increment) => WaterFilling::with_increment(increment),
                None => WaterFilling::new(),
            };
            BestResponseEngine::new(
                model,
                solver,
                fixed_load_kw,
                sessions,
                e.eta,
                e.max_sweeps,
                e.stabilizer_tolerance,
            )
            .run(initial)
        }
        Strategy::LinearProgram => BestResponseEngine::new(
            model,
            LinearProgram,
            fixed_load_kw,
            sessions,
            e.eta,
            e.max_sweeps,
            e.stabilizer_tolerance,
        )
        .run(initial),
        Strategy::MeritOrderMilp => BestResponseEngine::new(
            model,
            MeritOrderMilp,
            fixed_load_kw,
            sessions,
            e.eta,
            e.max_sweeps,
            e.stabilizer_tolerance,
        )
        .run(initial),
    }
}

fn main() {
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    // Apply CLI overrides
    if let Some(ref name) = cli.strategy_override {
        scenario.engine.strategy = name.clone();
    }
    if let Some(seed) = cli.seed_override {
        scenario.engine.seed = seed;
    }
    if let Some(ref path) = cli.sessions_csv {
        match read_sessions_csv(Path::new(path)) {
            Ok(vehicles) => scenario.vehicles = vehicles,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Resolve the fixed load: CSV override first, then in-config profile
    let fixed_load_kw = if let Some(ref path) = scenario.grid.fixed_load_csv {
        match read_fixed_load_csv(Path::new(path)) {
            Ok(profile) => profile,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        scenario.fixed_load_profile()
    };

    // Run
    let run = run_scenario(&scenario, fixed_load_kw.clone());

    // Report
    let model = DispatchModel::new(GenerationStack::french_2019());
    let report = RunReport::from_run(&model, &fixed_load_kw, &run);
    println!("{report}");

    // Baseline strategy comparison
    let sessions = scenario.sessions();
    let baseline_tons = report.baseline_tons;
    println!("\n--- Strategy Comparison (added t CO2) ---");
    for (name, fleet) in [
        ("plug-and-charge", plug_and_charge_fleet(&sessions)),
        ("off-peak", off_peak_fleet(&sessions)),
    ] {
        let fleet_total = fleet.total_load_kw();
        let combined: Vec<f64> = (0..SLOTS_PER_DAY)
            .map(|slot| fixed_load_kw[slot] + fleet_total[slot])
            .collect();
        let added = model.profile_emissions_tons(&combined) - baseline_tons;
        println!("{name:>20}: {added:.4}");
    }
    println!(
        "{:>20}: {:.4}",
        scenario.engine.strategy, report.added_tons
    );

    // Exports
    if let Some(ref path) = cli.schedule_out {
        if let Err(e) = export_schedule_csv(&run.schedule, &fixed_load_kw, Path::new(path)) {
            eprintln!("error: failed to write schedule CSV: {e}");
            process::exit(1);
        }
        eprintln!("Schedule written to {path}");
    }
    if let Some(ref path) = cli.trace_out {
        if let Err(e) = export_trace_csv(&run.trace, Path::new(path)) {
            eprintln!("error: failed to write trace CSV: {e}");
            process::exit(1);
        }
        eprintln!("Trace written to {path}");
    }
}
