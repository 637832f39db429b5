//! `sole` command-line harness
//!
//! Runs concurrent callers against one singleton strategy and exits 0 only
//! if the report passed.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sole_cell::StrategyKind;
use sole_harness::{Harness, HarnessConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let strategy = Arg::new("strategy")
        .long("strategy")
        .short('s')
        .value_parser(value_parser!(StrategyKind))
        .help("Construction strategy: eager, synchronized, guarded, holder, optimistic");
    let callers = Arg::new("callers")
        .long("callers")
        .short('n')
        .value_parser(value_parser!(usize))
        .help("Number of concurrent callers");
    let delay = Arg::new("delay-ms")
        .long("delay-ms")
        .value_parser(value_parser!(u64))
        .help("Simulated construction delay in milliseconds");

    Command::new("sole")
        .version(sole_harness::VERSION)
        .about("Concurrent harness for lazy singleton strategies")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML config file; flags override its values"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the report as JSON"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("run")
                .about("All callers request the instance built by the default factory")
                .arg(strategy.clone())
                .arg(callers.clone())
                .arg(delay.clone())
                .arg(
                    Arg::new("label")
                        .long("label")
                        .help("Instance label; defaults to the strategy's label"),
                ),
        )
        .subcommand(
            Command::new("race")
                .about("Callers offer competing labels; the first constructor wins")
                .arg(strategy.clone())
                .arg(callers)
                .arg(delay.clone())
                .arg(
                    Arg::new("labels")
                        .long("labels")
                        .value_delimiter(',')
                        .num_args(1..)
                        .help("Comma-separated labels, e.g. A,B"),
                ),
        )
        .subcommand(
            Command::new("interrupt")
                .about("Interrupt the constructor mid-delay, then retry")
                .arg(strategy)
                .arg(delay),
        )
}

fn setup_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the config file (if any) and apply subcommand flags over it
fn load_config(args: &ArgMatches) -> Result<HarnessConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    if let Ok(Some(strategy)) = args.try_get_one::<StrategyKind>("strategy") {
        config.strategy = *strategy;
    }
    if let Ok(Some(callers)) = args.try_get_one::<usize>("callers") {
        config.callers = *callers;
    }
    if let Ok(Some(delay)) = args.try_get_one::<u64>("delay-ms") {
        config.construction_delay_ms = *delay;
    }
    if let Ok(Some(label)) = args.try_get_one::<String>("label") {
        config.label = Some(label.clone());
    }
    if let Ok(Some(labels)) = args.try_get_many::<String>("labels") {
        config.labels = labels.cloned().collect();
    }

    config.validate()?;
    Ok(config)
}

fn print<R: serde::Serialize>(report: &R, text: String, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{text}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let log_json = matches
        .subcommand()
        .is_some_and(|(_, args)| args.get_flag("log-json"));
    setup_tracing(log_json);

    let passed = match matches.subcommand() {
        Some(("run", args)) => {
            let json = args.get_flag("json");
            let report = Harness::new(load_config(args)?)?.run()?;
            print(&report, report.generate_text(), json)?;
            report.passed()
        }
        Some(("race", args)) => {
            let json = args.get_flag("json");
            let report = Harness::new(load_config(args)?)?.race()?;
            print(&report, report.generate_text(), json)?;
            report.passed()
        }
        Some(("interrupt", args)) => {
            let json = args.get_flag("json");
            let report = Harness::new(load_config(args)?)?.run_interrupted()?;
            print(&report, report.generate_text(), json)?;
            report.passed()
        }
        Some((other, _)) => bail!("unknown subcommand '{other}'"),
        None => bail!("no subcommand given"),
    };

    std::process::exit(if passed { 0 } else { 1 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let matches = cli()
            .try_get_matches_from(["sole", "run", "--strategy", "synchronized", "-n", "7", "--delay-ms", "3"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        let config = load_config(args).unwrap();

        assert_eq!(name, "run");
        assert_eq!(config.strategy, StrategyKind::Synchronized);
        assert_eq!(config.callers, 7);
        assert_eq!(config.construction_delay_ms, 3);
    }

    #[test]
    fn race_labels_split_on_commas() {
        let matches = cli()
            .try_get_matches_from(["sole", "race", "--labels", "A,B,C"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(load_config(args).unwrap().labels, vec!["A", "B", "C"]);
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(cli().try_get_matches_from(["sole"]).is_err());
    }

    #[test]
    fn zero_callers_flag_fails_validation() {
        let matches = cli()
            .try_get_matches_from(["sole", "run", "--callers", "0"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert!(load_config(args).is_err());
    }
}
