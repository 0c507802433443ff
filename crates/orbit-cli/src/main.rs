//! `orbit` - host and inspect Orbit task components

mod commands;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use commands::RunOptions;
use orbit_core::CYCLE_SOURCE_MODEL;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("orbit")
        .version(orbit_core::VERSION)
        .about("Host and inspect Orbit dataflow task components")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Deploy a cycle source and print the cycles it publishes")
                .arg(
                    Arg::new("cycles")
                        .long("cycles")
                        .default_value("10")
                        .value_parser(value_parser!(u64))
                        .help("Number of cycles to receive"),
                )
                .arg(
                    Arg::new("period-ms")
                        .long("period-ms")
                        .value_parser(value_parser!(u64))
                        .help("Trigger periodically instead of back to back"),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .default_value("source")
                        .help("Name of the deployed task"),
                )
                .arg(
                    Arg::new("buffer")
                        .long("buffer")
                        .default_value("16")
                        .value_parser(value_parser!(usize))
                        .help("Reader buffer size; 0 keeps only the latest sample"),
                ),
        )
        .subcommand(
            Command::new("describe")
                .about("Print the summary of a cycle source")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .default_value("source")
                        .help("Name of the described task"),
                ),
        )
        .subcommand(
            Command::new("conf")
                .about("Print the resolved configuration of a task model")
                .arg(
                    Arg::new("models")
                        .long("models")
                        .value_parser(value_parser!(PathBuf))
                        .help("YAML file describing task models"),
                )
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of configuration files"),
                )
                .arg(
                    Arg::new("model")
                        .long("model")
                        .default_value(CYCLE_SOURCE_MODEL)
                        .help("Task model name"),
                )
                .arg(
                    Arg::new("override")
                        .long("override")
                        .action(ArgAction::SetTrue)
                        .help("Let later sections override earlier values"),
                )
                .arg(
                    Arg::new("sections")
                        .num_args(0..)
                        .help("Sections to merge, in order"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("run", args)) => {
            let options = RunOptions {
                name: args.get_one::<String>("name").cloned().unwrap_or_default(),
                cycles: args.get_one::<u64>("cycles").copied().unwrap_or_default(),
                period: args.get_one::<u64>("period-ms").copied().map(Duration::from_millis),
                buffer: args.get_one::<usize>("buffer").copied().unwrap_or_default(),
            };
            let last = commands::run(&options, |cycle| println!("cycle: {cycle}")).await?;
            tracing::info!(task = %options.name, last, "run finished");
        }
        Some(("describe", args)) => {
            let name = args.get_one::<String>("name").map_or("source", String::as_str);
            print!("{}", commands::describe(name));
        }
        Some(("conf", args)) => {
            let sections: Vec<String> = args
                .get_many::<String>("sections")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let yaml = commands::conf(
                args.get_one::<PathBuf>("models").map(PathBuf::as_path),
                args.get_one::<PathBuf>("dir").map_or_else(|| std::path::Path::new("."), PathBuf::as_path),
                args.get_one::<String>("model").map_or(CYCLE_SOURCE_MODEL, String::as_str),
                &sections,
                args.get_flag("override"),
            )?;
            print!("{yaml}");
        }
        _ => {}
    }
    Ok(())
}
