//! `mm`: validate and inspect model definitions

mod commands;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use commands::Workspace;
use mm_actions::ModelManagementConfig;
use mm_model::ModelFilter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    let models = Arg::new("models")
        .long("models")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Model definitions JSON");
    let meta = Arg::new("meta")
        .long("meta")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Attribute metadata JSON");
    let config = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Model management config (TOML)");
    let json = Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON");

    Command::new("mm")
        .version(mm_actions::VERSION)
        .about("Model management definition tools")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate every attribute of every definition and class")
                .arg(models.clone())
                .arg(meta.clone())
                .arg(config.clone())
                .arg(json.clone()),
        )
        .subcommand(
            Command::new("fields")
                .about("List the effective fields of a definition")
                .arg(models)
                .arg(meta)
                .arg(config)
                .arg(json)
                .arg(
                    Arg::new("definition")
                        .long("definition")
                        .required(true)
                        .help("Definition id"),
                )
                .arg(
                    Arg::new("term")
                        .long("term")
                        .default_value("")
                        .help("Only fields whose label contains this text"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Include system and hidden fields"),
                )
                .arg(
                    Arg::new("local")
                        .long("local")
                        .action(ArgAction::SetTrue)
                        .help("Hide inherited fields"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load(args: &ArgMatches) -> Result<(Workspace, ModelManagementConfig)> {
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => ModelManagementConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ModelManagementConfig::default(),
    };
    let models = args
        .get_one::<PathBuf>("models")
        .context("--models is required")?;
    let meta = args
        .get_one::<PathBuf>("meta")
        .context("--meta is required")?;
    Ok((Workspace::load(models, meta)?, config))
}

fn run_validate(args: &ArgMatches) -> Result<ExitCode> {
    let (mut workspace, config) = load(args)?;
    let report = commands::validate(&mut workspace, &config)?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_fields(args: &ArgMatches) -> Result<ExitCode> {
    let (mut workspace, config) = load(args)?;
    let definition = args
        .get_one::<String>("definition")
        .context("--definition is required")?;
    let all = args.get_flag("all");
    let filter = ModelFilter::default()
        .with_term(args.get_one::<String>("term").cloned().unwrap_or_default())
        .with_system(all)
        .with_hidden(all)
        .with_inherited(!args.get_flag("local"));

    let rows = commands::list_fields(&mut workspace, definition, &filter, &config.default_language)
        .with_context(|| {
            format!(
                "known definitions: {}",
                commands::definition_ids(&workspace).join(", ")
            )
        })?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{row}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("validate", args)) => run_validate(args),
        Some(("fields", args)) => run_fields(args),
        _ => Ok(ExitCode::FAILURE),
    }
}
