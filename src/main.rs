use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand, value_parser};
use projscan::{
    CommandContext, SnapshotConfig,
    commands::{
        ActiveCommand, BlameCommand, Command as CommandTrait, DiffCommand, HeatmapCommand,
        LogCommand, ParseCommand, ReposCommand, ShowCommand,
        traits::{
            ActiveArgs, BlameArgs, DiffArgs, HeatmapArgs, LogArgs, ParseArgs, ReposArgs, ShowArgs,
        },
    },
    i18n::{current_language, setup_i18n},
    services::{LogFilter, ParseKind, is_error},
};
use rust_i18n::t;
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

rust_i18n::i18n!("locales", fallback = "en");

const DEFAULT_LOG_COUNT: &str = "10";

fn dir_arg() -> Arg {
    Arg::new("dir")
        .help(t!("dir_help"))
        .value_parser(value_parser!(PathBuf))
        .default_value(".")
        .index(1)
}

fn parse_subcommand(kind: ParseKind, about: String) -> ClapCommand {
    ClapCommand::new(kind.as_str()).about(about).arg(dir_arg())
}

fn build_cli() -> ClapCommand {
    ClapCommand::new("projscan")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("app_about"))
        .long_about(t!("app_long_about"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help(t!("config_help")),
        )
        .arg(
            Arg::new("output_dir")
                .long("output-dir")
                .env("PROJSCAN_OUTPUT_DIR")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help(t!("output_dir_help")),
        )
        .arg(
            Arg::new("no_save")
                .long("no-save")
                .global(true)
                .action(ArgAction::SetTrue)
                .help(t!("no_save_help")),
        )
        .arg(
            Arg::new("no_gitignore")
                .long("no-gitignore")
                .global(true)
                .action(ArgAction::SetTrue)
                .help(t!("no_gitignore_help")),
        )
        .arg(
            Arg::new("top")
                .long("top")
                .global(true)
                .value_parser(value_parser!(usize))
                .help(t!("top_help")),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help(t!("verbose_help")),
        )
        .subcommand(parse_subcommand(ParseKind::Git, t!("git_about")))
        .subcommand(parse_subcommand(ParseKind::All, t!("all_about")))
        .subcommand(parse_subcommand(ParseKind::Java, t!("java_about")))
        .subcommand(parse_subcommand(ParseKind::Pom, t!("pom_about")))
        .subcommand(parse_subcommand(ParseKind::Html, t!("html_about")))
        .subcommand(parse_subcommand(ParseKind::Markdown, t!("markdown_about")))
        .subcommand(
            ClapCommand::new("repos")
                .about(t!("repos_about"))
                .arg(dir_arg()),
        )
        .subcommand(
            ClapCommand::new("log")
                .about(t!("log_about"))
                .arg(dir_arg())
                .arg(
                    Arg::new("number")
                        .short('n')
                        .long("number")
                        .value_parser(value_parser!(usize))
                        .default_value(DEFAULT_LOG_COUNT)
                        .help(t!("log_number_help")),
                )
                .arg(
                    Arg::new("author")
                        .long("author")
                        .help(t!("log_author_help")),
                )
                .arg(Arg::new("path").long("path").help(t!("log_path_help")))
                .arg(
                    Arg::new("long")
                        .short('l')
                        .long("long")
                        .action(ArgAction::SetTrue)
                        .help(t!("log_long_help")),
                ),
        )
        .subcommand(
            ClapCommand::new("show")
                .about(t!("show_about"))
                .arg(dir_arg())
                .arg(
                    Arg::new("rev")
                        .help(t!("show_rev_help"))
                        .required(true)
                        .index(2),
                ),
        )
        .subcommand(
            ClapCommand::new("diff")
                .about(t!("diff_about"))
                .arg(dir_arg())
                .arg(
                    Arg::new("old")
                        .help(t!("diff_old_help"))
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("new")
                        .help(t!("diff_new_help"))
                        .required(true)
                        .index(3),
                ),
        )
        .subcommand(
            ClapCommand::new("heatmap")
                .about(t!("heatmap_about"))
                .arg(dir_arg())
                .arg(
                    Arg::new("year")
                        .long("year")
                        .value_parser(value_parser!(i32))
                        .help(t!("heatmap_year_help")),
                ),
        )
        .subcommand(
            ClapCommand::new("active")
                .about(t!("active_about"))
                .arg(dir_arg())
                .arg(
                    Arg::new("number")
                        .short('n')
                        .long("number")
                        .value_parser(value_parser!(usize))
                        .help(t!("active_number_help")),
                ),
        )
        .subcommand(
            ClapCommand::new("blame")
                .about(t!("blame_about"))
                .arg(dir_arg())
                .arg(
                    Arg::new("file")
                        .help(t!("blame_file_help"))
                        .required(true)
                        .index(2),
                ),
        )
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file first, then environment and command line overrides
fn load_config(matches: &ArgMatches) -> Result<SnapshotConfig> {
    let path = matches.get_one::<PathBuf>("config");
    let mut config = SnapshotConfig::load(path.map(PathBuf::as_path))
        .with_context(|| t!("config_load_failed"))?;

    if let Some(output_dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = output_dir.clone();
    }
    if let Some(top) = matches.get_one::<usize>("top") {
        config.top_contributors = *top;
    }
    if matches.get_flag("no_save") {
        config.save_results = false;
    }
    if matches.get_flag("no_gitignore") {
        config.respect_gitignore = false;
    }
    Ok(config)
}

fn dir_of(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
}

fn string_of(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

/// Run the selected command; `Ok(false)` when a parse result reports an error
fn run() -> Result<bool> {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("verbose"));
    debug!(locale = current_language(), "starting");

    let config = load_config(&matches)?;
    let most_active_files = config.most_active_files;
    let context = CommandContext::new(config);

    match matches.subcommand() {
        Some(("repos", sub_matches)) => {
            let cmd = ReposCommand::new(context);
            let args = ReposArgs {
                dir: dir_of(sub_matches),
            };
            CommandTrait::execute(&cmd, args)?;
        }
        Some(("log", sub_matches)) => {
            let cmd = LogCommand::new(context);
            let args = LogArgs {
                dir: dir_of(sub_matches),
                filter: LogFilter {
                    max_count: sub_matches.get_one::<usize>("number").copied().unwrap_or(10),
                    author: sub_matches.get_one::<String>("author").cloned(),
                    path: sub_matches.get_one::<String>("path").cloned(),
                    long: sub_matches.get_flag("long"),
                },
            };
            CommandTrait::validate_args(&cmd, &args)?;
            CommandTrait::execute(&cmd, args)?;
        }
        Some(("show", sub_matches)) => {
            let cmd = ShowCommand::new(context);
            let args = ShowArgs {
                dir: dir_of(sub_matches),
                rev: string_of(sub_matches, "rev"),
            };
            CommandTrait::validate_args(&cmd, &args)?;
            CommandTrait::execute(&cmd, args)?;
        }
        Some(("diff", sub_matches)) => {
            let cmd = DiffCommand::new(context);
            let args = DiffArgs {
                dir: dir_of(sub_matches),
                old: string_of(sub_matches, "old"),
                new: string_of(sub_matches, "new"),
            };
            CommandTrait::validate_args(&cmd, &args)?;
            CommandTrait::execute(&cmd, args)?;
        }
        Some(("heatmap", sub_matches)) => {
            let cmd = HeatmapCommand::new(context);
            let args = HeatmapArgs {
                dir: dir_of(sub_matches),
                year: sub_matches
                    .get_one::<i32>("year")
                    .copied()
                    .unwrap_or_else(|| Local::now().year()),
            };
            CommandTrait::validate_args(&cmd, &args)?;
            CommandTrait::execute(&cmd, args)?;
        }
        Some(("active", sub_matches)) => {
            let cmd = ActiveCommand::new(context);
            let args = ActiveArgs {
                dir: dir_of(sub_matches),
                limit: sub_matches
                    .get_one::<usize>("number")
                    .copied()
                    .unwrap_or(most_active_files),
            };
            CommandTrait::validate_args(&cmd, &args)?;
            CommandTrait::execute(&cmd, args)?;
        }
        Some(("blame", sub_matches)) => {
            let cmd = BlameCommand::new(context);
            let args = BlameArgs {
                dir: dir_of(sub_matches),
                path: string_of(sub_matches, "file"),
            };
            CommandTrait::validate_args(&cmd, &args)?;
            CommandTrait::execute(&cmd, args)?;
        }
        Some((name, sub_matches)) => {
            let kind: ParseKind = name.parse()?;
            let cmd = ParseCommand::new(context);
            let args = ParseArgs {
                kind,
                dir: dir_of(sub_matches),
            };
            let result = CommandTrait::execute(&cmd, args)?;
            return Ok(!is_error(&result));
        }
        None => unreachable!(),
    }

    Ok(true)
}

fn main() {
    setup_i18n();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("{}: {error}", t!("error_prefix"));

            let mut source = error.source();
            let mut level = 1;
            while let Some(err) = source {
                eprintln!(
                    "   {} {}: {}",
                    "  ".repeat(level),
                    t!("error_cause_prefix"),
                    err
                );
                source = err.source();
                level += 1;
            }

            eprintln!();
            eprintln!("{}", t!("error_tip"));
            process::exit(1);
        }
    }
}
