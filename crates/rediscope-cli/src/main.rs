// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::{APP_NAME, Config};
use rediscope_tui::RunOptions;
use runtime::SystemClipboard;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.show_version {
        println!("{APP_NAME} {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `{APP_NAME} --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let settings = config.session_settings()?;
    let refresh_interval = config.refresh_interval()?;

    let log_path = options.log_file.clone().unwrap_or_else(|| config.log_path());
    logging::init(&log_path, config.log_level()).with_context(|| {
        format!(
            "start logging to {}; set [log].path or REDISCOPE_LOG_PATH to a writable file",
            log_path.display()
        )
    })?;
    tracing::info!(config = %options.config_path.display(), "starting");

    let url = config.redis_url();
    let store = runtime::connect(&url, settings.database_count)
        .context("is the server running? set REDIS_URL or [redis].url to point at it")?;

    if options.check_only {
        println!("ok: connected to {}", store.endpoint());
        return Ok(());
    }

    rediscope_tui::run_app(
        store,
        Box::new(SystemClipboard),
        RunOptions {
            settings,
            refresh_interval,
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    log_file: Option<PathBuf>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    show_version: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        log_file: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
        show_version: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--log-file" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--log-file requires a file path"))?;
                options.log_file = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--version" | "-V" => {
                options.show_version = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("{APP_NAME}: browse and edit a redis server from the terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --log-file <path>        Write the session log to this file");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and connect, then exit");
    println!("  --version                Show version");
    println!("  --help                   Show this help");
    println!();
    println!("REDIS_URL overrides [redis].url, for example redis://:secret@127.0.0.1:6379/0");
}
