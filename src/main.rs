/*!
 * Command-line interface for codemap-extract
 */

use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use chrono::Local;
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use codemap_extract::config::{Args, Config};
use codemap_extract::error::{ExtractError, Result};
use codemap_extract::extract::{discover, Extraction};
use codemap_extract::library::PythonEnvironment;
use codemap_extract::prompt::{parse_file_types, parse_libraries, Prompter};
use codemap_extract::report::Reporter;
use codemap_extract::rules::IgnoreRules;
use codemap_extract::types::RunRequest;
use codemap_extract::utils::expand_home;

type StdPrompter = Prompter<io::StdinLock<'static>, io::Stdout>;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut command = Args::command();
        clap_complete::generate(shell, &mut command, "codemap-extract", &mut io::stdout());
        return;
    }

    setup_logging(args.quiet, args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", level);
}

fn run(args: Args) -> Result<()> {
    // Settings are read once here and written once at the end
    let mut config = Config::load(&args.config, &args.ignore_file)?;
    let rules = IgnoreRules::from_config(&config)?;
    let mut prompter = (!args.no_prompt).then(Prompter::stdio);

    let root = resolve_directory(
        args.root.as_deref(),
        config.last_directory.as_deref(),
        prompter.as_mut(),
        "Enter the application's root directory to analyze",
    )?;
    let output_dir = resolve_directory(
        args.output.as_deref(),
        config.last_output_directory.as_deref(),
        prompter.as_mut(),
        "Enter the output directory",
    )?;

    println!("\nAnalyzing directory structure. This may take a bit for large codebases...");
    let discovery = discover(&root, &output_dir, &rules)?;

    let file_types = match (args.types.as_deref(), prompter.as_mut()) {
        (Some(input), _) => parse_file_types(input, &discovery.file_types)?,
        (None, Some(prompter)) => prompter.choose_file_types(&discovery.file_types)?,
        (None, None) => discovery.file_types.clone(),
    };
    let libraries = match (args.libraries.as_deref(), prompter.as_mut()) {
        (Some(input), _) => parse_libraries(input, &discovery.libraries)?,
        (None, Some(prompter)) => prompter.choose_libraries(&discovery.libraries)?,
        (None, None) => Vec::new(),
    };
    log::info!(
        "Selected {} file types and {} libraries",
        file_types.len(),
        libraries.len()
    );

    // Only ask the interpreter for its search path when something will be resolved
    let resolver = if libraries.is_empty() {
        PythonEnvironment::default()
    } else {
        PythonEnvironment::from_config(&config)
    };

    let progress = create_progress(args.quiet);
    let request = RunRequest {
        root,
        output_dir,
        file_types,
        libraries,
    };
    let summary = Extraction::new(&rules, &resolver)
        .with_progress(Arc::clone(&progress))
        .run(&request, &discovery.file_types, Local::now())?;
    progress.finish_and_clear();

    Reporter::new().print_report(&summary);
    println!("Operation completed successfully.");

    config.remember_run(&request.root, &request.output_dir);
    if let Err(e) = config.save(&args.config) {
        log::error!("Error saving configuration: {}", e);
    }

    Ok(())
}

/// Flag value, else an interactive answer, else the value saved by the last run
fn resolve_directory(
    flag: Option<&str>,
    last: Option<&Path>,
    prompter: Option<&mut StdPrompter>,
    question: &str,
) -> Result<PathBuf> {
    let dir = match (flag, prompter) {
        (Some(value), _) => expand_home(value),
        (None, Some(prompter)) => prompter.ask_directory(question, last)?,
        (None, None) => last.map(Path::to_path_buf).unwrap_or_default(),
    };

    if dir.as_os_str().is_empty() {
        return Err(ExtractError::InvalidArgument(format!(
            "{}: no directory given and none saved from a previous run",
            question
        )));
    }
    Ok(dir)
}

fn create_progress(quiet: bool) -> Arc<ProgressBar> {
    if quiet {
        return Arc::new(ProgressBar::hidden());
    }

    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let progress = ProgressBar::new(0);
    progress.set_style(style);
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    Arc::new(progress)
}
