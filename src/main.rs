use trackcfg::cli::Args;
use trackcfg::config::{self, EngineSettings, OutputFormat};
use trackcfg::core::{DirSource, DispatchOutcome, Dispatcher, PageConfigState, PageEvent};
use trackcfg::entities::PageLayout;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());

    // Ensure directories exist
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create configuration directory: {}", e);
    }

    // Determine log level based on verbosity flags
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Initialize logger based on --log flag
    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::config_file("trackcfg.log", &path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!(
            "Logging to file: {} (level: {:?})",
            log_path.display(),
            log_level
        );
    } else {
        // Console logging with specified verbosity level (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }

    debug!("Command-line args: {:?}", args);

    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    info!("Config path: {}", settings_path.display());
    let settings = EngineSettings::load(&settings_path)?;
    if args.save_settings {
        settings.save(&settings_path)?;
        info!("Saved settings to {}", settings_path.display());
    }
    let format = args.format.unwrap_or(settings.output_format);

    let layout = PageLayout::from_file(&args.layout)?;
    let mut state = PageConfigState::new(&layout, settings)?;

    let mut dispatcher = Dispatcher::new();
    if let Some(dir) = &args.markup_dir {
        info!("Subtrack markup from {}", dir.display());
        dispatcher = dispatcher.with_source(Box::new(DirSource::new(dir)));
    }

    for subtrack in &args.open {
        replay(&mut dispatcher, &mut state, PageEvent::Open { subtrack: subtrack.clone() });
    }

    if let Some(path) = &args.events {
        for event in load_events(path)? {
            if event == PageEvent::Submit {
                debug!("Ignoring submit in event file; the payload is built once at the end");
                continue;
            }
            replay(&mut dispatcher, &mut state, event);
        }
    }

    for (name, value) in &args.edits {
        replay(
            &mut dispatcher,
            &mut state,
            PageEvent::Edit {
                name: name.clone(),
                value: value.clone(),
            },
        );
    }

    let payload = match dispatcher.dispatch(&mut state, PageEvent::Submit)? {
        DispatchOutcome::Submitted(payload) => payload,
        other => anyhow::bail!("Unexpected submit outcome: {:?}", other),
    };

    let text = match format {
        OutputFormat::Query => payload.to_query_string(),
        OutputFormat::Json => payload.to_json()?,
    };

    match &args.outfile {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write payload: {}", path.display()))?;
            info!("Wrote {} fields to {}", payload.len(), path.display());
        }
        None => println!("{}", text),
    }

    state.teardown();
    Ok(())
}

/// Dispatch one event and drain whatever it queued. Failures are logged;
/// a session keeps going past a bad edit.
fn replay(dispatcher: &mut Dispatcher, state: &mut PageConfigState, event: PageEvent) {
    if let Err(e) = dispatcher.dispatch(state, event) {
        warn!("{}", e);
    }
    dispatcher.run_pending(state);
}

fn load_events(path: &Path) -> Result<Vec<PageEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events: {}", path.display()))?;
    let events: Vec<PageEvent> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse events: {}", path.display()))?;
    info!("Replaying {} events from {}", events.len(), path.display());
    Ok(events)
}
