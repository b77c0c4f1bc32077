use clap::Parser;
use std::path::PathBuf;

use crate::config::OutputFormat;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Replay a track configuration session and print what would be submitted
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Page layout (JSON): composite, views, subtracks and rendered controls
    #[arg(value_name = "LAYOUT")]
    pub layout: PathBuf,

    /// Events to replay (JSON array of page events)
    #[arg(short = 'e', long = "events", value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Edit a control after replaying events (can be specified multiple times)
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub edits: Vec<(String, String)>,

    /// Open a subtrack's dialog before anything else (can be specified multiple times)
    #[arg(long = "open", value_name = "SUBTRACK")]
    pub open: Vec<String>,

    /// Directory holding <subtrack>.html dialog markup
    #[arg(short = 'm', long = "markup-dir", value_name = "DIR")]
    pub markup_dir: Option<PathBuf>,

    /// Payload format (default: from settings, else query)
    #[arg(short = 'F', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the payload here instead of stdout
    #[arg(short = 'o', long = "outfile", value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Enable debug logging to file (default: trackcfg.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Write the effective settings to trackcfg.json in the config directory
    #[arg(long = "save-settings")]
    pub save_settings: bool,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "trackcfg",
            "page.json",
            "-s",
            "hist.color=1,2,3",
            "--set",
            "histSigA=",
            "--open",
            "histSigA",
            "-F",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.layout, PathBuf::from("page.json"));
        assert_eq!(args.edits, vec![
            ("hist.color".to_string(), "1,2,3".to_string()),
            ("histSigA".to_string(), String::new()),
        ]);
        assert_eq!(args.open, vec!["histSigA".to_string()]);
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.verbosity, 2);
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_bad_assignment() {
        assert!(Args::try_parse_from(["trackcfg", "page.json", "-s", "novalue"]).is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
