//! Command-line argument parsing

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use svchelper_service::ServiceCommand;

/// svchelper demo - a heartbeat task run as a Windows service
///
/// Started by the service control manager without a command, the demo
/// serves the SCM. Otherwise the command installs, controls or runs it.
#[derive(Parser, Debug)]
#[command(name = "svchelper-demo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Service command to execute
    #[command(subcommand)]
    pub command: Option<ServiceCommand>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for logs
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Log file path
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// Compact format
    Compact,
}

/// Options taking a value; the value is never a verb
const VALUE_OPTIONS: [&str; 5] = ["-c", "--config", "--log-format", "--log-file", "--"];

impl Args {
    /// Parse the process arguments, accepting verbs in any case
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_verbs(std::env::args_os()))
    }
}

/// Lowercase the first positional argument when it names a verb
pub fn normalize_verbs<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out: Vec<OsString> = Vec::new();
    let mut skip_value = false;
    let mut done = false;
    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || done {
            out.push(arg);
            continue;
        }
        if skip_value {
            skip_value = false;
            out.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if VALUE_OPTIONS.contains(&text) {
            skip_value = text != "--";
            done = text == "--";
            out.push(arg);
            continue;
        }
        if text.starts_with('-') {
            out.push(arg);
            continue;
        }
        done = true;
        match text.parse::<ServiceCommand>() {
            Ok(cmd) => out.push(OsString::from(cmd.verb())),
            Err(_) => out.push(arg),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_verbose() {
        let args = Args::parse_from(["svchelper-demo", "-v"]);
        assert_eq!(args.verbose, 1);

        let args = Args::parse_from(["svchelper-demo", "-vvv"]);
        assert_eq!(args.verbose, 3);
    }

    #[test]
    fn test_subcommand_is_optional() {
        let args = Args::parse_from(["svchelper-demo"]);
        assert!(args.command.is_none());

        let args = Args::parse_from(["svchelper-demo", "-c", "demo.toml", "debug"]);
        assert_eq!(args.command, Some(ServiceCommand::Debug));
        assert_eq!(args.config, Some(PathBuf::from("demo.toml")));
    }

    #[test]
    fn test_normalize_verbs() {
        assert_eq!(
            normalize_verbs(os(&["demo", "-v", "INSTALL"])),
            os(&["demo", "-v", "install"])
        );
        assert_eq!(
            normalize_verbs(os(&["demo", "--config", "Stop", "Debug"])),
            os(&["demo", "--config", "Stop", "debug"])
        );
        assert_eq!(normalize_verbs(os(&["demo", "bogus"])), os(&["demo", "bogus"]));
    }

    #[test]
    fn test_log_format() {
        let args = Args::parse_from(["svchelper-demo", "--log-format", "json"]);
        assert_eq!(args.log_format, LogFormat::Json);
    }
}
