//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::{config::Config, types::ImportTarget};

/// Convert Closure-style namespaced JavaScript into flat ECMAScript modules
#[derive(Parser, Debug, Clone)]
#[command(name = "closure2esm", version, about, long_about = None)]
pub struct Cli {
    /// Entry file whose dependency closure is converted
    #[arg(short, long)]
    pub entry: Option<PathBuf>,

    /// Output directory, cleared at the start of every run
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Directory searched for module declarations, may be repeated
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,

    /// Configuration file to use instead of ./closure2esm.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Namespace root of the legacy module statements
    #[arg(long)]
    pub namespace: Option<String>,

    /// Where generated imports point to
    #[arg(long, value_enum)]
    pub import_target: Option<ImportTarget>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Overlay the flags that were given on top of `config`
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(entry) = &self.entry {
            config.entry = Some(entry.clone());
        }
        if let Some(out_dir) = &self.out_dir {
            config.out_dir = out_dir.clone();
        }
        if !self.include_dirs.is_empty() {
            config.include_dirs = self.include_dirs.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(import_target) = self.import_target {
            config.import_target = import_target;
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["closure2esm"]).unwrap();
        assert!(cli.entry.is_none());
        assert!(cli.include_dirs.is_empty());
        assert_eq!(cli.import_target, None);
        assert_eq!(cli.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "closure2esm",
            "--entry",
            "exports.js",
            "-I",
            "javascript/net/grpc/web",
            "--include",
            "closure/goog",
            "--out-dir",
            "dist",
            "--import-target",
            "module-file",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.entry, Some(PathBuf::from("exports.js")));
        assert_eq!(
            cli.include_dirs,
            vec![
                PathBuf::from("javascript/net/grpc/web"),
                PathBuf::from("closure/goog")
            ]
        );
        assert_eq!(cli.import_target, Some(ImportTarget::ModuleFile));
        assert_eq!(cli.log_level(), LevelFilter::Debug);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["closure2esm", "--out-dir", "cli-out", "--namespace", "acme"]).unwrap();
        let mut config = Config {
            out_dir: PathBuf::from("file-out"),
            include_dirs: vec![PathBuf::from("kept")],
            ..Default::default()
        };
        cli.apply_to(&mut config);

        assert_eq!(config.out_dir, PathBuf::from("cli-out"));
        assert_eq!(config.namespace, "acme");
        assert_eq!(config.include_dirs, vec![PathBuf::from("kept")]);
    }
}
