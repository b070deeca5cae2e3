use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sieve_bloom::{sizing, BloomConfig, FilterPlan};
use std::{fs, path::Path, path::PathBuf};
use tracing::{info, Level};

/// Sieve command-line tool.
#[derive(Parser)]
#[command(name = "sievectl", author, version, about = "Bloom filter planning and lookup tool", long_about = None)]
struct Cli {
    #[command(flatten)]
    opts: Options,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Options {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long = "log-level", global = true, default_value_t = Level::WARN)]
    log_level: Level,

    /// Write JSON logs to rolling files in this directory instead of stderr.
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print bit-array size and hash count for a target load.
    Plan {
        /// Expected number of elements.
        #[arg(long)]
        elements: u64,
        /// Acceptable false positive probability.
        #[arg(long)]
        fpp: f64,
    },

    /// Build a filter from a key file and query it.
    Check {
        /// YAML filter configuration.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override expected elements (default: number of keys).
        #[arg(long)]
        elements: Option<u64>,
        /// Override false positive probability.
        #[arg(long)]
        fpp: Option<f64>,
        /// Newline-separated keys to insert.
        #[arg(long)]
        keys: PathBuf,
        /// Keys to look up.
        queries: Vec<String>,
    },
}

/// Outcome of a `check` run.
#[derive(Debug)]
struct CheckReport {
    /// (query, definitely absent)
    answers: Vec<(String, bool)>,
    estimate: u64,
}

fn load_config(path: &Path) -> anyhow::Result<BloomConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config: BloomConfig = serde_yaml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn read_keys(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}

fn render_plan(plan: &FilterPlan) -> anyhow::Result<String> {
    let mut out = serde_yaml::to_string(plan)?;
    out.push_str(&format!("num_bytes: {}\n", plan.num_bytes()));
    Ok(out)
}

fn check(config: &BloomConfig, keys: &[String], queries: &[String]) -> anyhow::Result<CheckReport> {
    let mut bf = config.build()?;
    bf.add_all(keys)?;
    info!(keys = keys.len(), set_bits = bf.set_bits(), "filter populated");
    let mut answers = Vec::with_capacity(queries.len());
    for q in queries {
        answers.push((q.clone(), bf.does_not_exist(q)?));
    }
    Ok(CheckReport { answers, estimate: bf.elements_estimate() })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log = sieve_log::init(cli.opts.log_dir.as_deref(), cli.opts.log_level)?;

    match cli.command {
        Commands::Plan { elements, fpp } => {
            let plan = sizing::plan(elements, fpp)?;
            print!("{}", render_plan(&plan)?);
        }

        Commands::Check { config, elements, fpp, keys, queries } => {
            let keys = read_keys(&keys)?;
            let mut cfg = match &config {
                Some(path) => load_config(path)?,
                None => BloomConfig::default(),
            };
            if let Some(n) = elements {
                cfg.expected_elements = n;
            } else if config.is_none() {
                cfg.expected_elements = keys.len().max(1) as u64;
            }
            if let Some(p) = fpp {
                cfg.false_positive_probability = p;
            }

            let report = check(&cfg, &keys, &queries)?;
            for (q, absent) in &report.answers {
                let verdict = if *absent { "definitely-absent" } else { "possibly-present" };
                println!("{q}\t{verdict}");
            }
            println!("estimate\t{}", report.estimate);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn scratch(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_check_args() {
        let cli = Cli::parse_from([
            "sievectl", "--log-level", "debug", "check", "--keys", "k.txt", "--fpp", "0.1", "A", "C",
        ]);
        assert_eq!(cli.opts.log_level, Level::DEBUG);
        match cli.command {
            Commands::Check { fpp, queries, elements, .. } => {
                assert_eq!(fpp, Some(0.1));
                assert_eq!(elements, None);
                assert_eq!(queries, vec!["A".to_string(), "C".to_string()]);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn check_reports_membership() {
        let cfg = BloomConfig { expected_elements: 10_000, false_positive_probability: 0.1, ..Default::default() };
        let keys = vec!["A".to_string(), "B".to_string()];
        let report = check(&cfg, &keys, &["A".to_string(), "C".to_string()]).unwrap();
        assert_eq!(report.answers, vec![("A".to_string(), false), ("C".to_string(), true)]);
        assert_eq!(report.estimate, 2);
    }

    #[test]
    fn plan_renders_as_yaml() {
        let plan = sizing::plan(10_000, 0.10).unwrap();
        let out = render_plan(&plan).unwrap();
        assert!(out.contains("num_bits: 47925\n"), "{out}");
        assert!(out.contains("num_hashes: 3\n"), "{out}");
        assert!(out.contains("expected_fpp: "), "{out}");
        assert!(out.ends_with("num_bytes: 5991\n"), "{out}");
    }

    #[test]
    fn key_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "keys.txt", "alpha\r\n\nbeta\n");
        assert_eq!(read_keys(&path).unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn config_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "bloom.yaml", "expected_elements: 100\nfalse_positive_probability: 0.05\nhash: xxh64\n");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.expected_elements, 100);
        assert_eq!(cfg.hash, sieve_bloom::HashKind::Xxh64);
    }

    #[test]
    fn config_file_rejects_bad_probability() {
        let dir = tempfile::tempdir().unwrap();
        let path = scratch(&dir, "bad.yaml", "expected_elements: 100\nfalse_positive_probability: 2.0\n");
        assert!(load_config(&path).is_err());
    }
}
