//! `triage`: reception triage from the command line.
//!
//! Configuration comes from flags, then `TRIAGE_*` environment variables
//! (a `.env` file is honoured), then defaults. Logs go to stderr; set
//! `RUST_LOG` to change the level.

mod render;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triage_core::config::{
    ENV_CORPUS, ENV_DB, ENV_OPERATOR, ENV_OVERRIDES, ENV_SYSTEM_ID,
};
use triage_core::corpus::{load_with_overrides, CorpusFile};
use triage_core::export::{AuditSummaryExporter, ComplianceExporter};
use triage_core::{classify, workflow, AuditTrail, StaffTier, TriageConfig};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "GP reception symptom triage, escalation and audit")]
struct Cli {
    /// Corpus file (JSON or YAML); the built-in protocol when omitted
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,
    /// Administrator override file merged over the corpus
    #[arg(long, global = true)]
    overrides: Option<PathBuf>,
    /// SQLite database for cases and the audit log
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Operator recorded against cases and audit entries
    #[arg(long, global = true)]
    operator: Option<String>,
    /// System identifier stamped on compliance exports
    #[arg(long, global = true)]
    system_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a query without recording it
    Classify {
        /// The patient's description
        #[arg(required = true)]
        query: Vec<String>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a corpus file (and optional overrides) without using it
    Validate {
        /// Corpus file to check
        path: PathBuf,
    },
    /// Show the corpus in effect
    Corpus {
        /// Print as a corpus file (JSON)
        #[arg(long)]
        json: bool,
    },
    /// Classify, open an escalation case and write the audit record
    Record {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// List open cases
    Cases {
        /// Only cases held at this tier (reception, triager, gp)
        #[arg(long)]
        tier: Option<String>,
    },
    /// Pass a case up one tier
    Escalate {
        case_id: String,
        #[arg(long)]
        reason: String,
    },
    /// Close a case with an outcome
    Resolve {
        case_id: String,
        #[arg(long)]
        outcome: String,
    },
    /// Export the audit log
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Compliance)]
        format: ExportFormat,
        /// Earliest recorded_at (RFC 3339)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Latest recorded_at (RFC 3339)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Re-hash the audit log and check the stored root
    Verify,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// Records with inclusion proofs (JSON)
    Compliance,
    /// Per-record summary (JSON)
    SummaryJson,
    /// Per-record summary (CSV)
    SummaryCsv,
}

impl Cli {
    fn config(&self) -> anyhow::Result<TriageConfig> {
        self.config_with(|key| std::env::var(key).ok())
    }

    /// Flags win over `env`.
    fn config_with<E>(&self, env: E) -> anyhow::Result<TriageConfig>
    where
        E: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| -> Option<String> {
            let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
            match key {
                ENV_CORPUS => path(&self.corpus),
                ENV_OVERRIDES => path(&self.overrides),
                ENV_DB => path(&self.db),
                ENV_OPERATOR => self.operator.clone(),
                ENV_SYSTEM_ID => self.system_id.clone(),
                _ => None,
            }
        };
        TriageConfig::from_lookup(|key| flag(key).or_else(|| env(key)))
            .context("invalid configuration")
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triage_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    match cli.command {
        Commands::Classify { query, json } => {
            let corpus = config.load_corpus().context("failed to load corpus")?;
            let result = classify(&query.join(" "), &corpus);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render::classification(&result));
            }
        }
        Commands::Validate { path } => {
            let corpus = load_with_overrides(Some(&path), config.override_path())
                .with_context(|| format!("{} is not a usable corpus", path.display()))?;
            println!(
                "ok: version {} with {} entries ({})",
                corpus.version(),
                corpus.len(),
                render::tier_counts(&corpus)
            );
        }
        Commands::Corpus { json } => {
            let corpus = config.load_corpus().context("failed to load corpus")?;
            if json {
                let file: CorpusFile = corpus.to_file();
                println!("{}", file.to_json()?);
            } else {
                print!("{}", render::corpus(&corpus));
            }
        }
        Commands::Record { query } => {
            let corpus = config.load_corpus().context("failed to load corpus")?;
            let db = config.open_database().context("failed to open database")?;
            let outcome = workflow::triage(&db, &corpus, &query.join(" "), config.operator())?;

            print!("{}", render::classification(&outcome.result));
            print!("{}", render::case(&outcome.case));
            println!("{}", render::commit(&outcome.commit));
        }
        Commands::Cases { tier } => {
            let tier = tier
                .map(|t| StaffTier::parse(&t).with_context(|| format!("unknown tier '{t}'")))
                .transpose()?;
            let db = config.open_database().context("failed to open database")?;
            let cases = workflow::open_cases(&db, tier)?;
            if cases.is_empty() {
                println!("No open cases.");
            }
            for case in &cases {
                println!("{}", render::case_line(case));
            }
        }
        Commands::Escalate { case_id, reason } => {
            let db = config.open_database().context("failed to open database")?;
            let (case, commit) = workflow::escalate_case(&db, &case_id, config.operator(), &reason)?;
            print!("{}", render::case(&case));
            println!("{}", render::commit(&commit));
        }
        Commands::Resolve { case_id, outcome } => {
            let db = config.open_database().context("failed to open database")?;
            let (case, commit) = workflow::resolve_case(&db, &case_id, config.operator(), &outcome)?;
            print!("{}", render::case(&case));
            println!("{}", render::commit(&commit));
        }
        Commands::Export {
            format,
            from,
            to,
            out,
        } => {
            let db = config.open_database().context("failed to open database")?;
            let range = from.as_deref().zip(to.as_deref());

            let text = match format {
                ExportFormat::Compliance => {
                    let mut exporter = ComplianceExporter::new(&db);
                    if let Some(system_id) = config.system_id() {
                        exporter = exporter.with_system_id(system_id);
                    }
                    let batch = match range {
                        Some((start, end)) => exporter.export_date_range(start, end)?,
                        None => exporter.export_all()?,
                    };
                    batch.to_json()?
                }
                ExportFormat::SummaryJson | ExportFormat::SummaryCsv => {
                    let exporter = AuditSummaryExporter::new(&db);
                    let summary = match range {
                        Some((start, end)) => exporter.export_date_range(start, end)?,
                        None => exporter.export_all()?,
                    };
                    match format {
                        ExportFormat::SummaryCsv => summary.to_csv(),
                        _ => summary.to_json()?,
                    }
                }
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "export written");
                }
                None => {
                    print!("{text}");
                    if !text.ends_with('\n') {
                        println!();
                    }
                }
            }
        }
        Commands::Verify => {
            let db = config.open_database().context("failed to open database")?;
            let verification = AuditTrail::new(&db).verify_log()?;
            print!("{}", render::verification(&verification));
            if !verification.is_intact() {
                bail!("audit log verification failed");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::collections::HashMap;
    use std::path::Path;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_win_over_env() {
        let vars = env(&[
            (ENV_DB, "from-env.db"),
            (ENV_OPERATOR, "env-op"),
            (ENV_SYSTEM_ID, "env-surgery"),
        ]);
        let cli = Cli::try_parse_from([
            "triage",
            "--db",
            "from-flag.db",
            "--operator",
            "flag-op",
            "verify",
        ])
        .unwrap();

        let config = cli.config_with(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.database_path(), Path::new("from-flag.db"));
        assert_eq!(config.operator(), "flag-op");
        // No flag given, so the environment still applies.
        assert_eq!(config.system_id(), Some("env-surgery"));
    }

    #[test]
    fn test_defaults_without_flags_or_env() {
        let cli = Cli::try_parse_from(["triage", "cases"]).unwrap();
        let config = cli.config_with(|_| None).unwrap();

        assert_eq!(
            config.database_path(),
            Path::new(triage_core::config::DEFAULT_DB_PATH)
        );
        assert_eq!(config.operator(), triage_core::config::DEFAULT_OPERATOR);
        assert!(config.corpus_path().is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["triage", "record", "earache", "--operator", "rec7"]).unwrap();
        assert!(matches!(&cli.command, Commands::Record { query } if query == &["earache"]));

        let config = cli.config_with(|_| None).unwrap();
        assert_eq!(config.operator(), "rec7");
    }

    #[test]
    fn test_missing_corpus_file_is_rejected() {
        let cli = Cli::try_parse_from([
            "triage",
            "--corpus",
            "/nonexistent/triage-corpus.json",
            "corpus",
        ])
        .unwrap();
        assert!(cli.config_with(|_| None).is_err());
    }

    #[test]
    fn test_export_range_needs_both_ends() {
        assert!(Cli::try_parse_from(["triage", "export", "--from", "2025-01-01T00:00:00Z"]).is_err());
    }
}
