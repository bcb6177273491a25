//! Ontoreport CLI: wires configuration, collaborators and the report store
pub mod adapters;

use adapters::{HttpAnnotator, SolrSearchIndex};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ontoreport_checks::ReportEngine;
use ontoreport_core::{CatalogSnapshot, EngineConfig};
use ontoreport_store::{FileLease, LeaseBackend, RedisLease, ReportStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "ontoreport", version, about = "Ontology health report generator")]
pub struct Cli {
    /// YAML engine configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON catalog snapshot used as the ontology registry
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Overrides `report_path` from the configuration
    #[arg(long, global = true)]
    pub report_path: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value = "http://localhost:8983/solr/term_search_core1"
    )]
    pub search_url: String,

    #[arg(
        long,
        global = true,
        default_value = "http://localhost:8080/annotator"
    )]
    pub annotator_url: String,

    #[arg(long, global = true)]
    pub annotator_apikey: Option<String>,

    /// Shared lease backend; without it a lock file next to the report is used
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Regenerate the report, for every ontology or only the listed ones
    Generate {
        #[arg(long, value_delimiter = ',')]
        ontologies: Vec<String>,
    },
    /// Print the report, or one ontology's entry
    Show { acronym: Option<String> },
    /// Remove ontologies from the report
    Delete {
        #[arg(required = true)]
        acronyms: Vec<String>,
    },
}

pub fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(path) = &cli.report_path {
        config.report_path = path.clone();
    }
    Ok(config)
}

pub fn open_store(cli: &Cli, config: &EngineConfig) -> anyhow::Result<ReportStore> {
    let lease: Arc<dyn LeaseBackend> = match &cli.redis_url {
        Some(url) => Arc::new(RedisLease::open(url)?),
        None => Arc::new(FileLease::beside(&config.report_path)),
    };
    Ok(ReportStore::new(
        config.report_path.clone(),
        config.lock.clone(),
        lease,
    ))
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let store = open_store(&cli, &config)?;

    match &cli.command {
        Command::Generate { ontologies } => {
            let catalog_path = cli
                .catalog
                .as_ref()
                .context("--catalog is required to generate a report")?;
            let registry = Arc::new(CatalogSnapshot::from_file(catalog_path)?);
            let search = Arc::new(SolrSearchIndex::new(&cli.search_url, HTTP_TIMEOUT)?);
            let annotator = Arc::new(HttpAnnotator::new(
                &cli.annotator_url,
                cli.annotator_apikey.clone(),
                HTTP_TIMEOUT,
            )?);

            let engine = ReportEngine::new(config, registry, search, annotator, store);
            let summary = engine.refresh_report(ontologies)?;
            info!(
                run_id = %summary.run_id,
                reported = summary.reported.len(),
                skipped = summary.skipped.len(),
                elapsed_ms = summary.elapsed_ms,
                "report run complete"
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Show { acronym } => {
            let collection = store.read(false)?;
            let json = match acronym {
                Some(acronym) => match collection.ontologies.get(acronym) {
                    Some(report) => serde_json::to_string_pretty(report)?,
                    None => bail!("{} is not in the report", acronym),
                },
                None => serde_json::to_string_pretty(&collection)?,
            };
            println!("{}", json);
        }
        Command::Delete { acronyms } => {
            store.delete_entities(acronyms)?;
            info!(count = acronyms.len(), "deleted ontologies from report");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_splits_ontology_list() {
        let cli = Cli::parse_from(["ontoreport", "generate", "--ontologies", "GO,NCIT"]);
        match cli.command {
            Command::Generate { ontologies } => assert_eq!(ontologies, ["GO", "NCIT"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "ontoreport",
            "show",
            "GO",
            "--report-path",
            "/tmp/r.json",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.report_path, PathBuf::from("/tmp/r.json"));
        assert_eq!(config.lock.key, "ONTOLOGIES_REPORT_LOCK");
    }

    #[test]
    fn test_delete_requires_acronyms() {
        assert!(Cli::try_parse_from(["ontoreport", "delete"]).is_err());
    }

    #[test]
    fn test_generate_without_catalog_fails() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.json");
        let cli = Cli::parse_from([
            "ontoreport",
            "--report-path",
            report.to_str().unwrap(),
            "generate",
        ]);
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("--catalog"));
        assert!(!report.exists());
    }

    #[test]
    fn test_show_missing_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.json");
        let cli = Cli::parse_from(["ontoreport", "--report-path", report.to_str().unwrap(), "show"]);
        assert!(run(cli).is_err());
    }
}
