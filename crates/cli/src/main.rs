use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use odl_engine::{DataSource, ExtractionOptions, StaticDocumentFetcher, parse_query_file};
use odl_types::options::{CONVERTER_OPTIONS, operation_label, stage_label};
use odl_types::{DataSourceSettings, FilterOperation, HealthCheckResult, HealthStatus, Query, QueryDataResponse, Stage};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

/// odl - query OpenDaylight topology data as tables
#[derive(Parser, Debug)]
#[command(name = "odl", author, version, about = "Query OpenDaylight topology data as tables")]
struct Cli {
    /// Settings file (default: $ODL_SETTINGS_PATH or ~/.config/odl/datasource.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run queries from a YAML/JSON file
    Query {
        /// Query file holding one query or a list of queries
        #[arg(long, short)]
        query: PathBuf,

        /// Read the document from a saved JSON response instead of the controller
        #[arg(long, conflicts_with = "base_url")]
        document: Option<PathBuf>,

        /// Controller base URL (overrides settings and ODL_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Abort extraction after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Check the data source configuration
    Health {
        /// Controller base URL (overrides settings and ODL_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Controller-relative URI to fetch as part of the check
        #[arg(long)]
        probe: Option<String>,
    },

    /// Print the default topology query
    DefaultQuery {
        #[arg(long, value_enum, default_value_t = QueryFormat::Yaml)]
        format: QueryFormat,
    },

    /// List converters, stages and filter operations
    Options,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum QueryFormat {
    Json,
    Yaml,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            query,
            document,
            base_url,
            timeout_ms,
            format,
        } => {
            let settings = resolve_settings(cli.settings.as_deref(), base_url)?;
            run_queries(settings, &query, document.as_deref(), timeout_ms, format).await
        }
        Commands::Health { base_url, probe } => {
            let settings = resolve_settings(cli.settings.as_deref(), base_url)?;
            run_health(settings, probe.as_deref()).await
        }
        Commands::DefaultQuery { format } => print_default_query(format),
        Commands::Options => {
            print_options();
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Settings file, then `ODL_BASE_URL`, then the command-line flag.
fn resolve_settings(path: Option<&Path>, base_url: Option<String>) -> Result<DataSourceSettings> {
    let settings = odl_util::settings::load_settings(path).context("failed to load data source settings")?;
    Ok(match base_url {
        Some(base_url) => settings.with_base_url(base_url),
        None => settings,
    })
}

async fn run_queries(
    settings: DataSourceSettings,
    query_path: &Path,
    document_path: Option<&Path>,
    timeout_ms: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let queries = parse_query_file(query_path)?;
    debug!(count = queries.len(), path = %query_path.display(), "loaded queries");

    let source = match document_path {
        Some(path) => {
            let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read document: {}", path.display()))?;
            let document = serde_json::from_str(&content).with_context(|| format!("Document is not valid JSON: {}", path.display()))?;
            let fetcher = StaticDocumentFetcher::new(document).with_label(path.display().to_string());
            DataSource::with_fetcher(settings, Arc::new(fetcher))
        }
        None => DataSource::new(settings).context("failed to create controller client")?,
    };
    let options = match timeout_ms {
        Some(millis) => ExtractionOptions::default().with_timeout(Duration::from_millis(millis)),
        None => ExtractionOptions::default(),
    };

    let response = source.with_options(options).query_data(&queries).await;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Table => println!("{}", render_response(&response)),
    }

    let failed = response.responses.values().filter(|outcome| outcome.is_error()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} queries failed", response.responses.len());
    }
    Ok(())
}

fn render_response(response: &QueryDataResponse) -> String {
    response
        .responses
        .iter()
        .map(|(ref_id, outcome)| match &outcome.error {
            Some(error) => format!("== {ref_id} ==\nerror: {error}"),
            None => format!("== {ref_id} ==\n{}", render::render_table(&outcome.table)),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn run_health(settings: DataSourceSettings, probe: Option<&str>) -> Result<()> {
    let result = match DataSource::new(settings) {
        Ok(source) => source.check_health(probe).await,
        Err(error) => HealthCheckResult::error(error.to_string()),
    };
    println!("{}", result.message);
    if result.status == HealthStatus::Error {
        anyhow::bail!("health check failed");
    }
    Ok(())
}

fn print_default_query(format: QueryFormat) -> Result<()> {
    let query = Query::default_topology();
    let rendered = match format {
        QueryFormat::Json => serde_json::to_string_pretty(&query)?,
        QueryFormat::Yaml => serde_yaml::to_string(&query)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn print_options() {
    println!("Converters:");
    for option in CONVERTER_OPTIONS {
        println!("  {:<12} {}", option.value, option.label);
    }
    println!("Stages:");
    for stage in Stage::ALL {
        println!("  {:<12} {}", stage.as_str(), stage_label(stage));
    }
    println!("Operations:");
    for operation in FilterOperation::ALL {
        println!("  {:<12} {}", operation.as_str(), operation_label(operation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use odl_types::{DataResponse, Table};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_query_subcommand() {
        let cli = Cli::try_parse_from([
            "odl",
            "--settings",
            "/tmp/ds.json",
            "query",
            "-q",
            "links.yaml",
            "--document",
            "topology.json",
            "--timeout-ms",
            "250",
            "--format",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.settings.as_deref(), Some(Path::new("/tmp/ds.json")));
        match cli.command {
            Commands::Query {
                query,
                document,
                timeout_ms,
                format,
                ..
            } => {
                assert_eq!(query, PathBuf::from("links.yaml"));
                assert_eq!(document, Some(PathBuf::from("topology.json")));
                assert_eq!(timeout_ms, Some(250));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn document_and_base_url_are_exclusive() {
        let result = Cli::try_parse_from([
            "odl",
            "query",
            "-q",
            "links.yaml",
            "--document",
            "topology.json",
            "--base-url",
            "http://odl:8181",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn flag_overrides_settings_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("datasource.json");
        std::fs::write(&path, r#"{"baseUrl": "http://file:8181"}"#).unwrap();

        temp_env::with_var_unset("ODL_BASE_URL", || {
            let from_file = resolve_settings(Some(&path), None).unwrap();
            assert_eq!(from_file.base_url, "http://file:8181");
            let from_flag = resolve_settings(Some(&path), Some("http://flag:8181".to_string())).unwrap();
            assert_eq!(from_flag.base_url, "http://flag:8181");
        });
    }

    #[test]
    fn response_rendering_labels_each_ref_id() {
        let mut response = QueryDataResponse::default();
        response.responses.insert("A".to_string(), DataResponse::ok(Table::default()));
        response.responses.insert("B".to_string(), DataResponse::error("fetch failed: timeout"));
        let rendered = render_response(&response);
        assert_eq!(rendered, "== A ==\n(no rows)\n\n== B ==\nerror: fetch failed: timeout");
    }
}
