use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use kslim_core::{kind_of, qualified_name, OutputConfig};
use kslim_filter::{Filter, FilterCriteria};
use kslim_output::response::summary_response;
use kslim_output::summary::SummaryOptions;
use kslim_output::{extract_status, Processor};
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "kslimctl", version, about = "Shrink, redact and summarize Kubernetes resource lists")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Json)]
    output: Output,

    /// YAML or JSON output config; defaults plus KSLIM_* env vars when absent
    #[arg(long = "config", global = true, env = "KSLIM_CONFIG")]
    config: Option<PathBuf>,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long = "metrics", global = true, action = ArgAction::SetTrue)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Args, Debug)]
struct Input {
    /// JSON file holding an array or a List (`{"items": [...]}`); stdin when omitted or `-`
    file: Option<PathBuf>,

    /// Filter criterion `path=value`, repeatable (values parse as JSON, else string)
    #[arg(short = 'w', long = "where")]
    wheres: Vec<String>,

    /// Filter criteria as a JSON object, merged with --where
    #[arg(long = "criteria")]
    criteria: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Redact, slim and truncate a resource list
    Process {
        #[command(flatten)]
        input: Input,
        /// Per-request item limit (0 = configured limit)
        #[arg(long = "limit", default_value_t = 0)]
        limit: i64,
        /// Print statistics to stderr
        #[arg(long = "stats", action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Counts by status/namespace/cluster/kind instead of full objects
    Summary {
        #[command(flatten)]
        input: Input,
        /// Resource type named in the envelope (`<kind>Summary`); taken from the first record when omitted
        #[arg(long = "kind")]
        kind: Option<String>,
        #[arg(long = "by-cluster", action = ArgAction::SetTrue)]
        by_cluster: bool,
        #[arg(long = "by-kind", action = ArgAction::SetTrue)]
        by_kind: bool,
        /// Field path holding the cluster name
        #[arg(long = "cluster-field")]
        cluster_field: Option<String>,
        #[arg(long = "sample", default_value_t = 10)]
        sample: usize,
    },
    /// Apply filter criteria only
    Filter {
        #[command(flatten)]
        input: Input,
        /// Report how many records matched
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
}

fn init_tracing() {
    let env = std::env::var("KSLIM_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics(enabled: bool) -> Option<metrics_exporter_prometheus::PrometheusHandle> {
    if !enabled {
        return None;
    }
    match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "failed to install metrics recorder");
            None
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<OutputConfig> {
    let Some(path) = path else { return Ok(OutputConfig::from_env()) };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg: OutputConfig = serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(cfg)
}

fn read_records(file: Option<&Path>) -> Result<Vec<Value>> {
    let text = match file {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let doc: Value = serde_json::from_str(&text).context("input is not valid JSON")?;
    Ok(match doc {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => items,
            Some(_) => bail!("`items` is not an array"),
            None => vec![Value::Object(obj)],
        },
        Value::Null => Vec::new(),
        _ => bail!("expected a JSON array or object"),
    })
}

fn parse_criteria(input: &Input) -> Result<FilterCriteria> {
    let mut criteria = match &input.criteria {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("parsing --criteria")? {
            Value::Object(m) => m,
            _ => bail!("--criteria must be a JSON object"),
        },
        None => FilterCriteria::new(),
    };
    for w in &input.wheres {
        let Some((path, raw)) = w.split_once('=') else { bail!("--where expects path=value, got {:?}", w) };
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        criteria.insert(path.to_string(), value);
    }
    Ok(criteria)
}

/// Records from `input`, narrowed by its criteria.
fn load_input(input: &Input) -> Result<Vec<Value>> {
    let records = read_records(input.file.as_deref())?;
    let criteria = parse_criteria(input)?;
    if criteria.is_empty() {
        return Ok(records);
    }
    let filter = Filter::compile(&criteria).context("invalid filter")?;
    Ok(filter.apply(records))
}

/// The kind shared by every record, or `Resource` for empty or mixed lists.
fn common_kind(records: &[Value]) -> &str {
    let mut kinds = records.iter().map(kind_of);
    match kinds.next() {
        Some(first) if !first.is_empty() && kinds.all(|k| k == first) => first,
        _ => "Resource",
    }
}

fn print_json(v: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

fn print_rows(items: &[Value]) {
    for it in items {
        let status = extract_status(it);
        println!("{} • {} • {}", kind_of(it), qualified_name(it), if status.is_empty() { "-" } else { status.as_str() });
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let recorder = init_metrics(cli.metrics);
    let config = load_config(cli.config.as_deref())?;
    let processor = Processor::new(config);

    match cli.command {
        Commands::Process { input, limit, stats } => {
            let records = load_input(&input)?;
            info!(records = records.len(), limit, "process invoked");
            let (result, st) = if limit > 0 {
                processor.process_with_limit_and_stats(&records, limit)
            } else {
                processor.process_with_stats(&records)
            };
            if processor.should_suggest_summary(records.len()) {
                warn!(records = records.len(), "large result set; consider `kslimctl summary`");
            }
            if stats {
                eprintln!("{}", serde_json::to_string(&st)?);
            }
            match cli.output {
                Output::Json => print_json(&result.into_response())?,
                Output::Human => {
                    print_rows(&result.items);
                    for w in &result.warnings {
                        println!("! {}", w.message);
                    }
                }
            }
        }
        Commands::Summary { input, kind, by_cluster, by_kind, cluster_field, sample } => {
            let records = load_input(&input)?;
            let mut opts = if by_cluster {
                SummaryOptions::fleet(cluster_field.as_deref().unwrap_or(""))
            } else {
                SummaryOptions::default()
            };
            opts.include_by_kind = by_kind;
            opts.max_sample_size = sample;
            if let (Some(f), false) = (&cluster_field, by_cluster) {
                opts.cluster_field = f.clone();
            }
            info!(records = records.len(), "summary invoked");
            let summary = processor.summarize(&records, &opts);
            let kind = kind.unwrap_or_else(|| common_kind(&records).to_string());
            match cli.output {
                Output::Json => print_json(&summary_response(&kind, &summary))?,
                Output::Human => {
                    println!("{} total: {}", kind, summary.total);
                    let groups = [
                        ("status", &summary.by_status),
                        ("namespace", &summary.by_namespace),
                        ("cluster", &summary.by_cluster),
                        ("kind", &summary.by_kind),
                    ];
                    for (label, counts) in groups {
                        if let Some(counts) = counts {
                            for (k, n) in counts {
                                println!("  {} {} • {}", label, k, n);
                            }
                        }
                    }
                    for s in &summary.sample {
                        println!("  - {}", s);
                    }
                    if summary.has_more {
                        println!("  …");
                    }
                }
            }
        }
        Commands::Filter { input, explain } => {
            let records = read_records(input.file.as_deref())?;
            let criteria = parse_criteria(&input)?;
            let filter = Filter::compile(&criteria).context("invalid filter")?;
            let (hits, st) = filter.select_with_stats(&records);
            if explain {
                eprintln!("Explain: total={} matched={} criteria={}", st.total, st.matched, st.criteria);
            }
            match cli.output {
                Output::Json => print_json(&hits)?,
                Output::Human => {
                    for it in hits {
                        println!("{} • {}", kind_of(it), qualified_name(it));
                    }
                }
            }
        }
    }

    if let Some(handle) = recorder {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
