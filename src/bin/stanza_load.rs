use std::convert::Infallible;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use stanza_loader::config::{ConfigLoader, ResolvedConfig};
use stanza_loader::domain::{FormatType, NodeId};
use stanza_loader::error::StanzaError;
use stanza_loader::hierarchy::{HierarchyOptions, build_hierarchy};
use stanza_loader::loader::{DataLoader, LoadRequest};
use stanza_loader::output::{JsonOutput, StderrNotifier};
use stanza_loader::transport::HttpTransport;
use stanza_loader::tree::normalize_tree;

#[derive(Parser)]
#[command(name = "stanza-load")]
#[command(about = "Fetch remote datasets as rows and rebuild flat node lists into hierarchies")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch a dataset and print it as JSON")]
    Fetch(FetchArgs),
    #[command(about = "Normalize a JSON node list and print its hierarchy")]
    Tree(TreeArgs),
}

#[derive(Args)]
struct FetchArgs {
    url: String,

    /// text, tsv, csv, json, sparql-results-json or elasticsearch
    #[arg(long = "type")]
    format: Option<FormatType>,

    #[arg(long)]
    limit: Option<u64>,

    #[arg(long)]
    offset: Option<u64>,

    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Args)]
struct TreeArgs {
    file: camino::Utf8PathBuf,

    #[arg(long, value_parser = parse_node_id)]
    root_id: Option<NodeId>,

    #[arg(long, value_parser = parse_node_id)]
    pseudo_root_id: Option<NodeId>,

    #[arg(long)]
    id_key: Option<String>,

    #[arg(long)]
    parent_key: Option<String>,

    #[arg(long)]
    children_key: Option<String>,

    #[arg(long)]
    label_key: Option<String>,

    #[arg(long)]
    value_key: Option<String>,

    /// Print the normalized node list instead of the hierarchy
    #[arg(long)]
    flat: bool,
}

fn parse_node_id(value: &str) -> Result<NodeId, Infallible> {
    value.parse()
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<StanzaError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &StanzaError) -> u8 {
    match error {
        StanzaError::NodeNotFound(_)
        | StanzaError::InvalidUrl { .. }
        | StanzaError::ConfigRead(_) => 2,
        StanzaError::Transport(_) | StanzaError::Status { .. } | StanzaError::Timeout => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, &config),
        Commands::Tree(args) => run_tree(args, &config),
    }
}

fn run_fetch(args: FetchArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let request = LoadRequest::new(args.url)
        .format(args.format.unwrap_or(config.format))
        .timeout(
            args.timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(config.timeout),
        )
        .limit(args.limit)
        .offset(args.offset);

    let transport = HttpTransport::with_user_agent(&config.user_agent)?;
    let loader = DataLoader::new(transport);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    let dataset = runtime.block_on(loader.load(&request, Some(&StderrNotifier)))?;

    JsonOutput::print_dataset(&dataset).into_diagnostic()?;
    Ok(())
}

fn run_tree(args: TreeArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let content = std::fs::read_to_string(&args.file).into_diagnostic()?;
    let nodes: Vec<serde_json::Value> = serde_json::from_str(&content).into_diagnostic()?;

    let mut fields = config.fields.clone();
    if let Some(key) = args.id_key {
        fields.id = key;
    }
    if let Some(key) = args.parent_key {
        fields.parent = key;
    }
    if let Some(key) = args.children_key {
        fields.children = key;
    }
    if let Some(key) = args.label_key {
        fields.label = key;
    }
    if let Some(key) = args.value_key {
        fields.value = key;
    }

    let tree = normalize_tree(&nodes, &fields)?;
    if args.flat {
        JsonOutput::print_tree(&tree).into_diagnostic()?;
        return Ok(());
    }

    let options = HierarchyOptions {
        root_id: args.root_id,
        pseudo_root_id: args
            .pseudo_root_id
            .unwrap_or_else(|| config.pseudo_root_id.clone()),
    };
    let hierarchy = build_hierarchy(&tree, &options)?;
    JsonOutput::print_hierarchy(&hierarchy).into_diagnostic()?;
    Ok(())
}
