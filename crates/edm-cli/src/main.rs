//! # edm-cli
//!
//! Command-line interface for OData CSDL metadata documents.
//!
//! Documents are parsed into the versioned Entity Data Model and can then be
//! dumped as JSON, summarized, re-emitted as EDMX, or used to resolve types
//! and navigation links.

use anyhow::Context;
use clap::{Parser, Subcommand};
use edm_csdl::{Construct, CsdlConfig, InputFormat, MetadataParser, to_xml_string, vocabulary};
use edm_model::{
    EdmSimpleType, MetadataRegistry, ProtocolVersion, ResolvedType, RootDocument, TypeRef,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Exit code for unusable configuration
const EXIT_CONFIG: u8 = 3;
/// Exit code for documents that fail to parse or resolve
const EXIT_FAILURE: u8 = 1;

#[derive(Parser)]
#[command(name = "edm")]
#[command(about = "OData CSDL metadata toolkit")]
#[command(version)]
struct Cli {
    /// Path to a parser configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Protocol version to parse with (v3 or v4)
    #[arg(short, long, global = true)]
    protocol: Option<ProtocolVersion>,

    /// Input format (xml or json); guessed from the extension when omitted
    #[arg(short, long, global = true)]
    format: Option<InputFormat>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a metadata document and print the model as JSON
    Parse {
        /// Input file path
        input: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print per-schema counts of a metadata document
    Summary {
        /// Input file path
        input: PathBuf,
    },

    /// Re-emit a metadata document as EDMX XML
    Emit {
        /// Input file path
        input: PathBuf,

        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a type name against the primitive registry or a document
    ResolveType {
        /// Type name, e.g. Edm.DateTimeOffset or Collection(NS.Person)
        name: String,

        /// Document to resolve declared types against
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// List the field names recognized for a construct
    Vocabulary {
        /// Construct name, e.g. EntityType or FunctionImport
        construct: Construct,
    },

    /// Print the navigation targets of every entity set
    Links {
        /// Input file path
        input: PathBuf,
    },
}

/// Failures that map to a dedicated exit code.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Invalid configuration {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: edm_csdl::Error,
    },
}

#[derive(Serialize)]
struct PrimitiveInfo {
    name: String,
    host_type: String,
    format: Option<&'static str>,
    versions: Vec<ProtocolVersion>,
    collection: bool,
}

#[derive(Serialize)]
struct DeclaredInfo {
    kind: &'static str,
    name: String,
    collection: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            let code = match err.downcast_ref::<CliError>() {
                Some(CliError::Config { .. }) => EXIT_CONFIG,
                None => EXIT_FAILURE,
            };
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let parser = MetadataParser::new(config);

    match cli.command {
        Commands::Parse { input, pretty } => {
            let root = parse_document(&parser, &input)?;
            let json = if pretty {
                serde_json::to_string_pretty(&root)?
            } else {
                serde_json::to_string(&root)?
            };
            println!("{}", json);
            eprintln!(
                "Parse summary: schemas={}, entity_types={}",
                root.schemas().len(),
                root.schemas()
                    .iter()
                    .map(|s| s.entity_types.len())
                    .sum::<usize>()
            );
        }
        Commands::Summary { input } => {
            let root = parse_document(&parser, &input)?;
            print!("{}", summarize(&root));
        }
        Commands::Emit { input, output } => {
            let root = parse_document(&parser, &input)?;
            let xml = to_xml_string(&root)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, xml)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {}", path.display());
                }
                None => println!("{}", xml),
            }
        }
        Commands::ResolveType { name, document } => {
            let type_ref = TypeRef::parse(&name);
            let json = match document {
                Some(path) => {
                    let root = parse_document(&parser, &path)?;
                    resolve_declared(&root, &type_ref)?
                }
                None => resolve_primitive(&type_ref, parser.version())?,
            };
            println!("{}", json);
        }
        Commands::Vocabulary { construct } => {
            for field in vocabulary(construct, parser.version()) {
                println!("{}", field);
            }
        }
        Commands::Links { input } => {
            let root = parse_document(&parser, &input)?;
            let version = root.protocol_version();
            let registry = MetadataRegistry::new();
            registry.register(root);
            let links = registry.ensure_initialized(version)?;

            let mut table: BTreeMap<&str, BTreeMap<&str, Option<&str>>> = BTreeMap::new();
            for set_name in links.entity_set_names() {
                if let Some(set) = links.entity_set(set_name) {
                    let targets = set
                        .links
                        .iter()
                        .map(|link| (link.name.as_str(), link.target.as_deref()))
                        .collect();
                    table.insert(set_name, targets);
                }
            }
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
    }

    Ok(())
}

/// File settings first, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<CsdlConfig> {
    let mut config = match &cli.config {
        Some(path) => CsdlConfig::load(path).map_err(|source| CliError::Config {
            path: path.display().to_string(),
            source,
        })?,
        None => CsdlConfig::default(),
    };
    if let Some(version) = cli.protocol {
        config.version = version;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    debug!(?config, "Resolved parser configuration");
    Ok(config)
}

fn parse_document(parser: &MetadataParser, input: &Path) -> anyhow::Result<RootDocument> {
    parser
        .parse_file(input)
        .with_context(|| format!("Failed to parse {}", input.display()))
}

fn summarize(root: &RootDocument) -> String {
    let mut out = format!(
        "Document version {} ({}), {} schema(s)\n",
        root.version,
        root.protocol_version(),
        root.schemas().len()
    );
    for schema in root.schemas() {
        match &schema.alias {
            Some(alias) => out.push_str(&format!("Schema {} (alias {})\n", schema.namespace, alias)),
            None => out.push_str(&format!("Schema {}\n", schema.namespace)),
        }
        let containers = schema.entity_containers();
        let counts = [
            ("entity_types", schema.entity_types.len()),
            ("complex_types", schema.complex_types.len()),
            ("enum_types", schema.enum_types.len()),
            ("type_definitions", schema.type_definitions().len()),
            ("associations", schema.associations().len()),
            ("functions", schema.functions().len()),
            ("actions", schema.actions().len()),
            ("entity_containers", containers.len()),
            (
                "entity_sets",
                containers.iter().map(|c| c.entity_sets.len()).sum(),
            ),
            ("annotation_groups", schema.annotation_groups.len()),
        ];
        for (label, count) in counts {
            out.push_str(&format!("  {}={}\n", label, count));
        }
    }
    out
}

fn resolve_primitive(type_ref: &TypeRef, version: ProtocolVersion) -> anyhow::Result<String> {
    let primitive = EdmSimpleType::resolve_for_version(&type_ref.element_type, version)?;
    let info = PrimitiveInfo {
        name: primitive.qualified_name(),
        host_type: format!("{:?}", primitive.host_type()),
        format: primitive.format(),
        versions: primitive.versions().to_vec(),
        collection: type_ref.is_collection,
    };
    Ok(serde_json::to_string_pretty(&info)?)
}

fn resolve_declared(root: &RootDocument, type_ref: &TypeRef) -> anyhow::Result<String> {
    let (kind, name) = match root.resolve_type(type_ref)? {
        ResolvedType::Primitive(_) => return resolve_primitive(type_ref, root.protocol_version()),
        ResolvedType::Entity(t) => ("entity", t.name.clone()),
        ResolvedType::Complex(t) => ("complex", t.name.clone()),
        ResolvedType::Enum(t) => ("enum", t.name.clone()),
        ResolvedType::Definition(t) => ("type_definition", t.name.clone()),
    };
    let info = DeclaredInfo {
        kind,
        name,
        collection: type_ref.is_collection,
    };
    Ok(serde_json::to_string_pretty(&info)?)
}
