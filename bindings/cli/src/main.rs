//! Command line host for the CAS service registry.
//!
//! Every invocation prints one JSON result object on stdout:
//! `{"changed": bool, "message": str}` on success, `{"failed": true, "msg": str}`
//! on failure (with a non-zero exit code). Logs go to stderr.

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{anyhow, Context};
use cas_registry::{
    common::{
        attribute::AttributeMapping,
        input::{DescriptorInput, SamlServiceInput, ServiceInput},
    },
    FsRegistry, ServiceRegistry,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cas-registry")]
#[command(about = "Create and remove CAS service registry descriptors")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a generic CAS service descriptor
    Service {
        /// Service registry directory
        #[arg(short, long)]
        registry: PathBuf,

        /// Service URL or pattern
        #[arg(long)]
        entity_id: String,

        /// Service id (random 4-digit id when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: String,

        /// Evaluation order to use instead of the numeric id
        #[arg(long)]
        evaluation_order_override: Option<i64>,

        /// Released attribute, repeatable
        #[arg(short, long = "attribute")]
        attributes: Vec<String>,
    },
    /// Create a SAML service provider descriptor
    SamlService {
        /// Service registry directory
        #[arg(short, long)]
        registry: PathBuf,

        /// SAML entity ID
        #[arg(long)]
        entity_id: String,

        /// Service id (random 4-digit id when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: String,

        #[arg(long)]
        metadata_location: String,

        #[arg(long)]
        name_id_format: String,

        /// Principal attribute used as NameID
        #[arg(long)]
        name_id_attribute: String,

        /// Evaluation order to use instead of the numeric id
        #[arg(long)]
        evaluation_order_override: Option<i64>,

        /// Released attribute as `name=uri`, repeatable
        #[arg(short, long = "attribute", value_parser = parse_pair)]
        attributes: Vec<(String, String)>,
    },
    /// Remove a descriptor file or a whole registry directory
    Remove {
        /// File, link or directory to remove
        target: PathBuf,
    },
    /// Run from a JSON argument file using the provisioning module parameter names
    Apply {
        /// Descriptor shape to create when `state` is `present`
        #[arg(long, value_enum, default_value_t = Kind::Service)]
        kind: Kind,

        /// JSON argument file
        args: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Service,
    Saml,
}

fn parse_pair(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(name, uri)| (name.to_string(), uri.to_string()))
        .ok_or_else(|| format!("expected name=uri, got `{arg}`"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse().command) {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(?err, "operation failed");
            println!("{}", json!({ "failed": true, "msg": format!("{err:#}") }));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<Value> {
    match command {
        Command::Service {
            registry,
            entity_id,
            id,
            name,
            description,
            evaluation_order_override,
            attributes,
        } => create(
            registry,
            ServiceInput {
                service_id: entity_id,
                name,
                description,
                allowed_attributes: attributes,
                evaluation_order_override,
                id,
            }
            .into(),
        ),
        Command::SamlService {
            registry,
            entity_id,
            id,
            name,
            description,
            metadata_location,
            name_id_format,
            name_id_attribute,
            evaluation_order_override,
            attributes,
        } => create(
            registry,
            SamlServiceInput {
                entity_id,
                name,
                description,
                metadata_location,
                required_name_id_format: name_id_format,
                name_id_attribute,
                attributes: attributes.into_iter().collect::<AttributeMapping>(),
                evaluation_order_override,
                id,
            }
            .into(),
        ),
        Command::Remove { target } => remove(target),
        Command::Apply { kind, args } => apply(kind, args),
    }
}

fn create(registry: PathBuf, input: DescriptorInput) -> anyhow::Result<Value> {
    let created = FsRegistry::new(registry).create(&input)?;
    Ok(json!({ "changed": true, "message": created.to_string() }))
}

fn remove(target: PathBuf) -> anyhow::Result<Value> {
    let removed = cas_registry::remove(target)?;
    Ok(json!({ "changed": removed.changed(), "message": removed.to_string() }))
}

fn apply(kind: Kind, args: PathBuf) -> anyhow::Result<Value> {
    let text = fs::read_to_string(&args)
        .with_context(|| format!("reading arguments from {}", args.display()))?;
    let args: Value = serde_json::from_str(&text).context("parsing arguments")?;

    let registry = args
        .get("service_registry_path")
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("missing or invalid parameters: service_registry_path"))?;

    match args.get("state").and_then(Value::as_str) {
        Some("present") => {
            let input: DescriptorInput = match kind {
                Kind::Service => ServiceInput::from_args(&args)?.into(),
                Kind::Saml => SamlServiceInput::from_args(&args)?.into(),
            };
            create(registry, input)
        }
        Some("absent") => remove(registry),
        other => Err(anyhow!(
            "value of state must be one of: present, absent, got: {}",
            other.unwrap_or("null")
        )),
    }
}
