use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use docsmith::config::BaseConfig;
use docsmith::telemetry;
use docsmith::{
    create_proofs_batch, verify_proof, AnchorCoordinator, Document, DocumentHasher,
    DocumentStore, DocumentTree, Hash32, Identifier, KvBackendVariant, LedgerVariant,
    NoopLedger, Proof, RocksBackend,
};

#[derive(Debug, Parser)]
#[command(name = "docsmith", about = "Salted Merkle commitments over structured documents")]
struct Cli {
    #[command(flatten)]
    config: BaseConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the root of a JSON document.
    Root { doc: PathBuf },
    /// Print inclusion proofs for the given properties.
    Prove {
        doc: PathBuf,
        #[arg(required = true)]
        properties: Vec<String>,
    },
    /// Check a JSON proof against a hex root.
    Verify { proof: PathBuf, root: String },
    /// Persist and anchor a document, printing it with its root.
    Anchor { doc: PathBuf },
    /// Show the anchoring state of a hex document identifier.
    Status { id: String },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn parse_root(raw: &str) -> Result<Hash32> {
    let mut root = [0u8; 32];
    hex::decode_to_slice(raw.trim_start_matches("0x"), &mut root)
        .with_context(|| format!("invalid root {raw}"))?;
    Ok(root)
}

fn coordinator(config: &BaseConfig) -> Result<AnchorCoordinator<KvBackendVariant, LedgerVariant>> {
    let backend = KvBackendVariant::Rocks(RocksBackend::open(&config.storage_path)?);
    let store = DocumentStore::new(Arc::new(backend), config.key_prefix.as_bytes());
    Ok(AnchorCoordinator::new(
        Arc::new(store),
        Arc::new(LedgerVariant::Noop(NoopLedger)),
        config.ledger_timeout(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();
    info!(
        "Starting docsmith: storage_path={}, key_prefix={}",
        cli.config.storage_path, cli.config.key_prefix
    );

    match cli.command {
        Command::Root { doc } => {
            let doc: Document = read_json(&doc)?;
            let tree = DocumentTree::<DocumentHasher>::build(&doc)?;
            println!("{}", hex::encode(tree.root()));
        }
        Command::Prove { doc, properties } => {
            let doc: Document = read_json(&doc)?;
            let proofs = create_proofs_batch(&doc, &properties[..])?;
            println!("{}", serde_json::to_string_pretty(&proofs)?);
        }
        Command::Verify { proof, root } => {
            let proof: Proof = read_json(&proof)?;
            let root = parse_root(&root)?;
            if !verify_proof::<DocumentHasher>(&proof, &root)? {
                bail!("proof for `{}` does not match root", proof.property);
            }
            println!("ok");
        }
        Command::Anchor { doc } => {
            let doc: Document = read_json(&doc)?;
            let anchored = coordinator(&cli.config)?.anchor(&doc).await?;
            println!("{}", serde_json::to_string_pretty(&anchored)?);
        }
        Command::Status { id } => {
            let id = Identifier::new(
                hex::decode(id.trim_start_matches("0x")).context("invalid identifier")?,
            );
            let state = coordinator(&cli.config)?.status(&id)?;
            println!("{state:?}");
        }
    }

    info!("docsmith done");
    Ok(())
}
