use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use netstore_store::{
    INITIAL_VARIANT_ID, INITIAL_VARIANT_NUM, NetstoreConfig, NetworkApi, NetworkAttributes,
    NetworkStore, Resource, ResourceType, VariantNum,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init(args) => init(args).await,
        Command::Networks(args) => list_networks(args).await,
        Command::Variants(args) => list_variants(args).await,
        Command::CloneVariant(args) => clone_variant(args).await,
        Command::DeleteVariant(args) => delete_variant(args).await,
    }
}

#[derive(Parser)]
#[command(author, version, about = "Developer utilities for the network store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the datastore directory, its config and schema, optionally with an empty network.
    Init(InitArgs),
    /// List the networks of a datastore.
    Networks(DatastoreArgs),
    /// List the variants of one network.
    Variants(NetworkArgs),
    /// Clone a variant into a new copy-on-write variant.
    CloneVariant(CloneVariantArgs),
    /// Delete a variant other than the initial one.
    DeleteVariant(DeleteVariantArgs),
}

#[derive(Parser)]
struct DatastoreArgs {
    /// Directory where the datastore lives (contains netstore.json and the sqlite file).
    #[arg(long, default_value = ".netstore")]
    datastore: PathBuf,
}

#[derive(Parser)]
struct InitArgs {
    #[command(flatten)]
    store: DatastoreArgs,
    /// Id of an empty network to create in the initial variant.
    #[arg(long)]
    network_id: Option<String>,
    /// Remove any existing datastore contents first.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Parser)]
struct NetworkArgs {
    #[command(flatten)]
    store: DatastoreArgs,
    /// Network uuid.
    #[arg(long)]
    network: Uuid,
}

#[derive(Parser)]
struct CloneVariantArgs {
    #[command(flatten)]
    network: NetworkArgs,
    /// Variant number to clone.
    #[arg(long, default_value_t = INITIAL_VARIANT_NUM)]
    source: VariantNum,
    /// Number of the new variant.
    #[arg(long)]
    target: VariantNum,
    /// Name of the new variant.
    #[arg(long)]
    target_id: String,
    /// Replace an existing variant with the same number or name.
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

#[derive(Parser)]
struct DeleteVariantArgs {
    #[command(flatten)]
    network: NetworkArgs,
    /// Variant number to delete.
    #[arg(long)]
    variant: VariantNum,
}

async fn open(args: &DatastoreArgs) -> Result<NetworkStore> {
    NetworkStore::open(&args.datastore)
        .await
        .with_context(|| format!("open datastore {}", args.datastore.display()))
}

async fn init(args: InitArgs) -> Result<()> {
    let base = &args.store.datastore;
    if args.force && base.exists() {
        fs::remove_dir_all(base).with_context(|| format!("remove {}", base.display()))?;
    }
    let config = NetstoreConfig::load_or_init_in(base).context("load datastore config")?;
    let store = open(&args.store).await?;
    println!(
        "datastore ready at {} ({} backend)",
        base.display(),
        config.backend_name()
    );
    if let Some(network_id) = args.network_id {
        let uuid = Uuid::new_v4();
        store
            .create_network(Resource {
                resource_type: ResourceType::Network,
                id: network_id.clone(),
                variant_num: INITIAL_VARIANT_NUM,
                attributes: NetworkAttributes::new(uuid),
            })
            .await
            .context("create network")?;
        println!("created network {network_id} ({uuid}) with variant {INITIAL_VARIANT_ID}");
    }
    Ok(())
}

async fn list_networks(args: DatastoreArgs) -> Result<()> {
    let store = open(&args).await?;
    let networks = store.get_networks().await?;
    if networks.is_empty() {
        println!("no networks");
    }
    for network in networks {
        println!("{}\t{}", network.uuid, network.id);
    }
    Ok(())
}

async fn list_variants(args: NetworkArgs) -> Result<()> {
    let store = open(&args.store).await?;
    let variants = store.get_variants_infos(args.network).await?;
    if variants.is_empty() {
        return Err(anyhow!("network {} not found", args.network));
    }
    for variant in variants {
        let kind = if variant.scope().is_full() {
            "full".to_string()
        } else {
            format!("partial of {}", variant.full_variant_num)
        };
        println!("{}\t{}\t{kind}", variant.num, variant.id);
    }
    Ok(())
}

async fn clone_variant(args: CloneVariantArgs) -> Result<()> {
    let store = open(&args.network.store).await?;
    let network = args.network.network;
    store
        .clone_variant(
            network,
            args.source,
            args.target,
            &args.target_id,
            args.overwrite,
        )
        .await
        .with_context(|| format!("clone variant {} of {network}", args.source))?;
    println!(
        "cloned variant {} into {} ({})",
        args.source, args.target, args.target_id
    );
    Ok(())
}

async fn delete_variant(args: DeleteVariantArgs) -> Result<()> {
    let store = open(&args.network.store).await?;
    let network = args.network.network;
    store
        .delete_variant(network, args.variant)
        .await
        .with_context(|| format!("delete variant {} of {network}", args.variant))?;
    println!("deleted variant {}", args.variant);
    Ok(())
}
