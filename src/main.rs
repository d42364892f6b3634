//! LineageDB CLI - command-line interface for the lineage graph engine

use clap::{Parser, Subcommand};
use lineagedb::cache::{CacheSweeper, LruQueryCache};
use lineagedb::config;
use lineagedb::engine::LineageEngine;
use lineagedb::node::{NodeSpec, NodeType};
use lineagedb::query::{Direction, SubgraphFilter};
use lineagedb::server;
use lineagedb::{EdgeSpec, RelationshipType, SqliteStore};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "lineagedb")]
#[command(version = "0.1.0")]
#[command(about = "Lineage graph engine - dependency tracking for data catalogs")]
#[command(long_about = r#"
LineageDB stores directed lineage relationships between data assets and
serves traversal queries over them:
  • Invariant-checked node/edge mutation (no self-loops, duplicates, cycles)
  • Subgraph retrieval, path finding with confidence scores
  • Downstream impact analysis for change planning

Example usage:
  lineagedb add-node --label orders --type table --data-source warehouse
  lineagedb paths --from <id> --to <id> --direction upstream
  lineagedb impact --id <id> --depth 5
  lineagedb serve --port 3900
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Path for the config file
        #[arg(short, long, default_value = "lineagedb.toml")]
        path: PathBuf,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Run the HTTP API server
    Serve {
        /// Path to the database file (overrides config)
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create a single node
    AddNode {
        /// Display name
        #[arg(short, long)]
        label: String,

        /// Node type (table, view, column, gold, ...)
        #[arg(short = 't', long = "type")]
        node_type: String,

        /// Data source the asset lives in
        #[arg(long)]
        data_source: Option<String>,

        /// Schema name within the data source
        #[arg(long)]
        schema: Option<String>,

        /// Table name within the schema
        #[arg(long)]
        table: Option<String>,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },

    /// Create a single edge
    AddEdge {
        /// Source node id (the dependent asset)
        #[arg(short, long)]
        from: String,

        /// Target node id (the asset depended on)
        #[arg(short, long)]
        to: String,

        /// Relationship type (derives_from, transforms_to, copies_from, aggregates_from)
        #[arg(short, long, default_value = "derives_from")]
        relationship: String,

        /// Confidence in [0.0, 1.0]; defaults to 0.8
        #[arg(short, long)]
        confidence: Option<f32>,

        /// Transformation description
        #[arg(long)]
        transformation: Option<String>,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },

    /// Bulk-import nodes from a JSON file (array of node specs)
    Import {
        /// Path to the JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },

    /// Tombstone a node and every edge touching it
    DeleteNode {
        /// Node id
        #[arg(short, long)]
        id: String,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },

    /// Tombstone a single edge
    DeleteEdge {
        /// Edge id
        #[arg(short, long)]
        id: String,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },

    /// Retrieve a filtered subgraph
    Subgraph {
        /// Restrict to one data source
        #[arg(long)]
        data_source: Option<String>,

        /// Comma-separated node types to include
        #[arg(long)]
        node_types: Option<String>,

        /// Comma-separated relationship types to include
        #[arg(long)]
        relationships: Option<String>,

        /// Result cap per entity kind
        #[arg(short, long)]
        limit: Option<usize>,

        /// Include metadata maps in the output
        #[arg(short = 'm', long)]
        include_metadata: bool,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },

    /// Enumerate paths between two nodes
    Paths {
        /// Start node id
        #[arg(short, long)]
        from: String,

        /// End node id
        #[arg(short, long)]
        to: String,

        /// Maximum path length in hops
        #[arg(long, default_value = "10")]
        depth: usize,

        /// Traversal direction (upstream, downstream, both)
        #[arg(long, default_value = "both")]
        direction: String,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },

    /// Analyze downstream impact of a change to a node
    Impact {
        /// Node id
        #[arg(short, long)]
        id: String,

        /// Maximum traversal depth
        #[arg(long, default_value = "5")]
        depth: usize,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },

    /// Show graph statistics
    Stats {
        /// Restrict to one data source
        #[arg(long)]
        data_source: Option<String>,

        /// Path to the database file
        #[arg(short, long, default_value = "lineage.db")]
        database: PathBuf,
    },
}

fn open_engine(database: &PathBuf) -> anyhow::Result<LineageEngine> {
    config::ensure_db_dir(database)?;
    Ok(LineageEngine::open(database)?)
}

fn parse_csv<T: FromStr<Err = lineagedb::Error>>(csv: &str) -> anyhow::Result<Vec<T>> {
    csv.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<T>().map_err(Into::into))
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { path, force } => {
            let default = config::LineageConfig {
                database: Some("lineage.db".to_string()),
                port: Some(3900),
                cache_ttl_secs: Some(300),
                cache_capacity: Some(256),
            };
            config::write_config(&path, &default, force)?;
            println!("✅ Wrote config to {}", path.display());
        }

        Commands::Serve { database, port } => {
            let loaded = config::load_config(None)?.unwrap_or_default();
            let database = database
                .or(loaded.database.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("lineage.db"));
            let port = port.or(loaded.port).unwrap_or(3900);
            let ttl = Duration::from_secs(loaded.cache_ttl_secs.unwrap_or(300));
            let capacity = loaded.cache_capacity.unwrap_or(256);

            config::ensure_db_dir(&database)?;
            let cache = Arc::new(LruQueryCache::new(capacity, ttl));
            let engine = LineageEngine::new(SqliteStore::open(&database)?, cache);
            // swept for the lifetime of the server, joined on shutdown
            let _sweeper = CacheSweeper::start(engine.cache(), ttl);

            println!("🗄️  Database: {:?}", database);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::start_server(port, engine))?;
        }

        Commands::AddNode {
            label,
            node_type,
            data_source,
            schema,
            table,
            description,
            database,
        } => {
            let engine = open_engine(&database)?;
            let mut spec = NodeSpec::new(label, NodeType::from_str(&node_type)?);
            spec.data_source = data_source;
            spec.schema_name = schema;
            spec.table_name = table;
            spec.description = description;

            let node = engine.create_node(spec)?;
            println!("✅ Created node {} ({})", node.label, node.id);
        }

        Commands::AddEdge {
            from,
            to,
            relationship,
            confidence,
            transformation,
            database,
        } => {
            let engine = open_engine(&database)?;
            let mut spec = EdgeSpec::new(from, to, RelationshipType::from_str(&relationship)?);
            spec.confidence = confidence;
            spec.transformation = transformation;

            let edge = engine.create_edge(spec)?;
            println!(
                "✅ Created edge {} -> {} ({}, confidence {:.2})",
                edge.from_id, edge.to_id, edge.relationship, edge.confidence
            );
        }

        Commands::Import { file, database } => {
            let engine = open_engine(&database)?;
            let contents = std::fs::read_to_string(&file)?;
            let specs: Vec<NodeSpec> = serde_json::from_str(&contents)?;

            println!("🚀 Importing {} nodes from {:?}", specs.len(), file);
            let report = engine.bulk_create_nodes(specs)?;

            println!("✅ Created: {}", report.created.len());
            if !report.is_clean() {
                println!("⚠️  Rejected: {}", report.errors.len());
                for item in &report.errors {
                    println!("  [{}] {}", item.index, item.error);
                }
            }
        }

        Commands::DeleteNode { id, database } => {
            let engine = open_engine(&database)?;
            engine.delete_node(&id)?;
            println!("🗑️  Tombstoned node {}", id);
        }

        Commands::DeleteEdge { id, database } => {
            let engine = open_engine(&database)?;
            engine.delete_edge(&id)?;
            println!("🗑️  Tombstoned edge {}", id);
        }

        Commands::Subgraph {
            data_source,
            node_types,
            relationships,
            limit,
            include_metadata,
            database,
        } => {
            let engine = open_engine(&database)?;
            let filter = SubgraphFilter {
                data_source,
                node_types: node_types.as_deref().map(parse_csv).transpose()?,
                relationships: relationships.as_deref().map(parse_csv).transpose()?,
                limit,
                include_metadata,
            };

            let result = engine.get_subgraph(&filter)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Paths {
            from,
            to,
            depth,
            direction,
            database,
        } => {
            let engine = open_engine(&database)?;
            let direction = Direction::from_str(&direction)?;
            let search = engine.find_paths(&from, &to, depth, direction)?;

            if search.paths.is_empty() {
                println!("∅ No paths found.");
            } else {
                println!("Found {} path(s):", search.paths.len());
                for path in &search.paths {
                    println!(
                        "- {} hop(s), confidence {:.2}: {}",
                        path.hops(),
                        path.confidence,
                        path.node_ids.join(" -> ")
                    );
                }
                if let Some(shortest) = &search.shortest {
                    println!("Shortest: {} hop(s)", shortest.hops());
                }
            }
        }

        Commands::Impact {
            id,
            depth,
            format,
            database,
        } => {
            let engine = open_engine(&database)?;
            println!("💥 Impact analysis for: {} (depth: {})...", id, depth);
            let report = engine.analyze_impact(&id, depth)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.affected.is_empty() {
                println!("∅ No downstream dependents.");
            } else {
                for affected in &report.affected {
                    let marker = if affected.node.node_type.is_critical() {
                        "🔴 [CRITICAL]"
                    } else {
                        "🟠"
                    };
                    println!(
                        "{} [{}] {} (depth: {})",
                        marker, affected.node.node_type, affected.node.label, affected.depth
                    );
                }
                println!("Impact radius: {}", report.impact_radius);
            }
        }

        Commands::Stats {
            data_source,
            database,
        } => {
            let engine = open_engine(&database)?;
            let stats = engine.get_statistics(data_source.as_deref())?;

            println!("📊 LineageDB Statistics ({:?})", database);
            println!("------------------------------------");
            println!("{}", stats);
        }
    }

    Ok(())
}
