//! Command-line front end for building and running spatial queries.
//!
//! `sql` prints what would be sent to a geography-enabled database; the
//! other commands run against the in-memory store loaded from a fixture.

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geoscope::config::{Config, SearchConfig};
use geoscope::query::SpatialQuery;
use geoscope::{
    spherical_centroid, Error, MemoryStore, SearchEntity, SpatialOps, SpatialPredicateBuilder,
    TableRef,
};

use crate::args::{Cli, Command, FilterCommand};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config {
            target: TableRef::new(&cli.target),
            source: None,
            search: SearchConfig::default(),
        },
    };
    debug!("Target table: {}", config.target.table);

    let output = run(cli.command, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<serde_json::Value> {
    let builder = config.builder();

    match command {
        Command::Centroid { points } => {
            let centroid = spherical_centroid(points)?;
            Ok(json!({ "lat": centroid.lat, "lng": centroid.lng }))
        }

        Command::Sql { filter } => {
            let query = build_filter(&builder, &filter)?;
            Ok(serde_json::to_value(query.to_statement())?)
        }

        Command::Search { data, filter } => {
            let query = build_filter(&builder, &filter)?;
            let ops = SpatialOps::new(builder, load_store(&data)?);
            info!("Running {} filter", filter_name(&filter));
            let ids = ops.execute(&query).await?;
            Ok(json!({ "table": config.target.table, "ids": ids }))
        }

        Command::Contains { shape, bbox } => {
            let ops = SpatialOps::new(builder, MemoryStore::new());
            let contained = ops.bounding_box_contains(&shape, bbox).await?;
            Ok(json!({ "contains": contained, "envelope": bbox.inset() }))
        }

        Command::WithinRadius {
            point,
            radius,
            bbox,
        } => {
            let ops = SpatialOps::new(builder, MemoryStore::new());
            let within = ops.bounding_box_within_radius(point, radius, bbox).await?;
            Ok(json!({ "within": within, "envelope": bbox.inset() }))
        }

        Command::Union { data, ids } => {
            let ops = SpatialOps::new(builder, load_store(&data)?);
            let shape = ops.union_simplify(config.source_table(), &ids).await?;
            Ok(json!({ "ids": ids, "shape": shape }))
        }

        Command::Distance { data, id, point } => {
            let ops = SpatialOps::new(builder, load_store(&data)?);
            let entity = source_entity(ops.store(), config, id)?;
            let miles = ops.distance_between(&entity, point).await?;
            Ok(json!({ "id": id, "miles": miles }))
        }

        Command::Area { data, id } => {
            let ops = SpatialOps::new(builder, load_store(&data)?);
            let entity = source_entity(ops.store(), config, id)?;
            let square_miles = ops.area_of_shape(&entity).await?;
            Ok(json!({ "id": id, "square_miles": square_miles }))
        }
    }
}

fn build_filter(builder: &SpatialPredicateBuilder, filter: &FilterCommand) -> Result<SpatialQuery> {
    let query = match filter {
        FilterCommand::Radius(args) => builder.radius_filter(&args.location(), args.radius),
        FilterCommand::Nearest(args) => builder.nearest_filter(&args.location(), args.radius),
        FilterCommand::Shape { shape } => Some(builder.shape_containment_filter(shape)),
        FilterCommand::Bbox { bbox } => Some(builder.bounding_box_filter(*bbox)),
    };
    Ok(query.ok_or(Error::MissingLocation)?)
}

fn filter_name(filter: &FilterCommand) -> &'static str {
    match filter {
        FilterCommand::Radius(_) => "radius",
        FilterCommand::Nearest(_) => "nearest",
        FilterCommand::Shape { .. } => "shape",
        FilterCommand::Bbox { .. } => "bounding box",
    }
}

fn load_store(path: &std::path::Path) -> Result<MemoryStore> {
    MemoryStore::load_json(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn source_entity(store: &MemoryStore, config: &Config, id: i64) -> Result<SearchEntity> {
    let source = config.source_table();
    store
        .entity(source, id)
        .with_context(|| format!("No row {} in {}", id, source.table))
}
