//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use geoscope::{BoundingBox, GeoPoint, Geography, SearchLocation};

#[derive(Parser, Debug)]
#[command(name = "geoscope")]
#[command(about = "Build and run spatial search queries")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Target table, when no config file is given
    #[arg(long, global = true, default_value = "places")]
    pub target: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Averaged-Cartesian centroid of a set of points
    Centroid {
        /// Point as "lat,lng" (repeatable)
        #[arg(short, long = "point", required = true, allow_hyphen_values = true)]
        points: Vec<GeoPoint>,
    },

    /// Print the parameterized SQL for a filter
    Sql {
        #[command(subcommand)]
        filter: FilterCommand,
    },

    /// Run a filter against a JSON fixture
    Search {
        /// Fixture file: {"<table>": [{"id": 1, "geog_point": "POINT(..)"}]}
        #[arg(short, long)]
        data: PathBuf,

        #[command(subcommand)]
        filter: FilterCommand,
    },

    /// Does a shape intersect the inset envelope of a bounding box?
    Contains {
        /// Shape as WKT or EWKT
        #[arg(long)]
        shape: Geography,

        /// "minLng,minLat,maxLng,maxLat"
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,
    },

    /// Is a point within a radius of the inset envelope of a bounding box?
    WithinRadius {
        /// Point as "lat,lng"
        #[arg(long, allow_hyphen_values = true)]
        point: GeoPoint,

        /// Radius in meters
        #[arg(long)]
        radius: f64,

        /// "minLng,minLat,maxLng,maxLat"
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,
    },

    /// Union and simplify the shapes of source rows
    Union {
        #[arg(short, long)]
        data: PathBuf,

        /// Row ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,
    },

    /// Distance in miles from a source row's point to another point
    Distance {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(long)]
        id: i64,

        /// Point as "lat,lng"
        #[arg(long, allow_hyphen_values = true)]
        point: GeoPoint,
    },

    /// Area in square miles of a source row's shape
    Area {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum FilterCommand {
    /// Target points within a radius
    Radius(LocationArgs),
    /// Closest target point within a radius
    Nearest(LocationArgs),
    /// Target points covered by a shape
    Shape {
        /// Shape as WKT or EWKT
        #[arg(long)]
        shape: Geography,
    },
    /// Target points covered by a bounding box
    Bbox {
        /// "minLng,minLat,maxLng,maxLat"
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,
    },
}

#[derive(Args, Debug, Clone)]
pub struct LocationArgs {
    /// Search origin as "lat,lng"
    #[arg(long, conflicts_with = "geography", allow_hyphen_values = true)]
    pub point: Option<GeoPoint>,

    /// Search origin as a stored geography value
    #[arg(long)]
    pub geography: Option<Geography>,

    /// Radius in meters (config default when omitted)
    #[arg(long)]
    pub radius: Option<f64>,
}

impl LocationArgs {
    pub fn location(&self) -> SearchLocation {
        SearchLocation::from_attributes(
            self.geography.clone(),
            self.point.map(|p| p.lat),
            self.point.map(|p| p.lng),
        )
    }
}
