//! Per-grain statistics for segmented AFM height maps.
//!
//! Given a height map and a labelled segmentation of it, [`GrainStats`]
//! measures each labelled grain and collects one [`GrainRecord`] per grain
//! into a [`GrainStatsTable`], alongside plot descriptors and optional height
//! profiles.
//!
//! ```no_run
//! use grainstats::{Direction, GrainStats, GrainStatsInput, GrainStatsParams};
//! use grainstats_core::{HeightMap, LabelMap};
//!
//! let heights = HeightMap::filled(64, 64, 0.0);
//! let labels = LabelMap::filled(64, 64, 0);
//! let stats = GrainStats::new(GrainStatsParams::default()).unwrap();
//! let out = stats
//!     .calculate_stats(&GrainStatsInput {
//!         image: heights.view(),
//!         labels: Some(labels.view()),
//!         direction: Direction::Above,
//!         image_name: "scan",
//!     })
//!     .unwrap();
//! println!("{} grains", out.table.len());
//! ```
//!
//! Features:
//! - `rayon`: measure grains in parallel; output order is unchanged.
//! - `image`: render plot descriptors to `image::GrayImage`.
//! - `tracing`: spans around aggregation and the core geometry.
//! - `cli`: the `grainstats` binary.

mod error;
mod io;
mod params;
mod pipeline;
mod plot_data;
mod record;

pub use error::{GrainStatsError, SkipReason};
pub use io::{GrainScan, GrainStatsConfig, GrainStatsIoError, GrainStatsReport};
pub use params::{Direction, GrainStatsParams};
pub use pipeline::{GrainStats, GrainStatsInput, GrainStatsOutput};
pub use plot_data::{GrainPlotData, PlotArray, PlotName};
pub use record::{GrainRecord, GrainStatsTable, SkippedGrain, GRAIN_STATS_COLUMNS};

pub use grainstats_core::BoundaryMethod as EdgeDetectionMethod;
