/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json        .geojson
///        │                            │
///        ▼                            ▼
///   ┌──────────┐                ┌──────────┐
///   │  loader   │                │   geo    │  outlines → WorldMap
///   └──────────┘                └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ EmissionTable  │  Arc-shared, immutable, country/year index
///   └───────────────┘
///        │   + Selection
///        ▼
///   ┌──────────┐
///   │  filter   │  mode-dependent masks → FilteredTable (memoised)
///   └──────────┘
/// ```

pub mod filter;
pub mod geo;
pub mod loader;
pub mod model;
