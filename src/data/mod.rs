/// Data layer: typed tables, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file against a fixed schema → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Schema + Vec<Row>, immutable after load
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  single-field predicates → surviving row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  group by key fields, mean / sum → AggregateTable
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
