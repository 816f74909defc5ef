//! Data-fetch collaborators: provider trait, concrete providers, and the cache

pub mod cache;
pub mod csv_import;
pub mod dates;
pub mod eastmoney;
pub mod market;
pub mod provider;
pub mod synthetic;

pub use cache::{CacheMeta, CacheStatus, CachedProvider, SeriesCache};
pub use csv_import::CsvProvider;
pub use dates::{format_yyyymmdd, parse_flexible, parse_yyyymmdd};
pub use eastmoney::EastmoneyProvider;
pub use market::MarketIndex;
pub use provider::{fallback_display_name, fetch_as_bars, DataError, DataSource, MarketDataProvider};
pub use synthetic::SyntheticProvider;
