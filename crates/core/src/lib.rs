pub mod cache;
pub mod config;
pub mod extract;
pub mod filter;
pub mod refresh;
pub mod registry;
pub mod search;
pub mod store;
pub mod upstream;

pub use cache::{CachedSearchPage, PageStatus, SearchCache};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, Credentials,
};
pub use filter::filter_adult_content;
pub use refresh::RefreshJob;
pub use registry::{parse_subscription, ApiSite, RegistryError, SourceRegistry};
pub use search::{SearchError, SearchEvent, SearchService, VideoResolver};
pub use store::{record_key, Favorite, PlayRecord, SqliteStore, StoreError, VideoStore};
pub use upstream::{UpstreamClient, UpstreamError, VideoResult};
