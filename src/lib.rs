pub mod filter;
pub mod geo;
pub mod placement;
pub mod ranking;
pub mod refresh_status;
pub mod region;
pub mod store;
pub mod types;

pub use filter::NewsFilter;
pub use placement::{Placement, PlacementBucket, marker_radius, resolve};
pub use ranking::{RankedItem, top_threats};
pub use refresh_status::{RefreshState, RefreshStatus, read_status};
pub use region::{BroadRegion, region_from_location, region_matches};
pub use store::{NewsStore, Snapshot, StoreError};
pub use types::{Competitor, Coordinates, NewsDetails, NewsItem};
