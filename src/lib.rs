pub mod bbox;
pub mod builder;
pub mod error;
pub mod filter;
pub mod model;
pub mod time;

pub use bbox::{bbox_intersection, Bbox};
pub use builder::{
    build_hierarchy, BuildOptions, CollectionPattern, HierarchyBuilder, ItemErrorPolicy,
};
pub use error::{Result, StacError};
pub use filter::{filter_catalog, filter_collection_ids, CatalogFilter, FilteredItems};
pub use model::{Catalog, Collection, Extent, Item, StacNode};
pub use time::{parse_time, TimeRange};
