mod extent;
mod item;

pub use extent::{Extent, SpatialExtent, TemporalExtent};
pub use item::{Asset, Item, Link, Properties};

use serde::Serialize;
use std::path::{Path, PathBuf};

/// The operations the builder and the filters need from a catalog node.
pub trait StacNode {
    fn id(&self) -> &str;

    fn add_child(&mut self, child: Collection);

    fn add_item(&mut self, item: Item);

    fn children(&self) -> &[Collection];

    fn items(&self) -> &[Item];

    /// Extent covering the node's own items.
    fn extent_from_items(&self) -> Extent {
        Extent::from_items(self.items())
    }
}

/// Root container of a STAC hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub id: String,
    pub description: String,
    #[serde(skip)]
    pub href: PathBuf,
    #[serde(skip)]
    children: Vec<Collection>,
    #[serde(skip)]
    items: Vec<Item>,
}

impl Catalog {
    pub fn new(id: impl Into<String>, description: impl Into<String>, href: &Path) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            href: href.to_path_buf(),
            children: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.children.iter().find(|c| c.id == id)
    }
}

impl StacNode for Catalog {
    fn id(&self) -> &str {
        &self.id
    }

    fn add_child(&mut self, child: Collection) {
        self.children.push(child);
    }

    fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    fn children(&self) -> &[Collection] {
        &self.children
    }

    fn items(&self) -> &[Item] {
        &self.items
    }
}

/// Group of items sharing one tile, with their aggregate extent.
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub id: String,
    pub description: String,
    pub extent: Extent,
    #[serde(skip)]
    pub href: PathBuf,
    #[serde(skip)]
    children: Vec<Collection>,
    #[serde(skip)]
    items: Vec<Item>,
}

impl Collection {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        extent: Extent,
        href: &Path,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            extent,
            href: href.to_path_buf(),
            children: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Replaces the stored extent with the one derived from the current items.
    pub fn update_extent_from_items(&mut self) {
        self.extent = self.extent_from_items();
    }
}

impl StacNode for Collection {
    fn id(&self) -> &str {
        &self.id
    }

    fn add_child(&mut self, child: Collection) {
        self.children.push(child);
    }

    fn add_item(&mut self, mut item: Item) {
        item.collection = Some(self.id.clone());
        self.items.push(item);
    }

    fn children(&self) -> &[Collection] {
        &self.children
    }

    fn items(&self) -> &[Item] {
        &self.items
    }
}
