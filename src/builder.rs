use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, StacError};
use crate::model::{Catalog, Collection, Extent, Item, StacNode};

pub const DEFAULT_ITEM_PATTERN: &str = "**/odc-metadata.stac-item.json";
pub const DEFAULT_COLLECTION_PATTERN: &str = r"[SN]\d{2}[EW]\d{3}";
pub const TILE_NAME_LENGTH: usize = 7;

/// How tile directories are recognised among the root's sub-directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionPattern {
    /// Directory name starts with a match of this regular expression, e.g. `S02E017`.
    Regex(String),
    /// Directory name is exactly this many characters long.
    FixedLength(usize),
}

impl Default for CollectionPattern {
    fn default() -> Self {
        CollectionPattern::Regex(DEFAULT_COLLECTION_PATTERN.to_string())
    }
}

/// What to do with an item document that cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemErrorPolicy {
    /// Skip malformed documents and keep going. Filesystem errors still abort.
    #[default]
    Skip,
    /// Abort the whole build on the first failure.
    Fail,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub item_pattern: String,
    pub collection_pattern: CollectionPattern,
    pub on_item_error: ItemErrorPolicy,
    /// Report per-tile item counts and skipped documents at info/warn level instead of debug.
    pub verbose: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            item_pattern: DEFAULT_ITEM_PATTERN.to_string(),
            collection_pattern: CollectionPattern::default(),
            on_item_error: ItemErrorPolicy::default(),
            verbose: false,
        }
    }
}

#[derive(Debug)]
enum TileFilter {
    Regex(Regex),
    FixedLength(usize),
}

impl TileFilter {
    fn matches(&self, name: &str) -> bool {
        match self {
            TileFilter::Regex(regex) => regex.is_match(name),
            TileFilter::FixedLength(len) => name.chars().count() == *len,
        }
    }
}

/// Builds an in-memory catalog from a directory of tiles holding existing STAC items.
#[derive(Debug)]
pub struct HierarchyBuilder {
    options: BuildOptions,
    tile_filter: TileFilter,
}

impl HierarchyBuilder {
    pub fn new(options: BuildOptions) -> Result<Self> {
        let tile_filter = match &options.collection_pattern {
            // 先頭一致のみ（名前の末尾は問わない）
            CollectionPattern::Regex(pattern) => {
                TileFilter::Regex(Regex::new(&format!("^(?:{})", pattern))?)
            }
            CollectionPattern::FixedLength(len) => TileFilter::FixedLength(*len),
        };

        glob::Pattern::new(&options.item_pattern).map_err(|source| StacError::InvalidGlob {
            pattern: options.item_pattern.clone(),
            source,
        })?;

        Ok(Self {
            options,
            tile_filter,
        })
    }

    pub fn build(&self, root_dir: &Path) -> Result<Catalog> {
        if !root_dir.is_dir() {
            return Err(StacError::NotADirectory(root_dir.to_path_buf()));
        }

        let root_name = stem(root_dir);
        let mut catalog = Catalog::new(
            format!("{}_catalog", root_name),
            format!("STAC Catalog for {} products", root_name),
            &root_dir.join("catalog.json"),
        );

        let tile_dirs = self.tile_directories(root_dir)?;
        debug!("Found {} tile directories in {:?}", tile_dirs.len(), root_dir);

        for tile_dir in tile_dirs {
            let collection = self.build_collection(&root_name, &tile_dir)?;
            catalog.add_child(collection);
        }

        Ok(catalog)
    }

    fn tile_directories(&self, root_dir: &Path) -> Result<Vec<PathBuf>> {
        let io_error = |source| StacError::Io {
            path: root_dir.to_path_buf(),
            source,
        };

        let mut dirs = Vec::new();
        for entry in fs::read_dir(root_dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if !path.is_dir() {
                continue;
            }

            let matches = path
                .file_name()
                .map(|name| self.tile_filter.matches(&name.to_string_lossy()))
                .unwrap_or(false);
            if matches {
                dirs.push(path);
            }
        }

        // read_dirの順序は不定なので名前順に並べる
        dirs.sort();
        Ok(dirs)
    }

    fn build_collection(&self, root_name: &str, tile_dir: &Path) -> Result<Collection> {
        let tile = stem(tile_dir);
        let item_paths = self.find_items(tile_dir)?;

        let mut collection = Collection::new(
            tile.clone(),
            format!(
                "STAC Collection for {} products of tile {}.",
                root_name, tile
            ),
            Extent::empty(),
            &tile_dir.join("collection.json"),
        );

        for item_path in &item_paths {
            let in_tile = item_path
                .parent()
                .map(|parent| parent.to_string_lossy().contains(tile.as_str()))
                .unwrap_or(false);
            if !in_tile {
                debug!("Skipping {:?}: outside of tile {}", item_path, tile);
                continue;
            }

            let Some(mut item) = self.load_item(item_path, &tile)? else {
                continue;
            };

            item.set_self_href(item_path);
            item.make_asset_hrefs_relative();
            collection.add_item(item);
        }

        // アイテムが無い場合は初期値のExtentのまま
        if !collection.items().is_empty() {
            collection.update_extent_from_items();
        }

        if self.options.verbose {
            info!(
                "{} - {} ({} loaded)",
                tile,
                item_paths.len(),
                collection.items().len()
            );
        } else {
            debug!(
                "{} - {} ({} loaded)",
                tile,
                item_paths.len(),
                collection.items().len()
            );
        }

        Ok(collection)
    }

    fn find_items(&self, tile_dir: &Path) -> Result<Vec<PathBuf>> {
        let base = glob::Pattern::escape(&tile_dir.to_string_lossy());
        let pattern = Path::new(&base)
            .join(&self.options.item_pattern)
            .to_string_lossy()
            .into_owned();

        let paths = glob::glob(&pattern).map_err(|source| StacError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;

        let mut items = Vec::new();
        for entry in paths {
            let path = entry?;
            if path.is_file() {
                items.push(path);
            }
        }

        Ok(items)
    }

    fn load_item(&self, path: &Path, tile: &str) -> Result<Option<Item>> {
        match Item::from_file(path) {
            Ok(item) => Ok(Some(item)),
            Err(e)
                if self.options.on_item_error == ItemErrorPolicy::Skip
                    && e.is_malformed_document() =>
            {
                if self.options.verbose {
                    warn!("Could not read {:?} in tile {} - Skip! ({})", path, tile, e);
                } else {
                    debug!("Could not read {:?} in tile {} - Skip! ({})", path, tile, e);
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Builds the catalog for `root_dir` with the given options.
pub fn build_hierarchy(root_dir: &Path, options: &BuildOptions) -> Result<Catalog> {
    HierarchyBuilder::new(options.clone())?.build(root_dir)
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
