use tracing::debug;

use crate::bbox::{bbox_intersection, Bbox};
use crate::error::Result;
use crate::model::{Collection, Item, StacNode};
use crate::time::{TimeRange, DEFAULT_TIME_PATTERN};

/// Items surviving [`filter_catalog`].
///
/// Without a time range the items stay grouped per collection; with one they
/// are returned as a single flat list.
#[derive(Debug, Clone, PartialEq)]
pub enum FilteredItems<'a> {
    Grouped(Vec<Vec<&'a Item>>),
    Flat(Vec<&'a Item>),
}

impl<'a> FilteredItems<'a> {
    pub fn len(&self) -> usize {
        match self {
            FilteredItems::Grouped(groups) => groups.iter().map(Vec::len).sum(),
            FilteredItems::Flat(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All items, in collection order, regardless of grouping.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &'a Item> + '_> {
        match self {
            FilteredItems::Grouped(groups) => Box::new(groups.iter().flatten().copied()),
            FilteredItems::Flat(items) => Box::new(items.iter().copied()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogFilter<'a> {
    pub collections: Vec<&'a Collection>,
    pub items: FilteredItems<'a>,
}

/// Selects the child collections of `node` whose extent meets `bbox`, then the
/// items of those collections taken within `time_range`.
///
/// A collection passes the spatial test when any of its extent boxes
/// intersects `bbox`; collections without a usable box are dropped.
/// `time_range` holds two strings parsed with `time_pattern`
/// (default `%Y-%m-%d`) and is applied to item timestamps, both ends included.
pub fn filter_catalog<'a, N>(
    node: &'a N,
    bbox: Option<&Bbox>,
    time_range: Option<(&str, &str)>,
    time_pattern: Option<&str>,
) -> Result<CatalogFilter<'a>>
where
    N: StacNode + ?Sized,
{
    let time_range = match time_range {
        Some((start, end)) => Some(TimeRange::parse(
            start,
            end,
            time_pattern.unwrap_or(DEFAULT_TIME_PATTERN),
        )?),
        None => None,
    };

    let collections: Vec<&Collection> = match bbox {
        None => node.children().iter().collect(),
        Some(query) => node
            .children()
            .iter()
            .filter(|collection| {
                collection
                    .extent
                    .spatial
                    .bbox
                    .iter()
                    .any(|b| bbox_intersection(query, b).is_some())
            })
            .collect(),
    };

    let items = match time_range {
        None => FilteredItems::Grouped(
            collections
                .iter()
                .map(|collection| collection.items().iter().collect())
                .collect(),
        ),
        Some(range) => FilteredItems::Flat(
            collections
                .iter()
                .flat_map(|collection| collection.items())
                .filter(|item| item.datetime().is_some_and(|time| range.contains(&time)))
                .collect(),
        ),
    };

    debug!(
        "Filtered {}: {} collections, {} items",
        node.id(),
        collections.len(),
        items.len()
    );

    Ok(CatalogFilter { collections, items })
}

/// Ids of the collections whose primary box overlaps `bbox` and whose primary
/// interval overlaps `time_range`.
///
/// A collection still carrying the empty placeholder box never passes a
/// spatial query, and one without any interval bound never passes a temporal one.
pub fn filter_collection_ids<'a, I>(
    collections: I,
    bbox: Option<&Bbox>,
    time_range: Option<&TimeRange>,
) -> Vec<String>
where
    I: IntoIterator<Item = &'a Collection>,
{
    collections
        .into_iter()
        .filter(|collection| {
            bbox.map_or(true, |query| {
                collection
                    .extent
                    .spatial
                    .primary()
                    .is_some_and(|b| b.overlaps(query))
            })
        })
        .filter(|collection| {
            time_range.map_or(true, |range| {
                collection
                    .extent
                    .temporal
                    .primary()
                    .is_some_and(|[start, end]| range.overlaps(start.as_ref(), end.as_ref()))
            })
        })
        .map(|collection| collection.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StacError;
    use crate::model::{Catalog, Extent};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::path::Path;

    fn item(id: &str, bbox: [f64; 4], datetime: &str) -> Item {
        serde_json::from_value(json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": id,
            "geometry": null,
            "bbox": bbox,
            "properties": { "datetime": datetime },
            "assets": {}
        }))
        .unwrap()
    }

    fn collection(id: &str, items: Vec<Item>) -> Collection {
        let mut collection =
            Collection::new(id, "test", Extent::empty(), Path::new("collection.json"));
        for item in items {
            collection.add_item(item);
        }
        if !collection.items().is_empty() {
            collection.update_extent_from_items();
        }
        collection
    }

    /// Collection A covers [0,0,10,10] over 2020, B covers [20,20,30,30] in 2021, C has no items.
    fn catalog() -> Catalog {
        let mut catalog = Catalog::new("test_catalog", "test", Path::new("catalog.json"));
        catalog.add_child(collection(
            "A",
            vec![
                item("a1", [0.0, 0.0, 5.0, 5.0], "2020-01-01T00:00:00Z"),
                item("a2", [5.0, 5.0, 10.0, 10.0], "2020-06-15T00:00:00Z"),
                item("a3", [2.0, 2.0, 8.0, 8.0], "2020-12-31T00:00:00Z"),
            ],
        ));
        catalog.add_child(collection(
            "B",
            vec![
                item("b1", [20.0, 20.0, 30.0, 30.0], "2021-03-01T00:00:00Z"),
                item("b2", [20.0, 20.0, 25.0, 25.0], "2021-04-01T00:00:00Z"),
            ],
        ));
        catalog.add_child(collection("C", vec![]));
        catalog
    }

    fn ids(items: &FilteredItems) -> Vec<String> {
        items.iter().map(|item| item.id.clone()).collect()
    }

    #[test]
    fn test_no_filters_keeps_everything_grouped() {
        let catalog = catalog();
        let result = filter_catalog(&catalog, None, None, None).unwrap();

        assert_eq!(result.collections.len(), 3);
        match &result.items {
            FilteredItems::Grouped(groups) => {
                let sizes: Vec<_> = groups.iter().map(Vec::len).collect();
                assert_eq!(sizes, vec![3, 2, 0]);
            }
            other => panic!("expected grouped items, got {:?}", other),
        }
    }

    #[test]
    fn test_bbox_filter() {
        let catalog = catalog();

        let result =
            filter_catalog(&catalog, Some(&Bbox::new(5.0, 5.0, 15.0, 15.0)), None, None).unwrap();
        let collection_ids: Vec<_> = result.collections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(collection_ids, vec!["A"]);
        assert_eq!(ids(&result.items), vec!["a1", "a2", "a3"]);

        let result =
            filter_catalog(&catalog, Some(&Bbox::new(-180.0, -90.0, 180.0, 90.0)), None, None)
                .unwrap();
        let collection_ids: Vec<_> = result.collections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(collection_ids, vec!["A", "B"]);

        let result =
            filter_catalog(&catalog, Some(&Bbox::new(40.0, 40.0, 50.0, 50.0)), None, None).unwrap();
        assert!(result.collections.is_empty());
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_time_filter_flattens() {
        let catalog = catalog();

        let result =
            filter_catalog(&catalog, None, Some(("2020-06-15", "2021-03-01")), None).unwrap();

        assert!(matches!(result.items, FilteredItems::Flat(_)));
        assert_eq!(ids(&result.items), vec!["a2", "a3", "b1"]);
    }

    #[test]
    fn test_bbox_and_time_filter() {
        let catalog = catalog();

        let result = filter_catalog(
            &catalog,
            Some(&Bbox::new(0.0, 0.0, 1.0, 1.0)),
            Some(("01/06/2020", "01/01/2021")),
            Some("%d/%m/%Y"),
        )
        .unwrap();

        assert_eq!(result.collections.len(), 1);
        assert_eq!(ids(&result.items), vec!["a2", "a3"]);
    }

    #[test]
    fn test_malformed_time_range() {
        let catalog = catalog();
        let err = filter_catalog(&catalog, None, Some(("2020-01-01", "tomorrow")), None).unwrap_err();
        assert!(matches!(err, StacError::TimeParse { .. }));
    }

    #[test]
    fn test_collection_ids_overlap() {
        let catalog = catalog();
        let query_time = TimeRange::new(
            Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
        );

        let ids = filter_collection_ids(
            catalog.children(),
            Some(&Bbox::new(5.0, 5.0, 15.0, 15.0)),
            Some(&query_time),
        );
        assert_eq!(ids, vec!["A"]);

        let ids = filter_collection_ids(
            catalog.children(),
            Some(&Bbox::new(20.0, 20.0, 30.0, 30.0)),
            Some(&query_time),
        );
        assert!(ids.is_empty());

        let later = TimeRange::new(
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
        );
        let ids = filter_collection_ids(catalog.children(), Some(&Bbox::new(5.0, 5.0, 15.0, 15.0)), Some(&later));
        assert!(ids.is_empty());

        let ids = filter_collection_ids(catalog.children(), None, Some(&later));
        assert_eq!(ids, vec!["B"]);
    }

    #[test]
    fn test_collection_ids_skip_placeholder_extent() {
        let catalog = catalog();
        let whole_world = Bbox::new(-180.0, -90.0, 180.0, 90.0);

        let ids = filter_collection_ids(catalog.children(), Some(&whole_world), None);
        assert_eq!(ids, vec!["A", "B"]);

        let ids = filter_collection_ids(catalog.children(), None, None);
        assert_eq!(ids, vec!["A", "B", "C"]);
    }
}
