use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::bbox::Bbox;
use crate::model::Item;

/// Spatial and temporal envelope of a collection, in STAC layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialExtent {
    pub bbox: Vec<Bbox>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalExtent {
    pub interval: Vec<[Option<DateTime<Utc>>; 2]>,
}

impl SpatialExtent {
    /// The overall box; STAC stores it first.
    pub fn primary(&self) -> Option<&Bbox> {
        self.bbox.first()
    }
}

impl TemporalExtent {
    pub fn primary(&self) -> Option<&[Option<DateTime<Utc>>; 2]> {
        self.interval.first()
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::empty()
    }
}

impl Extent {
    /// Placeholder for a collection whose items are not known yet.
    /// It is not a region: its single box is [`Bbox::EMPTY`] and its interval has no bounds.
    pub fn empty() -> Self {
        Self {
            spatial: SpatialExtent {
                bbox: vec![Bbox::EMPTY],
            },
            temporal: TemporalExtent {
                interval: vec![[None, None]],
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spatial.primary().map_or(true, Bbox::is_empty)
            && self
                .temporal
                .primary()
                .map_or(true, |[start, end]| start.is_none() && end.is_none())
    }

    /// Bounding union over the items' boxes and timestamps.
    ///
    /// Without items, or without any item carrying a box or a timestamp,
    /// the corresponding part stays at the [`Extent::empty`] placeholder.
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let mut bbox = Bbox::EMPTY;
        let mut start: Option<DateTime<Utc>> = None;
        let mut end: Option<DateTime<Utc>> = None;

        for item in items {
            if let Some(item_bbox) = item.bbox_2d() {
                bbox = bbox.union(&item_bbox);
            }
            if let Some(item_start) = item.start_datetime() {
                start = Some(start.map_or(item_start, |s| s.min(item_start)));
            }
            if let Some(item_end) = item.end_datetime() {
                end = Some(end.map_or(item_end, |e| e.max(item_end)));
            }
        }

        Self {
            spatial: SpatialExtent { bbox: vec![bbox] },
            temporal: TemporalExtent {
                interval: vec![[start, end]],
            },
        }
    }

    /// Plain JSON mapping of the extent.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn item(id: &str, bbox: [f64; 4], datetime: &str) -> Item {
        serde_json::from_value(json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": id,
            "geometry": null,
            "bbox": bbox,
            "properties": { "datetime": datetime },
            "links": [],
            "assets": {}
        }))
        .unwrap()
    }

    #[test]
    fn test_from_no_items_keeps_placeholder() {
        let items: Vec<Item> = Vec::new();
        let extent = Extent::from_items(&items);
        assert_eq!(extent, Extent::empty());
        assert!(extent.is_empty());
        assert!(extent.spatial.primary().unwrap().is_empty());
    }

    #[test]
    fn test_from_items_unions() {
        let items = vec![
            item("a", [0.0, 0.0, 5.0, 5.0], "2020-01-01T00:00:00Z"),
            item("b", [3.0, -2.0, 10.0, 4.0], "2020-12-31T00:00:00Z"),
            item("c", [1.0, 1.0, 2.0, 10.0], "2020-06-15T12:00:00Z"),
        ];

        let extent = Extent::from_items(&items);

        assert!(!extent.is_empty());
        assert_eq!(extent.spatial.bbox, vec![Bbox::new(0.0, -2.0, 10.0, 10.0)]);
        assert_eq!(
            extent.temporal.interval,
            vec![[
                Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
                Some(Utc.with_ymd_and_hms(2020, 12, 31, 0, 0, 0).unwrap()),
            ]]
        );
    }

    #[test]
    fn test_to_value() {
        let value = Extent::empty().to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "spatial": { "bbox": [[null, null, null, null]] },
                "temporal": { "interval": [[null, null]] }
            })
        );

        let items = vec![item("a", [0.0, 0.0, 5.0, 5.0], "2020-01-01T00:00:00Z")];
        let value = Extent::from_items(&items).to_value().unwrap();
        assert_eq!(value["spatial"]["bbox"], json!([[0.0, 0.0, 5.0, 5.0]]));
        assert_eq!(value["temporal"]["interval"][0][0], json!("2020-01-01T00:00:00Z"));
    }
}
