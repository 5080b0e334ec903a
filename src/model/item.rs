use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::bbox::Bbox;
use crate::error::{Result, StacError};

/// A STAC item document.
///
/// Fields this crate works with are typed; everything else is kept in `extra`
/// so that a loaded document serializes back without losing information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub stac_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    pub id: String,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    pub properties: Properties,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    self_href: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_datetime: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_datetime: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// RFC 3339 timestamps, plus zoneless ones which are read as UTC.
fn deserialize_datetime<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(&value)
        .map(|datetime| datetime.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S%.f"))
                .map(|naive| naive.and_utc())
        })
        .map_err(|e| {
            <D::Error as de::Error>::custom(format!("invalid datetime {:?}: {}", value, e))
        })?;

    Ok(Some(parsed))
}

impl Item {
    /// Reads an item document from disk. The file is closed once parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| StacError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut item: Item =
            serde_json::from_reader(reader).map_err(|source| StacError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        item.self_href = Some(path.to_path_buf());

        Ok(item)
    }

    pub fn self_href(&self) -> Option<&Path> {
        self.self_href.as_deref()
    }

    /// Points the item (and its `self` link) at `href`.
    pub fn set_self_href(&mut self, href: &Path) {
        let href_string = href.to_string_lossy().into_owned();

        match self.links.iter_mut().find(|link| link.rel == "self") {
            Some(link) => link.href = href_string,
            None => self.links.push(Link {
                rel: "self".to_string(),
                href: href_string,
                media_type: Some("application/json".to_string()),
                extra: Map::new(),
            }),
        }

        self.self_href = Some(href.to_path_buf());
    }

    /// Strips every asset href down to its file name so that assets resolve
    /// next to the item document.
    pub fn make_asset_hrefs_relative(&mut self) {
        for asset in self.assets.values_mut() {
            if let Some(name) = Path::new(&asset.href).file_name() {
                asset.href = name.to_string_lossy().into_owned();
            }
        }
    }

    /// Horizontal part of the item's `bbox`.
    pub fn bbox_2d(&self) -> Option<Bbox> {
        self.bbox.as_deref().and_then(Bbox::from_slice)
    }

    /// Nominal timestamp: `datetime`, or `start_datetime` for range-only items.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        self.properties.datetime.or(self.properties.start_datetime)
    }

    pub fn start_datetime(&self) -> Option<DateTime<Utc>> {
        self.properties.start_datetime.or(self.properties.datetime)
    }

    pub fn end_datetime(&self) -> Option<DateTime<Utc>> {
        self.properties.end_datetime.or(self.properties.datetime)
    }
}
