use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{check_locales, CatalogError};
use crate::constants::DEFAULT_LOCALE;

/// 固定长度连载（如 22 天灵修）中的一篇
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesEntry {
    pub day: u32,
    pub id: String,
    pub title: BTreeMap<String, String>,
    pub body: BTreeMap<String, String>,
}

impl SeriesEntry {
    pub fn title_for(&self, locale: &str) -> &str {
        localized(&self.title, locale)
    }

    pub fn body_for(&self, locale: &str) -> &str {
        localized(&self.body, locale)
    }
}

fn localized<'a>(text: &'a BTreeMap<String, String>, locale: &str) -> &'a str {
    text.get(locale)
        .or_else(|| text.get(DEFAULT_LOCALE))
        .map(String::as_str)
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    version: u32,
    entries: Vec<SeriesEntry>,
}

/// 按天编号 1..=N 连续排列的连载目录
#[derive(Debug, Clone)]
pub struct SeriesCatalog {
    version: u32,
    entries: Vec<SeriesEntry>,
}

impl SeriesCatalog {
    pub fn from_entries(version: u32, mut entries: Vec<SeriesEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::EmptySeries);
        }
        entries.sort_by_key(|e| e.day);

        let mut ids = HashSet::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let expected = index as u32 + 1;
            if entry.day != expected {
                return Err(CatalogError::SeriesGap {
                    expected,
                    found: entry.day,
                });
            }
            if !ids.insert(entry.id.as_str()) {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
            check_locales(&entry.id, &entry.title)?;
            check_locales(&entry.id, &entry.body)?;
        }

        Ok(Self { version, entries })
    }

    pub fn from_json(name: &'static str, raw: &str) -> Result<Self, CatalogError> {
        let parsed: RawSeries = serde_json::from_str(raw).map_err(|source| CatalogError::Parse {
            catalog: name,
            source,
        })?;
        Self::from_entries(parsed.version, parsed.entries)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// 连载长度，即解锁上限
    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 第 `day` 天（从 1 开始）的内容
    pub fn entry(&self, day: u32) -> Option<&SeriesEntry> {
        day.checked_sub(1)
            .and_then(|index| self.entries.get(index as usize))
    }
}
