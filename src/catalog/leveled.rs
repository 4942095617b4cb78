use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{check_locales, CatalogError, ContentItem};
use crate::progression::types::Category;

/// 闭区间等级段 `[min_level, max_level]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelBand {
    pub min_level: u32,
    pub max_level: u32,
}

/// 带等级段的题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeveledItem<C> {
    #[serde(flatten)]
    pub item: ContentItem<C>,
    pub min_level: u32,
    pub max_level: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBand<C> {
    category: C,
    min_level: u32,
    max_level: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLeveled<C> {
    version: u32,
    bands: Vec<RawBand<C>>,
    items: Vec<ContentItem<C>>,
}

/// 按等级段切分的题库。每道题继承其维度所在的等级段。
#[derive(Debug, Clone)]
pub struct LeveledCatalog<C> {
    version: u32,
    bands: BTreeMap<C, LevelBand>,
    items: Vec<LeveledItem<C>>,
}

impl<C: Category> LeveledCatalog<C> {
    pub fn from_parts(
        version: u32,
        bands: BTreeMap<C, LevelBand>,
        items: Vec<ContentItem<C>>,
    ) -> Result<Self, CatalogError> {
        for (category, band) in &bands {
            if band.min_level == 0 || band.min_level > band.max_level {
                return Err(CatalogError::InvalidBand {
                    category: category.key().to_string(),
                    min_level: band.min_level,
                    max_level: band.max_level,
                });
            }
        }

        let mut ids = HashSet::with_capacity(items.len());
        let mut ordinals = HashSet::with_capacity(items.len());
        let mut leveled = Vec::with_capacity(items.len());
        for item in items {
            if !ids.insert(item.id.clone()) {
                return Err(CatalogError::DuplicateId(item.id));
            }
            if !ordinals.insert((item.category, item.ordinal)) {
                return Err(CatalogError::DuplicateOrdinal {
                    category: item.category.key().to_string(),
                    ordinal: item.ordinal,
                });
            }
            check_locales(&item.id, &item.text)?;
            let band = bands
                .get(&item.category)
                .copied()
                .ok_or_else(|| CatalogError::MissingBand(item.category.key().to_string()))?;
            leveled.push(LeveledItem {
                item,
                min_level: band.min_level,
                max_level: band.max_level,
            });
        }

        leveled.sort_by(|a, b| {
            a.min_level
                .cmp(&b.min_level)
                .then_with(|| a.item.category.priority().cmp(&b.item.category.priority()))
                .then_with(|| a.item.ordinal.cmp(&b.item.ordinal))
        });

        Ok(Self {
            version,
            bands,
            items: leveled,
        })
    }

    pub fn from_json(name: &'static str, raw: &str) -> Result<Self, CatalogError> {
        let parsed: RawLeveled<C> = serde_json::from_str(raw).map_err(|source| {
            CatalogError::Parse {
                catalog: name,
                source,
            }
        })?;
        let bands = parsed
            .bands
            .into_iter()
            .map(|b| {
                (
                    b.category,
                    LevelBand {
                        min_level: b.min_level,
                        max_level: b.max_level,
                    },
                )
            })
            .collect();
        Self::from_parts(parsed.version, bands, parsed.items)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn items(&self) -> &[LeveledItem<C>] {
        &self.items
    }

    /// 当前等级已进入的最高等级段（`min_level <= level` 中 `min_level` 最大者）
    pub fn band_for_level(&self, level: u32) -> Option<C> {
        self.bands
            .iter()
            .filter(|(_, band)| band.min_level <= level)
            .max_by(|(ca, a), (cb, b)| {
                a.min_level
                    .cmp(&b.min_level)
                    .then_with(|| cb.priority().cmp(&ca.priority()))
            })
            .map(|(category, _)| *category)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::types::IntimacyBand;

    fn question(id: &str, category: IntimacyBand, ordinal: u32) -> ContentItem<IntimacyBand> {
        ContentItem {
            id: id.to_string(),
            category,
            ordinal,
            text: BTreeMap::from([
                ("en".to_string(), id.to_string()),
                ("es".to_string(), id.to_string()),
            ]),
        }
    }

    fn bands() -> BTreeMap<IntimacyBand, LevelBand> {
        BTreeMap::from([
            (
                IntimacyBand::Icebreaker,
                LevelBand {
                    min_level: 1,
                    max_level: 100,
                },
            ),
            (
                IntimacyBand::Playful,
                LevelBand {
                    min_level: 100,
                    max_level: 500,
                },
            ),
        ])
    }

    #[test]
    fn items_inherit_their_category_band() {
        let catalog = LeveledCatalog::from_parts(
            1,
            bands(),
            vec![
                question("p1", IntimacyBand::Playful, 1),
                question("i1", IntimacyBand::Icebreaker, 1),
            ],
        )
        .unwrap();

        let first = &catalog.items()[0];
        assert_eq!(first.item.id, "i1");
        assert_eq!((first.min_level, first.max_level), (1, 100));
        assert_eq!(catalog.items()[1].min_level, 100);
    }

    #[test]
    fn band_for_level_picks_highest_entered_band() {
        let catalog = LeveledCatalog::from_parts(1, bands(), vec![]).unwrap();
        assert_eq!(catalog.band_for_level(1), Some(IntimacyBand::Icebreaker));
        assert_eq!(catalog.band_for_level(99), Some(IntimacyBand::Icebreaker));
        assert_eq!(catalog.band_for_level(100), Some(IntimacyBand::Playful));
        assert_eq!(catalog.band_for_level(9_000), Some(IntimacyBand::Playful));
        assert_eq!(catalog.band_for_level(0), None);
    }

    #[test]
    fn item_without_band_is_rejected() {
        let err = LeveledCatalog::from_parts(1, bands(), vec![question("d", IntimacyBand::Deep, 1)])
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingBand(_)));
    }

    #[test]
    fn inverted_band_is_rejected() {
        let mut table = bands();
        table.insert(
            IntimacyBand::Deep,
            LevelBand {
                min_level: 600,
                max_level: 500,
            },
        );
        let err = LeveledCatalog::<IntimacyBand>::from_parts(1, table, vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidBand { .. }));
    }
}
