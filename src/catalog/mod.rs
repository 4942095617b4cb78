//! 预置内容目录：随代码版本发布，启动时加载一次并校验，运行期不可变。

pub mod leveled;
pub mod series;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_LOCALE, MIN_LOCALES_PER_ITEM};
use crate::progression::types::{Category, IntimacyBand, LoveLanguage, Temperament};

pub use leveled::{LevelBand, LeveledCatalog, LeveledItem};
pub use series::{SeriesCatalog, SeriesEntry};

const LOVE_LANGUAGE_ACTIONS_JSON: &str = include_str!("../../data/love_language_actions.json");
const TEMPERAMENT_CHAPTERS_JSON: &str = include_str!("../../data/temperament_chapters.json");
const DEVOTIONAL_JSON: &str = include_str!("../../data/devotional.json");
const COUPLE_GAME_JSON: &str = include_str!("../../data/couple_game.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog {catalog} is not valid JSON: {source}")]
    Parse {
        catalog: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate item id {0}")]
    DuplicateId(String),
    #[error("duplicate ordinal {ordinal} in category {category}")]
    DuplicateOrdinal { category: String, ordinal: u32 },
    #[error("item {id} needs at least {min} locales including '{fallback}'")]
    Locales {
        id: String,
        min: usize,
        fallback: &'static str,
    },
    #[error("series entry {found} out of order (expected day {expected})")]
    SeriesGap { expected: u32, found: u32 },
    #[error("series is empty")]
    EmptySeries,
    #[error("invalid level band for {category}: {min_level}..={max_level}")]
    InvalidBand {
        category: String,
        min_level: u32,
        max_level: u32,
    },
    #[error("category {0} has no level band")]
    MissingBand(String),
}

/// 目录中的单条内容，`text` 为 locale -> 文案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem<C> {
    pub id: String,
    pub category: C,
    pub ordinal: u32,
    pub text: BTreeMap<String, String>,
}

impl<C> ContentItem<C> {
    /// 取指定语言的文案，缺失时回退到默认语言
    pub fn text_for(&self, locale: &str) -> &str {
        self.text
            .get(locale)
            .or_else(|| self.text.get(DEFAULT_LOCALE))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

pub(crate) fn check_locales(
    id: &str,
    text: &BTreeMap<String, String>,
) -> Result<(), CatalogError> {
    let has_fallback = text
        .get(DEFAULT_LOCALE)
        .is_some_and(|t| !t.trim().is_empty());
    if text.len() < MIN_LOCALES_PER_ITEM || !has_fallback {
        return Err(CatalogError::Locales {
            id: id.to_string(),
            min: MIN_LOCALES_PER_ITEM,
            fallback: DEFAULT_LOCALE,
        });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog<C> {
    version: u32,
    items: Vec<ContentItem<C>>,
}

/// 按维度分组的内容池，每个池按 ordinal 升序
#[derive(Debug, Clone)]
pub struct Catalog<C> {
    version: u32,
    pools: BTreeMap<C, Vec<ContentItem<C>>>,
}

impl<C: Category> Catalog<C> {
    pub fn from_items(version: u32, items: Vec<ContentItem<C>>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::with_capacity(items.len());
        let mut ordinals = HashSet::with_capacity(items.len());
        let mut pools: BTreeMap<C, Vec<ContentItem<C>>> =
            C::ALL.iter().map(|c| (*c, Vec::new())).collect();

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
            pools.entry(item.category).or_default().push(item);
        }

        for (category, pool) in pools.iter_mut() {
            pool.sort_by_key(|item| item.ordinal);
            if pool.is_empty() {
                tracing::warn!(
                    program = %C::PROGRAM,
                    category = category.key(),
                    "Catalog category has no content"
                );
            }
        }

        Ok(Self { version, pools })
    }

    pub fn from_json(name: &'static str, raw: &str) -> Result<Self, CatalogError> {
        let parsed: RawCatalog<C> = serde_json::from_str(raw).map_err(|source| {
            CatalogError::Parse {
                catalog: name,
                source,
            }
        })?;
        Self::from_items(parsed.version, parsed.items)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// 某维度的内容池；空池返回空切片
    pub fn pool(&self, category: C) -> &[ContentItem<C>] {
        self.pools
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 全部内置目录
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub love_language: Catalog<LoveLanguage>,
    pub temperament: Catalog<Temperament>,
    pub devotional: SeriesCatalog,
    pub couple_game: LeveledCatalog<IntimacyBand>,
}

impl Catalogs {
    pub fn load_builtin() -> Result<Self, CatalogError> {
        let catalogs = Self {
            love_language: Catalog::from_json("love_language_actions", LOVE_LANGUAGE_ACTIONS_JSON)?,
            temperament: Catalog::from_json("temperament_chapters", TEMPERAMENT_CHAPTERS_JSON)?,
            devotional: SeriesCatalog::from_json("devotional", DEVOTIONAL_JSON)?,
            couple_game: LeveledCatalog::from_json("couple_game", COUPLE_GAME_JSON)?,
        };

        tracing::info!(
            love_language = catalogs.love_language.len(),
            temperament = catalogs.temperament.len(),
            devotional = catalogs.devotional.len(),
            couple_game = catalogs.couple_game.len(),
            "Content catalogs loaded"
        );
        Ok(catalogs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, category: Temperament, ordinal: u32) -> ContentItem<Temperament> {
        ContentItem {
            id: id.to_string(),
            category,
            ordinal,
            text: BTreeMap::from([
                ("en".to_string(), format!("{id} en")),
                ("es".to_string(), format!("{id} es")),
            ]),
        }
    }

    #[test]
    fn builtin_catalogs_load() {
        let catalogs = Catalogs::load_builtin().unwrap();
        for c in LoveLanguage::ALL {
            assert!(!catalogs.love_language.pool(*c).is_empty(), "{c:?}");
        }
        for c in Temperament::ALL {
            assert!(!catalogs.temperament.pool(*c).is_empty(), "{c:?}");
        }
        assert_eq!(catalogs.devotional.len(), 22);
        assert!(!catalogs.couple_game.is_empty());
    }

    #[test]
    fn pools_are_sorted_by_ordinal() {
        let catalog = Catalog::from_items(
            1,
            vec![
                item("c", Temperament::Sanguine, 3),
                item("a", Temperament::Sanguine, 1),
                item("b", Temperament::Sanguine, 2),
            ],
        )
        .unwrap();
        let ids: Vec<&str> = catalog
            .pool(Temperament::Sanguine)
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(catalog.pool(Temperament::Choleric).is_empty());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::from_items(
            1,
            vec![
                item("a", Temperament::Sanguine, 1),
                item("a", Temperament::Choleric, 1),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(_)));
    }

    #[test]
    fn duplicate_ordinals_are_rejected() {
        let err = Catalog::from_items(
            1,
            vec![
                item("a", Temperament::Sanguine, 1),
                item("b", Temperament::Sanguine, 1),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateOrdinal { .. }));
    }

    #[test]
    fn single_locale_is_rejected() {
        let mut lonely = item("a", Temperament::Sanguine, 1);
        lonely.text.remove("es");
        let err = Catalog::from_items(1, vec![lonely]).unwrap_err();
        assert!(matches!(err, CatalogError::Locales { .. }));
    }

    #[test]
    fn text_falls_back_to_default_locale() {
        let entry = item("a", Temperament::Sanguine, 1);
        assert_eq!(entry.text_for("es"), "a es");
        assert_eq!(entry.text_for("fr"), "a en");
    }
}
