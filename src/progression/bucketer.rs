//! 等级分桶：按等级从已进入的全部等级段中随机抽题。
//!
//! 资格规则只看 `min_level <= level`，已越过 `max_level` 的题目仍然保留在池中。
//! 这是整个引擎里唯一刻意不确定的路径。

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::LeveledItem;
use crate::progression::error::EngineError;
use crate::progression::types::Category;

/// 等级 `level` 可用的全部题目
pub fn eligible<C: Category>(
    level: u32,
    catalog: &[LeveledItem<C>],
) -> impl Iterator<Item = &LeveledItem<C>> {
    catalog.iter().filter(move |entry| entry.min_level <= level)
}

/// 无放回抽取 `sample_size` 道题；可用题数不足时返回全部（已打乱）
pub fn questions_for_level<C: Category>(
    level: u32,
    catalog: &[LeveledItem<C>],
    sample_size: usize,
) -> Result<Vec<&LeveledItem<C>>, EngineError> {
    let mut rng = rand::thread_rng();
    questions_for_level_with_rng(level, catalog, sample_size, &mut rng)
}

pub fn questions_for_level_with_rng<'a, C, R>(
    level: u32,
    catalog: &'a [LeveledItem<C>],
    sample_size: usize,
    rng: &mut R,
) -> Result<Vec<&'a LeveledItem<C>>, EngineError>
where
    C: Category,
    R: Rng + ?Sized,
{
    if level == 0 {
        return Err(EngineError::invalid("level starts at 1"));
    }

    let pool: Vec<&LeveledItem<C>> = eligible(level, catalog).collect();
    let mut sample: Vec<&LeveledItem<C>> =
        pool.choose_multiple(rng, sample_size).copied().collect();
    sample.shuffle(rng);

    tracing::debug!(
        level,
        eligible = pool.len(),
        returned = sample.len(),
        "Sampled leveled questions"
    );
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::catalog::ContentItem;
    use crate::progression::types::IntimacyBand;

    fn leveled(id: &str, category: IntimacyBand, min: u32, max: u32) -> LeveledItem<IntimacyBand> {
        LeveledItem {
            item: ContentItem {
                id: id.to_string(),
                category,
                ordinal: 1,
                text: BTreeMap::from([
                    ("en".to_string(), id.to_string()),
                    ("es".to_string(), id.to_string()),
                ]),
            },
            min_level: min,
            max_level: max,
        }
    }

    fn bank() -> Vec<LeveledItem<IntimacyBand>> {
        vec![
            leveled("a", IntimacyBand::Icebreaker, 1, 100),
            leveled("b", IntimacyBand::Icebreaker, 1, 100),
            leveled("c", IntimacyBand::Playful, 100, 500),
            leveled("d", IntimacyBand::Playful, 100, 500),
            leveled("e", IntimacyBand::Deep, 500, 1000),
        ]
    }

    #[test]
    fn only_entered_bands_are_eligible() {
        let catalog = bank();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = questions_for_level_with_rng(120, &catalog, 10, &mut rng).unwrap();
            assert_eq!(picked.len(), 4);
            assert!(picked.iter().all(|q| q.min_level <= 120));
        }
    }

    #[test]
    fn passed_bands_stay_in_rotation() {
        let catalog = bank();
        let ids: HashSet<&str> = eligible(2_000, &catalog).map(|q| q.item.id.as_str()).collect();
        assert!(ids.contains("a"));
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn sample_has_no_duplicates() {
        let catalog = bank();
        let mut rng = StdRng::seed_from_u64(42);
        let picked = questions_for_level_with_rng(600, &catalog, 3, &mut rng).unwrap();
        let ids: HashSet<&str> = picked.iter().map(|q| q.item.id.as_str()).collect();
        assert_eq!(picked.len(), 3);
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn zero_sample_is_empty_and_zero_level_invalid() {
        let catalog = bank();
        assert!(questions_for_level(5, &catalog, 0).unwrap().is_empty());
        assert!(matches!(
            questions_for_level(0, &catalog, 3),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
