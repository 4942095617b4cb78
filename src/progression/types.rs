use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 内容项目（程序）标识，同时用作存储键的一段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    LoveLanguage,
    Temperament,
    Devotional,
    CoupleGame,
}

impl Program {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoveLanguage => "love_language",
            Self::Temperament => "temperament",
            Self::Devotional => "devotional",
            Self::CoupleGame => "couple_game",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 封闭的偏好/强度维度集合。
///
/// `ALL` 的声明顺序即同分时的排名优先级，排名结果不依赖任何 map 的迭代顺序。
pub trait Category:
    Copy + Eq + Hash + Ord + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const ALL: &'static [Self];
    const PROGRAM: Program;

    fn key(self) -> &'static str;

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == key)
    }

    /// 声明顺序中的位置，越小优先级越高
    fn priority(self) -> usize {
        Self::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or(Self::ALL.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoveLanguage {
    Words,
    QualityTime,
    Gifts,
    Acts,
    Touch,
}

impl Category for LoveLanguage {
    const ALL: &'static [Self] = &[
        Self::Words,
        Self::QualityTime,
        Self::Gifts,
        Self::Acts,
        Self::Touch,
    ];
    const PROGRAM: Program = Program::LoveLanguage;

    fn key(self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::QualityTime => "quality_time",
            Self::Gifts => "gifts",
            Self::Acts => "acts",
            Self::Touch => "touch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperament {
    Sanguine,
    Choleric,
    Melancholic,
    Phlegmatic,
}

impl Category for Temperament {
    const ALL: &'static [Self] = &[
        Self::Sanguine,
        Self::Choleric,
        Self::Melancholic,
        Self::Phlegmatic,
    ];
    const PROGRAM: Program = Program::Temperament;

    fn key(self) -> &'static str {
        match self {
            Self::Sanguine => "sanguine",
            Self::Choleric => "choleric",
            Self::Melancholic => "melancholic",
            Self::Phlegmatic => "phlegmatic",
        }
    }
}

/// 情侣游戏题库的亲密度分段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntimacyBand {
    Icebreaker,
    Playful,
    Deep,
    Intimate,
}

impl Category for IntimacyBand {
    const ALL: &'static [Self] = &[Self::Icebreaker, Self::Playful, Self::Deep, Self::Intimate];
    const PROGRAM: Program = Program::CoupleGame;

    fn key(self) -> &'static str {
        match self {
            Self::Icebreaker => "icebreaker",
            Self::Playful => "playful",
            Self::Deep => "deep",
            Self::Intimate => "intimate",
        }
    }
}

/// 四舍五入到整数的百分比；总数为 0 时为 0
pub fn rounded_percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((score as f64 / total as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore<C> {
    pub category: C,
    pub score: u32,
    pub percentage: u32,
    pub rank: u32,
}

/// 由测验答案得出的排名画像，`scores` 按 rank 升序排列。
///
/// 重新测验时整体替换，不做合并。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile<C> {
    pub total: u32,
    pub scores: Vec<CategoryScore<C>>,
}

impl<C: Category> PreferenceProfile<C> {
    pub fn primary(&self) -> Option<C> {
        self.scores.first().map(|s| s.category)
    }

    pub fn secondary(&self) -> Option<C> {
        self.scores.get(1).map(|s| s.category)
    }

    pub fn ranked(&self) -> impl Iterator<Item = C> + '_ {
        self.scores.iter().map(|s| s.category)
    }

    pub fn rank_of(&self, category: C) -> Option<u32> {
        self.scores
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.rank)
    }

    pub fn score_of(&self, category: C) -> Option<u32> {
        self.scores
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.score)
    }

    /// 校验从存储读回的画像：每个维度恰好出现一次，rank 为 1..=N，
    /// 且排名与 (分数降序, 优先级) 一致。
    pub fn validate(&self) -> Result<(), String> {
        if self.scores.len() != C::ALL.len() {
            return Err(format!(
                "expected {} categories, found {}",
                C::ALL.len(),
                self.scores.len()
            ));
        }

        let mut seen: HashSet<C> = HashSet::with_capacity(self.scores.len());
        for entry in &self.scores {
            if !seen.insert(entry.category) {
                return Err(format!("duplicate category {}", entry.category.key()));
            }
        }

        let sum: u32 = self.scores.iter().map(|s| s.score).sum();
        if sum != self.total {
            return Err(format!("score sum {} does not match total {}", sum, self.total));
        }

        for entry in &self.scores {
            let expected = rounded_percentage(entry.score, self.total);
            if entry.percentage != expected {
                return Err(format!(
                    "{} percentage {} (expected {})",
                    entry.category.key(),
                    entry.percentage,
                    expected
                ));
            }
        }

        for (index, pair) in self.scores.iter().enumerate() {
            let expected_rank = index as u32 + 1;
            if pair.rank != expected_rank {
                return Err(format!(
                    "rank {} at position {} (expected {})",
                    pair.rank, index, expected_rank
                ));
            }
        }

        for window in self.scores.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            let ordered = a.score > b.score
                || (a.score == b.score && a.category.priority() < b.category.priority());
            if !ordered {
                return Err(format!(
                    "{} ranked above {} inconsistently",
                    a.category.key(),
                    b.category.key()
                ));
            }
        }

        Ok(())
    }
}
