use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::config::EngineEnvConfig;
use crate::progression::scorer::QuizDefinition;
use crate::progression::types::{Category, LoveLanguage, Program, Temperament};

/// 轮换选择参数。
///
/// `counter % 10 >= secondary_threshold` 取第二名维度，否则取第一名；
/// 阈值 7 对应约 70/30 的主次比例。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationConfig<C> {
    pub secondary_threshold: u8,
    pub default_category: C,
}

impl<C: Category> RotationConfig<C> {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=10).contains(&self.secondary_threshold) {
            return Err(format!(
                "{}: secondaryThreshold must be within 1..=10, got {}",
                C::PROGRAM,
                self.secondary_threshold
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    /// 每个单元的解锁间隔（小时）
    pub unit_hours: u32,
}

impl ScheduleConfig {
    pub fn unit_duration(&self) -> Duration {
        Duration::hours(i64::from(self.unit_hours))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { unit_hours: 24 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub sample_size: usize,
    pub max_sample_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sample_size: 10,
            max_sample_size: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    pub love_language_questions: usize,
    pub temperament_questions: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            love_language_questions: 20,
            temperament_questions: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub love_language: RotationConfig<LoveLanguage>,
    pub temperament: RotationConfig<Temperament>,
    #[serde(default)]
    pub devotional: ScheduleConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            love_language: RotationConfig {
                secondary_threshold: 7,
                default_category: LoveLanguage::QualityTime,
            },
            temperament: RotationConfig {
                secondary_threshold: 7,
                default_category: Temperament::Sanguine,
            },
            devotional: ScheduleConfig::default(),
            game: GameConfig::default(),
            quiz: QuizConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env(env: &EngineEnvConfig) -> Self {
        let mut config = Self::default();
        config.love_language.secondary_threshold = env.secondary_threshold;
        config.temperament.secondary_threshold = env.secondary_threshold;
        config.devotional.unit_hours = env.devotional_unit_hours;
        config.game.sample_size = env.game_sample_size;
        config.game.max_sample_size = env.game_max_sample_size;
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        self.love_language.validate()?;
        self.temperament.validate()?;
        if self.devotional.unit_hours == 0 {
            return Err("devotional.unitHours must be positive".to_string());
        }
        if self.game.sample_size == 0 || self.game.sample_size > self.game.max_sample_size {
            return Err(format!(
                "game.sampleSize must be within 1..={}, got {}",
                self.game.max_sample_size, self.game.sample_size
            ));
        }
        if self.quiz.love_language_questions == 0 || self.quiz.temperament_questions == 0 {
            return Err("quiz question counts must be positive".to_string());
        }
        Ok(())
    }

    pub fn quiz_definition(&self, program: Program) -> Option<QuizDefinition> {
        let question_count = match program {
            Program::LoveLanguage => self.quiz.love_language_questions,
            Program::Temperament => self.quiz.temperament_questions,
            Program::Devotional | Program::CoupleGame => return None,
        };
        Some(QuizDefinition {
            program,
            question_count,
        })
    }
}
