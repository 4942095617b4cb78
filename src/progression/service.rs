//! 进度服务：把纯计算的引擎与存储拼在一起。
//!
//! 所有方法都显式接收 `now`，由 HTTP 层传入服务器时间；读路径从不推进计数。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::{Catalog, Catalogs, LeveledCatalog, LeveledItem, SeriesCatalog, SeriesEntry};
use crate::constants::DEVOTIONAL_SERIES;
use crate::progression::bucketer;
use crate::progression::config::{EngineConfig, GameConfig, RotationConfig};
use crate::progression::error::EngineError;
use crate::progression::rotation::{self, Selection};
use crate::progression::scheduler::{self, UnlockSchedule, UnlockWindow};
use crate::progression::scorer::{self, QuizDefinition};
use crate::progression::types::{Category, IntimacyBand, LoveLanguage, Program, Temperament};
use crate::store::operations::completions::CompletionRecord;
use crate::store::operations::counters::ProgressCounter;
use crate::store::operations::pairs::PairLink;
use crate::store::operations::profiles::ProfileRecord;
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 一个"测验 + 每日轮换"项目的静态部分
#[derive(Debug, Clone)]
pub struct RotationProgram<C> {
    pub catalog: Catalog<C>,
    pub config: RotationConfig<C>,
    pub quiz: QuizDefinition,
}

/// 可做每日轮换的维度集合
pub trait RotationCategory: Category {
    /// 为 true 时使用伴侣的画像（为对方做事），未配对则用自己的
    const SHARED: bool;

    fn program(service: &ProgressionService) -> &RotationProgram<Self>;
}

impl RotationCategory for LoveLanguage {
    const SHARED: bool = true;

    fn program(service: &ProgressionService) -> &RotationProgram<Self> {
        &service.love_language
    }
}

impl RotationCategory for Temperament {
    const SHARED: bool = false;

    fn program(service: &ProgressionService) -> &RotationProgram<Self> {
        &service.temperament
    }
}

#[derive(Debug, Clone)]
pub struct DailyItem<'a, C> {
    pub day: u64,
    pub selection: Selection<'a, C>,
    pub profile_owner: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct DailyCompletion {
    pub completed_day: u64,
    pub next_day: u64,
    pub item_id: String,
}

#[derive(Debug, Clone)]
pub struct DevotionalStatus<'a> {
    pub window: UnlockWindow,
    pub position: u32,
    pub completed_days: Vec<u32>,
    pub entry: &'a SeriesEntry,
}

#[derive(Debug, Clone)]
pub struct GameRound<'a> {
    pub level: u32,
    pub band: Option<IntimacyBand>,
    pub questions: Vec<&'a LeveledItem<IntimacyBand>>,
}

pub struct ProgressionService {
    store: Arc<Store>,
    love_language: RotationProgram<LoveLanguage>,
    temperament: RotationProgram<Temperament>,
    devotional: SeriesCatalog,
    schedule: UnlockSchedule,
    game: LeveledCatalog<IntimacyBand>,
    game_config: GameConfig,
}

impl ProgressionService {
    pub fn new(
        store: Arc<Store>,
        catalogs: Catalogs,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidInput)?;

        let quiz = |program: Program| {
            config
                .quiz_definition(program)
                .ok_or_else(|| EngineError::invalid(format!("{} has no quiz", program)))
        };
        let schedule =
            UnlockSchedule::new(catalogs.devotional.len(), config.devotional.unit_duration())?;

        Ok(Self {
            store,
            love_language: RotationProgram {
                catalog: catalogs.love_language,
                config: config.love_language,
                quiz: quiz(Program::LoveLanguage)?,
            },
            temperament: RotationProgram {
                catalog: catalogs.temperament,
                config: config.temperament,
                quiz: quiz(Program::Temperament)?,
            },
            devotional: catalogs.devotional,
            schedule,
            game: catalogs.couple_game,
            game_config: config.game.clone(),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn devotional_catalog(&self) -> &SeriesCatalog {
        &self.devotional
    }

    pub fn game_catalog(&self) -> &LeveledCatalog<IntimacyBand> {
        &self.game
    }

    /// 计分并整体覆盖已存画像
    pub fn submit_quiz<C: RotationCategory>(
        &self,
        user_id: &str,
        answers: &[String],
        now: DateTime<Utc>,
    ) -> Result<ProfileRecord<C>, ServiceError> {
        let program = C::program(self);
        let profile = scorer::score_quiz::<C, _>(&program.quiz, answers)?;
        let record = ProfileRecord {
            user_id: user_id.to_string(),
            program: C::PROGRAM,
            profile,
            taken_at: now,
        };
        self.store.put_profile(&record)?;

        tracing::info!(
            user_id,
            program = %C::PROGRAM,
            primary = record.profile.primary().map(|c| c.key()).unwrap_or_default(),
            "Quiz profile stored"
        );
        Ok(record)
    }

    pub fn profile<C: RotationCategory>(
        &self,
        user_id: &str,
    ) -> Result<Option<ProfileRecord<C>>, ServiceError> {
        Ok(self.store.get_profile::<C>(user_id)?)
    }

    fn profile_owner<C: RotationCategory>(&self, user_id: &str) -> Result<String, ServiceError> {
        if C::SHARED {
            if let Some(link) = self.store.get_partner(user_id)? {
                return Ok(link.partner_id);
            }
        }
        Ok(user_id.to_string())
    }

    fn select_for_day<C: RotationCategory>(
        &self,
        user_id: &str,
        day: u64,
    ) -> Result<(Selection<'_, C>, Option<String>), ServiceError> {
        let program = C::program(self);
        let owner = self.profile_owner::<C>(user_id)?;
        let record = self.store.get_profile::<C>(&owner)?;
        let profile = record.as_ref().map(|r| &r.profile);
        let selection =
            rotation::select_or_default(day, profile, &program.catalog, &program.config)?;
        Ok((selection, record.map(|r| r.user_id)))
    }

    /// 今日内容。首次请求会创建计数（第 1 天），之后重复读取结果不变。
    pub fn today_item<C: RotationCategory>(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DailyItem<'_, C>, ServiceError> {
        let counter = self.store.get_or_init_counter(user_id, C::PROGRAM, now)?;
        let (selection, profile_owner) = self.select_for_day::<C>(user_id, counter.value)?;
        let completed = self
            .store
            .is_completed(user_id, C::PROGRAM, counter.value)?;

        tracing::debug!(
            user_id,
            program = %C::PROGRAM,
            day = counter.value,
            item_id = %selection.item.id,
            fell_back = selection.fell_back,
            "Daily item selected"
        );

        Ok(DailyItem {
            day: counter.value,
            selection,
            profile_owner,
            completed,
        })
    }

    /// 标记完成：计数推进与完成记录一起提交
    pub fn complete_item<C: RotationCategory>(
        &self,
        user_id: &str,
        expected_day: u64,
        now: DateTime<Utc>,
    ) -> Result<DailyCompletion, ServiceError> {
        if expected_day == 0 {
            return Err(EngineError::invalid("day starts at 1").into());
        }
        self.store.get_or_init_counter(user_id, C::PROGRAM, now)?;
        let (selection, _) = self.select_for_day::<C>(user_id, expected_day)?;
        let item_id = selection.item.id.clone();

        let record = CompletionRecord::new(user_id, C::PROGRAM, expected_day, &item_id, now);
        let advanced = self.store.advance_counter_with_completion(&record, now)?;

        tracing::info!(
            user_id,
            program = %C::PROGRAM,
            day = expected_day,
            next_day = advanced.value,
            "Daily item completed"
        );
        Ok(DailyCompletion {
            completed_day: expected_day,
            next_day: advanced.value,
            item_id,
        })
    }

    fn devotional_window(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(UnlockWindow, u32), ServiceError> {
        let progress = self
            .store
            .start_series_if_absent(user_id, DEVOTIONAL_SERIES, now)?;
        let window = self.schedule.window(Some(progress.started_at), now);
        Ok((window, progress.position.min(window.unlocked)))
    }

    fn devotional_status_at(
        &self,
        user_id: &str,
        window: UnlockWindow,
        position: u32,
    ) -> Result<DevotionalStatus<'_>, ServiceError> {
        let entry = self.devotional.entry(position).ok_or_else(|| {
            EngineError::invalid(format!("devotional has no day {}", position))
        })?;
        let completed_days = self
            .store
            .list_completions(user_id, Program::Devotional)?
            .into_iter()
            .filter_map(|r| u32::try_from(r.unit).ok())
            .collect();
        Ok(DevotionalStatus {
            window,
            position,
            completed_days,
            entry,
        })
    }

    /// 首次访问以 now 开始连载
    pub fn devotional_status(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DevotionalStatus<'_>, ServiceError> {
        let (window, position) = self.devotional_window(user_id, now)?;
        self.devotional_status_at(user_id, window, position)
    }

    /// 切换查看的天数；超出解锁范围返回 `Locked`
    pub fn open_devotional_day(
        &self,
        user_id: &str,
        day: u32,
        now: DateTime<Utc>,
    ) -> Result<DevotionalStatus<'_>, ServiceError> {
        let (window, _) = self.devotional_window(user_id, now)?;
        let position = scheduler::advance_position(day, &window)?;
        self.store
            .set_series_position(user_id, DEVOTIONAL_SERIES, position, now)?;
        self.devotional_status_at(user_id, window, position)
    }

    pub fn complete_devotional_day(
        &self,
        user_id: &str,
        day: u32,
        now: DateTime<Utc>,
    ) -> Result<CompletionRecord, ServiceError> {
        let (window, _) = self.devotional_window(user_id, now)?;
        let day = scheduler::advance_position(day, &window)?;
        let entry = self
            .devotional
            .entry(day)
            .ok_or_else(|| EngineError::invalid(format!("devotional has no day {}", day)))?;

        let record =
            CompletionRecord::new(user_id, Program::Devotional, u64::from(day), &entry.id, now);
        self.store.record_completion(&record)?;
        tracing::info!(user_id, day, "Devotional day completed");
        Ok(record)
    }

    /// 按当前关卡抽一轮题；`sample_size` 超过上限时按上限处理
    pub fn game_round(
        &self,
        user_id: &str,
        sample_size: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<GameRound<'_>, ServiceError> {
        let size = match sample_size {
            Some(0) => return Err(EngineError::invalid("count must be positive").into()),
            Some(n) => n.min(self.game_config.max_sample_size),
            None => self.game_config.sample_size,
        };
        let counter = self
            .store
            .get_or_init_counter(user_id, Program::CoupleGame, now)?;
        let level = u32::try_from(counter.value)
            .map_err(|_| EngineError::invalid(format!("level {} out of range", counter.value)))?;

        let questions = bucketer::questions_for_level(level, self.game.items(), size)?;
        Ok(GameRound {
            level,
            band: self.game.band_for_level(level),
            questions,
        })
    }

    pub fn advance_game_level(
        &self,
        user_id: &str,
        expected_level: u64,
        now: DateTime<Utc>,
    ) -> Result<ProgressCounter, ServiceError> {
        if expected_level == 0 {
            return Err(EngineError::invalid("level starts at 1").into());
        }
        self.store
            .get_or_init_counter(user_id, Program::CoupleGame, now)?;
        let counter = self
            .store
            .advance_counter(user_id, Program::CoupleGame, expected_level, now)?;
        tracing::info!(user_id, level = counter.value, "Game level advanced");
        Ok(counter)
    }

    pub fn link_partner(
        &self,
        user_id: &str,
        partner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PairLink, ServiceError> {
        let link = self.store.set_partner(user_id, partner_id, now)?;
        tracing::info!(user_id, partner_id, "Partner linked");
        Ok(link)
    }

    pub fn unlink_partner(&self, user_id: &str) -> Result<bool, ServiceError> {
        Ok(self.store.clear_partner(user_id)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn service() -> ProgressionService {
        let store = Arc::new(Store::open_temporary().unwrap());
        let catalogs = Catalogs::load_builtin().unwrap();
        ProgressionService::new(store, catalogs, &EngineConfig::default()).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    fn love_answers() -> Vec<String> {
        let mut answers = vec!["words".to_string(); 8];
        answers.extend(vec!["quality_time".to_string(); 6]);
        answers.extend(vec!["acts".to_string(); 4]);
        answers.extend(vec!["gifts".to_string(); 2]);
        answers
    }

    #[test]
    fn read_path_is_idempotent() {
        let svc = service();
        svc.submit_quiz::<LoveLanguage>("u1", &love_answers(), t0())
            .unwrap();

        let first = svc.today_item::<LoveLanguage>("u1", t0()).unwrap();
        let later = svc
            .today_item::<LoveLanguage>("u1", t0() + Duration::hours(20))
            .unwrap();
        assert_eq!(first.day, 1);
        assert_eq!(later.day, 1);
        assert_eq!(first.selection.item.id, later.selection.item.id);
        assert_eq!(first.selection.target, LoveLanguage::Words);
        assert_eq!(first.profile_owner.as_deref(), Some("u1"));
    }

    #[test]
    fn completion_advances_once() {
        let svc = service();
        svc.today_item::<Temperament>("u1", t0()).unwrap();

        let done = svc.complete_item::<Temperament>("u1", 1, t0()).unwrap();
        assert_eq!(done.next_day, 2);

        let err = svc.complete_item::<Temperament>("u1", 1, t0()).unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Conflict { .. })));

        let today = svc.today_item::<Temperament>("u1", t0()).unwrap();
        assert_eq!(today.day, 2);
        assert!(!today.completed);
    }

    #[test]
    fn paired_love_language_uses_partner_profile() {
        let svc = service();
        let mut touch = vec!["touch".to_string(); 15];
        touch.extend(vec!["gifts".to_string(); 5]);
        svc.submit_quiz::<LoveLanguage>("ben", &touch, t0()).unwrap();
        svc.submit_quiz::<LoveLanguage>("ana", &love_answers(), t0())
            .unwrap();
        svc.link_partner("ana", "ben", t0()).unwrap();

        let today = svc.today_item::<LoveLanguage>("ana", t0()).unwrap();
        assert_eq!(today.profile_owner.as_deref(), Some("ben"));
        assert_eq!(today.selection.target, LoveLanguage::Touch);
    }

    #[test]
    fn partner_without_profile_falls_back_to_default() {
        let svc = service();
        svc.submit_quiz::<LoveLanguage>("ana", &love_answers(), t0())
            .unwrap();
        svc.link_partner("ana", "ben", t0()).unwrap();

        let today = svc.today_item::<LoveLanguage>("ana", t0()).unwrap();
        assert!(today.profile_owner.is_none());
        assert_eq!(today.selection.target, LoveLanguage::QualityTime);
    }

    #[test]
    fn wrong_answer_count_is_invalid() {
        let svc = service();
        let err = svc
            .submit_quiz::<Temperament>("u1", &["sanguine".to_string()], t0())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Engine(EngineError::InvalidInput(_))));
    }

    #[test]
    fn devotional_unlocks_over_time() {
        let svc = service();
        let status = svc.devotional_status("u1", t0()).unwrap();
        assert_eq!(status.window.unlocked, 1);
        assert_eq!(status.entry.day, 1);

        let locked = svc.open_devotional_day("u1", 2, t0() + Duration::hours(23));
        match locked {
            Err(ServiceError::Engine(EngineError::Locked { next_unlock_at, .. })) => {
                assert_eq!(next_unlock_at, Some(t0() + Duration::hours(24)));
            }
            other => panic!("expected Locked, got {other:?}"),
        }

        let opened = svc
            .open_devotional_day("u1", 2, t0() + Duration::hours(25))
            .unwrap();
        assert_eq!(opened.position, 2);
        assert_eq!(opened.entry.day, 2);

        let finished = svc
            .devotional_status("u1", t0() + Duration::days(1000))
            .unwrap();
        assert_eq!(finished.window.unlocked, 22);
        assert_eq!(finished.position, 2);
    }

    #[test]
    fn devotional_completion_is_recorded_once() {
        let svc = service();
        svc.complete_devotional_day("u1", 1, t0()).unwrap();
        assert!(matches!(
            svc.complete_devotional_day("u1", 1, t0()),
            Err(ServiceError::Store(StoreError::Conflict { .. }))
        ));
        assert!(matches!(
            svc.complete_devotional_day("u1", 5, t0()),
            Err(ServiceError::Engine(EngineError::Locked { .. }))
        ));
        let status = svc.devotional_status("u1", t0()).unwrap();
        assert_eq!(status.completed_days, vec![1]);
    }

    #[test]
    fn game_round_respects_level() {
        let svc = service();
        let round = svc.game_round("u1", Some(5), t0()).unwrap();
        assert_eq!(round.level, 1);
        assert_eq!(round.band, Some(IntimacyBand::Icebreaker));
        assert!(!round.questions.is_empty());
        assert!(round.questions.iter().all(|q| q.min_level <= 1));

        assert!(svc.game_round("u1", Some(0), t0()).is_err());

        let next = svc.advance_game_level("u1", 1, t0()).unwrap();
        assert_eq!(next.value, 2);
        assert!(svc.advance_game_level("u1", 1, t0()).is_err());
    }
}
