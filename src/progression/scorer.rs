//! 测验计分：把有序的维度投票转换成排名画像

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::progression::error::EngineError;
use crate::progression::types::{
    rounded_percentage, Category, CategoryScore, PreferenceProfile, Program,
};

/// 一份测验的定义，答案数必须与题目数一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDefinition {
    pub program: Program,
    pub question_count: usize,
}

/// 计票并排名。
///
/// 排名规则：分数降序；同分按 `Category::ALL` 的声明顺序。所有维度都会出现，
/// 零票的维度同样占一个名次。
pub fn score<C: Category>(answers: &[C]) -> Result<PreferenceProfile<C>, EngineError> {
    if answers.is_empty() {
        return Err(EngineError::invalid("answer sequence is empty"));
    }

    let mut tally: HashMap<C, u32> = HashMap::with_capacity(C::ALL.len());
    for answer in answers {
        *tally.entry(*answer).or_insert(0) += 1;
    }

    let total = answers.len() as u32;
    let mut ordered: Vec<(C, u32)> = C::ALL
        .iter()
        .map(|c| (*c, tally.get(c).copied().unwrap_or(0)))
        .collect();
    // stable sort: ALL 已按优先级排列，同分保持声明顺序
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    let scores = ordered
        .into_iter()
        .enumerate()
        .map(|(index, (category, count))| CategoryScore {
            category,
            score: count,
            percentage: rounded_percentage(count, total),
            rank: index as u32 + 1,
        })
        .collect();

    Ok(PreferenceProfile { total, scores })
}

/// 从字符串答案计分，未知维度名视为调用方错误
pub fn score_keys<C, S>(answers: &[S]) -> Result<PreferenceProfile<C>, EngineError>
where
    C: Category,
    S: AsRef<str>,
{
    let parsed = parse_answers::<C, S>(answers)?;
    score(&parsed)
}

/// 按测验定义计分：答案数量必须等于题目数量
pub fn score_quiz<C, S>(
    definition: &QuizDefinition,
    answers: &[S],
) -> Result<PreferenceProfile<C>, EngineError>
where
    C: Category,
    S: AsRef<str>,
{
    if definition.program != C::PROGRAM {
        return Err(EngineError::invalid(format!(
            "quiz for {} cannot score {} answers",
            definition.program,
            C::PROGRAM
        )));
    }
    if answers.len() != definition.question_count {
        return Err(EngineError::invalid(format!(
            "expected {} answers, got {}",
            definition.question_count,
            answers.len()
        )));
    }
    score_keys(answers)
}

fn parse_answers<C, S>(answers: &[S]) -> Result<Vec<C>, EngineError>
where
    C: Category,
    S: AsRef<str>,
{
    answers
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let key = raw.as_ref().trim();
            C::from_key(key).ok_or_else(|| {
                EngineError::invalid(format!(
                    "unknown {} category '{}' at answer {}",
                    C::PROGRAM,
                    key,
                    index + 1
                ))
            })
        })
        .collect()
}
