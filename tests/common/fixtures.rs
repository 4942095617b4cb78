use serde_json::Value;

/// 20 道爱之语答案：words 8、quality_time 6、acts 4、gifts 2
pub fn love_language_answers() -> Value {
    let mut answers = Vec::new();
    answers.extend(std::iter::repeat("words").take(8));
    answers.extend(std::iter::repeat("quality_time").take(6));
    answers.extend(std::iter::repeat("acts").take(4));
    answers.extend(std::iter::repeat("gifts").take(2));
    serde_json::json!({ "answers": answers })
}

/// 20 道性格答案，以 `primary` 为主、`secondary` 为次
pub fn temperament_answers(primary: &str, secondary: &str) -> Value {
    let mut answers = Vec::new();
    answers.extend(std::iter::repeat(primary).take(12));
    answers.extend(std::iter::repeat(secondary).take(8));
    serde_json::json!({ "answers": answers })
}

pub fn unique_user(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
