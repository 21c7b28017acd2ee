//! 请求输入校验，供认证、评分、评论和元数据路由共用。
//! 校验在任何状态修改之前完成。

use crate::constants::{
    DIFFICULTY_LEVELS, MAX_COMMENT_CHARS, MAX_DIFFICULTY_SCORE, MAX_QUALITY_SCORE,
    MAX_TAGS_CHARS, MIN_DIFFICULTY_SCORE, MIN_QUALITY_SCORE,
};

const MAX_USERNAME_CHARS: usize = 50;
const MAX_PASSWORD_CHARS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingField {
    Thinking,
    Implementing,
    Quality,
}

impl RatingField {
    fn label(self) -> &'static str {
        match self {
            RatingField::Thinking => "思维难度",
            RatingField::Implementing => "实现难度",
            RatingField::Quality => "质量",
        }
    }

    fn bounds(self) -> (f64, f64) {
        match self {
            RatingField::Quality => (MIN_QUALITY_SCORE, MAX_QUALITY_SCORE),
            _ => (MIN_DIFFICULTY_SCORE, MAX_DIFFICULTY_SCORE),
        }
    }
}

/// Difficulty scores must lie in [800, 3500], quality in [-5, 5].
pub fn validate_rating(value: f64, field: RatingField) -> Result<f64, String> {
    let (min, max) = field.bounds();
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{}评分必须在{min}~{max}之间", field.label()));
    }
    Ok(value)
}

/// Trimmed username, 1..=50 characters.
pub fn validate_username(raw: &str) -> Result<String, &'static str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("用户名不能为空");
    }
    if name.chars().count() > MAX_USERNAME_CHARS {
        return Err("用户名不能超过50个字符");
    }
    if name.chars().any(char::is_control) {
        return Err("用户名不能包含控制字符");
    }
    Ok(name.to_string())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.is_empty() {
        return Err("密码不能为空");
    }
    if password.chars().count() > MAX_PASSWORD_CHARS {
        return Err("密码长度不能超过256个字符");
    }
    Ok(())
}

pub fn validate_comment(text: &str) -> Result<String, &'static str> {
    let text = text.trim();
    if text.is_empty() {
        return Err("评论内容不能为空");
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        return Err("评论内容不能超过2000个字符");
    }
    Ok(text.to_string())
}

pub fn validate_tags(tags: &str) -> Result<String, &'static str> {
    let tags = tags.trim();
    if tags.chars().count() > MAX_TAGS_CHARS {
        return Err("标签不能超过500个字符");
    }
    Ok(tags.to_string())
}

pub fn validate_difficulty(label: &str) -> Result<(), &'static str> {
    if DIFFICULTY_LEVELS.iter().any(|(name, _)| *name == label) {
        Ok(())
    } else {
        Err("未知的难度级别")
    }
}
