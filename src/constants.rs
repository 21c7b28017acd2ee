/// 思维/实现难度评分下限
pub const MIN_DIFFICULTY_SCORE: f64 = 800.0;

/// 思维/实现难度评分上限
pub const MAX_DIFFICULTY_SCORE: f64 = 3500.0;

/// 质量评分下限
pub const MIN_QUALITY_SCORE: f64 = -5.0;

/// 质量评分上限
pub const MAX_QUALITY_SCORE: f64 = 5.0;

/// Lower edge of the overall-rating search interval.
pub const MIN_RATING_BOUND: f64 = 1.0;

/// Upper edge of the overall-rating search interval.
pub const MAX_RATING_BOUND: f64 = 8000.0;

/// Bisection tolerance and step adjustment of the overall-rating solver.
pub const SOLVER_EPS: f64 = 1e-4;

/// Elo logistic scale.
pub const ELO_SCALE: f64 = 400.0;

/// Legacy votes whose quality is at or above this value are on the old scale.
pub const LEGACY_QUALITY_THRESHOLD: f64 = 800.0;

/// 未评定题目的默认难度
pub const DEFAULT_DIFFICULTY: &str = "暂无评定";

/// 知识点难度级别（按从易到难排序）及其显示颜色
pub const DIFFICULTY_LEVELS: &[(&str, &str)] = &[
    ("暂无评定", "#bfbfbf"),
    ("入门", "#fe4c61"),
    ("普及−", "#f39c11"),
    ("普及/提高−", "#ffc116"),
    ("普及+/提高", "#52c41a"),
    ("提高+/省选−", "#3498db"),
    ("省选/NOI−", "#9d3dcf"),
    ("NOI/NOI+/CTSC", "#0e1d69"),
];

/// Sort rank given to difficulty labels outside `DIFFICULTY_LEVELS`.
pub const UNKNOWN_DIFFICULTY_RANK: usize = 99;

/// 评论最大长度（字符）
pub const MAX_COMMENT_CHARS: usize = 2000;

/// 标签字段最大长度（字符）
pub const MAX_TAGS_CHARS: usize = 500;

/// 管理员查看操作日志的默认条数
pub const DEFAULT_ACTION_LOG_LIMIT: usize = 100;

/// 管理员查看操作日志的最大条数
pub const MAX_ACTION_LOG_LIMIT: usize = 1000;

/// 每用户最大并发会话数
pub const MAX_SESSIONS_PER_USER: usize = 10;
