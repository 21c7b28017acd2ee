use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::extractors::JsonBody;
use crate::rating::display::{difficulty_color, quality_badge, rating_color, QualityBadge};
use crate::rating::ranking::{sort_rows, ProblemRow, SortPreference};
use crate::rating::{aggregate, overall_rating, ProblemStats, Vote};
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::action_log::Action;
use crate::store::operations::comments::Comment;
use crate::store::operations::metas::ProblemMeta;
use crate::store::operations::problems::Problem;
use crate::store::{unix_timestamp, Store};
use crate::validation::{
    validate_comment, validate_difficulty, validate_rating, validate_tags, RatingField,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_problems))
        .route("/:title", get(problem_detail))
        .route("/:title/vote", put(submit_vote))
        .route("/:title/votes/:voter", delete(delete_vote))
        .route("/:title/comments", post(add_comment).delete(delete_comment))
        .route("/:title/meta", put(update_meta))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatColors {
    thinking: String,
    implementing: String,
    overall: String,
    quality: QualityBadge,
}

impl StatColors {
    fn of(stats: &ProblemStats) -> Self {
        Self {
            thinking: rating_color(stats.thinking.mean),
            implementing: rating_color(stats.implementing.mean),
            overall: rating_color(stats.overall.mean),
            quality: quality_badge(stats.quality.mean),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProblemRowView {
    title: String,
    link: String,
    difficulty: String,
    difficulty_color: Option<&'static str>,
    tags: String,
    stats: Option<ProblemStats>,
    colors: Option<StatColors>,
}

impl From<ProblemRow> for ProblemRowView {
    fn from(row: ProblemRow) -> Self {
        Self {
            difficulty_color: difficulty_color(&row.difficulty),
            colors: row.stats.as_ref().map(StatColors::of),
            title: row.title,
            link: row.link,
            difficulty: row.difficulty,
            tags: row.tags,
            stats: row.stats,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProblemListView {
    problems: Vec<ProblemRowView>,
    sort: SortPreference,
    last_saved_at: DateTime<Utc>,
}

fn require_problem(store: &Store, title: &str) -> Result<Problem, AppError> {
    store
        .find_problem(title)
        .ok_or_else(|| AppError::not_found(&format!("题目不存在: {title}")))
}

/// Write the ratings file after a mutation, off the async executor. A failure
/// leaves the store dirty and the autosave job retries.
async fn persist(state: &AppState) {
    let store = state.store_arc();
    match tokio::task::spawn_blocking(move || store.save_ratings()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Saving ratings failed, autosave will retry"),
        Err(e) => tracing::error!(error = %e, "Ratings save task panicked"),
    }
}

async fn list_problems(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store();
    let mut rows: Vec<ProblemRow> = store
        .list_problems()
        .into_iter()
        .map(|problem| {
            let meta = store.get_meta(&problem.title);
            let stats = aggregate(&store.get_votes(&problem.title));
            ProblemRow {
                title: problem.title,
                link: problem.link,
                difficulty: meta.difficulty,
                tags: meta.tags,
                stats,
            }
        })
        .collect();
    sort_rows(&mut rows, auth.sort);

    Ok(ok(ProblemListView {
        problems: rows.into_iter().map(ProblemRowView::from).collect(),
        sort: auth.sort,
        last_saved_at: store.last_saved_at(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteView {
    voter: String,
    thinking: f64,
    implementing: f64,
    quality: f64,
    overall: f64,
    can_delete: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentView {
    user: String,
    text: String,
    time: f64,
    can_delete: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProblemDetailView {
    title: String,
    link: String,
    meta: ProblemMeta,
    difficulty_color: Option<&'static str>,
    can_edit: bool,
    stats: Option<ProblemStats>,
    colors: Option<StatColors>,
    votes: Vec<VoteView>,
    comments: Vec<CommentView>,
}

async fn problem_detail(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store();
    let problem = require_problem(store, &title)?;
    let votes = store.get_votes(&title);
    let stats = aggregate(&votes);
    let meta = store.get_meta(&title);

    let votes = votes
        .into_iter()
        .map(|v| VoteView {
            overall: overall_rating(v.thinking, v.implementing),
            can_delete: auth.may_delete(&v.voter),
            voter: v.voter,
            thinking: v.thinking,
            implementing: v.implementing,
            quality: v.quality,
        })
        .collect();
    let comments = store
        .get_comments(&title)
        .into_iter()
        .map(|c| CommentView {
            can_delete: auth.may_delete(&c.user),
            user: c.user,
            text: c.text,
            time: c.time,
        })
        .collect();

    Ok(ok(ProblemDetailView {
        difficulty_color: difficulty_color(&meta.difficulty),
        can_edit: auth.user.can_edit(&title),
        colors: stats.as_ref().map(StatColors::of),
        title: problem.title,
        link: problem.link,
        meta,
        stats,
        votes,
        comments,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    thinking: f64,
    implementing: f64,
    quality: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteResult {
    replaced: bool,
    stats: Option<ProblemStats>,
}

async fn submit_vote(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title): Path<String>,
    JsonBody(req): JsonBody<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store();
    require_problem(store, &title)?;

    let invalid = |msg: String| AppError::bad_request("VALIDATION_ERROR", &msg);
    let vote = Vote {
        voter: auth.username.clone(),
        thinking: validate_rating(req.thinking, RatingField::Thinking).map_err(invalid)?,
        implementing: validate_rating(req.implementing, RatingField::Implementing)
            .map_err(invalid)?,
        quality: validate_rating(req.quality, RatingField::Quality).map_err(invalid)?,
    };
    let details = format!(
        "{title} thinking={} implementing={} quality={}",
        vote.thinking, vote.implementing, vote.quality
    );

    let replaced = store.upsert_vote(&title, vote).is_some();
    persist(&state).await;
    store.log_action(&auth.username, Action::Vote, details);

    Ok(ok(VoteResult {
        replaced,
        stats: aggregate(&store.get_votes(&title)),
    }))
}

async fn delete_vote(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((title, voter)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store();
    require_problem(store, &title)?;
    if !auth.may_delete(&voter) {
        return Err(AppError::forbidden("无权删除此评分"));
    }

    store
        .remove_vote(&title, &voter)
        .ok_or_else(|| AppError::not_found("评分不存在"))?;
    persist(&state).await;
    store.log_action(&auth.username, Action::DeleteVote, format!("{title} voter={voter}"));

    Ok(ok(serde_json::json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentRequest {
    text: String,
}

async fn add_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title): Path<String>,
    JsonBody(req): JsonBody<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store();
    require_problem(store, &title)?;
    let text =
        validate_comment(&req.text).map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let comment = Comment {
        user: auth.username.clone(),
        text,
        time: unix_timestamp(),
    };
    store.add_comment(&title, comment.clone());
    persist(&state).await;
    store.log_action(&auth.username, Action::Comment, title);

    Ok(created(comment))
}

async fn delete_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title): Path<String>,
    JsonBody(target): JsonBody<Comment>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store();
    require_problem(store, &title)?;
    if !auth.may_delete(&target.user) {
        return Err(AppError::forbidden("无权删除此评论"));
    }

    if !store.remove_comment(&title, &target) {
        return Err(AppError::not_found("评论不存在"));
    }
    persist(&state).await;
    store.log_action(
        &auth.username,
        Action::DeleteComment,
        format!("{title} author={}", target.user),
    );

    Ok(ok(serde_json::json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaRequest {
    difficulty: String,
    #[serde(default)]
    tags: String,
}

async fn update_meta(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title): Path<String>,
    JsonBody(req): JsonBody<MetaRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store();
    require_problem(store, &title)?;
    if !auth.user.can_edit(&title) {
        return Err(AppError::forbidden("无权编辑该题目"));
    }

    validate_difficulty(&req.difficulty)
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;
    let tags =
        validate_tags(&req.tags).map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let meta = ProblemMeta {
        difficulty: req.difficulty,
        tags,
    };
    let details = format!("{title} difficulty={} tags={}", meta.difficulty, meta.tags);
    store.set_meta(&title, meta.clone());
    persist(&state).await;
    store.log_action(&auth.username, Action::EditMeta, details);

    Ok(ok(meta))
}
