/**
 * Reaction Routes
 * Per-visitor toggleable reactions on published posts
 */
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{BlogReaction, ReactionType};
use crate::error::AppError;
use crate::routes::blog::find_published;
use crate::state::AppState;
use crate::store::StoreError;
use crate::visitor::Visitor;

/// Request body for POST /api/blog/:slug/reactions
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub reaction_type: ReactionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    Added,
    Removed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCount {
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
    pub count: usize,
    pub user_reacted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub reactions: Vec<ReactionCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ReactionAction>,
}

/// Counts for every reaction type, including the ones nobody used yet.
fn summarize(rows: &[BlogReaction], visitor: &Visitor) -> Vec<ReactionCount> {
    ReactionType::ALL
        .iter()
        .map(|&reaction_type| {
            let of_type = rows.iter().filter(|r| r.reaction_type == reaction_type);
            let mut count = 0;
            let mut user_reacted = false;
            for row in of_type {
                count += 1;
                user_reacted |= row.visitor_id == visitor.id;
            }
            ReactionCount {
                reaction_type,
                count,
                user_reacted,
            }
        })
        .collect()
}

/// GET /api/blog/:slug/reactions
pub async fn get_reactions(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    visitor: Visitor,
) -> Result<Response, AppError> {
    let post = find_published(&state, &slug).await?;
    let rows = state.store.list_reactions(post.id).await?;

    let summary = ReactionSummary {
        reactions: summarize(&rows, &visitor),
        action: None,
    };
    Ok(visitor.respond(&state, Json(summary)))
}

/// POST /api/blog/:slug/reactions - Add the reaction, or remove it if present
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    visitor: Visitor,
    Json(payload): Json<ReactionRequest>,
) -> Result<Response, AppError> {
    let post = find_published(&state, &slug).await?;
    let reaction_type = payload.reaction_type;

    let action = if state
        .store
        .delete_reaction(post.id, visitor.id, reaction_type)
        .await?
    {
        ReactionAction::Removed
    } else {
        match state
            .store
            .insert_reaction(post.id, visitor.id, reaction_type)
            .await
        {
            // A concurrent request from the same visitor got there first.
            Ok(_) | Err(StoreError::Conflict(_)) => ReactionAction::Added,
            Err(e) => return Err(e.into()),
        }
    };

    tracing::debug!(post = %post.slug, reaction = reaction_type.as_str(), ?action, "reaction toggled");

    let rows = state.store.list_reactions(post.id).await?;
    let summary = ReactionSummary {
        reactions: summarize(&rows, &visitor),
        action: Some(action),
    };
    Ok(visitor.respond(&state, Json(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::blog::tests::create;
    use crate::routes::test_support::{app, json_request};
    use crate::visitor::VISITOR_COOKIE;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn react(
        state: &AppState,
        slug: &str,
        reaction: &str,
        cookie: Option<&str>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut req = json_request(
            Method::POST,
            &format!("/api/blog/{}/reactions", slug),
            Some(json!({ "reactionType": reaction })),
            None,
        );
        if let Some(cookie) = cookie {
            req.headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let res = app(state).oneshot(req).await.unwrap();
        let status = res.status();
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, set_cookie, body)
    }

    fn count(body: &Value, reaction: &str) -> (u64, bool) {
        let entry = body["reactions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["type"] == reaction)
            .unwrap();
        (
            entry["count"].as_u64().unwrap(),
            entry["userReacted"].as_bool().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_react_then_unreact_is_net_zero() {
        let state = AppState::in_memory();
        create(&state, "Reactive", "publish").await;

        let (status, cookie, body) = react(&state, "reactive", "like", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "added");
        assert_eq!(count(&body, "like"), (1, true));
        let cookie = cookie.expect("new visitor gets a cookie");
        assert!(cookie.starts_with(&format!("{}=", VISITOR_COOKIE)));

        let (_, again, body) = react(&state, "reactive", "like", Some(&cookie)).await;
        assert!(again.is_none());
        assert_eq!(body["action"], "removed");
        assert_eq!(count(&body, "like"), (0, false));
    }

    #[tokio::test]
    async fn test_visitors_are_counted_separately() {
        let state = AppState::in_memory();
        create(&state, "Popular", "publish").await;

        let (_, first, _) = react(&state, "popular", "helpful", None).await;
        let (_, _, body) = react(&state, "popular", "helpful", None).await;
        assert_eq!(count(&body, "helpful"), (2, true));

        let req = Request::builder()
            .uri("/api/blog/popular/reactions")
            .header(header::COOKIE, first.unwrap())
            .body(Body::empty())
            .unwrap();
        let res = app(&state).oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["reactions"].as_array().unwrap().len(), 4);
        assert_eq!(count(&body, "helpful"), (2, true));
        assert_eq!(count(&body, "love"), (0, false));
        assert!(body.get("action").is_none());
    }

    #[tokio::test]
    async fn test_tampered_cookie_gets_fresh_identity() {
        let state = AppState::in_memory();
        create(&state, "Guarded", "publish").await;

        let (_, cookie, _) = react(&state, "guarded", "love", None).await;
        let forged = format!("{}x", cookie.unwrap());
        let (_, reissued, body) = react(&state, "guarded", "love", Some(&forged)).await;
        assert!(reissued.is_some());
        assert_eq!(body["action"], "added");
        assert_eq!(count(&body, "love"), (2, true));
    }

    #[tokio::test]
    async fn test_unknown_type_and_unpublished_post() {
        let state = AppState::in_memory();
        create(&state, "Quiet", "draft").await;

        let (status, _, _) = react(&state, "quiet", "like", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        create(&state, "Loud", "publish").await;
        let (status, _, _) = react(&state, "loud", "angry", None).await;
        assert!(status.is_client_error());
    }
}
