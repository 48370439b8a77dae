use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{owned_conversation, validate_message_content};
use crate::api::ApiJson;
use crate::app::AppState;
use crate::database::models::NewMessage;
use crate::error::ApiError;
use crate::middleware::UserContext;
use crate::services::{generate_id, ProxyError};
use crate::types::MessageRole;

const SUPERVISOR_CHAT_PATH: &str = "/api/v1/supervisor-chat";
const CAREER_SEARCH_PATH: &str = "/api/v1/career-search";
const DEFAULT_AGENT: &str = "supervisor";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub stream: bool,
    pub context: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CareerSearchRequest {
    pub query: String,
    pub location: Option<String>,
    pub limit: Option<u32>,
    pub filters: Option<Value>,
}

fn user_context_json(user: &UserContext) -> Value {
    json!({
        "user_id": user.id,
        "email": user.email,
        "profile": user.active_profile,
        "permissions": user.permissions,
    })
}

/// Fill in what the chat UI relies on when the backend leaves it out
fn complete_chat_response(response: &mut Map<String, Value>, user: &UserContext) {
    response
        .entry("user_context")
        .or_insert_with(|| user_context_json(user));
    let agent_missing = !matches!(response.get("agent_used"), Some(Value::String(s)) if !s.is_empty());
    if agent_missing {
        response.insert("agent_used".to_string(), json!(DEFAULT_AGENT));
    }
}

/// Assistant text from the backend reply, whichever key it used
fn reply_text(response: &Map<String, Value>) -> Option<&str> {
    ["response", "message", "content"]
        .iter()
        .find_map(|key| response.get(*key).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
}

async fn persist_message(state: &AppState, conversation_id: Uuid, role: MessageRole, content: &str, metadata: Value) {
    let message = NewMessage {
        id: generate_id("msg"),
        conversation_id,
        role: role.as_str().to_string(),
        content: content.to_string(),
        metadata,
    };
    if let Err(e) = state.store.append_message(message).await {
        tracing::warn!(
            "Failed to store {} message in conversation {}: {}",
            role.as_str(),
            conversation_id,
            e
        );
    }
}

/// POST /api/v1/chat - Forward a message to the supervisor agent
///
/// With `stream: true` the backend's event stream is relayed chunk by chunk.
/// Otherwise the backend JSON is returned with `user_context` and `agent_used`
/// guaranteed present.
pub async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiJson(body): ApiJson<ChatRequest>,
) -> Result<Response, ApiError> {
    validate_message_content("message", &body.message)?;

    let conversation_id = match body.conversation_id {
        Some(id) => Some(owned_conversation(&state, id, user.id).await?.id),
        None => None,
    };

    let payload = json!({
        "message": body.message,
        "conversation_id": conversation_id,
        "stream": body.stream,
        "context": body.context,
        "user_context": user_context_json(&user),
    });

    if body.stream {
        let stream = state.backend.post_stream(SUPERVISOR_CHAT_PATH, &payload).await?;
        if let Some(id) = conversation_id {
            persist_message(&state, id, MessageRole::User, &body.message, json!({})).await;
        }
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(stream),
        )
            .into_response());
    }

    let mut response = match state.backend.post_json(SUPERVISOR_CHAT_PATH, &payload).await? {
        Value::Object(map) => map,
        other => {
            return Err(ProxyError::InvalidResponse(format!("expected a JSON object, got {}", other)).into());
        }
    };
    complete_chat_response(&mut response, &user);

    if let Some(id) = conversation_id {
        persist_message(&state, id, MessageRole::User, &body.message, json!({})).await;
        if let Some(reply) = reply_text(&response) {
            let metadata = json!({ "agent_used": response.get("agent_used") });
            persist_message(&state, id, MessageRole::Assistant, reply, metadata).await;
        }
    }

    Ok(Json(Value::Object(response)).into_response())
}

/// Flag results whose `match_score` exceeds `threshold`; returns how many were flagged
pub fn annotate_for_review(response: &mut Value, threshold: f64) -> usize {
    let mut flagged = 0;
    for key in ["results", "matches", "jobs"] {
        let Some(items) = response.get_mut(key).and_then(Value::as_array_mut) else {
            continue;
        };
        for item in items.iter_mut().filter_map(Value::as_object_mut) {
            let needs_review = item
                .get("match_score")
                .and_then(Value::as_f64)
                .map_or(false, |score| score > threshold);
            item.insert("requires_human_review".to_string(), json!(needs_review));
            if needs_review {
                flagged += 1;
            }
        }
    }
    flagged
}

/// POST /api/v1/career-search - Forward a search to the backend and mark
/// high-confidence matches for human review
pub async fn career_search(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiJson(body): ApiJson<CareerSearchRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::field_error("query", "Search query is required"));
    }

    let payload = json!({
        "query": body.query.trim(),
        "location": body.location,
        "limit": body.limit,
        "filters": body.filters,
        "user_context": user_context_json(&user),
    });

    let mut response = state.backend.post_json(CAREER_SEARCH_PATH, &payload).await?;
    if !response.is_object() {
        return Err(ProxyError::InvalidResponse("expected a JSON object".to_string()).into());
    }

    let threshold = match state.store.get_settings().await {
        Ok(Some(settings)) => settings.hitl_match_threshold,
        Ok(None) => state.config.features.hitl_match_threshold,
        Err(e) => {
            tracing::warn!("Using configured HITL threshold, settings unavailable: {}", e);
            state.config.features.hitl_match_threshold
        }
    };

    let flagged = annotate_for_review(&mut response, threshold);
    response["hitl_review_count"] = json!(flagged);
    response["hitl_threshold"] = json!(threshold);
    if flagged > 0 {
        tracing::info!("{} career matches flagged for human review (user {})", flagged, user.id);
    }

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_scores_above_threshold_only() {
        let mut response = json!({
            "results": [
                {"title": "Solar installer", "match_score": 0.92},
                {"title": "Energy auditor", "match_score": 0.8},
                {"title": "Wind tech"}
            ]
        });
        assert_eq!(annotate_for_review(&mut response, 0.8), 1);
        assert_eq!(response["results"][0]["requires_human_review"], true);
        assert_eq!(response["results"][1]["requires_human_review"], false);
        assert_eq!(response["results"][2]["requires_human_review"], false);
    }

    #[test]
    fn reply_text_checks_known_keys() {
        let map = json!({"agent_used": "pendo", "content": "Try the MassCEC internship"});
        assert_eq!(reply_text(map.as_object().unwrap()), Some("Try the MassCEC internship"));
        let empty = json!({"response": "  "});
        assert_eq!(reply_text(empty.as_object().unwrap()), None);
    }
}
