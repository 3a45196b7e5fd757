use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::info;

use super::present;
use crate::error::AppError;
use crate::models::{SendMessageRequest, SendMessageResponse};
use crate::state::AppState;
use crate::teams::is_teams_webhook;

pub(super) async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let Json(req) = body?;

    let (Some(webhook_url), Some(message)) = (present(req.webhook_url), present(req.message))
    else {
        return Err(AppError::Validation(
            "Webhook URL and message are required".to_string(),
        ));
    };
    if !is_teams_webhook(&webhook_url) {
        return Err(AppError::Validation(
            "Invalid Microsoft Teams webhook URL".to_string(),
        ));
    }

    state.teams.send_message(&webhook_url, &message).await?;
    info!("relayed message to Teams ({} chars)", message.len());

    Ok(Json(SendMessageResponse {
        success: true,
        message: "Message sent to Microsoft Teams successfully".to_string(),
    }))
}
