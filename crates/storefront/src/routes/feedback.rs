//! Feedback (testimonials) route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::{FeedbackEntry, NewFeedback, Rating};

use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

/// Most recent testimonials shown on the page.
const FEEDBACK_PAGE_SIZE: u32 = 50;

/// Feedback display data for templates.
#[derive(Clone)]
pub struct FeedbackView {
    pub name: String,
    pub message: String,
    pub stars: String,
    pub date: String,
}

impl From<&FeedbackEntry> for FeedbackView {
    fn from(entry: &FeedbackEntry) -> Self {
        Self {
            name: entry.name.clone(),
            message: entry.message.clone(),
            stars: "★".repeat(usize::from(entry.rating.value())),
            date: entry.created_at.format("%B %e, %Y").to_string(),
        }
    }
}

/// Feedback form data.
#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub name: String,
    pub message: String,
    pub rating: u8,
}

/// Query parameters for flash display after a submission.
#[derive(Debug, Deserialize)]
pub struct FlashQuery {
    pub submitted: Option<String>,
    pub error: Option<String>,
}

/// Feedback page template.
#[derive(Template, WebTemplate)]
#[template(path = "feedback/index.html")]
pub struct FeedbackIndexTemplate {
    pub entries: Vec<FeedbackView>,
    pub submitted: bool,
    pub error: Option<String>,
    pub signed_in: bool,
    pub cart_count: u32,
}

/// Map a flash error code to display text.
fn flash_message(code: &str) -> String {
    match code {
        "missing" => "Name and message are required.".to_string(),
        "rating" => "Rating must be between 1 and 5 stars.".to_string(),
        _ => "Something went wrong. Please try again.".to_string(),
    }
}

/// Display the testimonials page.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<FlashQuery>,
) -> Result<FeedbackIndexTemplate> {
    let entries: Vec<FeedbackEntry> = state
        .supabase()
        .table("feedback")
        .select("*")
        .order("created_at", true)
        .limit(FEEDBACK_PAGE_SIZE)
        .fetch()
        .await?;

    let cart_count = state.cart().count(user.as_ref()).await;

    Ok(FeedbackIndexTemplate {
        entries: entries.iter().map(FeedbackView::from).collect(),
        submitted: query.submitted.is_some(),
        error: query.error.as_deref().map(flash_message),
        signed_in: user.is_some(),
        cart_count,
    })
}

/// Submit a testimonial.
///
/// Requires an authenticated user; the insert runs under the user's own
/// token so row-level security attributes the row correctly.
#[instrument(skip(state, user, form), fields(user_id = %user.0.id))]
pub async fn submit(
    State(state): State<AppState>,
    user: RequireAuth,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let RequireAuth(user) = user;

    let name = form.name.trim();
    let message = form.message.trim();
    if name.is_empty() || message.is_empty() {
        return Redirect::to("/feedback?error=missing").into_response();
    }

    let Ok(rating) = Rating::new(form.rating) else {
        return Redirect::to("/feedback?error=rating").into_response();
    };

    let row = NewFeedback {
        user_id: user.id,
        name: name.to_string(),
        message: message.to_string(),
        rating,
    };

    match state
        .supabase()
        .table("feedback")
        .auth(&user.access_token)
        .insert(std::slice::from_ref(&row))
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = %user.id, "testimonial submitted");
            Redirect::to("/feedback?submitted=1").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to save testimonial");
            Redirect::to("/feedback?error=save").into_response()
        }
    }
}
