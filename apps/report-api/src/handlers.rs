//! HTTP handlers for the report API

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use template_engine::{RecordStore, Recommendations, ReportSession, StoreError};
use tracing::info;

use crate::error::ApiError;
use crate::models::{
    BannerRequest, EntryList, LoadResponse, PutTemplateRequest, RenderRequest, RenderResponse,
    SaveRequest, SaveResponse, SuggestionQuery, TemplateResponse,
};
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "report-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create or edit a template definition. On an edit, specs the request does
/// not mention are kept, so fields removed from the template keep their
/// configuration.
pub async fn put_template(
    State(state): State<Arc<AppState>>,
    Path(factcode): Path<String>,
    Json(req): Json<PutTemplateRequest>,
) -> ApiResult<(StatusCode, Json<TemplateResponse>)> {
    let factcode = factcode.trim().to_string();
    if factcode.is_empty() {
        return Err(ApiError::InvalidRequest("Fact code is required".to_string()));
    }

    let session = match state.store.get_template(&factcode).await {
        Ok(stored) => {
            let mut session = ReportSession::new(stored)?;
            session.revise(
                req.template,
                req.field_specs,
                req.visibility_rules,
                req.location_field,
            )?;
            session
        }
        Err(StoreError::TemplateNotFound(_)) => ReportSession::new(req.into_definition(factcode))?,
        Err(e) => return Err(e.into()),
    };
    state
        .store
        .put_template(session.definition().clone())
        .await?;

    info!(
        "Stored template {} with {} field(s)",
        session.definition().factcode,
        session.catalog().active().count()
    );

    Ok((
        StatusCode::OK,
        Json(TemplateResponse {
            definition: session.definition().clone(),
            fields: session.input_fields(),
        }),
    ))
}

/// Fetch a template with its input fields
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(factcode): Path<String>,
) -> ApiResult<Json<TemplateResponse>> {
    let session = state.session(&factcode).await?;
    state.recommender.record_access(&factcode);

    Ok(Json(TemplateResponse {
        definition: session.definition().clone(),
        fields: session.input_fields(),
    }))
}

/// Render the template against the submitted form values
pub async fn render(
    State(state): State<Arc<AppState>>,
    Path(factcode): Path<String>,
    Json(req): Json<RenderRequest>,
) -> ApiResult<Json<RenderResponse>> {
    let session = state
        .session(&factcode)
        .await?
        .with_values(req.values)
        .with_stop_reason(req.stop_reason);

    Ok(Json(RenderResponse::new(
        session.document(),
        session.input_fields(),
    )))
}

/// Top picks and full deduplicated history for a fact code
pub async fn recent(
    State(state): State<Arc<AppState>>,
    Path(factcode): Path<String>,
) -> Json<Recommendations> {
    Json(state.recommender.refresh(&factcode).await)
}

/// Location suggestions for the typed text, top picks excluded
pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    Path(factcode): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> Json<EntryList> {
    let mut recommendations = state.recommender.current(&factcode).await;
    if recommendations.entries.is_empty() {
        recommendations = state.recommender.refresh(&factcode).await;
    }

    let limit = state.recommender.config().suggestion_limit;
    let entries = recommendations
        .suggestions(&query.q, limit)
        .into_iter()
        .cloned()
        .collect();
    Json(EntryList::new(entries))
}

/// Top picks to offer in the banner for the current form state
pub async fn banner(
    State(state): State<Arc<AppState>>,
    Path(factcode): Path<String>,
    Json(req): Json<BannerRequest>,
) -> ApiResult<Json<EntryList>> {
    let session = state
        .session(&factcode)
        .await?
        .with_values(req.form.values)
        .with_stop_reason(req.form.stop_reason);
    let document = session.document();

    let recommendations = state.recommender.refresh(&factcode).await;
    let entries = recommendations
        .banner(req.prefill.as_ref(), &document.text)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(EntryList::new(entries)))
}

/// Save the generated document with the values of visible fields only. A
/// failed or skipped save still answers 200 with `saved: false`.
pub async fn save_entry(
    State(state): State<Arc<AppState>>,
    Path(factcode): Path<String>,
    Json(req): Json<SaveRequest>,
) -> ApiResult<Json<SaveResponse>> {
    let user_id = req.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::InvalidRequest("user_id is required".to_string()));
    }

    let session = state
        .session(&factcode)
        .await?
        .with_values(req.form.values)
        .with_stop_reason(req.form.stop_reason);
    let document = session.document();

    let result = state
        .recommender
        .save(
            user_id,
            session.definition(),
            &session.visible_values(),
            &document.text,
        )
        .await;
    if result.is_some() {
        state.recommender.refresh(&factcode).await;
    }

    Ok(Json(SaveResponse {
        saved: result.is_some(),
        text: document.text,
        result,
    }))
}

/// Load a saved entry's values into the form
pub async fn load_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<LoadResponse>> {
    let entry = state
        .recommender
        .load_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::EntryNotFound(id.clone()))?;

    Ok(Json(LoadResponse {
        entry_id: entry.id,
        factcode: entry.factcode,
        location_value: entry.location_value,
        values: entry.form_values,
    }))
}
