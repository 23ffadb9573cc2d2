//! Annotation handlers
//!
//! `GET /` describes the app, `POST /` annotates the MMIF document in the
//! request body and answers with the augmented document.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use spotlink_core::Mmif;
use std::sync::Arc;

/// Query parameters accepted by `POST /`
#[derive(Debug, Default, Deserialize)]
pub struct AnnotateParams {
    pub pretty: Option<String>,
}

impl AnnotateParams {
    /// `?pretty`, `?pretty=true`, `?pretty=1` all ask for indented output
    pub fn pretty(&self) -> bool {
        match self.pretty.as_deref() {
            Some(value) => matches!(value.to_ascii_lowercase().as_str(), "" | "true" | "1" | "yes"),
            None => false,
        }
    }
}

pub async fn metadata(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.pipeline.app_metadata())
}

pub async fn annotate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnnotateParams>,
    body: String,
) -> Result<Response, AppError> {
    let request = state.increment_requests() + 1;

    let mmif = Mmif::from_json(&body)?;
    tracing::info!(
        request,
        documents = mmif.documents.len(),
        views = mmif.views.len(),
        "Annotation request"
    );

    let annotated = state
        .pipeline
        .annotate(mmif, &state.shutdown.child_token())
        .await
        .inspect_err(|e| tracing::warn!(request, error = %e, "Annotation failed"))?;

    let json = annotated
        .to_json(params.pretty())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_flag() {
        let parse = |v: Option<&str>| AnnotateParams {
            pretty: v.map(str::to_string),
        }
        .pretty();

        assert!(!parse(None));
        assert!(parse(Some("")));
        assert!(parse(Some("True")));
        assert!(parse(Some("1")));
        assert!(!parse(Some("false")));
        assert!(!parse(Some("no")));
    }
}
