//! HTTP tests for the report API
//!
//! Every test runs the full router against an in-memory SQLite store.
//!
//! Test categories:
//! - Template storage and validation
//! - Rendering with hidden sentences and the stop clause
//! - Saving, recent entries, suggestions and the banner
//! - Loading entries and template seeding

#[cfg(test)]
mod api_tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use template_engine::RecommenderConfig;
    use tower::ServiceExt;

    use crate::db::SqliteStore;
    use crate::state::AppState;

    const FACTCODE: &str = "R397b";

    async fn test_app() -> (Router, Arc<AppState>) {
        let store = Arc::new(SqliteStore::connect("sqlite::memory:").await.unwrap());
        let state = Arc::new(AppState::with_store(store, RecommenderConfig::default()));
        (crate::app(state.clone()), state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn template_body() -> Value {
        json!({
            "template": "Op de {locatie} reed een voertuig richting {richting}. Het voertuig reed over de stoep: {stoep}.",
            "field_specs": [
                { "name": "locatie", "label": "Locatie" },
                {
                    "name": "richting",
                    "label": "Rijrichting",
                    "kind": {
                        "type": "single_select",
                        "options": [
                            { "label": "Noord", "value": "noord" },
                            { "label": "Zuid", "value": "zuid" }
                        ]
                    }
                }
            ],
            "visibility_rules": [
                {
                    "target_field": "stoep",
                    "depends_on": "richting",
                    "operator": "equals",
                    "value": "noord"
                }
            ],
            "location_field": "locatie"
        })
    }

    async fn app_with_template() -> (Router, Arc<AppState>) {
        let (app, state) = test_app().await;
        let uri = format!("/api/templates/{}", FACTCODE);
        let (status, _) = send(&app, Method::PUT, &uri, Some(template_body())).await;
        assert_eq!(status, StatusCode::OK);
        (app, state)
    }

    async fn save(app: &Router, location: &str) -> Value {
        let uri = format!("/api/templates/{}/entries", FACTCODE);
        let body = json!({
            "user_id": "agent-1",
            "values": { "locatie": location, "richting": "noord", "stoep": "ja" },
            "stop_reason": { "status": "stopped" }
        });
        let (status, json) = send(app, Method::POST, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        json
    }

    fn locations(json: &Value, key: &str) -> Vec<String> {
        json[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["location_value"].as_str().unwrap().to_string())
            .collect()
    }

    // ============================================================
    // Templates
    // ============================================================

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app().await;
        let (status, json) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_get_template_lists_fields_in_order() {
        let (app, state) = app_with_template().await;
        let uri = format!("/api/templates/{}", FACTCODE);
        let (status, json) = send(&app, Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["locatie", "richting", "stoep"]);
        assert_eq!(json["fields"][1]["kind"]["type"], "single_select");
        assert_eq!(json["fields"][2]["visible"], false);

        // Access telemetry is fire-and-forget
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(state.store.access_count(FACTCODE).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_template_is_not_found() {
        let (app, _) = test_app().await;
        let (status, json) = send(&app, Method::GET, "/api/templates/R999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], 404);
    }

    #[tokio::test]
    async fn test_self_referencing_rule_is_rejected() {
        let (app, _) = test_app().await;
        let body = json!({
            "template": "{a}",
            "visibility_rules": [
                { "target_field": "a", "depends_on": "a", "operator": "is_empty" }
            ]
        });
        let (status, _) = send(&app, Method::PUT, "/api/templates/R315", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_select_without_options_is_rejected() {
        let (app, _) = test_app().await;
        let body = json!({
            "template": "{a}",
            "field_specs": [
                { "name": "a", "label": "A", "kind": { "type": "single_select", "options": [] } }
            ]
        });
        let (status, _) = send(&app, Method::PUT, "/api/templates/R315", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_template_edit_keeps_field_configuration() {
        let (app, _) = app_with_template().await;
        let uri = format!("/api/templates/{}", FACTCODE);

        let body = json!({ "template": "Op de {locatie}." });
        let (status, json) = send(&app, Method::PUT, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fields"].as_array().unwrap().len(), 1);

        let body = json!({ "template": "Op de {locatie} richting {richting}." });
        let (status, json) = send(&app, Method::PUT, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fields"][1]["name"], "richting");
        assert_eq!(json["fields"][1]["label"], "Rijrichting");
        assert_eq!(json["fields"][1]["kind"]["type"], "single_select");

        // The stored definition carries the kept spec too
        let (_, json) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(json["fields"][1]["label"], "Rijrichting");
    }

    #[tokio::test]
    async fn test_template_edit_replaces_resent_specs() {
        let (app, _) = app_with_template().await;
        let uri = format!("/api/templates/{}", FACTCODE);
        let body = json!({
            "template": "Op de {locatie}.",
            "field_specs": [{ "name": "locatie", "label": "Plaats" }]
        });
        let (_, json) = send(&app, Method::PUT, &uri, Some(body)).await;
        assert_eq!(json["fields"][0]["label"], "Plaats");
    }

    // ============================================================
    // Rendering
    // ============================================================

    #[tokio::test]
    async fn test_render_removes_hidden_sentence() {
        let (app, _) = app_with_template().await;
        let uri = format!("/api/templates/{}/render", FACTCODE);
        let body = json!({ "values": { "locatie": "Markt", "richting": "zuid", "stoep": "ja" } });
        let (status, json) = send(&app, Method::POST, &uri, Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text"], "Op de Markt reed een voertuig richting zuid.");
        assert_eq!(json["complete"], true);
        assert_eq!(json["fields"][2]["visible"], false);
    }

    #[tokio::test]
    async fn test_render_reports_unfilled_fields() {
        let (app, _) = app_with_template().await;
        let uri = format!("/api/templates/{}/render", FACTCODE);
        let body = json!({ "values": { "locatie": "Markt" } });
        let (status, json) = send(&app, Method::POST, &uri, Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text"], "Op de Markt reed een voertuig richting {richting}.");
        assert_eq!(json["unfilled_fields"], json!(["richting"]));
        assert_eq!(json["complete"], false);
    }

    #[tokio::test]
    async fn test_render_appends_stop_clause() {
        let (app, _) = app_with_template().await;
        let uri = format!("/api/templates/{}/render", FACTCODE);
        let body = json!({
            "values": { "locatie": "Markt", "richting": "zuid" },
            "stop_reason": { "status": "not_stopped", "reason": { "kind": "other", "text": "  " } }
        });
        let (_, json) = send(&app, Method::POST, &uri, Some(body)).await;

        assert_eq!(
            json["text"],
            "Op de Markt reed een voertuig richting zuid.\n\n[REDEN NIET STAANDE HOUDEN INVULLEN]"
        );
    }

    // ============================================================
    // History
    // ============================================================

    #[tokio::test]
    async fn test_save_then_resave_updates_entry() {
        let (app, _) = app_with_template().await;

        let first = save(&app, "Markt").await;
        assert_eq!(first["saved"], true);
        assert_eq!(first["result"]["outcome"], "inserted");
        assert!(first["text"]
            .as_str()
            .unwrap()
            .ends_with("ter zake van feitcode R397b."));

        let second = save(&app, "Markt").await;
        assert_eq!(second["result"]["outcome"], "updated");
        assert_eq!(second["result"]["entry"]["id"], first["result"]["entry"]["id"]);

        let uri = format!("/api/templates/{}/recent", FACTCODE);
        let (_, json) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(locations(&json, "entries"), vec!["Markt"]);
    }

    #[tokio::test]
    async fn test_hidden_values_are_not_saved() {
        let (app, _) = app_with_template().await;
        let uri = format!("/api/templates/{}/entries", FACTCODE);
        let body = json!({
            "user_id": "agent-1",
            "values": { "locatie": "Markt", "richting": "zuid", "stoep": "GEHEIM" }
        });
        let (status, json) = send(&app, Method::POST, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["saved"], true);
        assert!(!json.to_string().contains("GEHEIM"));
        assert_eq!(json["result"]["entry"]["form_values"]["richting"], "zuid");

        let id = json["result"]["entry"]["id"].as_str().unwrap().to_string();
        let (_, json) = send(&app, Method::POST, &format!("/api/entries/{}/load", id), None).await;
        assert!(json["values"].get("stoep").is_none());
        assert_eq!(json["values"]["locatie"], "Markt");
    }

    #[tokio::test]
    async fn test_save_with_blank_location_is_skipped() {
        let (app, _) = app_with_template().await;
        let json = save(&app, "   ").await;
        assert_eq!(json["saved"], false);
        assert!(json.get("result").is_none());
    }

    #[tokio::test]
    async fn test_save_requires_user() {
        let (app, _) = app_with_template().await;
        let uri = format!("/api/templates/{}/entries", FACTCODE);
        let body = json!({ "user_id": " ", "values": { "locatie": "Markt" } });
        let (status, _) = send(&app, Method::POST, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recent_and_suggestions() {
        let (app, _) = app_with_template().await;
        for location in ["Markt", "Marktplein", "Dam", "Kerkstraat"] {
            save(&app, location).await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let uri = format!("/api/templates/{}/recent", FACTCODE);
        let (status, json) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            locations(&json, "top_picks"),
            vec!["Kerkstraat", "Dam", "Marktplein"]
        );
        assert_eq!(json["entries"].as_array().unwrap().len(), 4);

        // Top picks are never suggested
        let uri = format!("/api/templates/{}/suggestions?q=MARKT", FACTCODE);
        let (_, json) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(locations(&json, "entries"), vec!["Markt"]);
        assert_eq!(json["count"], 1);

        let uri = format!("/api/templates/{}/suggestions?q=", FACTCODE);
        let (_, json) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_banner_skips_current_document() {
        let (app, _) = app_with_template().await;
        save(&app, "Markt").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        save(&app, "Dam").await;

        let uri = format!("/api/templates/{}/banner", FACTCODE);
        let body = json!({
            "values": { "locatie": "Dam", "richting": "noord", "stoep": "ja" },
            "stop_reason": { "status": "stopped" },
            "prefill": { "locatie": "Markt", "richting": "noord", "stoep": "ja" }
        });
        let (status, json) = send(&app, Method::POST, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 0);

        let body = json!({ "values": { "locatie": "Elders" } });
        let (_, json) = send(&app, Method::POST, &uri, Some(body)).await;
        assert_eq!(locations(&json, "entries"), vec!["Dam", "Markt"]);
    }

    #[tokio::test]
    async fn test_load_entry() {
        let (app, _) = app_with_template().await;
        let saved = save(&app, "Markt").await;
        let id = saved["result"]["entry"]["id"].as_str().unwrap().to_string();

        let (status, json) = send(&app, Method::POST, &format!("/api/entries/{}/load", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location_value"], "Markt");
        assert_eq!(json["values"]["stoep"], "ja");

        let (status, _) = send(&app, Method::POST, "/api/entries/missing/load", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // ============================================================
    // Seeding
    // ============================================================

    #[tokio::test]
    async fn test_seed_file_stores_templates() {
        let (app, state) = test_app().await;
        let seed = r#"
[[templates]]
factcode = "R315"
template = "Het voertuig stond op de {locatie}."
location_field = "locatie"
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(seed.as_bytes()).unwrap();

        let count = crate::seed::load_seed_file(file.path(), state.store.as_ref())
            .await
            .unwrap();
        assert_eq!(count, 1);

        let (status, json) = send(&app, Method::GET, "/api/templates/R315", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fields"][0]["label"], "Locatie");
    }
}
