pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::profile::handlers as profile;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume documents
        .route(
            "/api/v1/resumes",
            post(resumes::handle_create).get(resumes::handle_list),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get)
                .put(resumes::handle_update)
                .delete(resumes::handle_delete),
        )
        .route(
            "/api/v1/resumes/:id/skills",
            post(resumes::handle_merge_skills),
        )
        // Rendering
        .route(
            "/api/v1/resumes/:id/preview",
            get(resumes::handle_preview),
        )
        .route("/api/v1/resumes/:id/export", get(resumes::handle_export))
        // Profile
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_update_profile),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::export::capture::DisplayListRasterizer;
    use crate::export::stabilize::BuiltinFonts;
    use crate::export::storage::tests::MemoryArchive;
    use crate::export::storage::archive_key;
    use crate::export::{ExportPipeline, ExportSettings};
    use crate::models::resume::ResumeData;
    use crate::models::user::UserProfile;
    use crate::profile::repository::tests::MemoryProfiles;
    use crate::render::tests::sample_resume;
    use crate::render::PageSize;
    use crate::resumes::repository::tests::MemoryResumes;
    use crate::resumes::ResumeRepository;

    struct Harness {
        app: Router,
        resumes: Arc<MemoryResumes>,
        archive: Arc<MemoryArchive>,
        owner: Uuid,
        stored: ResumeData,
    }

    fn harness_with(archive: MemoryArchive) -> Harness {
        let owner = Uuid::new_v4();
        let mut stored = sample_resume();
        stored.user_id = owner;

        let resumes = Arc::new(MemoryResumes::with(vec![stored.clone()]));
        let archive = Arc::new(archive);
        let profiles = Arc::new(MemoryProfiles::with(UserProfile {
            id: owner,
            email: "jane@example.com".to_string(),
            name: "Jane".to_string(),
            profile_picture: None,
            created_at: Utc::now(),
        }));
        let exports = Arc::new(ExportPipeline::new(
            Arc::new(DisplayListRasterizer),
            Arc::new(BuiltinFonts::default()),
            ExportSettings::default(),
        ));

        let state = AppState {
            resumes: resumes.clone(),
            profiles,
            archive: archive.clone(),
            exports,
            page_size: PageSize::A4,
        };
        Harness {
            app: build_router(state),
            resumes,
            archive,
            owner,
            stored,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryArchive::default())
    }

    impl Harness {
        async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string())),
                None => builder.body(Body::empty()),
            }
            .unwrap();
            self.app.clone().oneshot(request).await.unwrap()
        }

        fn resume_uri(&self, suffix: &str) -> String {
            format!(
                "/api/v1/resumes/{}{suffix}?user_id={}",
                self.stored.id, self.owner
            )
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn valid_payload() -> Value {
        let mut resume = sample_resume();
        resume.experience[1].end_date = Some("2019-12-01".to_string());
        serde_json::to_value(resume).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let response = h.send("GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "smartcv-api");
    }

    #[tokio::test]
    async fn test_create_assigns_owner_and_id() {
        let h = harness();
        let uri = format!("/api/v1/resumes?user_id={}", h.owner);
        let response = h.send("POST", &uri, Some(valid_payload())).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        let id: Uuid = serde_json::from_value(body["id"].clone()).unwrap();
        assert_ne!(id, h.stored.id);
        assert_eq!(h.resumes.get(id).map(|r| r.user_id), Some(h.owner));
    }

    #[tokio::test]
    async fn test_create_rejects_incomplete_resume() {
        let h = harness();
        let uri = format!("/api/v1/resumes?user_id={}", h.owner);
        let response = h
            .send("POST", &uri, Some(json!({"title": "Only a title"})))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("jobTitle"));
    }

    #[tokio::test]
    async fn test_list_only_returns_own_resumes() {
        let h = harness();
        let mine = h
            .send("GET", &format!("/api/v1/resumes?user_id={}", h.owner), None)
            .await;
        assert_eq!(json_body(mine).await["count"], 1);

        let theirs = h
            .send("GET", &format!("/api/v1/resumes?user_id={}", Uuid::new_v4()), None)
            .await;
        assert_eq!(json_body(theirs).await["count"], 0);
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_owner() {
        let h = harness();
        let response = h.send("GET", &h.resume_uri(""), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["title"], "Jane Doe");

        let uri = format!("/api/v1/resumes/{}?user_id={}", h.stored.id, Uuid::new_v4());
        let response = h.send("GET", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp_and_keeps_identity() {
        let h = harness();
        let mut payload = valid_payload();
        payload["title"] = json!("Jane Q. Doe");
        payload["id"] = json!(Uuid::new_v4());

        let response = h.send("PUT", &h.resume_uri(""), Some(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let saved = h.resumes.get(h.stored.id).unwrap();
        assert_eq!(saved.title, "Jane Q. Doe");
        assert_eq!(saved.user_id, h.owner);
        assert_eq!(saved.created_at, h.stored.created_at);
        assert!(saved.updated_at >= h.stored.updated_at);
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let h = harness();
        let response = h.send("DELETE", &h.resume_uri(""), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = h.send("DELETE", &h.resume_uri(""), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_merge_skills_dedups() {
        let h = harness();
        let response = h
            .send(
                "POST",
                &h.resume_uri("/skills"),
                Some(json!({"skills": ["rust", "Kubernetes", " "]})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            h.resumes.get(h.stored.id).unwrap().skills,
            vec!["Rust", "PostgreSQL", "Kubernetes"]
        );
    }

    #[tokio::test]
    async fn test_merge_skills_refuses_degraded_resume() {
        let mut stored = sample_resume();
        stored.degraded = true;
        let h = harness();
        stored.user_id = h.owner;
        stored.id = h.stored.id;
        h.resumes.update(&stored).await.unwrap();

        let response = h
            .send(
                "POST",
                &h.resume_uri("/skills"),
                Some(json!({"skills": ["Kubernetes"]})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            h.resumes.get(h.stored.id).unwrap().skills,
            vec!["Rust", "PostgreSQL"]
        );
    }

    #[tokio::test]
    async fn test_preview_fits_narrow_container() {
        let h = harness();
        let response = h
            .send(
                "GET",
                &format!("{}&container_width=400&template=gothic", h.resume_uri("/preview")),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let scale = body["transform"]["scale"].as_f64().unwrap();
        assert!((scale - 0.4635).abs() < 1e-3);
        assert_eq!(body["transform"]["origin"], "top-center");
        assert_eq!(body["fitToScreen"], true);
        assert_eq!(body["page"]["mode"], "interactive");
        assert_eq!(body["page"]["template"], "professional");
    }

    #[tokio::test]
    async fn test_preview_actual_size_when_fit_disabled() {
        let h = harness();
        let uri = format!("{}&container_width=400&fit=false", h.resume_uri("/preview"));
        let body = json_body(h.send("GET", &uri, None).await).await;
        assert_eq!(body["transform"]["scale"], 1.0);
    }

    #[tokio::test]
    async fn test_export_downloads_and_archives_pdf() {
        let h = harness();
        let response = h
            .send("GET", &format!("{}&template=executive", h.resume_uri("/export")), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let file_name = format!("jane-doe-{}.pdf", h.stored.id);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"{file_name}\"").as_str()
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let key = archive_key(h.owner, h.stored.id, &file_name);
        assert!(h.archive.objects.lock().unwrap().contains_key(&key));
    }

    #[tokio::test]
    async fn test_export_succeeds_when_archive_is_down() {
        let h = harness_with(MemoryArchive {
            failing: true,
            ..Default::default()
        });
        let response = h.send("GET", &h.resume_uri("/export"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_export_of_unknown_resume_is_not_found() {
        let h = harness();
        let uri = format!("/api/v1/resumes/{}/export?user_id={}", Uuid::new_v4(), h.owner);
        let response = h.send("GET", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profile_read_and_update() {
        let h = harness();
        let uri = format!("/api/v1/profile?user_id={}", h.owner);
        let body = json_body(h.send("GET", &uri, None).await).await;
        assert_eq!(body["name"], "Jane");

        let response = h
            .send("PUT", &uri, Some(json!({"profilePicture": "https://cdn/jane.png"})))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["name"], "Jane");
        assert_eq!(body["profilePicture"], "https://cdn/jane.png");
    }

    #[tokio::test]
    async fn test_profile_update_requires_a_field() {
        let h = harness();
        let uri = format!("/api/v1/profile?user_id={}", h.owner);
        let response = h.send("PUT", &uri, Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = h.send("PUT", &uri, Some(json!({"name": "  "}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let h = harness();
        let uri = format!("/api/v1/profile?user_id={}", Uuid::new_v4());
        let response = h.send("GET", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
