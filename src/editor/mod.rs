//! Local editing service for post files.
//!
//! A small JSON API over the content and image directories plus a single
//! page UI. It has no authentication and is meant to be bound to loopback.

mod error;
mod routes;

use std::net::IpAddr;
use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use tower_http::services::ServeDir;

/// Largest accepted request body (image uploads).
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct EditorState {
    pub posts_dir: PathBuf,
    pub images_dir: PathBuf,
}

/// All editor routes.
pub fn router(state: EditorState) -> Router {
    let images = ServeDir::new(&state.images_dir);

    Router::new()
        .route("/", get(routes::index))
        .route("/api/posts", get(routes::list_posts))
        .route(
            "/api/post/{filename}",
            get(routes::get_post).post(routes::save_post),
        )
        .route("/api/delete/{filename}", delete(routes::delete_post))
        .route("/api/new", post(routes::new_post))
        .route("/api/upload_image", post(routes::upload_image))
        .nest_service("/images", images)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Whether `bind` only accepts local connections.
pub fn is_loopback(bind: &str) -> bool {
    match bind.parse::<IpAddr>() {
        Ok(ip) => ip.is_loopback(),
        Err(_) => bind.eq_ignore_ascii_case("localhost"),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    struct TestEditor {
        dir: tempfile::TempDir,
    }

    impl TestEditor {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("posts")).unwrap();
            std::fs::create_dir_all(dir.path().join("images")).unwrap();
            Self { dir }
        }

        fn posts(&self) -> PathBuf {
            self.dir.path().join("posts")
        }

        fn images(&self) -> PathBuf {
            self.dir.path().join("images")
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
            let app = router(EditorState {
                posts_dir: self.posts(),
                images_dir: self.images(),
            });
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            (status, json)
        }

        async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
            self.send(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }

        async fn delete(&self, uri: &str) -> (StatusCode, serde_json::Value) {
            self.send(Request::delete(uri).body(Body::empty()).unwrap())
                .await
        }
    }

    #[tokio::test]
    async fn test_index_serves_ui() {
        let editor = TestEditor::new();
        let app = router(EditorState {
            posts_dir: editor.posts(),
            images_dir: editor.images(),
        });
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("<html"));
    }

    #[tokio::test]
    async fn test_save_get_list_round_trip() {
        let editor = TestEditor::new();
        let content = "---\ntitle: Draft\ndate: 2024-05-01\n---\nHello";

        let (status, body) = editor
            .post_json("/api/post/draft.md", serde_json::json!({ "content": content }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "saved");
        assert_eq!(
            std::fs::read_to_string(editor.posts().join("draft.md")).unwrap(),
            content
        );

        let (status, body) = editor.get("/api/post/draft.md").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], content);

        let (status, body) = editor.get("/api/posts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["filename"], "draft.md");
        assert_eq!(body[0]["title"], "Draft");
        assert_eq!(body[0]["date"], "2024-05-01");
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first_with_errors() {
        let editor = TestEditor::new();
        std::fs::write(editor.posts().join("old.md"), "---\ndate: 2023-01-01\n---\n").unwrap();
        std::fs::write(editor.posts().join("new.md"), "---\ndate: 2024-01-01\n---\n").unwrap();
        std::fs::write(editor.posts().join("broken.md"), "---\ntitle: [\n---\n").unwrap();
        std::fs::write(editor.posts().join("notes.txt"), "ignored").unwrap();

        let (_, body) = editor.get("/api/posts").await;
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["filename"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["new.md", "old.md", "broken.md"]);
        assert!(body[2]["error"].is_string());
        assert!(body[0].get("error").is_none());
    }

    #[tokio::test]
    async fn test_list_matches_post_source() {
        let editor = TestEditor::new();
        std::fs::write(editor.posts().join("a.md"), "---\ndate: 2024-01-03\n---\n").unwrap();
        std::fs::write(editor.posts().join("b.markdown"), "---\ndate: 2024-01-02\n---\n").unwrap();
        std::fs::write(editor.posts().join("C.MD"), "---\ndate: 2024-01-01\n---\n").unwrap();
        std::fs::write(
            editor.posts().join("d.md"),
            "---\nslug: a\ndate: 2024-01-04\n---\n",
        )
        .unwrap();

        let (_, body) = editor.get("/api/posts").await;
        let rows = body.as_array().unwrap();
        let names: Vec<_> = rows.iter().map(|p| p["filename"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a.md", "b.markdown", "C.MD", "d.md"]);
        assert_eq!(rows[1]["slug"], "b");
        assert_eq!(rows[2]["slug"], "C");
        assert!(rows[3]["error"].as_str().unwrap().contains("already used"));

        let (status, body) = editor.get("/api/post/b.markdown").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "---\ndate: 2024-01-02\n---\n");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let editor = TestEditor::new();
        editor
            .post_json("/api/post/a.md", serde_json::json!({ "content": "first version, long" }))
            .await;
        editor
            .post_json("/api/post/a.md", serde_json::json!({ "content": "second" }))
            .await;
        assert_eq!(
            std::fs::read_to_string(editor.posts().join("a.md")).unwrap(),
            "second"
        );
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let editor = TestEditor::new();
        let (status, body) = editor.get("/api/post/nope.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let (status, _) = editor.delete("/api/delete/nope.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_post() {
        let editor = TestEditor::new();
        std::fs::write(editor.posts().join("gone.md"), "bye").unwrap();

        let (status, body) = editor.delete("/api/delete/gone.md").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "deleted");
        assert!(!editor.posts().join("gone.md").exists());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_names() {
        let editor = TestEditor::new();
        std::fs::write(editor.dir.path().join("secret.md"), "secret").unwrap();

        for uri in [
            "/api/post/..%2Fsecret.md",
            "/api/post/.hidden.md",
            "/api/post/notes.txt",
            "/api/post/.md",
        ] {
            let (status, _) = editor.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }

        let (status, _) = editor
            .post_json("/api/post/..%2Fescape.md", serde_json::json!({ "content": "x" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!editor.dir.path().join("escape.md").exists());
    }

    #[tokio::test]
    async fn test_new_post() {
        let editor = TestEditor::new();

        let (status, body) = editor
            .post_json("/api/new", serde_json::json!({ "title": "My Trip, Part 2" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "my-trip-part-2.md");

        let content = std::fs::read_to_string(editor.posts().join("my-trip-part-2.md")).unwrap();
        assert!(content.contains("My Trip, Part 2"));
        assert!(content.contains("Write your content here."));

        let (status, _) = editor
            .post_json("/api/new", serde_json::json!({ "title": "My Trip, Part 2" }))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_new_post_is_complete_when_answered() {
        let editor = TestEditor::new();
        for i in 0..50 {
            let (status, body) = editor
                .post_json("/api/new", serde_json::json!({ "title": format!("Note {i}") }))
                .await;
            assert_eq!(status, StatusCode::OK);

            let filename = body["filename"].as_str().unwrap();
            let content = std::fs::read_to_string(editor.posts().join(filename)).unwrap();
            assert!(content.ends_with("Write your content here.\n"), "{filename}");
        }
    }

    #[tokio::test]
    async fn test_new_post_default_title() {
        let editor = TestEditor::new();
        let (status, body) = editor.post_json("/api/new", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "untitled-post.md");
    }

    #[tokio::test]
    async fn test_upload_and_serve_image() {
        let editor = TestEditor::new();
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n\
             --{boundary}--\r\n"
        );

        let (status, json) = editor
            .send(
                Request::post("/api/upload_image")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "uploaded");
        assert_eq!(json["filename"], "cat.png");
        assert_eq!(json["path"], "../images/cat.png");
        assert_eq!(std::fs::read(editor.images().join("cat.png")).unwrap(), b"PNGDATA");

        let (status, _) = editor.get("/images/cat.png").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_rejects_unsafe_file_name() {
        let editor = TestEditor::new();
        let boundary = "B";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"../evil.png\"\r\n\r\n\
             x\r\n\
             --{boundary}--\r\n"
        );

        let (status, _) = editor
            .send(
                Request::post("/api/upload_image")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!editor.dir.path().join("evil.png").exists());
    }

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("::1"));
        assert!(is_loopback("localhost"));
        assert!(!is_loopback("0.0.0.0"));
        assert!(!is_loopback("192.168.1.10"));
    }
}
