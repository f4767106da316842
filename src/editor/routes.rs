use std::io::{ErrorKind, Write};
use std::path::{Path as FsPath, PathBuf};

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::response::Html;
use serde::{Deserialize, Serialize};

use super::EditorState;
use super::error::EditorError;
use crate::build::source::{PostSource, is_post_file};
use crate::util::{is_safe_file_name, slugify};

const EDITOR_PAGE: &str = include_str!("editor.html");

#[derive(Debug, Serialize, Deserialize)]
pub struct PostEntry {
    pub filename: String,
    pub slug: String,
    pub title: String,
    /// `YYYY-MM-DD`, empty when the post could not be read
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct SavePostBody {
    pub content: String,
}

#[derive(Deserialize)]
pub struct NewPostBody {
    pub title: Option<String>,
}

/// Front matter written for a new post.
#[derive(Serialize)]
struct NewPostFrontMatter<'a> {
    title: &'a str,
    subtitle: &'a str,
    date: String,
    unlisted: bool,
}

/// GET / — the editor UI.
pub async fn index() -> Html<&'static str> {
    Html(EDITOR_PAGE)
}

/// GET /api/posts — every post file, newest first.
pub async fn list_posts(
    State(state): State<EditorState>,
) -> Result<Json<Vec<PostEntry>>, EditorError> {
    let posts_dir = state.posts_dir.clone();
    let entries = tokio::task::spawn_blocking(move || read_post_entries(&posts_dir))
        .await
        .map_err(|e| EditorError::io("listing posts", std::io::Error::other(e)))??;
    Ok(Json(entries))
}

/// GET /api/post/{filename} — raw file content.
pub async fn get_post(
    State(state): State<EditorState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>, EditorError> {
    let path = post_path(&state, &filename)?;
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Json(serde_json::json!({ "content": content }))),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(EditorError::NotFound(filename)),
        Err(e) => Err(EditorError::io(format!("reading {filename}"), e)),
    }
}

/// POST /api/post/{filename} — create or overwrite a post.
pub async fn save_post(
    State(state): State<EditorState>,
    Path(filename): Path<String>,
    Json(body): Json<SavePostBody>,
) -> Result<Json<serde_json::Value>, EditorError> {
    let path = post_path(&state, &filename)?;
    tokio::fs::write(&path, body.content)
        .await
        .map_err(|e| EditorError::io(format!("writing {filename}"), e))?;
    tracing::info!(file = %filename, "saved post");
    Ok(Json(serde_json::json!({ "status": "saved" })))
}

/// DELETE /api/delete/{filename}
pub async fn delete_post(
    State(state): State<EditorState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>, EditorError> {
    let path = post_path(&state, &filename)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            tracing::info!(file = %filename, "deleted post");
            Ok(Json(serde_json::json!({ "status": "deleted" })))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(EditorError::NotFound(filename)),
        Err(e) => Err(EditorError::io(format!("deleting {filename}"), e)),
    }
}

/// POST /api/new — start a post from the template, dated today.
pub async fn new_post(
    State(state): State<EditorState>,
    Json(body): Json<NewPostBody>,
) -> Result<Json<serde_json::Value>, EditorError> {
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled Post");
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(EditorError::BadRequest(format!(
            "title '{title}' has no characters usable in a file name"
        )));
    }
    let filename = format!("{slug}.md");
    let path = post_path(&state, &filename)?;

    let content = new_post_template(title, chrono::Local::now().date_naive())
        .map_err(|e| EditorError::BadRequest(format!("invalid title: {e}")))?;

    let created = tokio::task::spawn_blocking(move || create_post_file(&path, &content))
        .await
        .map_err(|e| EditorError::io("creating post", std::io::Error::other(e)))?;
    match created {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(EditorError::Conflict(filename));
        }
        Err(e) => return Err(EditorError::io(format!("creating {filename}"), e)),
    }

    tracing::info!(file = %filename, "created post");
    Ok(Json(serde_json::json!({ "filename": filename })))
}

/// POST /api/upload_image — multipart field `file`, stored under its own name.
pub async fn upload_image(
    State(state): State<EditorState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, EditorError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| EditorError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| EditorError::BadRequest("upload has no file name".to_string()))?;
        if !is_safe_file_name(&filename) {
            return Err(EditorError::InvalidName(filename));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| EditorError::BadRequest(e.to_string()))?;
        tokio::fs::write(state.images_dir.join(&filename), &bytes)
            .await
            .map_err(|e| EditorError::io(format!("saving image {filename}"), e))?;

        tracing::info!(file = %filename, bytes = bytes.len(), "uploaded image");
        return Ok(Json(serde_json::json!({
            "status": "uploaded",
            "path": format!("../images/{filename}"),
            "filename": filename,
        })));
    }

    Err(EditorError::BadRequest(
        "missing multipart field 'file'".to_string(),
    ))
}

/// Resolve a post file name inside the posts directory. Only plain names
/// that the post source would read are accepted, so the result never leaves
/// the directory.
fn post_path(state: &EditorState, filename: &str) -> Result<PathBuf, EditorError> {
    let valid = is_safe_file_name(filename) && is_post_file(FsPath::new(filename));
    if !valid {
        return Err(EditorError::InvalidName(filename.to_string()));
    }
    Ok(state.posts_dir.join(filename))
}

/// Create `path` with `content`, failing if it already exists. A file that
/// could not be written completely is removed again.
fn create_post_file(path: &FsPath, content: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    let written = file.write_all(content.as_bytes()).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = std::fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// One entry per post file, read through the same post source the build
/// uses, so parse failures and duplicate slugs show up as error rows.
fn read_post_entries(posts_dir: &FsPath) -> Result<Vec<PostEntry>, EditorError> {
    if !posts_dir.is_dir() {
        return Ok(Vec::new());
    }
    let posts = PostSource::new(posts_dir)
        .posts()
        .map_err(|e| EditorError::io("listing posts", std::io::Error::other(e)))?;

    let mut entries: Vec<PostEntry> = posts
        .map(|result| match result {
            Ok(post) => PostEntry {
                filename: file_name(&post.source_path),
                date: post.date.format("%Y-%m-%d").to_string(),
                slug: post.slug,
                title: post.title,
                error: None,
            },
            Err(e) => {
                let stem = e
                    .path()
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                PostEntry {
                    filename: file_name(e.path()),
                    slug: stem.clone(),
                    title: stem,
                    date: String::new(),
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.filename.cmp(&b.filename))
    });
    Ok(entries)
}

fn file_name(path: &FsPath) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn new_post_template(title: &str, date: chrono::NaiveDate) -> Result<String, serde_yaml::Error> {
    let front_matter = serde_yaml::to_string(&NewPostFrontMatter {
        title,
        subtitle: "Write your description here.",
        date: date.format("%Y-%m-%d").to_string(),
        unlisted: false,
    })?;
    Ok(format!("---\n{front_matter}---\n\nWrite your content here.\n"))
}
