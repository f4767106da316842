use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use super::post::Post;
use crate::config::SiteInfo;

const BASE_TEMPLATE: &str = include_str!("../../themes/default/templates/base.html");
const POST_TEMPLATE: &str = include_str!("../../themes/default/templates/post.html");
const INDEX_TEMPLATE: &str = include_str!("../../themes/default/templates/index.html");

/// Stylesheet of the built-in theme, written as `style.css`.
pub const DEFAULT_STYLESHEET: &str = include_str!("../../themes/default/static/style.css");

const POST_PAGE: &str = "post.html";
const INDEX_PAGE: &str = "index.html";

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("template directory not found: {0}")]
    TemplatesNotFound(PathBuf),

    #[error("template directory {0} has no '{1}' template")]
    MissingTemplate(PathBuf, &'static str),
}

/// The page renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Use the templates in `templates_dir`, or the built-in theme if `None`.
    pub fn new(templates_dir: Option<&Path>) -> Result<Self, RenderError> {
        match templates_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::builtin(),
        }
    }

    /// The theme compiled into the binary.
    pub fn builtin() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", BASE_TEMPLATE),
            (POST_PAGE, POST_TEMPLATE),
            (INDEX_PAGE, INDEX_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    /// Load every `*.html` template below `dir`. `post.html` and `index.html`
    /// must be among them.
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        if !dir.is_dir() {
            return Err(RenderError::TemplatesNotFound(dir.to_path_buf()));
        }

        let glob = dir.join("**/*.html");
        let tera = Tera::new(&glob.to_string_lossy())?;

        for required in [POST_PAGE, INDEX_PAGE] {
            if !tera.get_template_names().any(|name| name == required) {
                return Err(RenderError::MissingTemplate(dir.to_path_buf(), required));
            }
        }

        Ok(Self { tera })
    }

    /// Render the page for a single post.
    pub fn render_post(&self, context: &PostPageContext) -> Result<String, RenderError> {
        let tera_context = Context::from_serialize(context)?;
        Ok(self.tera.render(POST_PAGE, &tera_context)?)
    }

    /// Render one page of the post listing.
    pub fn render_index(&self, context: &IndexPageContext) -> Result<String, RenderError> {
        let tera_context = Context::from_serialize(context)?;
        Ok(self.tera.render(INDEX_PAGE, &tera_context)?)
    }
}

// =============================================================================
// Template contexts
// =============================================================================

/// Site-level information, available as `site.*` in every template.
#[derive(Debug, Clone, Serialize)]
pub struct SiteContext {
    pub title: String,
    /// Base URL without a trailing slash
    pub url: Option<String>,
    /// Prefix for site links: empty, or `/blog` style without a trailing slash
    pub base_path: String,
    pub description: Option<String>,
    pub author: Option<String>,
}

impl From<&SiteInfo> for SiteContext {
    fn from(site: &SiteInfo) -> Self {
        Self {
            title: site.title.clone(),
            url: site
                .url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            base_path: site
                .base_path
                .as_deref()
                .map(|p| p.trim_matches('/'))
                .filter(|p| !p.is_empty())
                .map(|p| format!("/{p}"))
                .unwrap_or_default(),
            description: site.description.clone(),
            author: site.author.clone(),
        }
    }
}

/// Post metadata as seen by templates (`post.*`, `posts[i].*`).
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `January 01, 2024`
    pub date_readable: String,
    pub subtitle: Option<String>,
    pub tags: Vec<String>,
    pub url: String,
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            date: post.date.format("%Y-%m-%d").to_string(),
            date_readable: post.date_readable(),
            subtitle: post.subtitle.clone(),
            tags: post.tags.clone(),
            url: post.url(),
            extra: post.extra.clone(),
        }
    }
}

/// Context passed to `post.html`.
#[derive(Debug, Serialize)]
pub struct PostPageContext<'a> {
    pub site: &'a SiteContext,
    pub post: PostSummary,
    /// Rendered markdown body
    pub content: String,
    /// The next more recent listed post
    pub newer: Option<PostSummary>,
    /// The next older listed post
    pub older: Option<PostSummary>,
}

/// Context passed to `index.html`.
#[derive(Debug, Serialize)]
pub struct IndexPageContext<'a> {
    pub site: &'a SiteContext,
    pub posts: Vec<PostSummary>,
    /// 1-based
    pub current_page: usize,
    pub total_pages: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn site() -> SiteContext {
        SiteContext::from(&SiteInfo {
            title: "Field Notes".to_string(),
            url: Some("https://notes.example.com/".to_string()),
            ..Default::default()
        })
    }

    fn post(slug: &str, title: &str) -> PostSummary {
        let mut post = Post::parse(
            Path::new(&format!("{slug}.md")),
            &format!("---\ntitle: {title}\n---\nbody"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        post.tags = vec!["rust".to_string()];
        PostSummary::from(&post)
    }

    #[test]
    fn test_site_url_trailing_slash_trimmed() {
        assert_eq!(site().url.as_deref(), Some("https://notes.example.com"));
    }

    #[test]
    fn test_base_path_normalized() {
        let context = |base_path: Option<&str>| {
            SiteContext::from(&SiteInfo {
                base_path: base_path.map(str::to_string),
                ..Default::default()
            })
            .base_path
        };
        assert_eq!(context(None), "");
        assert_eq!(context(Some("/")), "");
        assert_eq!(context(Some("blog/")), "/blog");
        assert_eq!(context(Some("/a/b")), "/a/b");
    }

    #[test]
    fn test_links_use_base_path() {
        let renderer = Renderer::builtin().unwrap();
        let site = SiteContext::from(&SiteInfo {
            title: "Field Notes".to_string(),
            base_path: Some("/blog".to_string()),
            ..Default::default()
        });
        let html = renderer
            .render_index(&IndexPageContext {
                site: &site,
                posts: vec![post("first", "First")],
                current_page: 1,
                total_pages: 2,
                prev_url: None,
                next_url: Some("/page2.html".to_string()),
            })
            .unwrap();

        assert!(html.contains("href=\"/blog/style.css\""));
        assert!(html.contains("href=\"/blog/\""));
        assert!(html.contains("href=\"/blog/posts/first.html\""));
        assert!(html.contains("href=\"/blog/page2.html\""));
    }

    #[test]
    fn test_render_post_page() {
        let renderer = Renderer::builtin().unwrap();
        let site = site();
        let html = renderer
            .render_post(&PostPageContext {
                site: &site,
                post: post("hello-world", "Hello World"),
                content: "<h1>Hi</h1>\n<p>First post.</p>\n".to_string(),
                newer: None,
                older: Some(post("older", "Older One")),
            })
            .unwrap();

        assert!(html.contains("<title>Hello World | Field Notes</title>"));
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("January 01, 2024"));
        assert!(html.contains(
            "<link rel=\"canonical\" href=\"https://notes.example.com/posts/hello-world.html\">"
        ));
        assert!(html.contains("href=\"/posts/older.html\""));
        assert!(!html.contains("class=\"newer\""));
        assert!(html.contains("<li>rust</li>"));
    }

    #[test]
    fn test_post_title_is_escaped() {
        let renderer = Renderer::builtin().unwrap();
        let site = site();
        let html = renderer
            .render_post(&PostPageContext {
                site: &site,
                post: post("tags", "\"<b>Bold</b>\""),
                content: String::new(),
                newer: None,
                older: None,
            })
            .unwrap();
        assert!(html.contains("&lt;b&gt;Bold&lt;"));
        assert!(!html.contains("<b>Bold</b>"));
    }

    #[test]
    fn test_render_index_page() {
        let renderer = Renderer::builtin().unwrap();
        let site = site();
        let html = renderer
            .render_index(&IndexPageContext {
                site: &site,
                posts: vec![post("second", "Second"), post("first", "First")],
                current_page: 1,
                total_pages: 2,
                prev_url: None,
                next_url: Some("/page2.html".to_string()),
            })
            .unwrap();

        let second = html.find("href=\"/posts/second.html\"").unwrap();
        let first = html.find("href=\"/posts/first.html\"").unwrap();
        assert!(second < first);
        assert!(html.contains("href=\"/page2.html\""));
        assert!(html.contains("Page 1 of 2"));
    }

    #[test]
    fn test_render_empty_index() {
        let renderer = Renderer::builtin().unwrap();
        let site = site();
        let html = renderer
            .render_index(&IndexPageContext {
                site: &site,
                posts: vec![],
                current_page: 1,
                total_pages: 1,
                prev_url: None,
                next_url: None,
            })
            .unwrap();
        assert!(html.contains("No posts yet."));
        assert!(!html.contains("class=\"pagination\""));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = Renderer::builtin().unwrap();
        let site = site();
        let render = || {
            renderer
                .render_post(&PostPageContext {
                    site: &site,
                    post: post("same", "Same"),
                    content: "<p>x</p>".to_string(),
                    newer: None,
                    older: None,
                })
                .unwrap()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn test_custom_template_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("post.html"), "POST {{ post.title }}").unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "{% for p in posts %}{{ p.slug }};{% endfor %}",
        )
        .unwrap();

        let renderer = Renderer::from_dir(dir.path()).unwrap();
        let site = site();
        let html = renderer
            .render_post(&PostPageContext {
                site: &site,
                post: post("a", "Custom"),
                content: String::new(),
                newer: None,
                older: None,
            })
            .unwrap();
        assert_eq!(html, "POST Custom");
    }

    #[test]
    fn test_custom_template_dir_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("post.html"), "{{ post.title }}").unwrap();
        assert!(matches!(
            Renderer::from_dir(dir.path()),
            Err(RenderError::MissingTemplate(_, "index.html"))
        ));
    }

    #[test]
    fn test_undefined_variable_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("post.html"), "{{ post.nope.deeper }}").unwrap();
        std::fs::write(dir.path().join("index.html"), "").unwrap();

        let renderer = Renderer::from_dir(dir.path()).unwrap();
        let site = site();
        let result = renderer.render_post(&PostPageContext {
            site: &site,
            post: post("a", "A"),
            content: String::new(),
            newer: None,
            older: None,
        });
        assert!(matches!(result, Err(RenderError::Template(_))));
    }
}
