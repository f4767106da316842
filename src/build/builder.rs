use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pulldown_cmark::Options;

use crate::config::SiteConfig;

use super::highlight::SyntaxHighlighter;
use super::markdown::{MarkdownError, markdown_options, render_markdown};
use super::paths::{IMAGES_DIR, index_output_path, index_url, post_output_path};
use super::post::{Post, sort_posts};
use super::render::{
    DEFAULT_STYLESHEET, IndexPageContext, PostPageContext, PostSummary, RenderError, Renderer,
    SiteContext,
};
use super::source::{PostSource, SourceError};
use super::writer::{OutputWriter, RenderedPage, WriteError};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("markdown config error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("template error: {0}")]
    Render(#[from] RenderError),

    #[error("output error: {0}")]
    Write(#[from] WriteError),
}

/// A post or page left out of the build, and why.
#[derive(Debug, Clone)]
pub struct BuildIssue {
    pub path: PathBuf,
    pub reason: String,
}

pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Post and index pages written
    pub pages: usize,
    /// Images, static files and stylesheets written
    pub static_files: usize,
    pub skipped: Vec<BuildIssue>,
}

pub struct Builder {
    config: SiteConfig,
}

impl Builder {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    /// Generate the whole site.
    ///
    /// Posts that fail to parse and pages that fail to render are skipped and
    /// reported in [`BuildResult::skipped`]. Anything that stops the site from
    /// being written at all (unreadable content directory, broken templates,
    /// filesystem errors) fails the build.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let mut skipped = Vec::new();

        let source = PostSource::new(&self.config.paths.content);
        let mut posts = Vec::new();
        for result in source.posts()? {
            match result {
                Ok(post) => posts.push(post),
                Err(e) => {
                    tracing::warn!("skipping post: {e}");
                    skipped.push(BuildIssue {
                        path: e.path().to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        sort_posts(&mut posts);
        tracing::info!(
            posts = posts.len(),
            dir = %source.dir().display(),
            "loaded posts"
        );

        let options = markdown_options(&self.config.markdown)?;
        let renderer = Renderer::new(self.config.paths.templates.as_deref())?;
        let highlighter = SyntaxHighlighter::new(&self.config.markdown.highlight_theme);
        let site = SiteContext::from(&self.config.site);

        let writer = OutputWriter::new(&self.config.paths.output);
        writer.reset()?;

        // Post pages
        let (post_pages, listed) =
            render_post_pages(&posts, &renderer, &site, &highlighter, options, &mut skipped);
        let mut pages = 0;
        for page in &post_pages {
            tracing::debug!(path = %page.path.display(), "writing post");
            writer.write_page(page)?;
            pages += 1;
        }

        // Index pages
        let per_page = self.config.site.posts_per_page.max(1);
        let chunks: Vec<&[&Post]> = if listed.is_empty() {
            vec![&listed[..]]
        } else {
            listed.chunks(per_page).collect()
        };
        let total_pages = chunks.len();

        for (i, chunk) in chunks.into_iter().enumerate() {
            let page = i + 1;
            let context = IndexPageContext {
                site: &site,
                posts: chunk.iter().map(|p| PostSummary::from(*p)).collect(),
                current_page: page,
                total_pages,
                prev_url: (page > 1).then(|| index_url(page - 1)),
                next_url: (page < total_pages).then(|| index_url(page + 1)),
            };

            let path = index_output_path(page);
            match renderer.render_index(&context) {
                Ok(html) => {
                    writer.write_page(&RenderedPage { path, html })?;
                    pages += 1;
                }
                Err(e) => {
                    tracing::warn!(page, "failed to render index page: {e}");
                    skipped.push(BuildIssue {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Static assets
        let mut static_files = writer.copy_tree(&self.config.paths.images, Path::new(IMAGES_DIR))?;
        match &self.config.paths.static_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    tracing::warn!(dir = %dir.display(), "static directory not found");
                }
                static_files += writer.copy_tree(dir, Path::new(""))?;
            }
            None => {
                writer.write_file(Path::new("style.css"), DEFAULT_STYLESHEET.as_bytes())?;
                static_files += 1;
            }
        }
        if let Some(css) = highlighter.stylesheet() {
            writer.write_file(Path::new("highlight.css"), css.as_bytes())?;
            static_files += 1;
        } else {
            tracing::warn!(
                theme = %self.config.markdown.highlight_theme,
                "unknown highlight theme, highlight.css not written"
            );
        }

        tracing::info!(
            pages,
            static_files,
            skipped = skipped.len(),
            output = %writer.root().display(),
            "site built"
        );

        Ok(BuildResult {
            output_dir: writer.root().to_path_buf(),
            pages,
            static_files,
            skipped,
        })
    }
}

/// Render every post page in memory.
///
/// A post whose page fails to render is reported and dropped, and the
/// remaining pages are rendered again so no newer/older link points at a
/// page that was never written. Returns the pages together with the
/// listed posts among them, in listing order.
fn render_post_pages<'p>(
    posts: &'p [Post],
    renderer: &Renderer,
    site: &SiteContext,
    highlighter: &SyntaxHighlighter,
    options: Options,
    skipped: &mut Vec<BuildIssue>,
) -> (Vec<RenderedPage>, Vec<&'p Post>) {
    let mut bodies: Vec<(&'p Post, String)> = posts
        .iter()
        .map(|post| (post, render_markdown(&post.body, highlighter, options)))
        .collect();

    loop {
        let listed: Vec<&'p Post> = bodies
            .iter()
            .map(|(post, _)| *post)
            .filter(|p| !p.unlisted)
            .collect();

        let mut rendered = Vec::with_capacity(bodies.len());
        let mut failed = HashSet::new();
        for (post, content) in &bodies {
            let (newer, older) = neighbours(&listed, post);
            let context = PostPageContext {
                site,
                post: PostSummary::from(*post),
                content: content.clone(),
                newer,
                older,
            };

            match renderer.render_post(&context) {
                Ok(html) => rendered.push(RenderedPage {
                    path: post_output_path(&post.slug),
                    html,
                }),
                Err(e) => {
                    tracing::warn!(post = %post.source_path.display(), "failed to render post: {e}");
                    skipped.push(BuildIssue {
                        path: post.source_path.clone(),
                        reason: e.to_string(),
                    });
                    failed.insert(post.slug.clone());
                }
            }
        }

        if failed.is_empty() {
            return (rendered, listed);
        }
        bodies.retain(|(post, _)| !failed.contains(&post.slug));
    }
}

/// The listed posts directly before and after `post` in listing order.
/// Unlisted posts have no neighbours.
fn neighbours(listed: &[&Post], post: &Post) -> (Option<PostSummary>, Option<PostSummary>) {
    let Some(i) = listed.iter().position(|p| p.slug == post.slug) else {
        return (None, None);
    };
    let newer = i.checked_sub(1).map(|j| PostSummary::from(listed[j]));
    let older = listed.get(i + 1).map(|p| PostSummary::from(*p));
    (newer, older)
}
