//! # ac-ui
//!
//! HTML pages, rendered with askama. Templates only project data; anything
//! that needs deciding (escaping, URLs, dates) is done while building the
//! view structs below.

use ac_core::models::{Board, Post, ThreadWithPosts};
use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub boards: Vec<Board>,
}

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate<'a> {
    pub title: String,
    pub board: &'a Board,
    pub threads: Vec<ThreadView>,
    /// One-time notices carried over from the previous request.
    pub flashes: Vec<String>,
    pub limits: FormLimits,
}

/// Attributes for the new-thread form.
#[derive(Debug, Clone)]
pub struct FormLimits {
    pub default_name: String,
    pub subject: usize,
    pub name: usize,
    pub email: usize,
    pub message: usize,
    /// Value for the file input's `accept` attribute, e.g. ".jpg,.png".
    pub accept: String,
}

impl FormLimits {
    pub fn accept_list(extensions: &[String]) -> String {
        extensions
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub struct ThreadView {
    pub id: i64,
    pub subject: Option<String>,
    pub posts: Vec<PostView>,
}

pub struct PostView {
    pub id: i64,
    pub is_op: bool,
    pub name: String,
    pub email: Option<String>,
    pub posted_at: String,
    /// Already escaped; rendered with `|safe`.
    pub body_html: String,
    pub filename: String,
    pub file_url: Option<String>,
}

impl ThreadView {
    /// `media_url` maps a stored filename to its public URL.
    pub fn build(thread: &ThreadWithPosts, media_url: impl Fn(&str) -> String) -> Self {
        let posts = thread
            .posts
            .iter()
            .enumerate()
            .map(|(i, post)| PostView::build(post, i == 0, &media_url))
            .collect();

        Self {
            id: thread.thread.id,
            subject: thread.thread.subject.clone(),
            posts,
        }
    }
}

impl PostView {
    fn build(post: &Post, is_op: bool, media_url: &impl Fn(&str) -> String) -> Self {
        Self {
            id: post.id,
            is_op,
            name: post.name.clone(),
            email: post.email.clone(),
            posted_at: post.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            body_html: format_content(&post.content),
            filename: post.filename.clone().unwrap_or_default(),
            file_url: post.filename.as_deref().map(media_url),
        }
    }
}

/// Escapes a post body and applies greentext: lines starting with '>' are
/// wrapped in a span. Line breaks become `<br />`.
pub fn format_content(raw: &str) -> String {
    let escaped = html_escape::encode_safe(raw).to_string();

    escaped
        .lines()
        .map(|line| {
            if line.starts_with("&gt;") {
                format!("<span class=\"greentext\">{line}</span>")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("<br />")
}
