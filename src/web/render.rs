//! HTML rendering for the chat page
//!
//! Server-rendered from `templates/chat.html`, no JavaScript. The template
//! escapes everything except assistant replies, which are markdown rendered
//! with raw HTML shown as text rather than injected into the page.

use askama::Template;
use pulldown_cmark::{html, Event, Options, Parser};

use crate::core::Result;
use crate::planner::TravelMode;
use crate::web::app::{ChatMessage, ChatRole};

/// Everything the page shows
pub struct PageView<'a> {
    pub history: &'a [ChatMessage],
    /// Shown above the chat when the last request failed
    pub error: Option<&'a str>,
    pub model: &'a str,
}

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatPage<'a> {
    messages: Vec<MessageView<'a>>,
    error: Option<&'a str>,
    modes: Vec<&'static str>,
    model: &'a str,
}

/// One history entry as the template sees it
struct MessageView<'a> {
    role: ChatRole,
    label: Option<&'a str>,
    /// Pre-rendered HTML when `markdown` is set, plain text otherwise
    body: String,
    markdown: bool,
}

impl<'a> MessageView<'a> {
    fn new(message: &'a ChatMessage) -> Self {
        let (body, markdown) = match message.role {
            ChatRole::User => (message.content.clone(), false),
            ChatRole::Assistant => (markdown_to_html(&message.content), true),
        };
        Self {
            role: message.role,
            label: message.label.as_deref(),
            body,
            markdown,
        }
    }
}

/// Render markdown to HTML, turning embedded HTML into plain text
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// The whole chat page
pub fn render_page(view: &PageView<'_>) -> Result<String> {
    let page = ChatPage {
        messages: view.history.iter().map(MessageView::new).collect(),
        error: view.error,
        modes: TravelMode::ALL.iter().map(|m| m.label()).collect(),
        model: view.model,
    };
    Ok(page.render()?)
}
