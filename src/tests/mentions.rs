use super::*;
use pretty_assertions::assert_eq;
use crate::adapters::MentionResolver;
use crate::{render, DiagnosticKind, Rendered};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn members(names: &'static [&'static str]) -> Options<'static> {
    let mut options = Options::default();
    options.parse.mention_resolver = Some(Arc::new(move |name: &str| names.iter().any(|n| *n == name)));
    options
}

async fn rendered(input: &str, options: &Options<'_>) -> Rendered {
    render(input, options).await.unwrap()
}

#[tokio::test]
async fn resolved_and_unresolved() {
    let rendered = rendered("hi @alice and @bob\n\n@carol\n", &members(&["alice"])).await;
    assert_eq!(
        rendered.contents,
        concat!(
            "<p>hi <a class=\"ping\" href=\"/members/alice\">@alice</a> and @bob</p>\n",
            "<p>@carol</p>\n"
        )
    );
    assert_eq!(rendered.messages.len(), 2);
    assert!(rendered
        .messages
        .iter()
        .all(|m| m.kind == DiagnosticKind::UnresolvedReference));
    assert_eq!(rendered.messages[1].line, Some(3));
}

#[tokio::test]
async fn display_names() {
    let rendered = rendered("@**Jane Doe** @**nobody**\n", &members(&["Jane Doe"])).await;
    assert_eq!(
        rendered.contents,
        "<p><a class=\"ping\" href=\"/members/Jane%20Doe\">@Jane Doe</a> @**nobody**</p>\n"
    );
}

#[tokio::test]
async fn trailing_punctuation() {
    let rendered = rendered("thanks @alice.\n", &members(&["alice"])).await;
    assert_eq!(
        rendered.contents,
        "<p>thanks <a class=\"ping\" href=\"/members/alice\">@alice</a>.</p>\n"
    );
}

#[tokio::test]
async fn emails_and_code_are_not_mentions() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut options = Options::default();
    options.parse.mention_resolver = Some(Arc::new(move |_: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    }));

    let rendered = rendered("mail me@example.com or `@alice`\n", &options).await;
    assert_eq!(
        rendered.contents,
        "<p>mail me@example.com or <code>@alice</code></p>\n"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn each_name_is_looked_up_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut options = Options::default();
    options.parse.mention_resolver = Some(Arc::new(move |_: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    }));

    rendered("@a @b @a @b @a\n", &options).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn base_url() {
    let mut options = members(&["alice"]);
    options.render.mention_base_url = "https://example.com/u/".to_string();
    let rendered = rendered("@alice\n", &options).await;
    assert_eq!(
        rendered.contents,
        "<p><a class=\"ping\" href=\"https://example.com/u/alice\">@alice</a></p>\n"
    );
}

#[tokio::test]
async fn without_resolver() {
    let rendered = rendered("@alice\n", &Options::default()).await;
    assert_eq!(rendered.contents, "<p>@alice</p>\n");
    assert!(rendered.messages.is_empty());
}

#[test]
fn sync_rendering_skips_lookups() {
    let options = members(&["alice"]);
    assert_eq!(markdown_to_html("@alice\n", &options).unwrap(), "<p>@alice</p>\n");
}

struct Directory;

#[async_trait]
impl MentionResolver for Directory {
    async fn exists(&self, name: &str) -> bool {
        match name {
            "slow" => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                true
            }
            "alice" => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                true
            }
            _ => false,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn lookups_time_out() {
    let mut options = Options::default();
    options.parse.mention_resolver = Some(Arc::new(Directory));
    options.parse.collaborator_timeout = Duration::from_secs(1);

    let rendered = rendered("@slow @alice\n", &options).await;
    assert_eq!(
        rendered.contents,
        "<p>@slow <a class=\"ping\" href=\"/members/alice\">@alice</a></p>\n"
    );
    assert_eq!(rendered.messages.len(), 1);
    assert_eq!(rendered.messages[0].kind, DiagnosticKind::UnresolvedReference);
}

#[tokio::test]
async fn disabled() {
    let mut options = members(&["alice"]);
    options.tokenizers.disabled = super::disabled(&["mention"]);
    let rendered = rendered("@alice\n", &options).await;
    assert_eq!(rendered.contents, "<p>@alice</p>\n");
    assert!(rendered.messages.is_empty());
}

#[test]
fn render_future_is_send() {
    fn assert_send<T: Send>(_: T) {}
    let options = Options::default();
    assert_send(render("@a", &options));
}

#[tokio::test]
async fn link_text_mentions_stay_text() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut options = Options::default();
    options.parse.mention_resolver = Some(Arc::new(move |_: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    }));

    let rendered = rendered("[@alice](http://x) @bob\n", &options).await;
    assert_eq!(
        rendered.contents,
        "<p><a href=\"http://x\">@alice</a> <a class=\"ping\" href=\"/members/bob\">@bob</a></p>\n"
    );
    assert!(rendered.messages.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Sets its flag when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Never answers.
#[derive(Default)]
struct Unresponsive {
    started: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

#[async_trait]
impl MentionResolver for Unresponsive {
    async fn exists(&self, _: &str) -> bool {
        let _flag = DropFlag(self.dropped.clone());
        self.started.store(true, Ordering::SeqCst);
        std::future::pending::<()>().await;
        true
    }
}

fn unresponsive() -> (Options<'static>, Arc<AtomicBool>, Arc<AtomicBool>) {
    let resolver = Unresponsive::default();
    let (started, dropped) = (resolver.started.clone(), resolver.dropped.clone());
    let mut options = Options::default();
    options.parse.mention_resolver = Some(Arc::new(resolver));
    options.parse.collaborator_timeout = Duration::from_secs(3600);
    (options, started, dropped)
}

#[tokio::test]
async fn dropping_a_render_drops_pending_lookups() {
    let (options, started, dropped) = unresponsive();

    let mut pending = Box::pin(render("@alice\n", &options));
    assert!(futures::poll!(pending.as_mut()).is_pending());
    assert!(started.load(Ordering::SeqCst));
    assert!(!dropped.load(Ordering::SeqCst));

    drop(pending);
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn aborting_a_render_task_drops_pending_lookups() {
    let (options, started, dropped) = unresponsive();

    let task = tokio::spawn(async move { render("@alice\n", &options).await });
    while !started.load(Ordering::SeqCst) {
        tokio::task::yield_now().await;
    }
    assert!(!dropped.load(Ordering::SeqCst));

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(dropped.load(Ordering::SeqCst));
}
