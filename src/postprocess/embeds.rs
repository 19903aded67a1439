//! Embed resolution against the table of trusted providers.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::Diagnostic;
use crate::nodes::{Node, NodeValue};

/// A provider whose players may be framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    /// Short lowercase name.
    pub name: &'static str,
    /// Hosts a page URL may be on.
    hosts: &'static [&'static str],
    /// Every embed URL for this provider starts with this.
    pub embed_prefix: &'static str,
    /// Compute the embed URL from the path and query of a page URL.
    embed: fn(&str, &str) -> Option<String>,
}

/// Every trusted provider.
pub static PROVIDERS: [Provider; 5] = [
    Provider {
        name: "youtube",
        hosts: &["www.youtube.com", "youtube.com", "m.youtube.com", "youtu.be"],
        embed_prefix: "https://www.youtube.com/embed/",
        embed: youtube,
    },
    Provider {
        name: "vimeo",
        hosts: &["vimeo.com", "www.vimeo.com"],
        embed_prefix: "https://player.vimeo.com/video/",
        embed: vimeo,
    },
    Provider {
        name: "dailymotion",
        hosts: &["www.dailymotion.com", "dailymotion.com", "dai.ly"],
        embed_prefix: "https://www.dailymotion.com/embed/video/",
        embed: dailymotion,
    },
    Provider {
        name: "soundcloud",
        hosts: &["soundcloud.com", "www.soundcloud.com"],
        embed_prefix: "https://w.soundcloud.com/player/?url=",
        embed: soundcloud,
    },
    Provider {
        name: "jsfiddle",
        hosts: &["jsfiddle.net"],
        embed_prefix: "https://jsfiddle.net/",
        embed: jsfiddle,
    },
];

fn id_chars(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn youtube(path: &str, query: &str) -> Option<String> {
    let id = match path.strip_prefix("/watch") {
        Some("") | Some("/") => query
            .split('&')
            .find_map(|kv| kv.strip_prefix("v="))?,
        _ => path
            .strip_prefix("/embed/")
            .unwrap_or_else(|| path.trim_start_matches('/')),
    };
    id_chars(id).then(|| format!("https://www.youtube.com/embed/{}", id))
}

fn vimeo(path: &str, _: &str) -> Option<String> {
    let id = path.trim_matches('/');
    (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .then(|| format!("https://player.vimeo.com/video/{}", id))
}

fn dailymotion(path: &str, _: &str) -> Option<String> {
    let id = path
        .strip_prefix("/video/")
        .unwrap_or_else(|| path.trim_start_matches('/'))
        .split('_')
        .next()?;
    id_chars(id).then(|| format!("https://www.dailymotion.com/embed/video/{}", id))
}

fn soundcloud(path: &str, _: &str) -> Option<String> {
    let page = path.trim_end_matches('/');
    if page.matches('/').count() < 2
        || !page
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'-' | b'_'))
    {
        return None;
    }
    let url = format!("https://soundcloud.com{}", page);
    Some(format!(
        "https://w.soundcloud.com/player/?url={}",
        utf8_percent_encode(&url, NON_ALPHANUMERIC)
    ))
}

fn jsfiddle(path: &str, _: &str) -> Option<String> {
    let parts: Vec<&str> = path
        .trim_matches('/')
        .split('/')
        .filter(|p| *p != "embedded")
        .collect();
    if parts.is_empty() || parts.len() > 3 || !parts.iter().all(|p| id_chars(p)) {
        return None;
    }
    Some(format!("https://jsfiddle.net/{}/embedded/", parts.join("/")))
}

/// Split an `http(s)` URL into host, path and query.
fn split_url(url: &str) -> Option<(&str, &str, &str)> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.split('#').next().unwrap_or(rest);
    let host_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (host, path_query) = rest.split_at(host_end);
    let (path, query) = match path_query.split_once('?') {
        Some((p, q)) => (p, q),
        None => (path_query, ""),
    };
    Some((host, path, query))
}

/// The provider and embed URL for a page URL.
pub fn lookup(url: &str) -> Option<(&'static Provider, String)> {
    let (host, path, query) = split_url(url)?;
    let host = host.to_ascii_lowercase();
    let provider = PROVIDERS.iter().find(|p| p.hosts.contains(&host.as_str()))?;
    let src = (provider.embed)(path, query)?;
    Some((provider, src))
}

/// Whether `src` is the embed URL of a trusted provider.
pub fn is_trusted_src(src: &str) -> bool {
    PROVIDERS.iter().any(|p| {
        src.starts_with(p.embed_prefix)
            && src.len() > p.embed_prefix.len()
            && (p.name != "jsfiddle" || src.ends_with("/embedded/"))
    })
}

/// Fill in provider and embed URL of every embed that names a trusted
/// provider.  The others are left to render as links, each with a
/// diagnostic.
pub fn resolve<'a>(root: Node<'a>, messages: &mut Vec<Diagnostic>) {
    for node in root.descendants() {
        let mut ast = node.data_mut();
        let line = ast.line;
        if let NodeValue::Embed(ref mut ne) = ast.value {
            match lookup(&ne.url) {
                Some((provider, src)) => {
                    ne.provider = Some(provider.name.to_string());
                    ne.src = Some(src);
                }
                None => {
                    tracing::debug!(url = %ne.url, "embed from unknown provider");
                    messages.push(
                        Diagnostic::sanitized(format!(
                            "embed of {} is not from a trusted provider; rendered as a link",
                            ne.url
                        ))
                        .at_line(line),
                    );
                    ne.provider = None;
                    ne.src = None;
                }
            }
        }
    }
}
