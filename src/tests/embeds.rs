use super::*;
use pretty_assertions::assert_eq;

#[test]
fn trusted_provider() {
    html(
        "!(https://www.youtube.com/watch?v=dQw4w9WgXcQ)\n",
        concat!(
            "<p>\n",
            "<iframe allowfullscreen=\"\" class=\"embed embed-youtube\" ",
            "sandbox=\"allow-scripts allow-same-origin allow-popups allow-presentation\" ",
            "src=\"https://www.youtube.com/embed/dQw4w9WgXcQ\"></iframe>\n",
            "</p>\n"
        ),
    );
}

#[test]
fn every_provider_is_framed() {
    for (url, provider) in [
        ("https://youtu.be/dQw4w9WgXcQ", "youtube"),
        ("https://vimeo.com/76979871", "vimeo"),
        ("https://www.dailymotion.com/video/x7tgad0", "dailymotion"),
        ("https://soundcloud.com/artist/track", "soundcloud"),
        ("https://jsfiddle.net/user/abc123/", "jsfiddle"),
    ] {
        let output = render_sync(&format!("!({})\n", url));
        assert!(
            output.contains(&format!("class=\"embed embed-{}\"", provider)),
            "{}",
            output
        );
        assert!(output.contains("sandbox=\""), "{}", output);
    }
}

#[test]
fn unknown_provider_is_a_link() {
    html(
        "!(https://example.com/video)\n",
        "<p><a href=\"https://example.com/video\">https://example.com/video</a></p>\n",
    );
}

#[test]
fn not_an_embed() {
    html("!(ftp://example.com)\n", "<p>!(ftp://example.com)</p>\n");
    html("!(https://a.b c)\n", "<p>!(<a href=\"https://a.b\">https://a.b</a> c)</p>\n");
}

#[test]
fn raw_frames() {
    html(
        "<iframe src=\"https://evil.example/x\"></iframe>\n",
        "<a href=\"https://evil.example/x\">https://evil.example/x</a>\n",
    );
    html(
        "<iframe src=\"https://player.vimeo.com/video/1\" sandbox=\"allow-top-navigation\"></iframe>\n",
        concat!(
            "<iframe sandbox=\"allow-scripts allow-same-origin allow-popups allow-presentation\" ",
            "src=\"https://player.vimeo.com/video/1\"></iframe>\n"
        ),
    );
}

#[test]
fn disabled() {
    html_opts!(
        [tokenizers.disabled = super::disabled(&["embed", "autolink"])],
        "!(https://vimeo.com/1)\n",
        "<p>!(https://vimeo.com/1)</p>\n"
    );
}

#[tokio::test]
async fn degraded_embeds_are_reported() {
    let rendered = crate::render("ok\n\n!(https://example.com/video)\n", &Options::default())
        .await
        .unwrap();
    assert_eq!(
        rendered.contents,
        "<p>ok</p>\n<p><a href=\"https://example.com/video\">https://example.com/video</a></p>\n"
    );
    assert_eq!(rendered.messages.len(), 1);
    assert_eq!(rendered.messages[0].kind, crate::DiagnosticKind::SanitizedContent);
    assert_eq!(rendered.messages[0].line, Some(3));
}
