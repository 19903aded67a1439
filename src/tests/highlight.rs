use super::*;
use pretty_assertions::assert_eq;
use crate::adapters::SyntaxHighlighterAdapter;

fn plugins(adapter: &dyn SyntaxHighlighterAdapter) -> Plugins<'_> {
    let mut plugins = Plugins::default();
    plugins.render.codefence_syntax_highlighter = Some(adapter);
    plugins
}

#[test]
fn highlighted() {
    html_plugins(
        "```rust\nfn main<'a>();\n```\n",
        concat!(
            "<pre><code class=\"language-rust\"><span class=\"hl-rust\">",
            "fn main&lt;'a&gt;();\n",
            "</span></code></pre>\n"
        ),
        &plugins(&MockHighlighter),
    );
}

#[test]
fn aliases_are_normalized() {
    let plugins = plugins(&MockHighlighter);
    let options = Options::default();
    let latex = markdown_to_html_with_plugins("```latex\n\\alpha\n```\n", &options, &plugins)
        .unwrap()
        .replace("language-latex", "language-x");
    let tex = markdown_to_html_with_plugins("```tex\n\\alpha\n```\n", &options, &plugins)
        .unwrap()
        .replace("language-tex", "language-x");
    assert_eq!(latex, tex);
    assert!(tex.contains("hl-tex"));
}

#[test]
fn plain_languages_are_not_highlighted() {
    for lang in ["console", "text", "plain", "TXT"] {
        html_plugins(
            &format!("```{}\n$ ls\n```\n", lang),
            &format!("<pre><code class=\"language-{}\">$ ls\n</code></pre>\n", lang),
            &plugins(&MockHighlighter),
        );
    }
    html_plugins(
        "```\nno language\n```\n",
        "<pre><code>no language\n</code></pre>\n",
        &plugins(&MockHighlighter),
    );
}

#[test]
fn highlighter_output_is_sanitized() {
    struct Hostile;

    impl SyntaxHighlighterAdapter for Hostile {
        fn highlight(&self, code: &str, _: Option<&str>) -> String {
            format!(
                "<script>alert(1)</script><span class=\"k\" onclick=\"x()\">{}</span><a href=\"javascript:x\">x</a>",
                code.trim_end()
            )
        }
    }

    html_plugins(
        "```js\nlet\n```\n",
        "<pre><code class=\"language-js\"><span class=\"k\">let</span><a>x</a></code></pre>\n",
        &plugins(&Hostile),
    );
}

#[test]
fn disabled() {
    let mut options = Options::default();
    options.tokenizers.disabled = super::disabled(&["highlight"]);
    let adapter = MockHighlighter;
    assert_eq!(
        markdown_to_html_with_plugins("```rust\nx\n```\n", &options, &plugins(&adapter)).unwrap(),
        "<pre><code class=\"language-rust\">x\n</code></pre>\n"
    );
}

#[cfg(feature = "syntect")]
#[test]
fn syntect() {
    use crate::plugins::syntect::SyntectAdapter;

    let adapter = SyntectAdapter::new();
    let plugins = plugins(&adapter);
    let options = Options::default();

    let output =
        markdown_to_html_with_plugins("```rust\nfn main() {}\n```\n", &options, &plugins).unwrap();
    assert!(output.starts_with("<pre><code class=\"language-rust\"><span class=\""));
    assert!(!output.contains("style="));

    let latex = markdown_to_html_with_plugins("```latex\n\\alpha\n```\n", &options, &plugins)
        .unwrap()
        .replace("language-latex", "language-x");
    let tex = markdown_to_html_with_plugins("```tex\n\\alpha\n```\n", &options, &plugins)
        .unwrap()
        .replace("language-tex", "language-x");
    assert_eq!(latex, tex);
}
