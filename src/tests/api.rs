use super::*;
use pretty_assertions::assert_eq;
use crate::error::Result;
use crate::hast::HtmlNode;
use crate::html::{format_document, Context, Transformer};
use crate::nodes::{Node, NodeKind};
use crate::sanitizer::sanitize;
use crate::{check_depth, parse_document, postprocess, render_bytes, Arena, Error, Registry};

fn italic<'a>(t: &Transformer, ctx: &Context<'_, '_>, node: Node<'a>) -> Result<HtmlNode> {
    Ok(HtmlNode::bare("i", t.children(ctx, node)?))
}

#[test]
fn pipeline_by_hand() {
    let arena = Arena::new();
    let options = Options::default();
    let plugins = Plugins::default();
    let registry = Registry::new(&options.tokenizers);

    let root = parse_document(&arena, "*a* b[^1]\n\n[^1]: c\n", &options);
    assert_eq!(check_depth(root, 256), Ok(3));

    let mut messages = vec![];
    postprocess::run(&arena, root, &options, &plugins, &registry, None, &mut messages);
    assert!(messages.is_empty());

    let mut transformer = Transformer::new();
    assert!(transformer.register(NodeKind::Emph, italic).is_some());
    let ctx = Context::new(&options, &plugins, &registry);
    let tree = sanitize(transformer.transform(&ctx, root).unwrap(), &mut messages);

    assert_eq!(
        format_document(&tree),
        concat!(
            "<p><i>a</i> b<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup></p>\n",
            "<section class=\"footnotes\">\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>c <a class=\"footnote-backref\" href=\"#fnref-1\">↩</a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        )
    );
}

#[test]
fn missing_rule_is_fatal() {
    let arena = Arena::new();
    let options = Options::default();
    let plugins = Plugins::default();
    let registry = Registry::default();
    let root = parse_document(&arena, "> `x`\n", &options);

    let mut transformer = Transformer::new();
    transformer.unregister(NodeKind::Code);
    let ctx = Context::new(&options, &plugins, &registry);
    assert_eq!(
        transformer.transform(&ctx, root),
        Err(Error::UnsupportedNode {
            kind: NodeKind::Code
        })
    );
}

#[tokio::test]
async fn invalid_utf8() {
    let err = render_bytes(b"# ok\n\nfine \xc3\x28\n", &Options::default())
        .await
        .unwrap_err();
    match err {
        Error::ParseError { line, ref message } => {
            assert_eq!(line, 3);
            assert!(!message.is_empty());
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.to_string().lines().count(), 1);

    let rendered = render_bytes("**ok** ✓".as_bytes(), &Options::default())
        .await
        .unwrap();
    assert_eq!(rendered.contents, "<p><strong>ok</strong> ✓</p>\n");
}

#[test]
fn errors_display() {
    assert_eq!(
        Error::ComplexityExceeded { depth: 9, max: 8 }.to_string(),
        "markdown AST too complex: tree depth 9 > 8"
    );
    assert_eq!(
        Error::UnsupportedNode {
            kind: NodeKind::Table
        }
        .to_string(),
        "no transform rule registered for table nodes"
    );
}

#[test]
fn concurrent_renders_share_configuration() {
    let mut options = Options::default();
    options.render.locale = Some("fr".to_string());
    let plugins = Plugins::default();

    let outputs: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let options = &options;
                let plugins = &plugins;
                s.spawn(move || {
                    markdown_to_html_with_plugins(&format!("<< {} >>", i), options, plugins)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, output) in outputs.iter().enumerate() {
        assert_eq!(output, &format!("<p>«\u{202f}{}\u{202f}»</p>\n", i));
    }
}

#[test]
fn options_are_printable() {
    let options = Options::default();
    let printed = format!("{:?}", options);
    assert!(printed.contains("depth: Some(256)"), "{}", printed);
    assert!(printed.contains("mention_base_url: \"/members/\""), "{}", printed);
}
