use super::*;
use pretty_assertions::assert_eq;
use crate::DiagnosticKind;

#[test]
fn footnotes() {
    html(
        concat!(
            "Here is a footnote reference,[^1] and another.[^longnote]\n",
            "\n",
            "[^1]: Here is the footnote.\n",
            "\n",
            "[^longnote]: Here's one with multiple blocks.\n",
            "\n",
            "    Subsequent paragraphs are indented.\n",
        ),
        concat!(
            "<p>Here is a footnote reference,<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup> ",
            "and another.<sup class=\"footnote-ref\"><a href=\"#fn-2\" id=\"fnref-2\">2</a></sup></p>\n",
            "<section class=\"footnotes\">\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>Here is the footnote. <a class=\"footnote-backref\" href=\"#fnref-1\">↩</a></p>\n",
            "</li>\n",
            "<li id=\"fn-2\">\n",
            "<p>Here's one with multiple blocks.</p>\n",
            "<p>Subsequent paragraphs are indented. <a class=\"footnote-backref\" href=\"#fnref-2\">↩</a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        ),
    );
}

#[test]
fn numbered_by_first_reference() {
    let output = render_sync(concat!(
        "[^c] [^b] [^a]\n",
        "\n",
        "[^a]: A\n",
        "[^b]: B\n",
        "[^c]: C\n",
    ));

    let c = output.find("<li id=\"fn-1\">\n<p>C").unwrap();
    let b = output.find("<li id=\"fn-2\">\n<p>B").unwrap();
    let a = output.find("<li id=\"fn-3\">\n<p>A").unwrap();
    assert!(c < b && b < a);
}

#[test]
fn repeated_references() {
    html(
        "a[^x] b[^x]\n\n[^x]: X\n",
        concat!(
            "<p>a<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup> ",
            "b<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1-2\">1</a></sup></p>\n",
            "<section class=\"footnotes\">\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>X <a class=\"footnote-backref\" href=\"#fnref-1\">↩</a> ",
            "<a class=\"footnote-backref\" href=\"#fnref-1-2\">↩</a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        ),
    );
}

#[test]
fn labels_are_case_insensitive() {
    html(
        "a[^Note]\n\n[^NOTE]: n\n",
        concat!(
            "<p>a<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup></p>\n",
            "<section class=\"footnotes\">\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>n <a class=\"footnote-backref\" href=\"#fnref-1\">↩</a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        ),
    );
}

#[test]
fn unused_definitions_are_dropped() {
    html("text\n\n[^unused]: gone\n", "<p>text</p>\n");
}

#[tokio::test]
async fn dangling_reference_stays_text() {
    let rendered = crate::render("a[^nowhere] b\n", &Options::default())
        .await
        .unwrap();
    assert_eq!(rendered.contents, "<p>a[^nowhere] b</p>\n");
    assert_eq!(rendered.messages.len(), 1);
    assert_eq!(rendered.messages[0].kind, DiagnosticKind::UnresolvedReference);
    assert_eq!(rendered.messages[0].line, Some(1));
}

#[test]
fn disabled() {
    html_opts!(
        [tokenizers.disabled = super::disabled(&["footnoteReference", "footnoteDefinition", "definition"])],
        "a[^1]\n\n[^1]: b\n",
        "<p>a[^1]</p>\n<p>[^1]: b</p>\n"
    );
}

#[test]
fn inline_notes_follow_reference_order() {
    let output = render_sync(concat!(
        "a[^first_footnote_reference]\n",
        "b[^`b` second footnote reference but first footnote definition]\n",
        "c[^last_footnote_reference]\n",
        "[^last_footnote_reference]: `c` last footnote reference but second footnote definition\n",
        "[^first_footnote_reference]: `a` first footnote reference but last footnote definition\n",
    ));

    assert!(output.contains(
        "b<sup class=\"footnote-ref\"><a href=\"#fn-2\" id=\"fnref-2\">2</a></sup>"
    ));
    let a = output.find("<li id=\"fn-1\">\n<p><code>a</code> first").unwrap();
    let b = output.find("<li id=\"fn-2\">\n<p><code>b</code> second").unwrap();
    let c = output.find("<li id=\"fn-3\">\n<p><code>c</code> last").unwrap();
    assert!(a < b && b < c);
}

#[test]
fn inline_note() {
    html(
        "x[^a *short* note] y\n",
        concat!(
            "<p>x<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup> y</p>\n",
            "<section class=\"footnotes\">\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>a <em>short</em> note <a class=\"footnote-backref\" href=\"#fnref-1\">↩</a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        ),
    );
}

#[tokio::test]
async fn dropped_definitions_are_reported() {
    let rendered = crate::render("a[^x]\n\n[^x]: one\n\n[^x]: two\n\n[^y]: unused\n", &Options::default())
        .await
        .unwrap();
    let lines: Vec<Option<usize>> = rendered.messages.iter().map(|m| m.line).collect();
    assert_eq!(lines, vec![Some(5), Some(7)]);
    assert!(rendered
        .messages
        .iter()
        .all(|m| m.kind == DiagnosticKind::UnresolvedReference));
}

#[tokio::test]
async fn definitions_without_references() {
    let mut options = Options::default();
    options.tokenizers.disabled = super::disabled(&["footnoteReference"]);
    let rendered = crate::render("a[^1]\n\n[^1]: b\n", &options).await.unwrap();
    assert_eq!(rendered.contents, "<p>a[^1]</p>\n");
    assert_eq!(rendered.messages.len(), 1);
    assert_eq!(rendered.messages[0].line, Some(3));
}
