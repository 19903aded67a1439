use super::*;

#[test]
fn codefence() {
    html(
        "``` rust\nfn main<'a>();\n```\n",
        "<pre><code class=\"language-rust\">fn main&lt;'a&gt;();\n</code></pre>\n",
    );
}

#[test]
fn indented_code() {
    html("    a < b\n", "<pre><code>a &lt; b\n</code></pre>\n");
}

#[test]
fn lists() {
    html(
        "2. Hello.\n3. Hi.\n",
        concat!(
            "<ol start=\"2\">\n",
            "<li>Hello.</li>\n",
            "<li>Hi.</li>\n",
            "</ol>\n"
        ),
    );

    html(
        "- Hello.\n- Hi.\n",
        concat!("<ul>\n", "<li>Hello.</li>\n", "<li>Hi.</li>\n", "</ul>\n"),
    );
}

#[test]
fn loose_lists() {
    html(
        "- a\n\n- b\n",
        concat!(
            "<ul>\n",
            "<li>\n",
            "<p>a</p>\n",
            "</li>\n",
            "<li>\n",
            "<p>b</p>\n",
            "</li>\n",
            "</ul>\n"
        ),
    );
}

#[test]
fn thematic_breaks() {
    html(
        "---\n\n- - -\n\n\n_        _   _\n",
        concat!("<hr />\n", "<hr />\n", "<hr />\n"),
    );
}

#[test]
fn setext_heading() {
    html("Hi\n==\n\nOk\n-----\n", concat!("<h1>Hi</h1>\n", "<h2>Ok</h2>\n"));
}

#[test]
fn atx_headings() {
    html("# One\n###### Six ##\n####### Seven\n", concat!(
        "<h1>One</h1>\n",
        "<h6>Six</h6>\n",
        "<p>####### Seven</p>\n"
    ));
}

#[test]
fn emphasis() {
    html("*a* _b_ **c** __d__\n", "<p><em>a</em> <em>b</em> <strong>c</strong> <strong>d</strong></p>\n");
    html("***a** b*\n", "<p><em><strong>a</strong> b</em></p>\n");
    html("snake_case_name\n", "<p>snake_case_name</p>\n");
}

#[test]
fn links() {
    html(
        "[a](/u \"t\") [b](</with space>)\n",
        "<p><a href=\"/u\" title=\"t\">a</a> <a href=\"/with%20space\">b</a></p>\n",
    );
}

#[test]
fn reference_links() {
    html(
        "[a][B] and [b]\n\n[b]: /url 'title'\n",
        "<p><a href=\"/url\" title=\"title\">a</a> and <a href=\"/url\" title=\"title\">b</a></p>\n",
    );
}

#[test]
fn inline_images() {
    html(
        "a ![b *c*](/d.png)\n",
        "<p>a <img alt=\"b c\" src=\"/d.png\" /></p>\n",
    );
}

#[test]
fn code_spans() {
    html("`` a ` b ``\n", "<p><code>a ` b</code></p>\n");
    html("```unmatched\n\nx\n", "<pre><code class=\"language-unmatched\">\nx\n</code></pre>\n");
}

#[test]
fn escapes_and_entities() {
    html("\\*not\\* &copy; &#35; &amp;\n", "<p>*not* © # &amp;</p>\n");
}

#[test]
fn hard_breaks() {
    html("a  \nb\\\nc\n", "<p>a<br />\nb<br />\nc</p>\n");
}

#[test]
fn autolinks() {
    html(
        "<https://a.b/c> <me@example.com>\n",
        "<p><a href=\"https://a.b/c\">https://a.b/c</a> <a href=\"mailto:me@example.com\">me@example.com</a></p>\n",
    );
}

#[test]
fn bare_urls() {
    html(
        "see https://example.com/a_(b).\n",
        "<p>see <a href=\"https://example.com/a_(b)\">https://example.com/a_(b)</a>.</p>\n",
    );
    html("nothttps://example.com\n", "<p>nothttps://example.com</p>\n");
}

#[test]
fn inline_html_is_nested() {
    html("a <b>bold *x*</b> c\n", "<p>a <b>bold <em>x</em></b> c</p>\n");
}

#[test]
fn blockquote_laziness() {
    html(
        "> a\nb\n\nc\n",
        concat!("<blockquote>\n", "<p>a\nb</p>\n", "</blockquote>\n", "<p>c</p>\n"),
    );
}
