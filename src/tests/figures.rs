use super::*;

#[test]
fn alt_text_caption() {
    html(
        "![A *cat*](/cat.png \"Cat\")\n",
        concat!(
            "<figure><img alt=\"A cat\" src=\"/cat.png\" title=\"Cat\" />\n",
            "<figcaption>A <em>cat</em></figcaption>\n",
            "</figure>\n"
        ),
    );
}

#[test]
fn caption_paragraph() {
    html(
        "![](/cat.png)\n\nFigure: A **cat**.\n\nFigure: Not a caption.\n",
        concat!(
            "<figure><img alt=\"\" src=\"/cat.png\" />\n",
            "<figcaption>A <strong>cat</strong>.</figcaption>\n",
            "</figure>\n",
            "<p>Figure: Not a caption.</p>\n"
        ),
    );
}

#[test]
fn caption_line() {
    html(
        "![cat](/cat.png)\nFigure: Sleeping\n",
        concat!(
            "<figure><img alt=\"cat\" src=\"/cat.png\" />\n",
            "<figcaption>Sleeping</figcaption>\n",
            "</figure>\n"
        ),
    );
}

#[test]
fn empty_marker_means_no_caption() {
    html(
        "![cat](/cat.png)\n\nFigure:\n",
        "<figure><img alt=\"cat\" src=\"/cat.png\" /></figure>\n",
    );
}

#[test]
fn image_among_text_is_not_promoted() {
    html(
        "Look: ![cat](/cat.png)\n",
        "<p>Look: <img alt=\"cat\" src=\"/cat.png\" /></p>\n",
    );
    html(
        "![](/cat.png)\n",
        "<p><img alt=\"\" src=\"/cat.png\" /></p>\n",
    );
    html(
        "![a](/a.png)![b](/b.png)\n",
        "<p><img alt=\"a\" src=\"/a.png\" /><img alt=\"b\" src=\"/b.png\" /></p>\n",
    );
}

#[test]
fn disabled() {
    html_opts!(
        [tokenizers.disabled = super::disabled(&["figure"])],
        "![cat](/cat.png)\n",
        "<p><img alt=\"cat\" src=\"/cat.png\" /></p>\n"
    );
}
