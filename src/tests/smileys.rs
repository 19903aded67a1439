use super::*;

#[test]
fn pinch() {
    html(
        "This is funny >_<\n",
        "<p>This is funny <img alt=\"&gt;_&lt;\" class=\"smiley\" src=\"/static/smileys/pinch.png\" /></p>\n",
    );
    html(
        "This is funny X/\n",
        "<p>This is funny <img alt=\"X/\" class=\"smiley\" src=\"/static/smileys/pinch.png\" /></p>\n",
    );
}

#[test]
fn cthulhu() {
    html(
        "^(;,;)^\n",
        "<p><img alt=\"^(;,;)^\" class=\"smiley\" src=\"/static/smileys/cthulhu.png\" /></p>\n",
    );
}

#[test]
fn only_whole_words() {
    html("a:) (:) `:)`\n", "<p>a:) (:) <code>:)</code></p>\n");
}

#[test]
fn base_url() {
    html_opts!(
        [render.smiley_base_url = "https://cdn.example/s/".to_string()],
        "hi :)\n",
        "<p>hi <img alt=\":)\" class=\"smiley\" src=\"https://cdn.example/s/smile.png\" /></p>\n"
    );
}

#[test]
fn not_in_image_alt() {
    html(
        "![:)](/a.png) b\n",
        "<p><img alt=\":)\" src=\"/a.png\" /> b</p>\n",
    );
}

#[test]
fn disabled() {
    html_opts!(
        [tokenizers.disabled = super::disabled(&["smiley"])],
        "This is funny >_<\n",
        "<p>This is funny &gt;_&lt;</p>\n"
    );
}
