use super::*;

#[test]
fn inline_math() {
    html(
        "Euler: $e^{i\\pi} + 1 = 0$.\n",
        "<p>Euler: <span class=\"math math-inline\">e^{i\\pi} + 1 = 0</span>.</p>\n",
    );
}

#[test]
fn inline_display_math() {
    html(
        "so $$x < y$$ holds\n",
        "<p>so <span class=\"math math-display\">x &lt; y</span> holds</p>\n",
    );
}

#[test]
fn lone_display_math_is_a_block() {
    html("$$x^2$$\n", "<div class=\"math math-display\">x^2</div>\n");
}

#[test]
fn fenced_display_math() {
    html(
        "$$\n\\frac{a}{b}\n$$\n",
        "<div class=\"math math-display\">\\frac{a}{b}\n</div>\n",
    );
}

#[test]
fn dollars_that_are_not_math() {
    html("$5 and $10\n", "<p>$5 and $10</p>\n");
    html("a $ b $ c\n", "<p>a $ b $ c</p>\n");
    html("$$$x$$$\n", "<p>$$$x$$$</p>\n");
}

#[test]
fn no_math_in_code() {
    html("`$x$`\n", "<p><code>$x$</code></p>\n");
    html("```\n$x$\n```\n", "<pre><code>$x$\n</code></pre>\n");
}

#[test]
fn disabled() {
    html_opts!(
        [tokenizers.disabled = super::disabled(&["inlineMath", "math"])],
        "$x$\n\n$$\ny\n$$\n",
        "<p>$x$</p>\n<p>$$\ny\n$$</p>\n"
    );
}
