use super::*;
use crate::Error;
use ntest::timeout;

// input: python3 -c 'n = 50000; print("*a_ " * n)'
#[test]
#[timeout(4000)]
fn pathological_emphases() {
    let n = 50_000;
    let input = "*a_ ".repeat(n);
    let mut exp = format!("<p>{}", input);
    // Right-most space is trimmed in output.
    exp.pop();
    exp += "</p>\n";

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_table_columns() {
    let n = 100_000;
    let input = format!("{}{}{}{}", "|", "x|".repeat(n), "\n|", "-|".repeat(n - 1));
    let exp = format!("<p>{}</p>\n", input);

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_unclosed_brackets() {
    let n = 50_000;
    let input = "[".repeat(n) + "a";
    html(&input, &format!("<p>{}</p>\n", input));
}

#[test]
#[timeout(4000)]
fn pathological_backtick_runs() {
    let mut input = String::new();
    for i in 1..=2_000 {
        input.push_str(&"`".repeat(i % 80 + 1));
        input.push('a');
    }
    assert!(markdown_to_html(&input, &Options::default()).is_ok());
}

// input: python3 -c 'n = 50000; print("$1 " * n)'
#[test]
#[timeout(4000)]
fn pathological_dollars() {
    let n = 50_000;
    let input = "$1 ".repeat(n);
    let mut exp = format!("<p>{}", input);
    exp.pop();
    exp += "</p>\n";

    html(&input, &exp);
}

#[test]
#[timeout(4000)]
fn pathological_block_quotes() {
    let input = ">".repeat(1_000_000);
    assert!(matches!(
        markdown_to_html(&input, &Options::default()),
        Err(Error::ComplexityExceeded { max: 256, .. })
    ));
}

#[test]
#[timeout(4000)]
fn pathological_nested_lists() {
    let input = "- ".repeat(100_000) + "a\n";
    assert!(matches!(
        markdown_to_html(&input, &Options::default()),
        Err(Error::ComplexityExceeded { max: 256, .. })
    ));
}

#[test]
#[timeout(4000)]
fn pathological_nested_emphasis() {
    let n = 50_000;
    let input = format!("{}a{}", "*".repeat(n), "*".repeat(n));
    assert!(matches!(
        markdown_to_html(&input, &Options::default()),
        Err(Error::ComplexityExceeded { max: 256, .. })
    ));
}

#[test]
#[timeout(4000)]
fn pathological_unguarded_nesting() {
    let mut options = Options::default();
    options.limits.depth = None;
    let input = ">".repeat(100_000) + "a\n";
    let output = markdown_to_html(&input, &options).unwrap();
    assert!(output.starts_with("<blockquote>\n".repeat(100).as_str()));
}

#[test]
#[timeout(4000)]
fn pathological_footnote_references() {
    let n = 20_000;
    let input = format!("{}\n\n[^a]: A\n", "[^a]".repeat(n));
    let output = markdown_to_html(&input, &Options::default()).unwrap();
    assert!(output.contains(&format!("id=\"fnref-1-{}\"", n)));
}

#[test]
#[timeout(4000)]
fn pathological_raw_html_nesting() {
    let n = 50_000;
    let input = "<div>".repeat(n) + "\n";
    assert!(markdown_to_html(&input, &Options::default()).is_ok());
}

// input: python3 -c 'n = 50000; print("<a" * n)'
#[test]
#[timeout(4000)]
fn pathological_autolink_schemes() {
    let n = 50_000;
    let input = "<a".repeat(n);
    html(&input, &format!("<p>{}</p>\n", "&lt;a".repeat(n)));
}

#[test]
#[timeout(4000)]
fn pathological_unclosed_raw_html() {
    let n = 50_000;
    for construct in ["<!--", "<?", "<![CDATA[", "<!A", "<a b=\"", "<a b='"] {
        let input = construct.repeat(n);
        assert!(markdown_to_html(&input, &Options::default()).is_ok(), "{}", construct);
    }
}

#[test]
#[timeout(4000)]
fn pathological_closing_tags() {
    let n = 50_000;
    let input = format!("a{}", "</b>".repeat(n));
    html(&input, "<p>a</p>\n");
}

#[test]
#[timeout(4000)]
fn pathological_unclosed_embeds_and_mentions() {
    let n = 50_000;
    for construct in ["!(https://", "@**"] {
        let input = construct.repeat(n);
        assert!(markdown_to_html(&input, &Options::default()).is_ok(), "{}", construct);
    }
}

// input: python3 -c 'n = 50000; print("http://a" + ")" * n)'
#[test]
#[timeout(4000)]
fn pathological_bare_url_parens() {
    let n = 50_000;
    let input = format!("http://a{}", ")".repeat(n));
    html(
        &input,
        &format!("<p><a href=\"http://a\">http://a</a>{}</p>\n", ")".repeat(n)),
    );
}

#[test]
#[timeout(4000)]
fn pathological_unguarded_inline_nesting() {
    let mut options = Options::default();
    options.limits.depth = None;
    let n = 200_000;
    let input = format!("{}x{}", "**".repeat(n), "**".repeat(n));
    let output = markdown_to_html(&input, &options).unwrap();
    assert!(output.contains(&format!("{}x", "<strong>".repeat(510))));
    assert!(!output.contains(&"<strong>".repeat(511)));
    assert!(output.starts_with("<p>***"));
}

#[test]
#[timeout(4000)]
fn pathological_unguarded_image_nesting() {
    let mut options = Options::default();
    options.limits.depth = None;
    let n = 20_000;
    let input = format!("{}x{}", "![".repeat(n), "](u)".repeat(n));
    let output = markdown_to_html(&input, &options).unwrap();
    assert!(output.contains("<img"));
}
