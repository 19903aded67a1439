use super::*;
use pretty_assertions::assert_eq;
use crate::Error;

fn quotes(n: usize) -> String {
    format!("{}hi\n", "> ".repeat(n))
}

#[test]
fn exact_limit_is_accepted() {
    // document > n block quotes > paragraph > text
    let mut options = Options::default();
    options.limits.depth = Some(10);
    assert_eq!(
        markdown_to_html(&quotes(8), &options).unwrap(),
        format!("{}<p>hi</p>\n{}", "<blockquote>\n".repeat(8), "</blockquote>\n".repeat(8))
    );
}

#[test]
fn one_past_the_limit_fails() {
    let mut options = Options::default();
    options.limits.depth = Some(10);
    assert_eq!(
        markdown_to_html(&quotes(9), &options),
        Err(Error::ComplexityExceeded { depth: 11, max: 10 })
    );
}

#[test]
fn default_limit() {
    let options = Options::default();
    assert!(markdown_to_html(&quotes(254), &options).is_ok());
    assert!(matches!(
        markdown_to_html(&quotes(255), &options),
        Err(Error::ComplexityExceeded { max: 256, .. })
    ));
}

#[test]
fn inline_nesting_counts() {
    let input = format!("{}a{}", "*".repeat(40), "*".repeat(40));
    html_opts!(
        [limits.depth = Some(5)],
        "*a*",
        "<p><em>a</em></p>\n"
    );
    let mut options = Options::default();
    options.limits.depth = Some(5);
    assert!(matches!(
        markdown_to_html(&input, &options),
        Err(Error::ComplexityExceeded { max: 5, .. })
    ));
}

#[test]
fn disabled_guard() {
    let mut options = Options::default();
    options.limits.depth = None;
    assert!(markdown_to_html(&quotes(300), &options).is_ok());
}

#[test]
fn parser_stops_nesting_past_the_limit() {
    use crate::{parse_document, tree_depth, Arena};

    let mut options = Options::default();
    options.limits.depth = Some(10);
    let arena = Arena::new();
    let root = parse_document(&arena, &quotes(5_000), &options);
    let depth = tree_depth(root);
    assert!(depth > 10 && depth < 20, "{}", depth);
}
