#![no_main]

use libfuzzer_sys::fuzz_target;

use zmark::hast::parse_fragment;
use zmark::sanitizer::sanitize;

fuzz_target!(|data: &str| {
    let mut messages = vec![];
    let once = sanitize(parse_fragment(data), &mut messages);

    let mut again = vec![];
    let twice = sanitize(once.clone(), &mut again);
    assert_eq!(once, twice);
    assert!(again.is_empty(), "{:?}", again);
});
