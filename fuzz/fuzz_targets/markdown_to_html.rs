#![no_main]

use libfuzzer_sys::fuzz_target;

use zmark::{markdown_to_html, Error, Options};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        match markdown_to_html(s, &Options::default()) {
            Ok(html) => {
                let lower = html.to_ascii_lowercase();
                assert!(!lower.contains("<script"), "{}", html);
                assert!(!lower.contains("href=\"javascript:"), "{}", html);
                assert!(!lower.contains("src=\"javascript:"), "{}", html);
            }
            Err(Error::ComplexityExceeded { .. }) => {}
            Err(err) => panic!("unexpected error: {}", err),
        }
    }
});
