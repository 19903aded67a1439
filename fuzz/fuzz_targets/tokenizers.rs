#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use zmark::registry::{BlockTokenizer, InlineTokenizer};
use zmark::{markdown_to_html, Options};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    disabled_blocks: Vec<u8>,
    disabled_inlines: Vec<u8>,
    depth: Option<u16>,
    markdown: &'a str,
}

fuzz_target!(|input: Input| {
    let mut options = Options::default();
    options.limits.depth = input.depth.map(usize::from);
    for i in input.disabled_blocks {
        let t = BlockTokenizer::ALL[i as usize % BlockTokenizer::ALL.len()];
        options.tokenizers.disabled.push(t.name().to_string());
    }
    for i in input.disabled_inlines {
        let t = InlineTokenizer::ALL[i as usize % InlineTokenizer::ALL.len()];
        options.tokenizers.disabled.push(t.name().to_string());
    }
    let _ = markdown_to_html(input.markdown, &options);
});
