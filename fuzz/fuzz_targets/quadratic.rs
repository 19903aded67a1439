#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use std::time::Instant;
use zmark::registry::InlineTokenizer;
use zmark::{markdown_to_html, Options};

// Renders a repeated input at doubling sizes and panics when the time spent
// per byte keeps growing with the input, which points at quadratic work
// somewhere in the pipeline.

/// Shapes that previous quadratic blowups had in common.
#[derive(Arbitrary, Debug)]
enum Markdown {
    /// `md`, `mdmd`, `mdmdmd`, ...
    Repeat { markdown: String },

    /// `pre*N + md + post*N`
    Sandwich {
        prefix: String,
        markdown: String,
        suffix: String,
    },
}

impl Markdown {
    fn render(&self, num_bytes: usize) -> String {
        match self {
            Markdown::Repeat { markdown } => markdown.repeat(num_bytes / markdown.len()),
            Markdown::Sandwich {
                prefix,
                markdown,
                suffix,
            } => {
                let per = prefix.len() + suffix.len();
                let n = num_bytes.saturating_sub(markdown.len()) / per;
                format!("{}{}{}", prefix.repeat(n), markdown, suffix.repeat(n))
            }
        }
    }

    fn should_fuzz(&self) -> bool {
        let ok = |s: &str| !s.is_empty() && s.len() <= 128;
        match self {
            Markdown::Repeat { markdown } => ok(markdown),
            Markdown::Sandwich {
                prefix,
                markdown,
                suffix,
            } => ok(prefix) && ok(markdown) && ok(suffix),
        }
    }
}

#[derive(Arbitrary, Debug)]
struct Input {
    disabled_inlines: Vec<u8>,
    unguarded: bool,
    markdown: Markdown,
}

impl Input {
    fn options(&self) -> Options<'static> {
        let mut options = Options::default();
        if self.unguarded {
            options.limits.depth = None;
        }
        for &i in &self.disabled_inlines {
            let t = InlineTokenizer::ALL[i as usize % InlineTokenizer::ALL.len()];
            options.tokenizers.disabled.push(t.name().to_string());
        }
        options
    }
}

/// Seconds per byte of rendering the input expanded to `num_bytes`.
fn time_per_byte(input: &Input, options: &Options, num_bytes: usize) -> f64 {
    let markdown = input.markdown.render(num_bytes);
    let now = Instant::now();
    let _ = markdown_to_html(&markdown, options);
    now.elapsed().as_secs_f64() / markdown.len().max(1) as f64
}

/// Doubling steps that must all look superlinear before we call it quadratic.
const MAX_STEPS: usize = 3;

/// A ratio of 2.0 between steps is quadratic; leave room for jitter.
const MIN_RATIO: f64 = 2.5;

fuzz_target!(|input: Input| {
    if !input.markdown.should_fuzz() {
        return;
    }
    let options = input.options();

    let mut num_bytes = 1024;
    let mut last = time_per_byte(&input, &options, num_bytes);
    let mut steps = vec![last];

    for _ in 0..MAX_STEPS {
        num_bytes *= 2;
        let per_byte = time_per_byte(&input, &options, num_bytes);
        if per_byte / last < MIN_RATIO {
            return;
        }
        steps.push(per_byte);
        last = per_byte;
    }

    panic!("time per byte grows with input size: {:?}\n{:#?}", steps, input);
});
