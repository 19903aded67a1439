use crate::parser::options::Plugins;
use crate::parser::registry::Registry;
use crate::Options;

/// What the transform rules may consult while they run.  Shared read-only
/// by every rule of one render call.
#[derive(Debug)]
pub struct Context<'o, 'c> {
    /// Options of the current render.
    pub options: &'o Options<'c>,

    /// Render plugins of the current render.
    pub plugins: &'o Plugins<'o>,

    /// The active tokenizers and render features.
    pub registry: &'o Registry,
}

impl<'o, 'c> Context<'o, 'c> {
    /// Bundle up the parts of a render call.
    pub fn new(options: &'o Options<'c>, plugins: &'o Plugins<'o>, registry: &'o Registry) -> Self {
        Context {
            options,
            plugins,
            registry,
        }
    }

    /// Whether code blocks should be passed through the highlighter.
    pub fn highlighting(&self) -> bool {
        self.plugins.render.codefence_syntax_highlighter.is_some()
            && self.registry.is_enabled("highlight")
    }
}
