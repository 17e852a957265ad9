use crate::domain::{Language, ParsedFile};

/// Uniform parsing contract over every supported language. Parsing is
/// CPU-bound and synchronous; failures degrade to an empty result and are
/// reported as warnings by the caller, never as errors.
pub trait ParserService: Send + Sync {
    fn parse(&self, source: &str, path: &str, lang: Language) -> ParsedFile;

    fn supports(&self, lang: Language) -> bool;
}
