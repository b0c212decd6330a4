//! Template tags.
//!
//! A tag has two phases. `parse` runs while the document is being parsed and
//! turns the tag's argument tokens into normalized [`TagArgs`]. `compile` runs
//! later and turns those arguments, plus the tag's nested content, into
//! instructions.
//!
//! The standard registry holds the four macro-related tags:
//!
//! | Tag      | `ends` | `block` | Purpose                                         |
//! |----------|--------|---------|-------------------------------------------------|
//! | `macro`  | yes    | yes     | define a callable bound on the context          |
//! | `call`   | yes    | no      | expose the block content as `caller`            |
//! | `import` | no     | yes     | bind another file's macros under an alias       |
//! | `from`   | no     | yes     | bind selected macros of another file directly   |

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ast::{TagArgs, TagNode};
use crate::compiler::{Compiler, Frame, Instr};
use crate::diagnostics::SourceArc;
use crate::syntax::lexer::Token;
use crate::{Span, TempletError};

pub mod call;
pub mod from;
pub mod import;
pub mod macro_tag;
pub mod signature;

pub use call::CallTag;
pub use from::FromTag;
pub use import::ImportTag;
pub use macro_tag::MacroTag;

/// Where a tag's arguments came from, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub src: &'a SourceArc,
    /// Name of the template being parsed.
    pub file: &'a str,
    pub line: usize,
    /// Span of the whole `{% ... %}` tag.
    pub span: Span,
}

pub trait Tag: Send + Sync {
    fn name(&self) -> &'static str;

    /// The tag has a closing `end<name>` counterpart; everything in between
    /// becomes its content.
    fn ends(&self) -> bool;

    /// The tag is a statement that may stand at the top level of a template.
    fn block(&self) -> bool;

    fn parse(&self, tokens: &[Token], cx: &ParseContext<'_>) -> Result<TagArgs, TempletError>;

    fn compile(
        &self,
        compiler: &mut Compiler<'_>,
        tag: &TagNode,
        frame: &Frame,
    ) -> Result<Vec<Instr>, TempletError>;
}

/// Tags by name. Names are case-sensitive.
#[derive(Clone)]
pub struct TagRegistry {
    tags: BTreeMap<&'static str, Arc<dyn Tag>>,
}

impl TagRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            tags: BTreeMap::new(),
        }
    }

    /// `macro`, `call`, `import` and `from`.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(MacroTag);
        registry.register(CallTag);
        registry.register(ImportTag);
        registry.register(FromTag);
        registry
    }

    /// Registers a tag, returning the one it replaced.
    pub fn register(&mut self, tag: impl Tag + 'static) -> Option<Arc<dyn Tag>> {
        self.tags.insert(tag.name(), Arc::new(tag))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tag>> {
        self.tags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tag>> {
        self.tags.values()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tags.keys()).finish()
    }
}

/// Error for a tag node whose arguments belong to another tag.
pub(crate) fn mismatched_args(expected: &str, tag: &TagNode) -> TempletError {
    crate::err_msg!(
        Internal,
        "`{}` tag on line {} carries arguments for a different tag",
        expected,
        tag.line
    )
}
