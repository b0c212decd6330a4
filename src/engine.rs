//! The engine ties the pipeline together: resolve, parse, compile, render.

use crate::ast::Template;
use crate::compiler::{Compiler, Program};
use crate::config::Config;
use crate::lower;
use crate::resolver::{FileResolver, Resolver};
use crate::runtime::{Context, Renderer};
use crate::syntax::parse_template;
use crate::tags::TagRegistry;
use crate::TempletError;

pub struct Engine<R: Resolver> {
    resolver: R,
    tags: TagRegistry,
    config: Config,
}

impl Engine<FileResolver> {
    /// An engine reading templates from `config.root`.
    pub fn from_config(config: Config) -> Self {
        let resolver = FileResolver::new(config.root.clone());
        Self::with_config(resolver, config)
    }
}

impl<R: Resolver> Engine<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_config(resolver, Config::default())
    }

    pub fn with_config(resolver: R, config: Config) -> Self {
        Self {
            resolver,
            tags: TagRegistry::standard(),
            config,
        }
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========================================================================
    // PIPELINE
    // ========================================================================

    /// Loads and parses the template at `path`.
    pub fn parse(&self, path: &str) -> Result<Template, TempletError> {
        let source = self.resolver.load(path, None)?;
        parse_template(&source.name, &source.text, &self.tags)
    }

    pub fn compile_template(&self, template: &Template) -> Result<Program, TempletError> {
        let mut compiler = Compiler::new(&self.tags, &self.resolver, self.config.compile_options());
        compiler.compile(template)
    }

    pub fn compile_file(&self, path: &str) -> Result<Program, TempletError> {
        self.compile_template(&self.parse(path)?)
    }

    /// Compiles template text that does not come from the resolver. Imports
    /// inside it are resolved relative to `name`.
    pub fn compile_source(&self, name: &str, source: &str) -> Result<Program, TempletError> {
        let template = parse_template(name, source, &self.tags)?;
        self.compile_template(&template)
    }

    /// Compiles `path` and lowers it to script text.
    pub fn lower_file(&self, path: &str) -> Result<String, TempletError> {
        Ok(lower::to_source(&self.compile_file(path)?))
    }

    pub fn render_file(&self, path: &str, context: Context) -> Result<String, TempletError> {
        let program = self.compile_file(path)?;
        Renderer::new(context).render(&program)
    }

    pub fn render_source(
        &self,
        name: &str,
        source: &str,
        context: Context,
    ) -> Result<String, TempletError> {
        let program = self.compile_source(name, source)?;
        Renderer::new(context).render(&program)
    }
}
