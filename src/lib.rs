//! Templet: a tag compiler for template macros, call blocks and namespaced
//! macro imports.
//!
//! Templates are parsed into a tree ([`ast`]), compiled into backend-neutral
//! instructions ([`compiler`]) and then either rendered directly
//! ([`runtime`]) or serialized as script text ([`lower`]).
//!
//! ```rust
//! use templet::{Context, Engine, MemoryResolver};
//!
//! let resolver = MemoryResolver::new().with(
//!     "page.html",
//!     r#"{% macro greet(name, greeting="Hello") %}{{ greeting }} {{ name }}{% endmacro %}{{ greet("Ann") }}"#,
//! );
//! let engine = Engine::new(resolver);
//! assert_eq!(engine.render_file("page.html", Context::new()).unwrap(), "Hello Ann");
//! ```

pub use crate::ast::Span;
pub use crate::diagnostics::{ErrorContext, ErrorType, TempletError};
pub use crate::engine::Engine;
pub use crate::resolver::{FileResolver, MemoryResolver, Resolver};
pub use crate::runtime::{Context, Renderer, Value};

pub mod ast;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod lower;
pub mod resolver;
pub mod runtime;
pub mod syntax;
pub mod tags;
