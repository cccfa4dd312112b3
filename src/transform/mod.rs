//! Asset transforms.
//!
//! ## Architecture
//!
//! - [`spec`]: [`TransformSpec`], the typed description of one step in a chain
//! - [`backend`]: the [`TransformBackend`] trait, context, output, errors
//! - [`builtin`]: [`BuiltinBackend`], the default implementation
//!
//! The orchestrator filters a rule's chain by build mode and feeds each step's
//! output into the next through the backend.

pub mod backend;
pub mod builtin;
pub mod spec;

pub use backend::{TransformBackend, TransformContext, TransformError, TransformOutput};
pub use builtin::BuiltinBackend;
pub use spec::{
    ImageOptions, MinifyOptions, MinifySyntax, OptimizeOptions, ScriptOptions, StyleSyntax,
    StylesheetOptions, TemplateOptions, TransformSpec,
};
