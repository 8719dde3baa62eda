//! Semantic binding
//!
//! The binder turns the syntax trees of one compilation into a
//! [`BoundProgram`](ql_bound::BoundProgram). Every name, call, operator and
//! conversion is resolved against the built-in symbol table, the declared
//! methods and namespaces, and the lexical scopes of each body.
//!
//! Binding never stops at the first problem. Rules that fail on well-formed
//! syntax report a diagnostic and substitute an error expression, whose type
//! converts to and from everything so a single mistake is reported once.
//! Only structurally malformed trees produce a [`BindError`].
//!
//! Method lookup for a bare name walks outward through nested method scopes,
//! the enclosing namespace and the global methods, then the namespaces
//! imported with `with`. The first level holding a method of that name wins;
//! two equally good overloads inside that level are ambiguous.

mod context;
mod error;
mod method;
mod overload;
mod program;
mod scope;

pub use error::BindError;
pub use program::{BindOptions, bind_program};
