//! Hook plugins: config-driven registry construction and shell hooks.
//!
//! Shell hooks let users intercept chat without recompiling the client: each
//! configured command receives the event payload as JSON and may rewrite or
//! cancel it.

pub mod hooks;
pub mod shell_hook;
