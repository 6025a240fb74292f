//! Errors escaping the resolver chain.

/// A programming error inside a plugin, unrelated to vendor I/O.
///
/// The resolver never swallows these: silently mis-adjudicating an
/// identity decision is worse than surfacing the bug to the caller's
/// error-reporting layer. Recoverable vendor failures never take this
/// path; plugins encode them as failed vendor results instead.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ResolverError {
    /// A plugin violated its own invariants
    #[error("plugin {plugin} failed: {message}")]
    #[diagnostic(code(vouch::resolver::plugin))]
    Plugin {
        /// Name of the offending plugin
        plugin: &'static str,
        message: String,
    },
}
