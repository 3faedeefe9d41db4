/// Router Module Index
///
/// Routing is split by access level so the access control for each group is
/// applied once, at the module boundary, instead of being re-derived per
/// route.

/// Anonymous routes: the board, downloads, registration, service calls, and
/// the signature-gated data API.
pub mod public;

/// Routes behind the `AuthUser` extractor layer: submission, profile,
/// uploads, URL signing.
pub mod authenticated;

/// Routes for administrators only; each handler re-checks the `is_admin`
/// policy after authentication.
pub mod admin;
