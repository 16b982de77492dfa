/// Router Module Index
///
/// Organizes the application's routing into the two halves of its surface, so the
/// access rule is applied at the module level rather than per handler.

/// The JSON API under /api. Open to any client.
pub mod api;

/// The server-rendered admin pages under /admin. Every route in this module sits
/// behind the session middleware.
pub mod admin;
