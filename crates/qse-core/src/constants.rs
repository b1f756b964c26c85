//! Wire constants shared by the ticket and engine clients.

/// Anti-request-forgery token sent in both the `X-Qlik-xrfkey` header and the
/// `xrfkey` query parameter of every ticket request. The proxy service rejects
/// the request unless the two values are byte-identical.
///
/// Fixed at sixteen characters as documented reference behavior; a hardened
/// deployment would generate this per session.
pub const XRFKEY: &str = "1234567890123456";

/// Header carrying the anti-request-forgery token.
pub const XRFKEY_HEADER: &str = "X-Qlik-xrfkey";

/// HTTPS port of the proxy service (QPS) ticket API.
pub const QPS_PORT: u16 = 4243;

/// Identity header presented during the engine WebSocket handshake.
pub const ENGINE_USER_HEADER: &str = "X-Qlik-User";

/// Privileged internal engine identity, accepted by the engine in lieu of a
/// ticket. An alternate authentication path to the ticket flow; both are
/// valid and independent.
pub const ENGINE_USER_VALUE: &str = "UserDirectory=internal; UserId=sa_engine";

/// Fixed connect and read timeout for ticket requests, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;
