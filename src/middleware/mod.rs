pub mod csp;
pub mod landlord_only;
pub mod rate_limit;
pub mod request_id;
pub mod resolve_tenant;
pub mod security_headers;

pub use csp::CspNonce;
pub use request_id::RequestId;
