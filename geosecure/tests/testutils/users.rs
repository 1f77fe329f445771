//! Authentications used across the integration tests

use geosecure::auth::{ROLE_ADMINISTRATOR, ROLE_AUTHENTICATED};
use geosecure::{Authentication, RequestContext, SecurityContext};

pub fn anonymous() -> Authentication {
    Authentication::anonymous()
}

pub fn reader() -> Authentication {
    Authentication::user("reader", ["READER", ROLE_AUTHENTICATED])
}

pub fn writer() -> Authentication {
    Authentication::user("writer", ["READER", "WRITER", ROLE_AUTHENTICATED])
}

pub fn military() -> Authentication {
    Authentication::user("colonel", ["MILITARY", ROLE_AUTHENTICATED])
}

pub fn admin() -> Authentication {
    Authentication::user("admin", [ROLE_ADMINISTRATOR, ROLE_AUTHENTICATED])
}

/// Every test user, with a label for assertion messages
pub fn all() -> Vec<(&'static str, Authentication)> {
    vec![
        ("anonymous", anonymous()),
        ("reader", reader()),
        ("writer", writer()),
        ("military", military()),
        ("admin", admin()),
    ]
}

/// No OWS request in progress
pub fn plain(auth: Authentication) -> SecurityContext {
    SecurityContext::new(auth, RequestContext::none())
}

pub fn wms(auth: Authentication, request: &str) -> SecurityContext {
    SecurityContext::new(auth, RequestContext::ows("WMS", request))
}

pub fn wfs(auth: Authentication, request: &str) -> SecurityContext {
    SecurityContext::new(auth, RequestContext::ows("WFS", request))
}

pub fn admin_request(auth: Authentication) -> SecurityContext {
    SecurityContext::new(auth, RequestContext::admin())
}
