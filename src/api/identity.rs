use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

use crate::model::role::Role;

/// Identity established by the authentication gateway in front of this
/// service. The gateway owns credentials and tokens; what reaches us is its
/// verdict, forwarded as trusted headers on the internal network.
pub struct Identity {
    pub employee_id: u64,
    pub role: Role,
}

const EMPLOYEE_HEADER: &str = "X-Employee-Id";
const ROLE_HEADER: &str = "X-Role";

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let employee_id = match header(req, EMPLOYEE_HEADER).and_then(|v| v.parse::<u64>().ok()) {
            Some(id) => id,
            None => return ready(Err(ErrorUnauthorized("Missing employee identity"))),
        };

        let role = match header(req, ROLE_HEADER)
            .and_then(|v| v.parse::<u8>().ok())
            .and_then(Role::from_id)
        {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(Identity { employee_id, role }))
    }
}

impl Identity {
    /// The external authorization verdict consumed by the approve flow.
    pub fn can_approve(&self) -> bool {
        self.role.can_approve()
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|h| h.to_str().ok())
}
