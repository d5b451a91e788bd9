//! Role gate for route handlers.
//!
//! Place [`Authorized`] first in a handler's arguments. Extractors run in
//! argument order, so anonymous or under-privileged callers are turned away
//! before the body or path is parsed.

use super::ClientCtx;
use crate::role::{Role, ADMIN_ONLY, USER_OR_ADMIN};
use crate::session::Caller;
use crate::web::error::ApiError;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use std::marker::PhantomData;

/// Roles an endpoint accepts.
pub trait Policy {
    const ROLES: &'static [Role];
}

/// Any registered member.
pub struct AnyMember;

impl Policy for AnyMember {
    const ROLES: &'static [Role] = USER_OR_ADMIN;
}

/// Administrators only.
pub struct AdminOnly;

impl Policy for AdminOnly {
    const ROLES: &'static [Role] = ADMIN_ONLY;
}

/// A caller that passed the `P` role check.
pub struct Authorized<P> {
    pub caller: Caller,
    pub client: ClientCtx,
    _policy: PhantomData<P>,
}

impl<P: Policy> FromRequest for Authorized<P> {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let client = ClientCtx::get_or_default_from_extensions(&mut req.extensions_mut());
        let result = client.require_any_role(P::ROLES).map(Caller::clone);
        ready(result.map(|caller| Authorized {
            caller,
            client,
            _policy: PhantomData,
        }))
    }
}
