use crate::role::Role;
use crate::session::{Authenticator, Caller, AUTH_TOKEN_HEADER};
use crate::web::error::ApiError;
use actix_web::dev::{self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Client data stored for a single request cycle.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// Authenticated member. None is an anonymous caller.
    pub caller: Option<Caller>,
    /// Set when a token was supplied but could not be checked.
    pub auth_failed: bool,
    /// Time the request started.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            caller: None,
            auth_failed: false,
            request_start: Instant::now(),
        }
    }
}

impl ClientCtxInner {
    /// Resolves the request's auth token header, if any.
    pub async fn from_token(token: Option<String>, auth: Option<Data<dyn Authenticator>>) -> Self {
        let (caller, auth_failed) = match (token, auth) {
            (Some(token), Some(auth)) => match auth.authenticate(&token).await {
                Ok(caller) => {
                    if caller.is_none() {
                        log::debug!("Rejected unknown or expired auth token");
                    }
                    (caller, false)
                }
                Err(err) => {
                    log::error!("Unable to authenticate request: {}", err);
                    (None, true)
                }
            },
            (Some(_), None) => {
                log::error!("Auth token supplied but no authenticator is registered");
                (None, true)
            }
            _ => (None, false),
        };

        ClientCtxInner {
            caller,
            auth_failed,
            ..Default::default()
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    pub fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            // Existing record in extensions; pull it and return clone.
            Some(cbox) => Self(cbox.clone()),
            // No existing record; create and insert it.
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    pub fn get_caller(&self) -> Option<&Caller> {
        self.0.caller.as_ref()
    }

    /// Require an authenticated caller holding at least one of `roles`.
    /// Anonymous callers get 401, callers without a matching role 403.
    /// A token that could not be checked is a server fault, not a 401.
    pub fn require_any_role(&self, roles: &[Role]) -> Result<&Caller, ApiError> {
        if self.0.auth_failed {
            return Err(ApiError::Internal);
        }
        let caller = self.get_caller().ok_or(ApiError::Unauthorized)?;
        if !caller.has_any_role(roles) {
            log::debug!(
                "Member {} lacks any of {:?}",
                caller.member_id,
                roles
            );
            return Err(ApiError::Forbidden);
        }
        Ok(caller)
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        let token = req
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let auth = req.app_data::<Data<dyn Authenticator>>().cloned();

        Box::pin(async move {
            let inner = ClientCtxInner::from_token(token, auth).await;
            req.extensions_mut().insert(Data::new(inner));

            svc.call(req).await
        })
    }
}
