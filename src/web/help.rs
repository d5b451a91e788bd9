//! Help request endpoints under `/api/help`.
//!
//! Every handler takes an [`Authorized`] caller as its first argument, so the
//! role check runs before the body or path is parsed. Clients authenticate with
//! the `x-auth-token` header.

use super::error::ApiError;
use super::response::GenericResponse;
use crate::app_config::AppConfig;
use crate::file::{save_field_as_temp_file, UploadedFile};
use crate::help::service::ContributionDraft;
use crate::help::{Help, HelpDraft, HelpError, HelpService};
use crate::middleware::{AdminOnly, AnyMember, Authorized};
use crate::session::Caller;
use actix_multipart::{Field, Multipart};
use actix_web::{get, post, put, web, HttpResponse};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // `view_help` must stay last; `/{id}` would shadow the other GET routes.
    conf.service(list_helps)
        .service(edit_help)
        .service(save_help)
        .service(save_help_resource)
        .service(view_help_resources)
        .service(list_help_types)
        .service(add_help_type)
        .service(add_help_contribution)
        .service(view_help_contributions)
        .service(add_help_comment)
        .service(view_help_comments)
        .service(view_help);
}

const INVALID_ID: &str = "Invalid Id";
const INVALID_INPUT: &str = "Invalid Input detected.";
const CHECK_INPUT: &str = "Please check input values";
const HELP_NOT_FOUND: &str = "The help doesn't exist.";
/// Upper bound on plain multipart fields such as `helpId`.
const MAX_TEXT_FIELD_BYTES: usize = 64;

/// Rejects non-positive ids from the path.
fn valid_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::InvalidArgument(INVALID_ID.to_owned()));
    }
    Ok(id)
}

#[derive(Debug, Deserialize, Validate)]
pub struct HelpForm {
    /// Only read by `PUT`; `POST` always creates.
    pub id: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 10000, message = "must be between 1 and 10000 characters"))]
    pub description: String,
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub help_type_id: Option<i32>,
    /// Accepted for compatibility and ignored; the owner is always the caller.
    pub member_id: Option<i32>,
}

impl HelpForm {
    /// Trimmed before validation so whitespace-only text counts as empty.
    fn trim(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
    }

    fn draft(self) -> HelpDraft {
        HelpDraft {
            title: self.title,
            description: self.description,
            help_type_id: self.help_type_id,
        }
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct HelpTypeForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: String,
}

impl HelpTypeForm {
    fn trim(&mut self) {
        trim_in_place(&mut self.name);
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContributionForm {
    #[validate(required(message = "is required"), range(min = 1, message = "must be a positive id"))]
    pub help_id: Option<i32>,
    #[validate(required(message = "is required"), range(min = 1, message = "must be a positive id"))]
    pub help_type_id: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "must be between 1 and 5000 characters"))]
    pub message: String,
    /// Ignored; the contributor is always the caller.
    pub member_id: Option<i32>,
}

impl ContributionForm {
    fn trim(&mut self) {
        trim_in_place(&mut self.message);
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(required(message = "is required"), range(min = 1, message = "must be a positive id"))]
    pub help_id: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "must be between 1 and 5000 characters"))]
    pub comment: String,
}

impl CommentForm {
    fn trim(&mut self) {
        trim_in_place(&mut self.comment);
    }
}

/// Reported when a multi-file upload stops part way.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadReport {
    /// Storage keys uploaded before the failure
    pub uploaded: Vec<String>,
    /// Original name of the file that failed
    pub failed: String,
}

#[get("/api/help")]
async fn list_helps(
    _auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
) -> Result<HttpResponse, ApiError> {
    let helps = service.get_all().await?;
    Ok(HttpResponse::Ok().json(helps))
}

/// Update a help owned by the caller (any help for administrators). A body
/// without an id creates one owned by the caller.
#[put("/api/help")]
async fn edit_help(
    auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    form: web::Json<HelpForm>,
) -> Result<HttpResponse, ApiError> {
    let mut form = form.into_inner();
    form.trim();
    form.validate()?;

    let caller = &auth.caller;
    let id = form.id;
    let help = match id {
        Some(id) => service.update(valid_id(id)?, caller, form.draft()).await?,
        None => service.create(caller.member_id, form.draft()).await?,
    };
    Ok(HttpResponse::Ok().json(help))
}

#[post("/api/help")]
async fn save_help(
    auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    form: web::Json<HelpForm>,
) -> Result<HttpResponse, ApiError> {
    let mut form = form.into_inner();
    form.trim();
    form.validate()?;

    let help = service.create(auth.caller.member_id, form.draft()).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok(help)))
}

/// Loads a help the caller may attach resources to.
async fn modifiable_help(
    service: &HelpService,
    help_id: i32,
    caller: &Caller,
) -> Result<Help, ApiError> {
    let help = service
        .get_help_with_resources(help_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(HELP_NOT_FOUND.to_owned()))?;
    HelpService::ensure_can_modify(&help, caller)?;
    Ok(help)
}

async fn read_text_field(field: &mut Field) -> Result<String, ApiError> {
    let mut buf: Vec<u8> = Vec::with_capacity(16);
    while let Some(chunk) = field.try_next().await.map_err(|e| {
        log::error!("save_help_resource: multipart read error: {}", e);
        ApiError::bad_request(INVALID_INPUT)
    })? {
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(ApiError::bad_request(INVALID_INPUT));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| ApiError::bad_request(INVALID_INPUT))
}

/// Attach uploaded files to a help.
///
/// Multipart fields: `resourceFile` (repeatable) and `helpId`. When `helpId`
/// comes first the help and the caller's rights are checked before any file
/// is buffered.
#[post("/api/help/resources")]
async fn save_help_resource(
    auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    config: Option<web::Data<AppConfig>>,
    mut payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let caller = &auth.caller;
    let limits = config
        .map(|c| c.limits.clone())
        .unwrap_or_default();
    let max_bytes = limits.max_upload_bytes();

    let mut files: Vec<UploadedFile> = Vec::new();
    let mut help: Option<Help> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        log::error!("save_help_resource: multipart read error: {}", e);
        ApiError::bad_request(INVALID_INPUT)
    })? {
        let field_name = field.content_disposition().get_name().map(str::to_owned);
        match field_name.as_deref() {
            Some("resourceFile") => {
                if files.len() >= limits.max_files_per_upload {
                    return Err(ApiError::bad_request(&format!(
                        "At most {} files may be uploaded at once.",
                        limits.max_files_per_upload
                    ))
                    .into());
                }
                if let Some(file) = save_field_as_temp_file(&mut field, max_bytes).await? {
                    files.push(file);
                }
            }
            Some("helpId") => {
                let help_id = read_text_field(&mut field)
                    .await?
                    .trim()
                    .parse::<i32>()
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or_else(|| ApiError::bad_request(INVALID_INPUT))?;
                help = Some(modifiable_help(&service, help_id, caller).await?);
            }
            _ => {
                // Drain fields we do not understand.
                while field
                    .try_next()
                    .await
                    .map_err(|_| ApiError::bad_request(INVALID_INPUT))?
                    .is_some()
                {}
            }
        }
    }

    let help = match help {
        Some(help) if !files.is_empty() => help,
        _ => return Err(ApiError::bad_request(INVALID_INPUT).into()),
    };

    let help_id = help.id;
    let count = files.len();
    match service.attach_resources(help, files).await {
        Ok(help) => {
            log::debug!(
                "Stored {} file(s) for help {:?} in {:?}",
                count,
                help_id,
                auth.client.request_time()
            );
            Ok(HttpResponse::Ok().json(GenericResponse::ok(help)))
        }
        Err(HelpError::Upload(failure)) => {
            let message = format!("Upload of '{}' failed.", failure.failed);
            Ok(HttpResponse::InternalServerError().json(
                GenericResponse::failure(vec![message]).with_object(UploadReport {
                    uploaded: failure.uploaded,
                    failed: failure.failed,
                }),
            ))
        }
        Err(e) => Err(ApiError::from(e).into()),
    }
}

#[get("/api/help/resources/{help_id}")]
async fn view_help_resources(
    _auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    help_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let help_id = valid_id(help_id.into_inner())?;

    let resources = service.get_resources(help_id).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok(resources)))
}

#[get("/api/help/helptype")]
async fn list_help_types(
    _auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
) -> Result<HttpResponse, ApiError> {
    let types = service.get_help_types().await?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok(types)))
}

#[post("/api/help/helptype")]
async fn add_help_type(
    _auth: Authorized<AdminOnly>,
    service: web::Data<HelpService>,
    form: web::Json<HelpTypeForm>,
) -> Result<HttpResponse, ApiError> {
    let mut form = form.into_inner();
    form.trim();
    form.validate()?;

    service.save_help_type(&form.name).await?;
    Ok(HttpResponse::Created().finish())
}

/// Offer assistance on a help.
///
/// Sample body: `{"help_id":1, "help_type_id":1, "message":"I want to help"}`
#[post("/api/help/support")]
async fn add_help_contribution(
    auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    form: web::Json<ContributionForm>,
) -> Result<HttpResponse, ApiError> {
    let mut form = form.into_inner();
    form.trim();
    form.validate()?;

    let (help_id, help_type_id) = match (form.help_id, form.help_type_id) {
        (Some(help_id), Some(help_type_id)) => (help_id, help_type_id),
        _ => return Err(ApiError::bad_request(CHECK_INPUT)),
    };

    let draft = ContributionDraft {
        help_id,
        help_type_id,
        message: form.message,
    };
    match service.save_contribution(auth.caller.member_id, draft).await? {
        Some(_) => Ok(HttpResponse::Created().finish()),
        None => Err(ApiError::bad_request(CHECK_INPUT)),
    }
}

#[get("/api/help/support/{help_id}")]
async fn view_help_contributions(
    _auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    help_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let help_id = valid_id(help_id.into_inner())?;

    let contributions = service
        .get_contributions(help_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(HELP_NOT_FOUND.to_owned()))?;
    Ok(HttpResponse::Ok().json(GenericResponse::ok(contributions)))
}

/// Comment on a help. Comments share storage with attachments.
#[post("/api/help/comments")]
async fn add_help_comment(
    _auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    form: web::Json<CommentForm>,
) -> Result<HttpResponse, ApiError> {
    let mut form = form.into_inner();
    form.trim();
    form.validate()?;

    let help_id = form
        .help_id
        .ok_or_else(|| ApiError::bad_request(CHECK_INPUT))?;

    match service.save_help_resource(help_id, &form.comment).await? {
        Some(comment) => Ok(HttpResponse::Created().json(GenericResponse::ok(comment))),
        None => Err(ApiError::bad_request(CHECK_INPUT)),
    }
}

#[get("/api/help/comments/{help_id}")]
async fn view_help_comments(
    _auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    help_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let help_id = valid_id(help_id.into_inner())?;

    let comments = service
        .get_comments(help_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(HELP_NOT_FOUND.to_owned()))?;
    Ok(HttpResponse::Ok().json(GenericResponse::object(comments)))
}

#[get("/api/help/{id}")]
async fn view_help(
    _auth: Authorized<AnyMember>,
    service: web::Data<HelpService>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = valid_id(id.into_inner())?;

    let help = service
        .get_help_with_resources(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(HELP_NOT_FOUND.to_owned()))?;
    Ok(HttpResponse::Ok().json(help))
}
