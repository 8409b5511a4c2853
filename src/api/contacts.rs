//! Contact endpoints
//!
//! `GET /api/contacts/{id}` is the conditional read: the client's
//! `If-None-Match` token is resolved against the snapshot cache and the
//! store, and the answer is 200 with an `ETag`, 304 with the same `ETag` and
//! no body, or 404 with no body.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json as JsonResponse,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireUserKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{Contact, EncodedVersionToken, Resolution};
use crate::infrastructure::services::{CreateContactRequest, UpdateContactRequest};

/// Request to create a new contact
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactApiRequest {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_family_member: bool,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub anniversary_date: Option<NaiveDate>,
}

/// Request to update a contact; omitted fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactApiRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_family_member: Option<bool>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub mobile_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub anniversary_date: Option<NaiveDate>,
}

/// List contacts response
#[derive(Debug, Clone, Serialize)]
pub struct ListContactsResponse {
    pub contacts: Vec<Contact>,
    pub total: usize,
}

/// First value of a token-carrying precondition header, trimmed
///
/// Repeated headers and comma-joined lists both yield their first entry. A
/// value that is not valid UTF-8, or is empty, counts as no token.
pub fn precondition_token(headers: &HeaderMap, name: HeaderName) -> Option<EncodedVersionToken> {
    let raw = headers.get_all(name).iter().next()?.to_str().ok()?;
    let first = raw.split(',').next()?;

    EncodedVersionToken::parse(first)
}

fn etag_header(etag: &EncodedVersionToken) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(etag.as_str())
        .map_err(|_| ApiError::internal(format!("Version token '{}' is not a valid header", etag)))
}

fn with_etag(mut response: Response, etag: Option<&EncodedVersionToken>) -> Response {
    if let Some(etag) = etag {
        match etag_header(etag) {
            Ok(value) => {
                response.headers_mut().insert(header::ETAG, value);
            }
            Err(e) => return e.into_response(),
        }
    }

    response
}

/// GET /api/contacts/{contact_id}
pub async fn get_contact(
    State(state): State<AppState>,
    RequireUserKey(_): RequireUserKey,
    Path(contact_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller_token = precondition_token(&headers, header::IF_NONE_MATCH);

    debug!(
        contact_id = %contact_id,
        if_none_match = caller_token.as_ref().map(|t| t.as_str()).unwrap_or("-"),
        "Conditional contact read"
    );

    match state
        .contact_service
        .get_conditional(&contact_id, caller_token.as_ref())
        .await
    {
        Ok(Resolution::Modified { entity, etag }) => {
            with_etag(JsonResponse(entity).into_response(), etag.as_ref())
        }
        Ok(Resolution::NotModified { etag }) => {
            with_etag(StatusCode::NOT_MODIFIED.into_response(), Some(&etag))
        }
        Err(e) if e.is_not_found() => StatusCode::NOT_FOUND.into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET /api/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    RequireUserKey(_): RequireUserKey,
) -> Result<JsonResponse<ListContactsResponse>, ApiError> {
    debug!("Listing contacts");

    let contacts = state.contact_service.list().await?;
    let total = contacts.len();

    Ok(JsonResponse(ListContactsResponse { contacts, total }))
}

/// POST /api/contacts
pub async fn create_contact(
    State(state): State<AppState>,
    RequireUserKey(_): RequireUserKey,
    Json(request): Json<CreateContactApiRequest>,
) -> Result<Response, ApiError> {
    debug!(contact_id = %request.id, "Creating contact");

    let contact = state
        .contact_service
        .create(CreateContactRequest {
            id: request.id,
            first_name: request.first_name,
            last_name: request.last_name,
            is_family_member: request.is_family_member,
            company: request.company,
            job_title: request.job_title,
            email: request.email,
            mobile_phone: request.mobile_phone,
            date_of_birth: request.date_of_birth,
            anniversary_date: request.anniversary_date,
        })
        .await?;

    let location = HeaderValue::from_str(&format!("/api/contacts/{}", contact.id()))
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let etag = contact.row_version().encode();

    let mut response = (StatusCode::CREATED, JsonResponse(contact)).into_response();
    response.headers_mut().insert(header::LOCATION, location);

    Ok(with_etag(response, etag.as_ref()))
}

/// PUT /api/contacts/{contact_id}
///
/// An `If-Match` token (other than `*`) makes the update conditional on the
/// stored version.
pub async fn update_contact(
    State(state): State<AppState>,
    RequireUserKey(_): RequireUserKey,
    Path(contact_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateContactApiRequest>,
) -> Result<Response, ApiError> {
    let expected = precondition_token(&headers, header::IF_MATCH).filter(|t| t.as_str() != "*");

    debug!(contact_id = %contact_id, conditional = expected.is_some(), "Updating contact");

    let contact = state
        .contact_service
        .update(
            &contact_id,
            UpdateContactRequest {
                first_name: request.first_name,
                last_name: request.last_name,
                is_family_member: request.is_family_member,
                company: request.company,
                job_title: request.job_title,
                email: request.email,
                mobile_phone: request.mobile_phone,
                date_of_birth: request.date_of_birth,
                anniversary_date: request.anniversary_date,
            },
            expected.as_ref(),
        )
        .await?;

    let etag = contact.row_version().encode();
    Ok(with_etag(JsonResponse(contact).into_response(), etag.as_ref()))
}

/// DELETE /api/contacts/{contact_id}
pub async fn delete_contact(
    State(state): State<AppState>,
    RequireUserKey(_): RequireUserKey,
    Path(contact_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!(contact_id = %contact_id, "Deleting contact");

    if state.contact_service.delete(&contact_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Contact '{}' not found", contact_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_token_absent() {
        assert!(precondition_token(&HeaderMap::new(), header::IF_NONE_MATCH).is_none());
    }

    #[test]
    fn test_precondition_token_trims_and_ignores_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, "  AQI=  ".parse().unwrap());
        assert_eq!(
            precondition_token(&headers, header::IF_NONE_MATCH).unwrap().as_str(),
            "AQI="
        );

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, "   ".parse().unwrap());
        assert!(precondition_token(&headers, header::IF_NONE_MATCH).is_none());
    }

    #[test]
    fn test_precondition_token_takes_first_value() {
        let mut headers = HeaderMap::new();
        headers.append(header::IF_NONE_MATCH, "AQI=, AQM=".parse().unwrap());
        headers.append(header::IF_NONE_MATCH, "AQQ=".parse().unwrap());

        assert_eq!(
            precondition_token(&headers, header::IF_NONE_MATCH).unwrap().as_str(),
            "AQI="
        );
    }

    #[test]
    fn test_precondition_token_non_utf8_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );

        assert!(precondition_token(&headers, header::IF_NONE_MATCH).is_none());
    }

    #[test]
    fn test_update_request_partial_fields() {
        let request: UpdateContactApiRequest =
            serde_json::from_str(r#"{"jobTitle":"Engineer"}"#).unwrap();

        assert_eq!(request.job_title.as_deref(), Some("Engineer"));
        assert!(request.first_name.is_none());
    }
}
