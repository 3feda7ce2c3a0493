//! Anonymous visitor identity.
//!
//! A visitor is identified by a UUID carried in the `sf_visitor` cookie as
//! `{uuid}.{signature}`, where the signature is the hex HMAC-SHA256 of the
//! uuid bytes keyed with the visitor secret. Missing or tampered cookies get
//! a fresh identity, which the handler hands back with `Set-Cookie`.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::convert::Infallible;
use uuid::Uuid;

use crate::config::SameSite;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const VISITOR_COOKIE: &str = "sf_visitor";
const COOKIE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visitor {
    pub id: Uuid,
    /// True when the identity was minted for this request.
    pub is_new: bool,
}

fn mac_for(secret: &str, id: &Uuid) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(id.as_bytes());
    Some(mac)
}

pub fn encode_token(secret: &str, id: &Uuid) -> Option<String> {
    let signature = mac_for(secret, id)?.finalize().into_bytes();
    Some(format!("{}.{}", id, hex::encode(signature)))
}

pub fn decode_token(secret: &str, token: &str) -> Option<Uuid> {
    let (raw_id, signature) = token.split_once('.')?;
    let id = Uuid::parse_str(raw_id).ok()?;
    let signature = hex::decode(signature).ok()?;
    mac_for(secret, &id)?.verify_slice(&signature).ok()?;
    Some(id)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

impl Visitor {
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Self {
        match cookie_value(headers, VISITOR_COOKIE).and_then(|t| decode_token(secret, t)) {
            Some(id) => Self { id, is_new: false },
            None => Self {
                id: Uuid::new_v4(),
                is_new: true,
            },
        }
    }

    fn cookie_header(&self, secret: &str, same_site: SameSite, secure: bool) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite={}",
            VISITOR_COOKIE,
            encode_token(secret, &self.id)?,
            COOKIE_MAX_AGE_SECS,
            same_site.as_str()
        );
        // Browsers drop SameSite=None cookies that are not Secure.
        if secure || same_site == SameSite::None {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }

    /// Attach `Set-Cookie` to the response when this visitor is new.
    pub fn respond(&self, state: &AppState, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.is_new {
            let config = &state.config;
            if let Some(value) = self.cookie_header(
                &config.visitor_secret,
                config.cookie_same_site,
                config.is_production(),
            ) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

impl FromRequestParts<AppState> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Visitor::from_headers(
            &parts.headers,
            &state.config.visitor_secret,
        ))
    }
}
