// src/flash.rs
//
// One-shot user messages carried across the post/redirect/get cycle in a
// cookie. The payload is JSON, hex-encoded to stay within the cookie charset.

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const FLASH_COOKIE: &str = "importfolio_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Flash {
            level,
            message: message.into(),
        }
    }

    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        json.iter().fold(String::with_capacity(json.len() * 2), |mut out, byte| {
            let _ = write!(out, "{:02x}", byte);
            out
        })
    }

    /// Returns `None` for anything that is not a well-formed encoded flash.
    pub fn decode(value: &str) -> Option<Self> {
        if value.len() % 2 != 0 {
            return None;
        }
        let bytes = (0..value.len())
            .step_by(2)
            .map(|i| value.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
            .collect::<Option<Vec<u8>>>()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn from_request(req: &HttpRequest) -> Option<Self> {
        req.cookie(FLASH_COOKIE)
            .and_then(|cookie| Flash::decode(cookie.value()))
    }

    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build(FLASH_COOKIE, self.encode())
            .path("/")
            .http_only(true)
            .finish()
    }
}

/// Expires the flash cookie in the browser.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// `303 See Other` back to the form, carrying `flash`.
pub fn redirect_with(flash: Flash) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(flash.cookie())
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_encoded_flash_decodes_back() {
        let flash = Flash::new(FlashLevel::Warning, "Too many stocks.\n\n- one; two");
        let encoded = flash.encode();

        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(Flash::decode(&encoded), Some(flash));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(Flash::decode("abc"), None);
        assert_eq!(Flash::decode("zz"), None);
        assert_eq!(Flash::decode("7b7d"), None);
    }

    #[test]
    fn test_redirect_sets_cookie_and_location() {
        let resp = redirect_with(Flash::new(FlashLevel::Danger, "Invalid date format."));

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
        let cookie = resp.cookies().find(|c| c.name() == FLASH_COOKIE).unwrap();
        let flash = Flash::decode(cookie.value()).unwrap();
        assert_eq!(flash.level, FlashLevel::Danger);
        assert_eq!(flash.message, "Invalid date format.");
    }
}
