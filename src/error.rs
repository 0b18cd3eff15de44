//! Error types.
//!
//! [`StripeError`] mirrors the error object Stripe.js hands back from card
//! validation events and `confirmCardPayment`. [`CheckoutError`] covers
//! everything that can go wrong while wiring the checkout into a page.

use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Representation of a Stripe.js error object.
#[derive(Clone, Debug, PartialEq, Deserialize, Error)]
#[error("{message}")]
pub struct StripeError {
    /// Human-readable message, shown to the customer as-is.
    pub message: String,
    /// Stripe’s error type, e.g. `"card_error"` or `"validation_error"`.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Optional Stripe error code, e.g. `"card_declined"`.
    #[serde(default)]
    pub code: Option<String>,
}

impl StripeError {
    /// An error carrying only a message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            code: None,
        }
    }
}

/// Failures while attaching the checkout to a page.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("no `window.document` available")]
    NoDocument,

    #[error("element `#{0}` not found")]
    MissingElement(String),

    #[error("element `#{id}` is not a {expected}")]
    WrongElementType { id: String, expected: &'static str },

    #[error("text of `#{id}` is too short to carry a wrapped value")]
    WrappedValue { id: String },

    #[error("{0} must not be empty")]
    EmptyValue(&'static str),

    #[error("stripe: {0}")]
    Stripe(#[from] StripeError),

    #[error("javascript: {0}")]
    Js(String),
}

impl CheckoutError {
    /// Wrap an arbitrary thrown JS value.
    pub fn js(value: JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<CheckoutError> for JsValue {
    fn from(err: CheckoutError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripe_error_decodes_type_and_code() {
        let err: StripeError = serde_json::from_value(serde_json::json!({
            "type": "card_error",
            "code": "card_declined",
            "message": "Your card was declined.",
            "decline_code": "generic_decline"
        }))
        .unwrap();
        assert_eq!(err.message, "Your card was declined.");
        assert_eq!(err.error_type.as_deref(), Some("card_error"));
        assert_eq!(err.code.as_deref(), Some("card_declined"));
        assert_eq!(err.to_string(), "Your card was declined.");
    }

    #[test]
    fn stripe_error_requires_message() {
        let res = serde_json::from_value::<StripeError>(serde_json::json!({ "code": "x" }));
        assert!(res.is_err());
    }

    #[test]
    fn checkout_error_messages() {
        assert_eq!(
            CheckoutError::MissingElement("card-errors".into()).to_string(),
            "element `#card-errors` not found"
        );
        assert_eq!(
            CheckoutError::EmptyValue("publishable key").to_string(),
            "publishable key must not be empty"
        );
        let wrapped: CheckoutError = StripeError::from_message("boom").into();
        assert_eq!(wrapped.to_string(), "stripe: boom");
    }
}
