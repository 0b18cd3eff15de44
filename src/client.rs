//! stripe_card_form/src/client.rs
//!
//! High-level Rust API over the Stripe.js Card Element.
//!
//! This module provides:
//! - `mount_card_element()` to create Stripe, create Elements, and mount a styled Card Element.
//! - `set_card_disabled()` to lock or unlock the card input while a payment is in flight.
//! - `on_card_change()` to receive decoded `CardChange` events from the widget.
//! - `confirm_card_payment()` to confirm a PaymentIntent with the mounted card.
//! - `unmount_card_element()` to tear the widget down again.
//!
//! # Example Usage
//! ```rust,ignore
//! use stripe_card_form::client::{mount_card_element, confirm_card_payment, ConfirmOutcome};
//! use stripe_card_form::config::{CardStyle, ClientSecret, PublishableKey};
//!
//! let key = PublishableKey::new("pk_test_123")?;
//! let secret = ClientSecret::new("pi_123_secret_456")?;
//! let mounted = mount_card_element(&key, &CardStyle::default(), "#card-element")?;
//!
//! wasm_bindgen_futures::spawn_local(async move {
//!     match confirm_card_payment(&mounted.stripe, &mounted.card, &secret).await {
//!         ConfirmOutcome::Confirmed(status) => log::info!("status: {status}"),
//!         ConfirmOutcome::Failed(err) => log::error!("Error: {}", err.message),
//!     }
//! });
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::{Object, Reflect};

use crate::bindings::{new_stripe, JsCardElement, JsElements, JsStripe};
use crate::config::{CardStyle, ClientSecret, PublishableKey};
use crate::error::StripeError;

/// Options for `elements.create("card", ...)`.
#[derive(Serialize, Clone, Debug)]
struct CardElementOptions<'a> {
    style: &'a CardStyle,
}

/// Options for `card.update(...)`.
#[derive(Serialize, Clone, Copy, Debug)]
struct CardUpdate {
    disabled: bool,
}

/// Payload of the Card Element `change` event.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CardChange {
    /// All card fields are filled in and pass client-side checks.
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub empty: bool,
    /// Present while the input is invalid.
    #[serde(default)]
    pub error: Option<StripeError>,
}

impl CardChange {
    pub fn card_valid(&self) -> bool {
        self.complete && self.error.is_none()
    }
}

/// PaymentIntent lifecycle states reported by Stripe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentIntentStatus {
    Succeeded,
    Processing,
    RequiresAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresCapture,
    Canceled,
    Other(String),
}

impl PaymentIntentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Processing => "processing",
            Self::RequiresAction => "requires_action",
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PaymentIntentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "succeeded" => Self::Succeeded,
            "processing" => Self::Processing,
            "requires_action" => Self::RequiresAction,
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_capture" => Self::RequiresCapture,
            "canceled" => Self::Canceled,
            _ => Self::Other(s),
        }
    }
}

impl<'de> Deserialize<'de> for PaymentIntentStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of a PaymentIntent this crate reads.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PaymentIntentSummary {
    #[serde(default)]
    pub id: Option<String>,
    pub status: PaymentIntentStatus,
}

/// Raw `confirmCardPayment` resolution: exactly one of the two is set.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    #[serde(default)]
    pub error: Option<StripeError>,
    #[serde(default)]
    pub payment_intent: Option<PaymentIntentSummary>,
}

/// Strongly-typed outcome of confirming a card payment.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfirmOutcome {
    /// Stripe reported an error (declined, invalid card, network...).
    Failed(StripeError),
    /// Stripe accepted the confirmation; the intent is now in this state.
    Confirmed(PaymentIntentStatus),
}

impl From<ConfirmResponse> for ConfirmOutcome {
    fn from(resp: ConfirmResponse) -> Self {
        match (resp.error, resp.payment_intent) {
            (Some(err), _) => Self::Failed(err),
            (None, Some(intent)) => Self::Confirmed(intent.status),
            (None, None) => Self::Failed(StripeError::from_message(
                "Stripe returned neither an error nor a payment intent.",
            )),
        }
    }
}

/// Handles produced by [`mount_card_element`].
#[derive(Clone, Debug)]
pub struct MountedCard {
    pub stripe: JsStripe,
    pub elements: JsElements,
    pub card: JsCardElement,
}

/// Initialize Stripe.js, create Elements, and mount a styled Card Element.
///
/// # Arguments
///
/// * `publishable_key` – Your Stripe publishable key (starts with `pk_`).
/// * `style` – Card Element style, see [`CardStyle::default`].
/// * `selector` – CSS selector of the mount point, e.g. `"#card-element"`.
pub fn mount_card_element(
    publishable_key: &PublishableKey,
    style: &CardStyle,
    selector: &str,
) -> Result<MountedCard, StripeError> {
    let stripe = new_stripe(publishable_key.as_str()).map_err(js_to_stripe_error)?;
    let elements = stripe.elements().map_err(js_to_stripe_error)?;

    let opts_js = to_js(&CardElementOptions { style })?;
    let card = elements
        .create_element("card", opts_js)
        .map_err(js_to_stripe_error)?;

    card.mount(selector).map_err(js_to_stripe_error)?;
    log::debug!("card element mounted into {selector}");

    Ok(MountedCard { stripe, elements, card })
}

/// Enable or disable the card input.
pub fn set_card_disabled(card: &JsCardElement, disabled: bool) -> Result<(), StripeError> {
    let opts = to_js(&CardUpdate { disabled })?;
    card.update(opts).map_err(js_to_stripe_error)
}

/// Subscribe to the card's `change` event.
///
/// The returned closure must be kept alive for as long as events should be
/// delivered.
pub fn on_card_change(
    card: &JsCardElement,
    mut handler: impl FnMut(CardChange) + 'static,
) -> Result<Closure<dyn FnMut(JsValue)>, StripeError> {
    let closure = Closure::wrap(Box::new(move |event: JsValue| {
        match from_value::<CardChange>(event) {
            Ok(change) => handler(change),
            Err(e) => log::warn!("undecodable card change event: {e}"),
        }
    }) as Box<dyn FnMut(JsValue)>);
    card.on("change", closure.as_ref().unchecked_ref())
        .map_err(js_to_stripe_error)?;
    Ok(closure)
}

/// Confirm a PaymentIntent with the mounted card as its payment method.
///
/// Every failure mode (Stripe error object, thrown exception, rejected
/// promise, malformed result) comes back as [`ConfirmOutcome::Failed`].
pub async fn confirm_card_payment(
    stripe: &JsStripe,
    card: &JsCardElement,
    client_secret: &ClientSecret,
) -> ConfirmOutcome {
    let data = match confirm_card_data(card) {
        Ok(d) => d,
        Err(e) => return ConfirmOutcome::Failed(e),
    };

    let promise = match stripe.confirm_card_payment(client_secret.as_str(), data) {
        Ok(p) => p,
        Err(e) => return ConfirmOutcome::Failed(js_to_stripe_error(e)),
    };

    match JsFuture::from(promise).await {
        Ok(js_val) => match from_value::<ConfirmResponse>(js_val) {
            Ok(resp) => resp.into(),
            Err(e) => ConfirmOutcome::Failed(serde_error_to_stripe_error(e)),
        },
        Err(js_err) => ConfirmOutcome::Failed(js_to_stripe_error(js_err)),
    }
}

/// Tear down a mounted Card Element.
pub fn unmount_card_element(card: &JsCardElement) -> Result<(), StripeError> {
    card.unmount().map_err(js_to_stripe_error)
}

/// `{ payment_method: { card } }`; built by hand because the card is a live
/// JS object, not serializable data.
fn confirm_card_data(card: &JsCardElement) -> Result<JsValue, StripeError> {
    let payment_method = Object::new();
    Reflect::set(&payment_method, &JsValue::from_str("card"), card.as_ref())
        .map_err(js_to_stripe_error)?;
    let data = Object::new();
    Reflect::set(&data, &JsValue::from_str("payment_method"), &payment_method)
        .map_err(js_to_stripe_error)?;
    Ok(data.into())
}

/// Serialize options as plain JS objects; Stripe.js does not accept `Map`s.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, StripeError> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(serde_error_to_stripe_error)
}

/// Convert any caught `JsValue` into a `StripeError` with best effort.
pub(crate) fn js_to_stripe_error(value: JsValue) -> StripeError {
    from_value::<StripeError>(value.clone()).unwrap_or_else(|_| {
        StripeError::from_message(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    })
}

/// Convert a `serde_wasm_bindgen::Error` into `StripeError`.
fn serde_error_to_stripe_error(err: serde_wasm_bindgen::Error) -> StripeError {
    StripeError::from_message(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(value: serde_json::Value) -> ConfirmOutcome {
        serde_json::from_value::<ConfirmResponse>(value).unwrap().into()
    }

    #[test]
    fn declined_card_is_failure_with_message() {
        let out = outcome(json!({
            "error": { "type": "card_error", "code": "card_declined", "message": "Your card was declined." }
        }));
        match out {
            ConfirmOutcome::Failed(err) => {
                assert_eq!(err.message, "Your card was declined.");
                assert_eq!(err.code.as_deref(), Some("card_declined"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn succeeded_intent_is_confirmed() {
        let out = outcome(json!({
            "paymentIntent": { "id": "pi_123", "status": "succeeded", "amount": 2500 }
        }));
        assert_eq!(out, ConfirmOutcome::Confirmed(PaymentIntentStatus::Succeeded));
    }

    #[test]
    fn error_wins_over_intent() {
        let out = outcome(json!({
            "error": { "message": "Authentication failed." },
            "paymentIntent": { "status": "requires_payment_method" }
        }));
        assert!(matches!(out, ConfirmOutcome::Failed(e) if e.message == "Authentication failed."));
    }

    #[test]
    fn empty_response_is_failure() {
        assert!(matches!(outcome(json!({})), ConfirmOutcome::Failed(_)));
    }

    #[test]
    fn unknown_status_is_preserved() {
        let out = outcome(json!({ "paymentIntent": { "status": "requires_reauth" } }));
        assert_eq!(
            out,
            ConfirmOutcome::Confirmed(PaymentIntentStatus::Other("requires_reauth".into()))
        );
    }

    #[test]
    fn status_strings_round_through_display() {
        for s in [
            "succeeded",
            "processing",
            "requires_action",
            "requires_payment_method",
            "requires_confirmation",
            "requires_capture",
            "canceled",
        ] {
            assert_eq!(PaymentIntentStatus::from(s.to_string()).to_string(), s);
        }
        assert_eq!(
            PaymentIntentStatus::from("requires_action".to_string()),
            PaymentIntentStatus::RequiresAction
        );
    }

    #[test]
    fn card_change_decodes_error_and_validity() {
        let change: CardChange = serde_json::from_value(json!({
            "elementType": "card",
            "empty": false,
            "complete": false,
            "brand": "visa",
            "error": { "type": "validation_error", "code": "incomplete_number", "message": "Your card number is incomplete." }
        }))
        .unwrap();
        assert!(!change.card_valid());
        assert_eq!(
            change.error.as_ref().map(|e| e.message.as_str()),
            Some("Your card number is incomplete.")
        );

        let ok: CardChange =
            serde_json::from_value(json!({ "complete": true, "empty": false })).unwrap();
        assert!(ok.card_valid());
        assert!(ok.error.is_none());
    }
}
