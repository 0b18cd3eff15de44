//! Page configuration: element ids, card styling and the key/secret values the
//! server renders into the page.

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// DOM ids the checkout binds to.
///
/// Deserializable with defaults, so JS callers may pass a partial object such
/// as `{ form: "order-form" }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    /// Element whose text holds the wrapped publishable key.
    pub public_key: String,
    /// Element whose text holds the wrapped client secret.
    pub client_secret: String,
    /// Container the card widget mounts into.
    pub card_mount: String,
    /// Region receiving validation and confirmation errors.
    pub card_errors: String,
    pub form: String,
    pub submit_button: String,
    pub loading_overlay: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            public_key: "id_stripe_public_key".into(),
            client_secret: "id_client_secret".into(),
            card_mount: "card-element".into(),
            card_errors: "card-errors".into(),
            form: "payment-form".into(),
            submit_button: "submit-button".into(),
            loading_overlay: "loading-overlay".into(),
        }
    }
}

impl ElementIds {
    /// CSS selector for the card mount point, as `card.mount()` expects.
    pub fn card_selector(&self) -> String {
        format!("#{}", self.card_mount)
    }
}

/// Styling for one state of the Card Element (`base`, `invalid`, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStateStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_smoothing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(rename = "::placeholder", skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Box<CardStateStyle>>,
    /// Any other Stripe style property or pseudo-class (e.g. `:-webkit-autofill`).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `style` option for `elements.create("card", { style })`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardStyle {
    pub base: CardStateStyle,
    pub invalid: CardStateStyle,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            base: CardStateStyle {
                color: Some("#000".into()),
                font_family: Some(r#""Helvetica Neue", Helvetica, sans-serif"#.into()),
                font_smoothing: Some("antialiased".into()),
                font_size: Some("16px".into()),
                placeholder: Some(Box::new(CardStateStyle {
                    color: Some("#aab7c4".into()),
                    ..Default::default()
                })),
                ..Default::default()
            },
            invalid: CardStateStyle {
                color: Some("#dc3545".into()),
                icon_color: Some("#dc3545".into()),
                ..Default::default()
            },
        }
    }
}

/// Everything [`crate::dom::attach`] needs besides the page itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub ids: ElementIds,
    pub style: CardStyle,
    /// Name of the hidden form field that carries the client secret to the
    /// server. `None` leaves the form untouched.
    pub secret_field: Option<String>,
}

impl CheckoutConfig {
    pub const DEFAULT_SECRET_FIELD: &'static str = "client_secret";
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            ids: ElementIds::default(),
            style: CardStyle::default(),
            secret_field: Some(Self::DEFAULT_SECRET_FIELD.into()),
        }
    }
}

/// A Stripe publishable key (`pk_...`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishableKey(String);

impl PublishableKey {
    pub fn new(key: impl Into<String>) -> Result<Self, CheckoutError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CheckoutError::EmptyValue("publishable key"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A PaymentIntent client secret (`pi_..._secret_...`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, CheckoutError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CheckoutError::EmptyValue("client secret"));
        }
        Ok(Self(secret))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The PaymentIntent id the secret belongs to: everything before
    /// `_secret`. Returns the whole secret when the marker is absent.
    pub fn payment_intent_id(&self) -> &str {
        self.0
            .split_once("_secret")
            .map_or(self.0.as_str(), |(id, _)| id)
    }
}

/// Strip the single wrapping character from each end of a rendered value
/// (`"\"pk_test_123\""` → `pk_test_123`).
///
/// Returns `None` when there are fewer than two characters to strip.
pub fn unwrap_rendered(text: &str) -> Option<&str> {
    let mut chars = text.chars();
    chars.next()?;
    chars.next_back()?;
    Some(chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_strips_one_char_each_side() {
        assert_eq!(unwrap_rendered("\"pk_test_123\""), Some("pk_test_123"));
        assert_eq!(unwrap_rendered("\"cs_test_abc\""), Some("cs_test_abc"));
        assert_eq!(unwrap_rendered("\"\"\""), Some("\""));
        assert_eq!(unwrap_rendered("\"\""), Some(""));
    }

    #[test]
    fn unwrap_keeps_inner_whitespace() {
        assert_eq!(unwrap_rendered(" \"pk\" "), Some("\"pk\""));
        assert_eq!(unwrap_rendered("\" cs_test_abc \""), Some(" cs_test_abc "));
    }

    #[test]
    fn unwrap_rejects_short_text() {
        assert_eq!(unwrap_rendered(""), None);
        assert_eq!(unwrap_rendered("\""), None);
    }

    #[test]
    fn unwrap_handles_multibyte_wrappers() {
        assert_eq!(unwrap_rendered("«abc»"), Some("abc"));
    }

    #[test]
    fn empty_key_and_secret_are_rejected() {
        assert!(matches!(
            PublishableKey::new(""),
            Err(CheckoutError::EmptyValue("publishable key"))
        ));
        assert!(matches!(
            ClientSecret::new(String::new()),
            Err(CheckoutError::EmptyValue("client secret"))
        ));
        assert_eq!(PublishableKey::new("pk_test_123").unwrap().as_str(), "pk_test_123");
    }

    #[test]
    fn payment_intent_id_is_prefix_before_secret() {
        let secret = ClientSecret::new("pi_3Nabc_secret_XYZ").unwrap();
        assert_eq!(secret.payment_intent_id(), "pi_3Nabc");
        let opaque = ClientSecret::new("cs_test_abc").unwrap();
        assert_eq!(opaque.payment_intent_id(), "cs_test_abc");
    }

    #[test]
    fn partial_ids_fill_in_defaults() {
        let ids: ElementIds =
            serde_json::from_value(serde_json::json!({ "form": "order-form" })).unwrap();
        assert_eq!(ids.form, "order-form");
        assert_eq!(ids.card_errors, "card-errors");
        assert_eq!(ids.card_selector(), "#card-element");
    }

    #[test]
    fn default_style_serializes_like_stripe_expects() {
        let value = serde_json::to_value(CardStyle::default()).unwrap();
        assert_eq!(value["base"]["color"], "#000");
        assert_eq!(value["base"]["fontSmoothing"], "antialiased");
        assert_eq!(value["base"]["fontSize"], "16px");
        assert_eq!(value["base"]["::placeholder"]["color"], "#aab7c4");
        assert_eq!(value["invalid"]["iconColor"], "#dc3545");
        assert!(value["base"].get("iconColor").is_none());
    }

    #[test]
    fn extra_style_properties_are_flattened() {
        let style: CardStyle = serde_json::from_value(serde_json::json!({
            "base": { "color": "#32325d", ":-webkit-autofill": { "color": "#fce883" } },
            "invalid": {}
        }))
        .unwrap();
        assert_eq!(style.base.color.as_deref(), Some("#32325d"));
        let value = serde_json::to_value(&style).unwrap();
        assert_eq!(value["base"][":-webkit-autofill"]["color"], "#fce883");
        assert_eq!(value["invalid"], serde_json::json!({}));
    }

    #[test]
    fn partial_config_keeps_secret_field() {
        let config: CheckoutConfig =
            serde_json::from_value(serde_json::json!({ "ids": { "form": "order-form" } })).unwrap();
        assert_eq!(config.secret_field.as_deref(), Some("client_secret"));
        assert_eq!(config.ids.form, "order-form");
        assert_eq!(config.style, CardStyle::default());

        let opted_out: CheckoutConfig =
            serde_json::from_value(serde_json::json!({ "secret_field": null })).unwrap();
        assert_eq!(opted_out.secret_field, None);
    }
}
