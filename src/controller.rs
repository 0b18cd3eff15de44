//! The payment form state machine.
//!
//! [`PaymentFormController`] owns one checkout page's submission lifecycle. It
//! talks to the page only through [`CheckoutView`], so the same logic drives the
//! server-rendered DOM adapter in `dom.rs` and can be exercised natively in
//! tests. The asynchronous confirmation itself happens outside: the caller
//! takes the secret handed out by [`PaymentFormController::on_form_submit`],
//! awaits `confirm_card_payment`, and feeds the result back through
//! [`PaymentFormController::on_confirm_outcome`].

use crate::client::{CardChange, ConfirmOutcome, PaymentIntentStatus};
use crate::config::ClientSecret;

/// Page operations the controller needs.
pub trait CheckoutView {
    /// Replace the error region's contents with an alert for `message`.
    fn show_error(&mut self, message: &str);
    fn clear_error(&mut self);
    fn set_card_disabled(&mut self, disabled: bool);
    fn set_submit_disabled(&mut self, disabled: bool);
    /// `true` hides the form and shows the loading indicator; `false` reverses it.
    fn show_loading(&mut self, loading: bool);
    /// Natively submit the underlying form, bypassing the intercepted handler.
    fn submit_form(&mut self);
}

/// Anything whose default browser action can be suppressed.
pub trait Cancelable {
    fn prevent_default(&self);
}

impl Cancelable for web_sys::Event {
    fn prevent_default(&self) {
        web_sys::Event::prevent_default(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiState {
    /// Controls enabled; the error region may still show the last failure.
    Idle,
    /// A confirmation call is in flight.
    Submitting,
    /// The form was handed to the browser; the page is navigating away.
    Submitted,
}

impl UiState {
    pub fn controls_enabled(self) -> bool {
        self == UiState::Idle
    }
}

/// What happened after a confirmation result was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitStep {
    /// Payment succeeded and the form was submitted.
    FormSubmitted,
    /// Payment failed; the form is back to idle for another attempt.
    Retry,
    /// Stripe accepted the confirmation but left the intent in another state.
    /// The UI stays in `Submitting`.
    Unresolved(PaymentIntentStatus),
    /// No attempt was in flight; the result was dropped.
    Ignored,
}

pub struct PaymentFormController<V> {
    view: V,
    client_secret: ClientSecret,
    state: UiState,
    card_valid: bool,
}

impl<V: CheckoutView> PaymentFormController<V> {
    pub fn new(view: V, client_secret: ClientSecret) -> Self {
        Self {
            view,
            client_secret,
            state: UiState::Idle,
            card_valid: false,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    /// Last validity reported by the card widget. Informational only.
    pub fn card_valid(&self) -> bool {
        self.card_valid
    }

    pub fn client_secret(&self) -> &ClientSecret {
        &self.client_secret
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Mirror the widget's live validation into the error region.
    pub fn on_card_input_change(&mut self, change: &CardChange) {
        self.card_valid = change.card_valid();
        match &change.error {
            Some(err) => self.view.show_error(&err.message),
            None => self.view.clear_error(),
        }
    }

    /// Intercept a form submission.
    ///
    /// The default action is always prevented. Returns the secret to confirm
    /// with when a new attempt starts, or `None` if one is already underway.
    pub fn on_form_submit(&mut self, event: &impl Cancelable) -> Option<ClientSecret> {
        event.prevent_default();
        if self.state != UiState::Idle {
            log::debug!("submit ignored while {:?}", self.state);
            return None;
        }
        self.enter(UiState::Submitting);
        Some(self.client_secret.clone())
    }

    /// Apply the result of the confirmation call started by `on_form_submit`.
    pub fn on_confirm_outcome(&mut self, outcome: ConfirmOutcome) -> SubmitStep {
        if self.state != UiState::Submitting {
            log::warn!("confirmation result arrived while {:?}", self.state);
            return SubmitStep::Ignored;
        }
        match outcome {
            ConfirmOutcome::Failed(err) => {
                log::info!("card payment failed: {}", err.message);
                self.view.show_error(&err.message);
                self.enter(UiState::Idle);
                SubmitStep::Retry
            }
            ConfirmOutcome::Confirmed(PaymentIntentStatus::Succeeded) => {
                self.state = UiState::Submitted;
                self.view.submit_form();
                SubmitStep::FormSubmitted
            }
            ConfirmOutcome::Confirmed(status) => {
                log::warn!(
                    "payment intent {} is `{status}` after confirmation; leaving form locked",
                    self.client_secret.payment_intent_id()
                );
                SubmitStep::Unresolved(status)
            }
        }
    }

    fn enter(&mut self, state: UiState) {
        let disabled = !state.controls_enabled();
        self.view.set_card_disabled(disabled);
        self.view.set_submit_disabled(disabled);
        self.view.show_loading(state == UiState::Submitting);
        self.state = state;
    }
}
