//! A Yew card checkout form for apps that render the page themselves.
//!
//! This component loads Stripe.js, mounts a Card Element, and drives the same
//! [`PaymentFormController`] as the server-rendered `dom` adapter: live card
//! errors, locked controls and a loading overlay while confirming, and native
//! form submission once the PaymentIntent has succeeded.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsValue;
use web_sys::HtmlFormElement;
use yew::prelude::*;

use crate::bindings::JsCardElement;
use crate::client::{
    confirm_card_payment, mount_card_element, on_card_change, set_card_disabled,
    unmount_card_element, ConfirmOutcome, MountedCard,
};
use crate::components::{CardErrors, LoadingOverlay, SubmitButton};
use crate::config::{CardStyle, ClientSecret, ElementIds, PublishableKey};
use crate::controller::{CheckoutView, PaymentFormController, SubmitStep};
use crate::error::{CheckoutError, StripeError};
use crate::use_stripejs;

/// Data emitted when the PaymentIntent has succeeded.
#[derive(Clone, PartialEq, Debug)]
pub struct CardCheckoutSuccess {
    pub payment_intent_id: String,
}

/// Properties for the [`CardCheckout`] component.
///
/// # Fields
///
/// * `publishable_key` – Your Stripe Publishable Key (`pk_…`).
/// * `client_secret` – The PaymentIntent client secret from your backend.
/// * `ids` – DOM ids for the rendered form, card mount, error region, button and overlay.
/// * `style` – Card Element style; defaults to [`CardStyle::default`].
/// * `form_action` – Where the form posts once payment succeeds.
/// * `submit_form_on_success` – Natively submit the form after success (default `true`).
/// * `on_success` – Notified once the PaymentIntent has succeeded.
/// * `on_error` – Notified when a confirmation attempt fails and the form is usable again.
/// * `button_label` – Override the Pay button text (default: `"Complete Order"`).
/// * `children` – Extra form fields rendered above the card input.
#[derive(Properties, PartialEq, Clone)]
pub struct CardCheckoutProps {
    pub publishable_key: AttrValue,
    pub client_secret: AttrValue,
    #[prop_or_default]
    pub ids: ElementIds,
    #[prop_or_default]
    pub style: CardStyle,
    #[prop_or_default]
    pub form_action: Option<AttrValue>,
    /// With `false` the form stays locked behind the loading overlay after
    /// success; the host app must navigate away itself from `on_success`.
    #[prop_or(true)]
    pub submit_form_on_success: bool,
    #[prop_or_default]
    pub on_success: Callback<CardCheckoutSuccess>,
    #[prop_or_default]
    pub on_error: Callback<StripeError>,
    #[prop_or_default]
    pub button_label: Option<AttrValue>,
    #[prop_or_default]
    pub children: Children,
}

/// Component state the controller renders through.
#[derive(Clone)]
struct ViewHandles {
    form: NodeRef,
    error: UseStateHandle<Option<AttrValue>>,
    submit_disabled: UseStateHandle<bool>,
    loading: UseStateHandle<bool>,
    submit_natively: bool,
}

/// [`CheckoutView`] backed by component state.
struct ComponentView {
    card: JsCardElement,
    handles: ViewHandles,
}

impl CheckoutView for ComponentView {
    fn show_error(&mut self, message: &str) {
        self.handles.error.set(Some(AttrValue::from(message.to_owned())));
    }

    fn clear_error(&mut self) {
        self.handles.error.set(None);
    }

    fn set_card_disabled(&mut self, disabled: bool) {
        if let Err(e) = set_card_disabled(&self.card, disabled) {
            log::error!("could not update card element: {e}");
        }
    }

    fn set_submit_disabled(&mut self, disabled: bool) {
        self.handles.submit_disabled.set(disabled);
    }

    fn show_loading(&mut self, loading: bool) {
        self.handles.loading.set(loading);
    }

    fn submit_form(&mut self) {
        if !self.handles.submit_natively {
            return;
        }
        match self.handles.form.cast::<HtmlFormElement>() {
            Some(form) => {
                if let Err(e) = form.submit() {
                    log::error!("native form submission failed: {e:?}");
                }
            }
            None => log::error!("checkout form is not rendered"),
        }
    }
}

/// What the host app hears about a finished confirmation.
#[derive(Clone, Debug, PartialEq)]
enum AttemptResult {
    Succeeded(CardCheckoutSuccess),
    Failed(StripeError),
}

/// Callbacks fire only for results the controller actually applied.
fn attempt_result(
    step: &SubmitStep,
    failure: Option<StripeError>,
    secret: &ClientSecret,
) -> Option<AttemptResult> {
    match step {
        SubmitStep::FormSubmitted => Some(AttemptResult::Succeeded(CardCheckoutSuccess {
            payment_intent_id: secret.payment_intent_id().to_owned(),
        })),
        SubmitStep::Retry => failure.map(AttemptResult::Failed),
        SubmitStep::Unresolved(_) | SubmitStep::Ignored => None,
    }
}

/// Everything that lives as long as the card is mounted.
struct Session {
    mounted: MountedCard,
    controller: Rc<RefCell<PaymentFormController<ComponentView>>>,
    _on_change: Closure<dyn FnMut(JsValue)>,
}

/// Yew function component rendering a complete card checkout form.
///
/// # Example
///
/// ```rust,ignore
/// use yew::prelude::*;
/// use stripe_card_form::{CardCheckout, CardCheckoutSuccess};
///
/// #[function_component(App)]
/// fn app() -> Html {
///     let on_success = Callback::from(|info: CardCheckoutSuccess| {
///         log::info!("Payment succeeded: {}", info.payment_intent_id);
///     });
///
///     html! {
///         <CardCheckout
///             publishable_key="pk_test_123"
///             client_secret="pi_ABC_secret_XYZ"
///             form_action="/checkout/"
///             {on_success}
///         >
///             <input name="full_name" placeholder="Full Name" />
///         </CardCheckout>
///     }
/// }
/// ```
#[function_component(CardCheckout)]
pub fn card_checkout(props: &CardCheckoutProps) -> Html {
    let stripe_ready = use_stripejs();
    let session = use_mut_ref(|| None::<Session>);
    let form_ref = use_node_ref();
    let error = use_state(|| None::<AttrValue>);
    let submit_disabled = use_state(|| false);
    let loading = use_state(|| false);

    // Mount the card once Stripe.js is ready; unmount on teardown.
    {
        let session = session.clone();
        let handles = ViewHandles {
            form: form_ref.clone(),
            error: error.clone(),
            submit_disabled: submit_disabled.clone(),
            loading: loading.clone(),
            submit_natively: props.submit_form_on_success,
        };
        let props = props.clone();
        use_effect_with(stripe_ready, move |ready| {
            if *ready {
                match start_session(&props, handles.clone()) {
                    Ok(s) => *session.borrow_mut() = Some(s),
                    Err(e) => {
                        log::error!("card checkout failed to start: {e}");
                        handles.error.set(Some(AttrValue::from(e.to_string())));
                    }
                }
            }
            move || {
                if let Some(s) = session.borrow_mut().take() {
                    let _ = unmount_card_element(&s.mounted.card);
                }
            }
        });
    }

    let onsubmit = {
        let session = session.clone();
        let on_success = props.on_success.clone();
        let on_error = props.on_error.clone();

        Callback::from(move |e: SubmitEvent| {
            let event: &web_sys::Event = e.as_ref();
            let guard = session.borrow();
            let Some(s) = guard.as_ref() else {
                event.prevent_default();
                return;
            };
            let Some(secret) = s.controller.borrow_mut().on_form_submit(event) else {
                return;
            };

            let stripe = s.mounted.stripe.clone();
            let card = s.mounted.card.clone();
            let controller = Rc::clone(&s.controller);
            let on_success = on_success.clone();
            let on_error = on_error.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = confirm_card_payment(&stripe, &card, &secret).await;
                let failure = match &outcome {
                    ConfirmOutcome::Failed(err) => Some(err.clone()),
                    ConfirmOutcome::Confirmed(_) => None,
                };
                let step = controller.borrow_mut().on_confirm_outcome(outcome);
                match attempt_result(&step, failure, &secret) {
                    Some(AttemptResult::Succeeded(info)) => on_success.emit(info),
                    Some(AttemptResult::Failed(err)) => on_error.emit(err),
                    None => {}
                }
            });
        })
    };

    let ids = &props.ids;
    let form_style = if *loading { "display: none;" } else { "" };
    html! {
        <>
            <form
                ref={form_ref}
                id={ids.form.clone()}
                method="post"
                action={props.form_action.clone()}
                style={form_style}
                {onsubmit}
            >
                { for props.children.iter() }
                <div id={ids.card_mount.clone()} class="stripe-style-input" />
                <CardErrors id={AttrValue::from(ids.card_errors.clone())} message={(*error).clone()} />
                <SubmitButton
                    id={AttrValue::from(ids.submit_button.clone())}
                    label={props.button_label.clone().unwrap_or_else(|| AttrValue::from("Complete Order"))}
                    disabled={!stripe_ready || *submit_disabled}
                    processing={*loading}
                />
            </form>
            <LoadingOverlay id={AttrValue::from(ids.loading_overlay.clone())} visible={*loading} />
        </>
    }
}

fn start_session(props: &CardCheckoutProps, handles: ViewHandles) -> Result<Session, CheckoutError> {
    let key = PublishableKey::new(props.publishable_key.to_string())?;
    let secret = ClientSecret::new(props.client_secret.to_string())?;
    let mounted = mount_card_element(&key, &props.style, &props.ids.card_selector())?;

    let view = ComponentView {
        card: mounted.card.clone(),
        handles,
    };
    let controller = Rc::new(RefCell::new(PaymentFormController::new(view, secret)));
    let on_change = {
        let controller = Rc::clone(&controller);
        on_card_change(&mounted.card, move |change| match controller.try_borrow_mut() {
            Ok(mut c) => c.on_card_input_change(&change),
            Err(_) => log::debug!("card change during controller update dropped"),
        })?
    };

    Ok(Session {
        mounted,
        controller,
        _on_change: on_change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PaymentIntentStatus;

    fn secret() -> ClientSecret {
        ClientSecret::new("pi_123_secret_abc").unwrap()
    }

    #[test]
    fn success_reports_payment_intent_id() {
        let result = attempt_result(&SubmitStep::FormSubmitted, None, &secret());
        assert_eq!(
            result,
            Some(AttemptResult::Succeeded(CardCheckoutSuccess {
                payment_intent_id: "pi_123".into()
            }))
        );
    }

    #[test]
    fn applied_failure_is_reported() {
        let err = StripeError::from_message("Your card was declined.");
        let result = attempt_result(&SubmitStep::Retry, Some(err.clone()), &secret());
        assert_eq!(result, Some(AttemptResult::Failed(err)));
    }

    #[test]
    fn ignored_failure_is_not_reported() {
        let err = StripeError::from_message("Your card was declined.");
        assert_eq!(attempt_result(&SubmitStep::Ignored, Some(err), &secret()), None);
    }

    #[test]
    fn unresolved_status_reports_nothing() {
        let step = SubmitStep::Unresolved(PaymentIntentStatus::RequiresAction);
        assert_eq!(attempt_result(&step, None, &secret()), None);
    }
}
