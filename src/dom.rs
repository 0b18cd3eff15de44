//! Attaching the checkout to a server-rendered page.
//!
//! The page carries the publishable key and client secret as wrapped text in
//! two elements, a mount point for the card, an error region, the form with
//! its submit control, and a loading overlay (ids in [`ElementIds`]).
//! [`attach`] reads the values, mounts the card, and wires the card `change`
//! and form `submit` events to a [`PaymentFormController`].
//!
//! From JS:
//!
//! ```js
//! import init, { startCheckout } from "./pkg/stripe_card_form.js";
//! await init();
//! startCheckout();                        // stock ids
//! startCheckout({ ids: { form: "order" } });
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlFormElement, HtmlInputElement};

use crate::bindings::JsCardElement;
use crate::client::{
    confirm_card_payment, mount_card_element, on_card_change, set_card_disabled,
    unmount_card_element, CardChange, MountedCard,
};
use crate::config::{unwrap_rendered, CheckoutConfig, ClientSecret, ElementIds, PublishableKey};
use crate::controller::{CheckoutView, PaymentFormController};
use crate::error::CheckoutError;

/// [`CheckoutView`] over real DOM nodes.
pub struct DomCheckoutView {
    document: Document,
    card: JsCardElement,
    error_region: Element,
    form: HtmlFormElement,
    submit_control: Element,
    loading_overlay: HtmlElement,
    /// `(field name, secret)` copied into the form before native submission.
    secret_field: Option<(String, String)>,
}

impl DomCheckoutView {
    /// Look up every element named in `ids`.
    pub fn from_document(
        document: Document,
        ids: &ElementIds,
        card: JsCardElement,
    ) -> Result<Self, CheckoutError> {
        Ok(Self {
            error_region: element_by_id(&document, &ids.card_errors)?,
            form: typed_element_by_id(&document, &ids.form, "form")?,
            submit_control: element_by_id(&document, &ids.submit_button)?,
            loading_overlay: typed_element_by_id(&document, &ids.loading_overlay, "HTML element")?,
            document,
            card,
            secret_field: None,
        })
    }

    /// Post `secret` as a hidden `name` field when the form is submitted.
    pub fn with_secret_field(mut self, name: impl Into<String>, secret: &ClientSecret) -> Self {
        self.secret_field = Some((name.into(), secret.as_str().to_owned()));
        self
    }

    fn render_error(&self, message: &str) -> Result<(), JsValue> {
        let icon = self.document.create_element("span")?;
        icon.set_class_name("icon");
        icon.set_attribute("role", "alert")?;
        let glyph = self.document.create_element("i")?;
        glyph.set_class_name("fas fa-times");
        icon.append_child(&glyph)?;

        let text = self.document.create_element("span")?;
        text.set_text_content(Some(message));

        self.error_region.set_text_content(None);
        self.error_region.append_child(&icon)?;
        self.error_region.append_child(&text)?;
        Ok(())
    }

    fn set_displayed(el: &HtmlElement, shown: bool, display: &str) -> Result<(), JsValue> {
        el.style()
            .set_property("display", if shown { display } else { "none" })
    }

    fn ensure_secret_field(&self) -> Result<(), JsValue> {
        let Some((name, secret)) = &self.secret_field else {
            return Ok(());
        };
        let selector = format!("input[name=\"{name}\"]");
        let input = match self.form.query_selector(&selector)? {
            Some(existing) => existing.dyn_into::<HtmlInputElement>()?,
            None => {
                let input: HtmlInputElement = self.document.create_element("input")?.dyn_into()?;
                input.set_type("hidden");
                input.set_name(name);
                self.form.append_child(&input)?;
                input
            }
        };
        input.set_value(secret);
        Ok(())
    }
}

impl CheckoutView for DomCheckoutView {
    fn show_error(&mut self, message: &str) {
        if let Err(e) = self.render_error(message) {
            log::error!("could not render card error: {e:?}");
        }
    }

    fn clear_error(&mut self) {
        self.error_region.set_text_content(Some(""));
    }

    fn set_card_disabled(&mut self, disabled: bool) {
        if let Err(e) = set_card_disabled(&self.card, disabled) {
            log::error!("could not update card element: {e}");
        }
    }

    fn set_submit_disabled(&mut self, disabled: bool) {
        let res = if disabled {
            self.submit_control.set_attribute("disabled", "")
        } else {
            self.submit_control.remove_attribute("disabled")
        };
        if let Err(e) = res {
            log::error!("could not toggle submit control: {e:?}");
        }
    }

    fn show_loading(&mut self, loading: bool) {
        let form: &HtmlElement = self.form.as_ref();
        let res = Self::set_displayed(form, !loading, "")
            .and_then(|_| Self::set_displayed(&self.loading_overlay, loading, "block"));
        if let Err(e) = res {
            log::error!("could not toggle loading overlay: {e:?}");
        }
    }

    fn submit_form(&mut self) {
        if let Err(e) = self.ensure_secret_field() {
            log::error!("could not attach client secret field: {e:?}");
        }
        if let Err(e) = self.form.submit() {
            log::error!("native form submission failed: {e:?}");
        }
    }
}

/// Keeps a page's checkout wired up. Dropping it detaches the submit
/// listener and unmounts the card.
pub struct CheckoutHandle {
    controller: Rc<RefCell<PaymentFormController<DomCheckoutView>>>,
    card: JsCardElement,
    form: HtmlFormElement,
    _on_change: Closure<dyn FnMut(JsValue)>,
    on_submit: Closure<dyn FnMut(web_sys::Event)>,
}

impl CheckoutHandle {
    pub fn controller(&self) -> &Rc<RefCell<PaymentFormController<DomCheckoutView>>> {
        &self.controller
    }
}

impl Drop for CheckoutHandle {
    fn drop(&mut self) {
        let _ = self
            .form
            .remove_event_listener_with_callback("submit", self.on_submit.as_ref().unchecked_ref());
        if let Err(e) = unmount_card_element(&self.card) {
            log::warn!("card unmount failed: {e}");
        }
    }
}

/// Read the page values, mount the card, and wire the form.
pub fn attach(config: &CheckoutConfig) -> Result<CheckoutHandle, CheckoutError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or(CheckoutError::NoDocument)?;
    let ids = &config.ids;

    let key = PublishableKey::new(read_wrapped_value(&document, &ids.public_key)?)?;
    let secret = ClientSecret::new(read_wrapped_value(&document, &ids.client_secret)?)?;

    let mounted = mount_card_element(&key, &config.style, &ids.card_selector())?;
    wire(document, config, secret, &mounted).map_err(|e| {
        let _ = unmount_card_element(&mounted.card);
        e
    })
}

/// Build the view and controller around a mounted card and hook up its events.
fn wire(
    document: Document,
    config: &CheckoutConfig,
    secret: ClientSecret,
    mounted: &MountedCard,
) -> Result<CheckoutHandle, CheckoutError> {
    let mut view = DomCheckoutView::from_document(document, &config.ids, mounted.card.clone())?;
    if let Some(field) = &config.secret_field {
        view = view.with_secret_field(field.clone(), &secret);
    }
    let form = view.form.clone();
    let controller = Rc::new(RefCell::new(PaymentFormController::new(view, secret)));

    let on_change = {
        let controller = Rc::clone(&controller);
        on_card_change(&mounted.card, move |change: CardChange| {
            match controller.try_borrow_mut() {
                Ok(mut c) => c.on_card_input_change(&change),
                Err(_) => log::debug!("card change during controller update dropped"),
            }
        })?
    };

    let on_submit = {
        let controller = Rc::clone(&controller);
        let stripe = mounted.stripe.clone();
        let card = mounted.card.clone();
        Closure::wrap(Box::new(move |event: web_sys::Event| {
            let Some(secret) = controller.borrow_mut().on_form_submit(&event) else {
                return;
            };
            let controller = Rc::clone(&controller);
            let stripe = stripe.clone();
            let card = card.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = confirm_card_payment(&stripe, &card, &secret).await;
                let step = controller.borrow_mut().on_confirm_outcome(outcome);
                log::debug!("submission finished: {step:?}");
            });
        }) as Box<dyn FnMut(web_sys::Event)>)
    };
    form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())
        .map_err(CheckoutError::js)?;

    Ok(CheckoutHandle {
        controller,
        card: mounted.card.clone(),
        form,
        _on_change: on_change,
        on_submit,
    })
}

/// Text content of `#id` with exactly its first and last character removed.
/// Surrounding whitespace is not trimmed.
pub fn read_wrapped_value(document: &Document, id: &str) -> Result<String, CheckoutError> {
    let text = element_by_id(document, id)?.text_content().unwrap_or_default();
    unwrap_rendered(&text)
        .map(str::to_owned)
        .ok_or_else(|| CheckoutError::WrappedValue { id: id.to_owned() })
}

fn element_by_id(document: &Document, id: &str) -> Result<Element, CheckoutError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| CheckoutError::MissingElement(id.to_owned()))
}

fn typed_element_by_id<T: JsCast>(
    document: &Document,
    id: &str,
    expected: &'static str,
) -> Result<T, CheckoutError> {
    element_by_id(document, id)?
        .dyn_into::<T>()
        .map_err(|_| CheckoutError::WrongElementType { id: id.to_owned(), expected })
}

thread_local! {
    static ACTIVE: RefCell<Option<CheckoutHandle>> = const { RefCell::new(None) };
}

/// Attach the checkout for the lifetime of the page.
///
/// `config` may be `undefined` for the stock template, or a (partial)
/// [`CheckoutConfig`] object. Calling again replaces the previous attachment.
#[wasm_bindgen(js_name = startCheckout)]
pub fn start_checkout(config: JsValue) -> Result<(), JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let config = if config.is_undefined() || config.is_null() {
        CheckoutConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };

    ACTIVE.with(|active| active.replace(None));
    let handle = attach(&config).map_err(|e| {
        log::error!("checkout attach failed: {e}");
        e
    })?;
    ACTIVE.with(|active| *active.borrow_mut() = Some(handle));
    Ok(())
}
