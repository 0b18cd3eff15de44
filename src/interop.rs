//! interop.rs
//!
//! Custom Yew hook to load Stripe.js v3 at runtime (no inline JS).
//!
//! # Overview
//! `use_stripejs()` injects a single
//! `<script id="stripejs-sdk" src="https://js.stripe.com/v3/" defer>`
//! into `<head>` on first use, returns `false` until the
//! script’s `load` event fires, then returns `true`.
//!
//! Server-rendered pages that include the script tag themselves do not need
//! this; `dom::attach` assumes `window.Stripe` is already present.
//!
//! # Usage
//! ```rust,ignore
//! use yew::prelude::*;
//! use stripe_card_form::use_stripejs;
//!
//! #[function_component(App)]
//! fn app() -> Html {
//!     let stripe_ready = use_stripejs();
//!     html! {
//!         if stripe_ready {
//!             <p>{"Stripe.js loaded"}</p>
//!         } else {
//!             <p>{"Loading Stripe.js..."}</p>
//!         }
//!     }
//! }
//! ```

use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::js_sys::Reflect;
use web_sys::{Document, HtmlScriptElement};
use yew::functional::hook;
use yew::prelude::*;

pub const STRIPE_JS_URL: &str = "https://js.stripe.com/v3/";
const SCRIPT_ID: &str = "stripejs-sdk";

/// Whether `window.Stripe` is defined.
pub fn stripe_loaded() -> bool {
    web_sys::window()
        .and_then(|win| Reflect::has(&win, &JsValue::from_str("Stripe")).ok())
        .unwrap_or(false)
}

/// Custom hook: load Stripe.js v3 exactly once and track readiness.
///
/// # Returns
/// - `false` while the `<script>` is being fetched & parsed.
/// - `true` once `window.Stripe` exists.
#[hook]
pub fn use_stripejs() -> bool {
    let loaded = use_state(stripe_loaded);

    {
        let loaded = loaded.clone();
        use_effect_with((), move |_| {
            if !*loaded {
                if let Err(e) = inject_script(move || loaded.set(true)) {
                    log::error!("could not load Stripe.js: {e:?}");
                }
            }
            || ()
        });
    }

    *loaded
}

/// Append the Stripe.js `<script>` unless it is already on the page, calling
/// `on_load` once it has loaded.
///
/// If another component already inserted the tag, its `load` event is shared
/// by adding a listener to the existing element.
fn inject_script(on_load: impl FnOnce() + 'static) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let onload = Closure::once(on_load);
    match document.get_element_by_id(SCRIPT_ID) {
        Some(existing) => {
            existing.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
        }
        None => {
            let script = create_script(&document)?;
            script.set_onload(Some(onload.as_ref().unchecked_ref()));
            document
                .head()
                .ok_or_else(|| JsValue::from_str("document has no <head>"))?
                .append_child(&script)?;
        }
    }
    // Leak so it lives until the load event.
    onload.forget();
    Ok(())
}

fn create_script(document: &Document) -> Result<HtmlScriptElement, JsValue> {
    let script: HtmlScriptElement = document.create_element("script")?.dyn_into()?;
    script.set_id(SCRIPT_ID);
    script.set_src(STRIPE_JS_URL);
    script.set_defer(true);
    Ok(script)
}
