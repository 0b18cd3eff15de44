pub mod bindings;
pub mod checkout_component;
pub mod client;
pub mod components;
pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
mod interop;

pub use bindings::*;
pub use checkout_component::*;
pub use components::*;
pub use controller::{Cancelable, CheckoutView, PaymentFormController, SubmitStep, UiState};
pub use error::{CheckoutError, StripeError};
pub use interop::*;
