use yew::prelude::*;

/// The card error region: an alert icon followed by the message, or nothing.
#[derive(Properties, PartialEq)]
pub struct CardErrorsProps {
    #[prop_or_default]
    pub id: Option<AttrValue>,
    /// Message to show; `None` renders an empty region.
    #[prop_or_default]
    pub message: Option<AttrValue>,
}

#[function_component(CardErrors)]
pub fn card_errors(props: &CardErrorsProps) -> Html {
    html! {
        <div id={props.id.clone()} class="card-errors" role="alert">
            if let Some(msg) = &props.message {
                <span class="icon" role="alert">
                    <i class="fas fa-times"></i>
                </span>
                <span>{ msg.to_string() }</span>
            }
        </div>
    }
}

/// Submit button that swaps its label while a payment is processing.
#[derive(Properties, PartialEq)]
pub struct SubmitButtonProps {
    #[prop_or_default]
    pub id: Option<AttrValue>,
    pub label: AttrValue,
    #[prop_or_default]
    pub disabled: bool,
    #[prop_or_default]
    pub processing: bool,
}

#[function_component(SubmitButton)]
pub fn submit_button(props: &SubmitButtonProps) -> Html {
    html! {
        <button
            id={props.id.clone()}
            type="submit"
            class="btn btn-checkout"
            disabled={props.disabled}
        >
            if props.processing {
                { "Processing…" }
            } else {
                { props.label.to_string() }
            }
        </button>
    }
}

/// Full-page overlay shown while the confirmation call is in flight.
#[derive(Properties, PartialEq)]
pub struct LoadingOverlayProps {
    #[prop_or_default]
    pub id: Option<AttrValue>,
    pub visible: bool,
}

#[function_component(LoadingOverlay)]
pub fn loading_overlay(props: &LoadingOverlayProps) -> Html {
    let style = if props.visible { "display: block;" } else { "display: none;" };
    html! {
        <div id={props.id.clone()} class="loading-overlay" {style}>
            <span class="loading-spinner">
                <i class="fas fa-3x fa-sync-alt fa-spin"></i>
            </span>
        </div>
    }
}
