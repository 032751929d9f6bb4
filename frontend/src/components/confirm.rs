use yew::prelude::*;

use console_core::confirm::Variant;

use super::StandardModal;

#[derive(Properties, PartialEq)]
pub struct ConfirmDeleteModalProps {
    pub show: bool,
    pub title: AttrValue,
    pub message: AttrValue,
    #[prop_or_default]
    pub variant: Variant,
    #[prop_or_default]
    pub confirm_label: Option<AttrValue>,
    #[prop_or_default]
    pub loading: bool,
    pub on_confirm: Callback<()>,
    pub on_cancel: Callback<()>,
}

#[function_component(ConfirmDeleteModal)]
pub fn confirm_delete_modal(props: &ConfirmDeleteModalProps) -> Html {
    let label = props
        .confirm_label
        .clone()
        .unwrap_or(AttrValue::Static(props.variant.default_label()));

    html! {
        <StandardModal
            show={props.show}
            title={props.title.clone()}
            on_close={props.on_cancel.clone()}
            on_confirm={Some(props.on_confirm.clone())}
            confirm_label={label}
            confirm_class={AttrValue::Static(props.variant.color_class())}
            loading={props.loading}
        >
            <div class="text-center">
                <i class={classes!("bi", props.variant.icon(), format!("text-{}", props.variant.color_class()), "fs-1")} />
                <p class="mt-3">{ props.message.clone() }</p>
            </div>
        </StandardModal>
    }
}
