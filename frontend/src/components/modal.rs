use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct StandardModalProps {
    pub show: bool,
    pub title: AttrValue,
    pub on_close: Callback<()>,
    #[prop_or_default]
    pub on_confirm: Option<Callback<()>>,
    #[prop_or(AttrValue::Static("Save"))]
    pub confirm_label: AttrValue,
    #[prop_or(AttrValue::Static("Cancel"))]
    pub cancel_label: AttrValue,
    /// Bootstrap button colour of the confirm button.
    #[prop_or(AttrValue::Static("primary"))]
    pub confirm_class: AttrValue,
    #[prop_or_default]
    pub confirm_disabled: bool,
    #[prop_or_default]
    pub loading: bool,
    #[prop_or_default]
    pub size: Option<AttrValue>,
    #[prop_or_default]
    pub children: Children,
}

/// Fixed header, scrollable body, fixed footer.
#[function_component(StandardModal)]
pub fn standard_modal(props: &StandardModalProps) -> Html {
    if !props.show {
        return Html::default();
    }

    let close = {
        let cb = props.on_close.clone();
        let loading = props.loading;
        Callback::from(move |_: MouseEvent| {
            if !loading {
                cb.emit(())
            }
        })
    };
    let confirm = props.on_confirm.clone().map(|cb| Callback::from(move |_: MouseEvent| cb.emit(())));
    let dialog_class = classes!("modal-dialog", "modal-dialog-scrollable", props.size.as_ref().map(|s| format!("modal-{s}")));

    html! {
        <div class="modal show d-block" tabindex="-1" role="dialog">
            <div class={dialog_class}>
                <div class="modal-content">
                    <div class="modal-header">
                        <h5 class="modal-title">{ props.title.clone() }</h5>
                        <button type="button" class="btn-close" onclick={close.clone()} disabled={props.loading} />
                    </div>
                    <div class="modal-body">
                        { for props.children.iter() }
                        if props.loading {
                            <div class="modal-loading-overlay">
                                <div class="spinner-border" role="status" />
                            </div>
                        }
                    </div>
                    <div class="modal-footer">
                        <button type="button" class="btn btn-secondary" onclick={close} disabled={props.loading}>
                            { props.cancel_label.clone() }
                        </button>
                        if let Some(onclick) = confirm {
                            <button
                                type="button"
                                class={classes!("btn", format!("btn-{}", props.confirm_class))}
                                {onclick}
                                disabled={props.loading || props.confirm_disabled}
                            >
                                { props.confirm_label.clone() }
                            </button>
                        }
                    </div>
                </div>
            </div>
            <div class="modal-backdrop show" />
        </div>
    }
}
