use web_sys::HtmlSelectElement;
use yew::prelude::*;

/// One option of a [`Select`]: display label plus whatever the caller
/// needs back when it is picked.
#[derive(Clone, PartialEq)]
pub struct Choice<T> {
    pub label: String,
    pub value: T,
}

#[derive(Properties, PartialEq)]
pub struct SelectProps<T: PartialEq> {
    pub label: AttrValue,
    pub options: Vec<Choice<T>>,
    #[prop_or_default]
    pub selected: Vec<usize>,
    #[prop_or_default]
    pub multiple: bool,
    #[prop_or_default]
    pub disabled: bool,
    #[prop_or_default]
    pub loading: bool,
    pub on_change: Callback<Vec<T>>,
}

/// Native `<select>` over typed options; an empty pick means "cleared".
#[function_component(Select)]
pub fn select<T>(props: &SelectProps<T>) -> Html
where
    T: Clone + PartialEq + 'static,
{
    let onchange = {
        let options = props.options.clone();
        let cb = props.on_change.clone();
        Callback::from(move |e: Event| {
            let el: HtmlSelectElement = e.target_unchecked_into();
            let picked = el.selected_options();
            let values = (0..picked.length())
                .filter_map(|i| picked.item(i))
                .filter_map(|opt| opt.get_attribute("value"))
                .filter_map(|v| v.parse::<usize>().ok())
                .filter_map(|i| options.get(i).map(|c| c.value.clone()))
                .collect();
            cb.emit(values);
        })
    };

    let placeholder = if props.loading { "Loading…" } else { "-- Select --" };

    html! {
        <div class="mb-3">
            <label class="form-label">{ props.label.clone() }</label>
            <select class="form-select" multiple={props.multiple} disabled={props.disabled || props.loading} {onchange}>
                if !props.multiple {
                    <option value="" selected={props.selected.is_empty()}>{ placeholder }</option>
                }
                { for props.options.iter().enumerate().map(|(i, c)| html! {
                    <option value={i.to_string()} selected={props.selected.contains(&i)}>{ c.label.clone() }</option>
                }) }
            </select>
        </div>
    }
}
