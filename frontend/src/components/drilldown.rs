use std::rc::Rc;

use yew::prelude::*;

use console_core::grid::{DrillDown, GridRow};

use super::{DataGrid, StandardModal};

#[derive(Properties, PartialEq)]
pub struct DrillDownModalProps<T: PartialEq> {
    pub state: Rc<DrillDown<T>>,
    pub on_close: Callback<()>,
}

#[function_component(DrillDownModal)]
pub fn drill_down_modal<T>(props: &DrillDownModalProps<T>) -> Html
where
    T: GridRow + Clone + PartialEq + 'static,
{
    let state = &props.state;
    let rows = Rc::new(state.rows.clone());

    html! {
        <StandardModal show={state.is_open()} title={state.title.clone()} on_close={props.on_close.clone()} size={Some(AttrValue::Static("lg"))}>
            if let Some(error) = &state.error {
                <div class="alert alert-danger">{ error.clone() }</div>
            } else {
                <DataGrid<T> {rows} loading={state.loading} />
            }
        </StandardModal>
    }
}
