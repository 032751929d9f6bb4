use std::rc::Rc;

use web_sys::HtmlInputElement;
use yew::prelude::*;

use console_core::grid::{self, Direction, GridQuery, GridRow};

#[derive(Properties, PartialEq)]
pub struct DataGridProps<T: PartialEq> {
    pub rows: Rc<Vec<T>>,
    #[prop_or(10)]
    pub page_size: usize,
    #[prop_or_default]
    pub loading: bool,
    #[prop_or_default]
    pub on_row_click: Option<Callback<T>>,
    /// Extra trailing cell per row (edit/delete buttons).
    #[prop_or_default]
    pub actions: Option<Callback<T, Html>>,
    #[prop_or(AttrValue::Static("No records found"))]
    pub empty_text: AttrValue,
}

#[function_component(DataGrid)]
pub fn data_grid<T>(props: &DataGridProps<T>) -> Html
where
    T: GridRow + Clone + PartialEq + 'static,
{
    let query = use_state(|| GridQuery::new(props.page_size));
    let view = grid::apply(&props.rows, &query);

    let on_search = {
        let query = query.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut q = (*query).clone();
            q.set_search(&input.value());
            query.set(q);
        })
    };

    let headers = T::COLUMNS.iter().enumerate().map(|(col, title)| {
        let query = query.clone();
        let marker = match (*query).sort {
            Some(s) if s.column == col && s.direction == Direction::Asc => " ▲",
            Some(s) if s.column == col => " ▼",
            _ => "",
        };
        let onclick = Callback::from(move |_: MouseEvent| {
            let mut q = (*query).clone();
            q.toggle_sort(col);
            query.set(q);
        });
        html! { <th class="sortable" {onclick}>{ *title }{ marker }</th> }
    });

    let body = if props.loading {
        html! { <tr><td colspan={(T::COLUMNS.len() + 1).to_string()} class="text-center">{"Loading…"}</td></tr> }
    } else if view.rows.is_empty() {
        html! { <tr><td colspan={(T::COLUMNS.len() + 1).to_string()} class="text-center">{ props.empty_text.clone() }</td></tr> }
    } else {
        view.rows
            .iter()
            .map(|row| {
                let cells = (0..T::COLUMNS.len()).map(|col| html! { <td>{ row.cell(col).display() }</td> });
                let onclick = props.on_row_click.clone().map(|cb| {
                    let row = (*row).clone();
                    Callback::from(move |_: MouseEvent| cb.emit(row.clone()))
                });
                let actions = props.actions.as_ref().map(|cb| cb.emit((*row).clone()));
                html! {
                    <tr class={classes!(onclick.is_some().then_some("clickable"))} {onclick}>
                        { for cells }
                        if let Some(actions) = actions {
                            <td class="text-end">{ actions }</td>
                        }
                    </tr>
                }
            })
            .collect::<Html>()
    };

    let goto = |page: usize| {
        let query = query.clone();
        Callback::from(move |_: MouseEvent| {
            let mut q = (*query).clone();
            q.goto(page);
            query.set(q);
        })
    };

    html! {
        <div class="data-grid">
            <input class="form-control mb-2" type="search" placeholder="Search…" value={query.search.clone()} oninput={on_search} />
            <table class="table table-striped table-hover">
                <thead>
                    <tr>
                        { for headers }
                        if props.actions.is_some() { <th /> }
                    </tr>
                </thead>
                <tbody>{ body }</tbody>
            </table>
            <div class="d-flex justify-content-between align-items-center">
                <span>{ format!("{} records", view.total) }</span>
                <div class="btn-group">
                    <button class="btn btn-sm btn-outline-secondary" disabled={view.page <= 1} onclick={goto(view.page.saturating_sub(1))}>{"‹"}</button>
                    <span class="px-2">{ format!("Page {} of {}", view.page, view.page_count) }</span>
                    <button class="btn btn-sm btn-outline-secondary" disabled={view.page >= view.page_count} onclick={goto(view.page + 1)}>{"›"}</button>
                </div>
            </div>
        </div>
    }
}
