use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};
use yew::prelude::*;

use console_core::toast::ToastTimer;

#[derive(Properties, PartialEq)]
pub struct SuccessToasterProps {
    pub show: bool,
    pub message: AttrValue,
    #[prop_or(3000)]
    pub duration_ms: u32,
    pub on_close: Callback<()>,
}

struct Timers {
    _expiry: Timeout,
    _tick: Interval,
}

#[function_component(SuccessToaster)]
pub fn success_toaster(props: &SuccessToasterProps) -> Html {
    let timer = use_mut_ref(|| ToastTimer::new(props.duration_ms));
    let timers: Rc<RefCell<Option<Timers>>> = use_mut_ref(|| None);
    let fraction = use_state(|| 1.0_f64);

    {
        let timer = timer.clone();
        let timers = timers.clone();
        let fraction = fraction.clone();
        let on_close = props.on_close.clone();
        let duration = props.duration_ms;
        // A new message while visible restarts the countdown.
        use_effect_with((props.show, props.message.clone()), move |(show, _)| {
            if *show {
                let ticket = timer.borrow_mut().show(js_sys::Date::now());
                fraction.set(1.0);

                let expiry = {
                    let timer = timer.clone();
                    let on_close = on_close.clone();
                    Timeout::new(duration, move || {
                        if timer.borrow_mut().expire(ticket) {
                            on_close.emit(());
                        }
                    })
                };
                let tick = {
                    let timer = timer.clone();
                    let fraction = fraction.clone();
                    Interval::new(100, move || fraction.set(timer.borrow().remaining_fraction(js_sys::Date::now())))
                };
                // Replacing the pair drops (and cancels) the previous timers.
                *timers.borrow_mut() = Some(Timers { _expiry: expiry, _tick: tick });
            } else {
                timers.borrow_mut().take();
                if timer.borrow_mut().dismiss() {
                    on_close.emit(());
                }
            }
            move || {
                timers.borrow_mut().take();
            }
        });
    }

    if !props.show {
        return Html::default();
    }

    let dismiss = {
        let timer = timer.clone();
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| {
            if timer.borrow_mut().dismiss() {
                on_close.emit(());
            }
        })
    };

    html! {
        <div class="toast-container position-fixed top-0 end-0 p-3">
            <div class="toast show align-items-center text-bg-success border-0" role="alert">
                <div class="d-flex">
                    <div class="toast-body">{ props.message.clone() }</div>
                    <button type="button" class="btn-close btn-close-white me-2 m-auto" onclick={dismiss} />
                </div>
                <div class="toast-progress" style={format!("width: {:.1}%", *fraction * 100.0)} />
            </div>
        </div>
    }
}
