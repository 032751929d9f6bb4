//! Auto-dismissing toast bookkeeping.
//!
//! Each time the toast becomes visible a new instance starts and a timer
//! ticket is issued. The instance ends exactly once: on expiry of its own
//! ticket, on dismiss, or when the owner hides it. Only the call that ends
//! it returns `true`, which is the owner's cue to run `on_close`.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToastTicket(u64);

#[derive(Clone, Debug, PartialEq)]
pub struct ToastTimer {
    duration_ms: u32,
    generation: u64,
    visible: bool,
    shown_at_ms: f64,
}

impl ToastTimer {
    pub fn new(duration_ms: u32) -> Self {
        Self { duration_ms: duration_ms.max(1), generation: 0, visible: false, shown_at_ms: 0.0 }
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Starts an instance, or restarts the countdown of the visible one.
    /// Any ticket handed out before is dead after this call.
    pub fn show(&mut self, now_ms: f64) -> ToastTicket {
        self.generation += 1;
        self.visible = true;
        self.shown_at_ms = now_ms;
        ToastTicket(self.generation)
    }

    /// Timer callback. Ends the instance only if `ticket` is still current.
    pub fn expire(&mut self, ticket: ToastTicket) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.end()
    }

    /// Close button, or the owner flipping `show` off.
    pub fn dismiss(&mut self) -> bool {
        self.end()
    }

    fn end(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        self.generation += 1;
        true
    }

    /// Width of the countdown bar, from 1.0 down to 0.0.
    pub fn remaining_fraction(&self, now_ms: f64) -> f64 {
        if !self.visible {
            return 0.0;
        }
        let elapsed = (now_ms - self.shown_at_ms).max(0.0);
        (1.0 - elapsed / f64::from(self.duration_ms)).clamp(0.0, 1.0)
    }
}

impl Default for ToastTimer {
    fn default() -> Self {
        ToastTimer::new(3000)
    }
}
