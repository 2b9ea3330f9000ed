use crate::error::{Result, TexError};

/// Progress sink: receives a fraction in `[0, 1]` and a phase label,
/// returns `true` to request an abort.
pub type ProgressSink<'a> = &'a mut dyn FnMut(f32, &str) -> bool;

/// Per-call progress state: a monotonic, de-duplicated percentage counter
/// plus cooperative cancellation. The sink is only ever invoked on the
/// calling thread, between units of work.
pub struct ProgressContext<'a> {
    sink: Option<ProgressSink<'a>>,
    phase: &'static str,
    total: u64,
    done: u64,
    last: Option<u32>,
}

impl<'a> ProgressContext<'a> {
    pub fn new(sink: Option<ProgressSink<'a>>) -> Self {
        ProgressContext {
            sink,
            phase: "",
            total: 1,
            done: 0,
            last: None,
        }
    }

    /// A context that reports nowhere and never cancels.
    pub fn silent() -> ProgressContext<'static> {
        ProgressContext::new(None)
    }

    /// Starts a run of `total` work units and reports 0%.
    pub fn begin(&mut self, total: u64, phase: &'static str) -> Result<()> {
        self.total = total.max(1);
        self.done = 0;
        self.last = None;
        self.phase = phase;
        self.report()
    }

    pub fn set_phase(&mut self, phase: &'static str) {
        self.phase = phase;
    }

    /// Records completed units and reports the new percentage when it
    /// changed. Returns `TexError::Cancelled` when the sink asks to stop.
    pub fn advance(&mut self, units: u64) -> Result<()> {
        self.done = (self.done + units).min(self.total);
        self.report()
    }

    /// Forces the counter to 100%; called once on success.
    pub fn finish(&mut self) -> Result<()> {
        self.done = self.total;
        self.report()
    }

    fn report(&mut self) -> Result<()> {
        let percent = (self.done * 100 / self.total) as u32;
        if self.last == Some(percent) {
            return Ok(());
        }
        self.last = Some(percent);
        if let Some(sink) = self.sink.as_mut()
            && sink(percent as f32 / 100.0, self.phase)
        {
            return Err(TexError::Cancelled);
        }
        Ok(())
    }
}
