//! Disposable QuickJS context with a minimal DOM shim for running the
//! obfuscated in-page decryptors.
//!
//! The executed code is untrusted and expected to throw: the contract is
//! best-effort side effects on the shimmed DOM, no effect on the host
//! process. Every capability the script could use to escape or block is
//! stubbed inside `dom.js` (inert fetch, null canvas context, no-op
//! dialogs), and execution itself is bounded by a memory limit and a
//! wall-clock interrupt deadline. Dropping the [`Sandbox`] releases the
//! runtime, so disposal happens exactly once on every exit path.

use std::time::{Duration, Instant};

use anyhow::anyhow;
use log::debug;
use rquickjs::{Context, Runtime, Value};

const DOM_SHIM: &str = include_str!("dom.js");

const MEMORY_LIMIT: usize = 64 * 1024 * 1024;
const MAX_STACK_SIZE: usize = 2 * 1024 * 1024;
/// Wall-clock budget for a single untrusted script before it is interrupted.
const SCRIPT_TIME_BUDGET: Duration = Duration::from_secs(2);
/// Cap on promise jobs pumped after an eval, in case the script spins.
const MAX_PENDING_JOBS: usize = 1024;

pub struct Sandbox {
    rt: Runtime,
    ctx: Context,
}

impl Sandbox {
    /// Build a fresh context scoped to `base_url` and evaluate the DOM shim
    /// into it.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let rt = Runtime::new().map_err(|err| anyhow!("quickjs runtime: {err}"))?;
        rt.set_memory_limit(MEMORY_LIMIT);
        rt.set_max_stack_size(MAX_STACK_SIZE);

        let ctx = Context::full(&rt).map_err(|err| anyhow!("quickjs context: {err}"))?;
        ctx.with(|ctx| {
            ctx.globals()
                .set("__baseUrl", base_url)
                .map_err(|err| anyhow!("set __baseUrl: {err}"))?;
            ctx.eval::<(), _>(DOM_SHIM)
                .map_err(|err| anyhow!(js_error_message(&ctx, err, "dom shim eval")))
        })?;

        Ok(Self { rt, ctx })
    }

    /// Insert the located fragment into the shimmed page under a fresh
    /// `#container` element.
    pub fn seed_fragment(&self, fragment: &str) -> anyhow::Result<()> {
        self.ctx.with(|ctx| {
            ctx.globals()
                .set("__fragment", fragment)
                .map_err(|err| anyhow!("set __fragment: {err}"))?;
            ctx.eval::<(), _>("__seedFragment(__fragment); delete globalThis.__fragment;")
                .map_err(|err| anyhow!(js_error_message(&ctx, err, "seed fragment")))
        })
    }

    /// Execute one untrusted script body. An error is reported back for
    /// logging but must never abort sibling scripts or the pipeline.
    pub fn run_script(&self, source: &str) -> Result<(), String> {
        let deadline = Instant::now() + SCRIPT_TIME_BUDGET;
        self.rt
            .set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));

        let result = self.ctx.with(|ctx| {
            ctx.eval::<Value, _>(source)
                .map(|_| ())
                .map_err(|err| js_error_message(&ctx, err, "script eval"))
        });

        self.rt.set_interrupt_handler(None);
        self.pump_jobs();
        result
    }

    /// Run every script, swallowing per-script failures. Returns how many
    /// completed without throwing.
    pub fn run_scripts<'a>(&self, scripts: impl IntoIterator<Item = &'a str>) -> usize {
        let mut succeeded = 0;
        for (idx, script) in scripts.into_iter().enumerate() {
            match self.run_script(script) {
                Ok(()) => succeeded += 1,
                Err(err) => debug!("[sandbox] script #{idx} failed: {err}"),
            }
        }
        succeeded
    }

    /// Give the executed scripts' own scheduling a fair chance to finish:
    /// drain, in due-time order, every queued timer callback that falls
    /// within the settle budget.
    pub fn settle(&self, budget: Duration) {
        let deadline = Instant::now() + SCRIPT_TIME_BUDGET;
        self.rt
            .set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));

        let ran = self.ctx.with(|ctx| {
            ctx.eval::<u32, _>(format!("__drainTimers({})", budget.as_millis()))
                .unwrap_or(0)
        });

        self.rt.set_interrupt_handler(None);
        self.pump_jobs();
        debug!("[sandbox] settle ran {ran} timer callback(s)");
    }

    /// Serialized markup of the mutated page body.
    pub fn page_html(&self) -> anyhow::Result<String> {
        self.ctx.with(|ctx| {
            ctx.eval::<String, _>("__pageHTML()")
                .map_err(|err| anyhow!(js_error_message(&ctx, err, "page serialization")))
        })
    }

    fn pump_jobs(&self) {
        for _ in 0..MAX_PENDING_JOBS {
            match self.rt.execute_pending_job() {
                Ok(true) => continue,
                Ok(false) => break,
                // a rejected job from untrusted code must not stop the rest
                Err(_) => continue,
            }
        }
    }
}

fn js_error_message(ctx: &rquickjs::Ctx<'_>, err: rquickjs::Error, stage: &str) -> String {
    let caught = ctx.catch();
    if let Some(exc) = caught.as_exception() {
        let msg = exc.message().unwrap_or_default();
        format!("{stage}: {msg}")
    } else {
        format!("{stage}: {err}")
    }
}
