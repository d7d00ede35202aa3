// SPDX-License-Identifier: CEPL-1.0
use std::{fmt, sync::Arc};

use tracing::{debug, error, info, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Trace,
    Info,
    Warn,
    Error,
}

/// One message from a backend or a native debug layer.
#[derive(Clone, Debug)]
pub struct DebugRecord<'a> {
    pub file: &'a str,
    pub line: u32,
    pub function: &'a str,
    pub level: DebugLevel,
    pub message: &'a str,
}

type InitFailureHook = Arc<dyn Fn(&str) + Send + Sync>;
type DebugOutputHook = Arc<dyn Fn(&DebugRecord<'_>) + Send + Sync>;
type DebugPrintHook = Arc<dyn Fn(fmt::Arguments<'_>) + Send + Sync>;

/// Caller-supplied hooks. Each one is invoked synchronously on the rendering
/// thread and must not call back into the graphics facade. A hook that is not
/// installed falls back to `tracing`.
#[derive(Clone, Default)]
pub struct Diagnostics {
    init_failure: Option<InitFailureHook>,
    debug_output: Option<DebugOutputHook>,
    debug_print: Option<DebugPrintHook>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_init_failure(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.init_failure = Some(Arc::new(hook));
        self
    }

    pub fn on_debug_output(
        mut self,
        hook: impl Fn(&DebugRecord<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.debug_output = Some(Arc::new(hook));
        self
    }

    pub fn on_debug_print(
        mut self,
        hook: impl Fn(fmt::Arguments<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.debug_print = Some(Arc::new(hook));
        self
    }

    pub fn init_failure(&self, message: &str) {
        error!("graphics init failed: {message}");
        if let Some(hook) = &self.init_failure {
            hook(message);
        }
    }

    pub fn debug_output(&self, record: &DebugRecord<'_>) {
        match &self.debug_output {
            Some(hook) => hook(record),
            None => {
                let DebugRecord {
                    file,
                    line,
                    function,
                    message,
                    ..
                } = record;
                match record.level {
                    DebugLevel::Trace => trace!("{file}:{line} {function}: {message}"),
                    DebugLevel::Info => info!("{file}:{line} {function}: {message}"),
                    DebugLevel::Warn => warn!("{file}:{line} {function}: {message}"),
                    DebugLevel::Error => error!("{file}:{line} {function}: {message}"),
                }
            }
        }
    }

    pub fn debug_print(&self, args: fmt::Arguments<'_>) {
        match &self.debug_print {
            Some(hook) => hook(args),
            None => debug!("{args}"),
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("init_failure", &self.init_failure.is_some())
            .field("debug_output", &self.debug_output.is_some())
            .field("debug_print", &self.debug_print.is_some())
            .finish()
    }
}

/// Emits a [`DebugRecord`] tagged with the call site.
#[macro_export]
macro_rules! debug_output {
    ($diag:expr, $level:expr, $($arg:tt)+) => {{
        let message = ::std::format!($($arg)+);
        $diag.debug_output(&$crate::DebugRecord {
            file: ::std::file!(),
            line: ::std::line!(),
            function: ::std::module_path!(),
            level: $level,
            message: &message,
        });
    }};
}
