use crate::config::Config;
use crate::scheduler::Defer;
use crate::surface::Surface;
use std::fmt;
use std::rc::Rc;

/// External collaborators shared by the reconciler and every instance
pub struct Runtime {
    surface: Rc<dyn Surface>,
    defer: Rc<dyn Defer>,
    config: Config,
}

/// Shared reference to a [`Runtime`]
pub type SharedRuntime = Rc<Runtime>;

impl Runtime {
    pub fn new(surface: Rc<dyn Surface>, defer: Rc<dyn Defer>, config: Config) -> Self {
        Self {
            surface,
            defer,
            config,
        }
    }

    pub fn surface(&self) -> &dyn Surface {
        &*self.surface
    }

    pub fn defer(&self) -> &dyn Defer {
        &*self.defer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
