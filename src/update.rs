//! Update-check hook run once at startup. The check itself is supplied by the host.

use anyhow::Result;
use tracing::{debug, warn};

/// Looks for a newer release of the application
pub trait UpdateCheck {
    /// Returns a notice to show when an update is available
    fn check(&self, app_name: &str) -> Result<Option<String>>;
}

/// Performs no check
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipUpdateCheck;

impl UpdateCheck for SkipUpdateCheck {
    fn check(&self, _app_name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Run a check, logging notices and failures; never fails
pub fn run_update_check(check: &dyn UpdateCheck, app_name: &str) {
    match check.check(app_name) {
        Ok(Some(notice)) => warn!("{}", notice),
        Ok(None) => debug!(app = app_name, "no update available"),
        Err(e) => warn!("Update check for {} failed: {:#}", app_name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording {
        names: RefCell<Vec<String>>,
        fail: bool,
    }

    impl UpdateCheck for Recording {
        fn check(&self, app_name: &str) -> Result<Option<String>> {
            self.names.borrow_mut().push(app_name.to_string());
            if self.fail {
                anyhow::bail!("registry unreachable");
            }
            Ok(Some(format!("{} 2.0.0 is available", app_name)))
        }
    }

    #[test]
    fn test_run_update_check_passes_app_name() {
        let check = Recording {
            names: RefCell::new(Vec::new()),
            fail: false,
        };
        run_update_check(&check, "acme");
        assert_eq!(*check.names.borrow(), vec!["acme"]);
    }

    #[test]
    fn test_run_update_check_swallows_errors() {
        let check = Recording {
            names: RefCell::new(Vec::new()),
            fail: true,
        };
        run_update_check(&check, "acme");
        assert_eq!(check.names.borrow().len(), 1);
    }

    #[test]
    fn test_skip_update_check() {
        assert!(SkipUpdateCheck.check("acme").unwrap().is_none());
    }
}
