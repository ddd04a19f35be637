//! Scoped host settings.
//!
//! A batch run switches off everything in the host application that would
//! slow it down or interfere with programmatic edits (screen updates, events,
//! as-you-type proofing and auto-format) and points the hyperlink base at the
//! document's folder. [`HostSession`] captures the host's settings first and
//! puts them back when it is dropped, on success and on failure alike.

use crate::config::LinkerConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application-wide settings a batch run changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOptions {
    /// Redraw the screen after each change
    pub screen_updating: bool,
    /// Fire document events (macros, add-ins)
    pub events_enabled: bool,
    /// Spell-check while typing
    pub check_spelling_as_you_type: bool,
    /// Grammar-check while typing
    pub check_grammar_as_you_type: bool,
    /// Apply auto-format rules while typing
    pub auto_format_as_you_type: bool,
    /// Base that relative hyperlink addresses resolve against
    pub hyperlink_base: Option<String>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            screen_updating: true,
            events_enabled: true,
            check_spelling_as_you_type: true,
            check_grammar_as_you_type: true,
            auto_format_as_you_type: true,
            hyperlink_base: None,
        }
    }
}

impl HostOptions {
    /// Settings for a batch run: everything interactive off.
    pub fn batch(link_base: Option<&Path>) -> Self {
        Self {
            screen_updating: false,
            events_enabled: false,
            check_spelling_as_you_type: false,
            check_grammar_as_you_type: false,
            auto_format_as_you_type: false,
            hyperlink_base: link_base.map(|p| p.to_string_lossy().replace('\\', "/")),
        }
    }
}

/// Access to a host application's settings.
pub trait HostSettings {
    /// Current settings.
    fn options(&self) -> HostOptions;

    /// Replace the settings.
    fn set_options(&mut self, options: &HostOptions) -> Result<()>;
}

/// Batch settings applied for the lifetime of the value.
pub struct HostSession<'h, H: HostSettings + ?Sized> {
    host: &'h mut H,
    saved: HostOptions,
}

impl<'h, H: HostSettings + ?Sized> HostSession<'h, H> {
    /// Snapshot the host's settings and apply batch settings.
    pub fn acquire(host: &'h mut H, config: &LinkerConfig) -> Result<Self> {
        let saved = host.options();
        host.set_options(&HostOptions::batch(config.link_base.as_deref()))?;
        log::debug!("Host settings switched to batch mode");
        Ok(Self { host, saved })
    }

    /// Settings that will be restored.
    pub fn saved(&self) -> &HostOptions {
        &self.saved
    }

    /// The host, for the duration of the session.
    pub fn host(&self) -> &H {
        &*self.host
    }

    /// Mutable access to the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: HostSettings + ?Sized> Drop for HostSession<'_, H> {
    fn drop(&mut self) {
        match self.host.set_options(&self.saved) {
            Ok(()) => log::debug!("Host settings restored"),
            Err(err) => log::error!("Could not restore host settings: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Default)]
    struct FakeHost {
        options: HostOptions,
        writes: usize,
        fail_after: Option<usize>,
    }

    impl HostSettings for FakeHost {
        fn options(&self) -> HostOptions {
            self.options.clone()
        }

        fn set_options(&mut self, options: &HostOptions) -> Result<()> {
            if self.fail_after == Some(self.writes) {
                return Err(Error::Config("host busy".to_string()));
            }
            self.writes += 1;
            self.options = options.clone();
            Ok(())
        }
    }

    #[test]
    fn test_batch_then_restore() {
        let mut host = FakeHost::default();
        host.options.check_spelling_as_you_type = false;
        let before = host.options.clone();

        let config = LinkerConfig::new().with_link_base("/case/briefs");
        {
            let session = HostSession::acquire(&mut host, &config).unwrap();
            assert!(!session.host().options.screen_updating);
            assert_eq!(
                session.host().options.hyperlink_base.as_deref(),
                Some("/case/briefs")
            );
            assert_eq!(session.saved(), &before);
        }
        assert_eq!(host.options, before);
    }

    #[test]
    fn test_acquire_failure_changes_nothing() {
        let mut host = FakeHost {
            fail_after: Some(0),
            ..FakeHost::default()
        };
        assert!(HostSession::acquire(&mut host, &LinkerConfig::new()).is_err());
        assert_eq!(host.options, HostOptions::default());
    }
}
