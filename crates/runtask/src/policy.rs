//! Credential policy: which workspace variable keys are disallowed, and the
//! verdict produced when they are found.
//!
//! Everything here is pure. The worker feeds in keys in the order the platform
//! listed them and reports whatever [`evaluate`] returns.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::TaskResult;

/// Keys rejected by [`RestrictedKeys::default`]: static cloud credentials that
/// the platform team injects on the workspace owner's behalf.
pub const DEFAULT_RESTRICTED_KEYS: [&str; 4] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_EXPIRATION",
    "AWS_SESSION_TOKEN",
];

/// Address workspace owners are pointed at in failure messages.
pub const CONTACT_ADDRESS: &str = "platform@mycoolcompany.com";

/// Message reported when no restricted key is present.
pub const PASSED_MESSAGE: &str =
    "No erroneous credentials set on this workspace. Good job! --Platform Engineering Team";

// ---------------------------------------------------------------------------
// Restricted key set
// ---------------------------------------------------------------------------

/// The set of variable keys a workspace must not carry.
///
/// Built once at startup and shared read-only for the life of the process.
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedKeys {
    keys: BTreeSet<String>,
}

impl RestrictedKeys {
    /// Creates a set from arbitrary keys.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if `key` is restricted.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Returns the keys of `listed` that are restricted.
    ///
    /// Input order is preserved and duplicates are kept: a key listed twice
    /// is reported twice.
    pub fn find_restricted<'a, I>(&self, listed: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        listed
            .into_iter()
            .filter(|key| self.contains(key))
            .map(str::to_owned)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for RestrictedKeys {
    fn default() -> Self {
        Self::new(DEFAULT_RESTRICTED_KEYS)
    }
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// What to report when the workspace variables could not be listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailurePolicy {
    /// Treat the workspace as having no variables and report `passed`.
    #[default]
    FailOpen,
    /// Report `failed`, telling the owner the check could not complete.
    FailClosed,
}

/// Builds the failure message naming every offending key, comma-joined.
pub fn failure_message(found: &[String]) -> String {
    format!(
        "This workspace appears to have AWS credential variables set on it. \
         AWS credentials are managed on your behalf by the Platform Engineering team. \
         These must be removed immediately to ensure compliance: {}. \
         Go to the \"Variables\" page in the left side nav and remove these variables, \
         then start another run. If you have any questions, feel free to reach out to \
         {CONTACT_ADDRESS}. Thanks!",
        found.join(", ")
    )
}

/// Message reported under [`LookupFailurePolicy::FailClosed`].
pub fn lookup_failed_message(reason: &str) -> String {
    format!(
        "The workspace variables could not be inspected ({reason}), so this run cannot be \
         cleared of AWS credential variables. Start another run to retry, or reach out to \
         {CONTACT_ADDRESS} if this keeps happening."
    )
}

/// Maps the restricted keys found on a workspace to a verdict.
pub fn evaluate(found: &[String]) -> TaskResult {
    if found.is_empty() {
        TaskResult::passed(PASSED_MESSAGE)
    } else {
        TaskResult::failed(failure_message(found))
    }
}
