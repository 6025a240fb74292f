//! The plugin-chaining engine.
//!
//! An [`IdentityResolver`] threads an accumulating
//! [`ResolutionMap`] through an ordered list of plugins. Each plugin
//! receives the input, the map as it stands, and a [`Next`] continuation
//! capturing the rest of the chain. A plugin that returns without calling
//! the continuation short-circuits: nothing downstream runs, and the
//! resolver returns the map as the plugin left it.
//!
//! The continuation offers two modes: pass-through (`run`) and keyed merge
//! (`merge`), which clones the map and adds named entries while preserving
//! every key set by earlier plugins. There is deliberately no whole-map
//! override; keyed merge is the single merge primitive.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;
use vouch_common::{ApplicantInput, CheckEntry, CheckName, ResolutionMap};

use crate::error::ResolverError;
use crate::events::{DecisionEvent, EventSink};

/// One link in the resolution chain.
#[async_trait]
pub trait ResolutionPlugin: Send + Sync {
    /// Stable plugin name for error reporting.
    fn name(&self) -> &'static str;

    /// Run this plugin and, unless short-circuiting, invoke `next`.
    ///
    /// Recoverable vendor failures must be encoded into the map, not
    /// returned as errors; `Err` is reserved for programming errors and
    /// aborts the whole resolution.
    async fn call(
        &self,
        input: &ApplicantInput,
        result: ResolutionMap,
        next: Next<'_>,
    ) -> Result<ResolutionMap, ResolverError>;
}

/// Continuation over the remainder of the plugin chain.
pub struct Next<'a> {
    input: &'a ApplicantInput,
    rest: &'a [Arc<dyn ResolutionPlugin>],
}

impl<'a> Next<'a> {
    /// A continuation with no plugins remaining. Lets a single plugin be
    /// exercised in isolation.
    pub fn terminal(input: &'a ApplicantInput) -> Self {
        Self { input, rest: &[] }
    }

    /// Pass the map through to the next plugin unchanged. With no plugins
    /// remaining the chain terminates and `result` is the final answer.
    pub async fn run(self, result: ResolutionMap) -> Result<ResolutionMap, ResolverError> {
        match self.rest.split_first() {
            None => Ok(result),
            Some((plugin, rest)) => {
                plugin
                    .call(
                        self.input,
                        result,
                        Next {
                            input: self.input,
                            rest,
                        },
                    )
                    .await
            }
        }
    }

    /// Merge named entries into the map, then continue. Keys owned by
    /// earlier plugins are preserved untouched.
    pub async fn merge(
        self,
        result: ResolutionMap,
        entries: impl IntoIterator<Item = (CheckName, CheckEntry)> + Send,
    ) -> Result<ResolutionMap, ResolverError> {
        let mut merged = result;
        for (name, entry) in entries {
            merged = merged.with(name, entry);
        }
        self.run(merged).await
    }
}

/// Drives an ordered plugin list over one applicant.
pub struct IdentityResolver {
    plugins: Vec<Arc<dyn ResolutionPlugin>>,
    events: Arc<dyn EventSink>,
}

impl IdentityResolver {
    pub fn new(plugins: Vec<Arc<dyn ResolutionPlugin>>, events: Arc<dyn EventSink>) -> Self {
        Self { plugins, events }
    }

    /// Run every plugin in list order and return the accumulated map.
    ///
    /// Emits exactly one terminal decision event per attempt, whether the
    /// chain ran to completion or a plugin short-circuited it.
    pub async fn resolve_identity(
        &self,
        input: &ApplicantInput,
    ) -> Result<ResolutionMap, ResolverError> {
        let span = tracing::info_span!("resolve_identity", plugins = self.plugins.len());
        let result = Next {
            input,
            rest: &self.plugins,
        }
        .run(ResolutionMap::new())
        .instrument(span)
        .await?;

        let event = match result.decision() {
            Some(decision) => DecisionEvent {
                passed: decision.passed(),
                failed_checks: decision.failed_checks.clone(),
                short_circuited: false,
            },
            // The decider never ran: an upstream plugin stopped the chain.
            None => DecisionEvent {
                passed: false,
                failed_checks: Vec::new(),
                short_circuited: true,
            },
        };
        self.events.decision_made(event);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use std::sync::Mutex;
    use vouch_common::{SkipReason, VendorResult};

    /// Plugin that records its invocation and merges one named entry.
    struct TracePlugin {
        name: &'static str,
        slot: CheckName,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ResolutionPlugin for TracePlugin {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn call(
            &self,
            _input: &ApplicantInput,
            result: ResolutionMap,
            next: Next<'_>,
        ) -> Result<ResolutionMap, ResolverError> {
            self.log.lock().unwrap().push(self.name);
            let entry = VendorResult::skipped(self.name, SkipReason::FeatureDisabled);
            next.merge(result, [(self.slot, CheckEntry::Vendor(entry))])
                .await
        }
    }

    /// Plugin that never calls the continuation.
    struct StopPlugin {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ResolutionPlugin for StopPlugin {
        fn name(&self) -> &'static str {
            "stop"
        }

        async fn call(
            &self,
            _input: &ApplicantInput,
            result: ResolutionMap,
            _next: Next<'_>,
        ) -> Result<ResolutionMap, ResolverError> {
            self.log.lock().unwrap().push("stop");
            Ok(result.with_vendor(
                CheckName::StateId,
                VendorResult::skipped("stop", SkipReason::UnsupportedJurisdiction),
            ))
        }
    }

    fn trace(
        name: &'static str,
        slot: CheckName,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn ResolutionPlugin> {
        Arc::new(TracePlugin {
            name,
            slot,
            log: log.clone(),
        })
    }

    #[tokio::test]
    async fn plugins_run_in_list_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let resolver = IdentityResolver::new(
            vec![
                trace("first", CheckName::AddressOfResidence, &log),
                trace("second", CheckName::StateId, &log),
                trace("third", CheckName::DeviceFraud, &log),
            ],
            Arc::new(NullEvents),
        );

        let map = resolver
            .resolve_identity(&ApplicantInput::default())
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
        let names: Vec<_> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                CheckName::AddressOfResidence,
                CheckName::StateId,
                CheckName::DeviceFraud
            ]
        );
    }

    #[tokio::test]
    async fn short_circuit_prevents_downstream_plugins() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(RecordingSink::new());
        let resolver = IdentityResolver::new(
            vec![
                trace("first", CheckName::AddressOfResidence, &log),
                Arc::new(StopPlugin { log: log.clone() }),
                trace("never", CheckName::DeviceFraud, &log),
            ],
            events.clone(),
        );

        let map = resolver
            .resolve_identity(&ApplicantInput::default())
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "stop"]);
        assert!(!map.contains(CheckName::DeviceFraud));
        // Short-circuit still produces exactly one decision event.
        assert_eq!(events.decision_count(), 1);
        assert!(events.decisions.lock().unwrap()[0].short_circuited);
    }

    #[tokio::test]
    async fn merge_preserves_earlier_keys() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let resolver = IdentityResolver::new(
            vec![
                trace("first", CheckName::AddressOfResidence, &log),
                trace("second", CheckName::StateId, &log),
            ],
            Arc::new(NullEvents),
        );

        let map = resolver
            .resolve_identity(&ApplicantInput::default())
            .await
            .unwrap();

        let first = map.vendor(CheckName::AddressOfResidence).unwrap();
        assert_eq!(first.vendor_name, "first");
        assert_eq!(map.len(), 2);
    }

    /// Plugin that hits an internal invariant violation.
    struct BuggyPlugin;

    #[async_trait]
    impl ResolutionPlugin for BuggyPlugin {
        fn name(&self) -> &'static str {
            "buggy"
        }

        async fn call(
            &self,
            _input: &ApplicantInput,
            _result: ResolutionMap,
            _next: Next<'_>,
        ) -> Result<ResolutionMap, ResolverError> {
            Err(ResolverError::Plugin {
                plugin: self.name(),
                message: "payload builder produced no checks".into(),
            })
        }
    }

    #[tokio::test]
    async fn plugin_error_aborts_the_chain_unswallowed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(RecordingSink::new());
        let resolver = IdentityResolver::new(
            vec![
                trace("first", CheckName::AddressOfResidence, &log),
                Arc::new(BuggyPlugin),
                trace("never", CheckName::DeviceFraud, &log),
            ],
            events.clone(),
        );

        let err = resolver
            .resolve_identity(&ApplicantInput::default())
            .await
            .unwrap_err();

        let ResolverError::Plugin { plugin, message } = err;
        assert_eq!(plugin, "buggy");
        assert!(message.contains("no checks"));
        // Nothing downstream ran and no decision was recorded.
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
        assert_eq!(events.decision_count(), 0);
    }

    struct NullEvents;
    impl crate::events::EventSink for NullEvents {
        fn check_completed(&self, _event: crate::events::CheckOutcomeEvent) {}
        fn decision_made(&self, _event: crate::events::DecisionEvent) {}
    }
}
