//! The turn orchestrator.
//!
//! One `handle_message` call is one turn. The orchestrator loads the session
//! (creating on miss), classifies explicit keywords before spending an LLM
//! call, extracts and merges parameters, runs compatibility-constrained
//! searches, commits selections, and persists the whole snapshot exactly
//! once at the end of a successful turn. Categorized failures render as
//! user-visible prompts with the session left untouched.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::domain::catalog::{AccessoryKind, ComponentKind, Product};
use crate::domain::configurator::{
    anchors_for, ApplicabilityTable, Cart, CartEntry, ConfiguratorState, ConversationRole,
    MasterRecord, SessionState, TurnIntent,
};
use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::domain::messages::{
    ConfigurationSummary, LanguageTag, MessageComposer, MessageIntent,
};
use crate::ports::{
    Extraction, ExtractionError, ExtractionRequest, ParameterExtractor, ProductRepository,
    RepositoryError, SearchOutcome,
};

use super::{SessionLocks, SessionStore};

/// Deployment-time knobs for the turn flow.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Minimum `Selected` entries required to finalize.
    pub minimum_real_components: usize,
    /// End-to-end turn deadline.
    pub turn_deadline: Duration,
    /// Sub-deadline for one LLM extraction call.
    pub llm_deadline: Duration,
    /// Sub-deadline for one graph query.
    pub graph_deadline: Duration,
    /// Extraction confidence at or above which a single direct-mention match
    /// commits without an extra confirmation turn.
    pub auto_commit_confidence: f64,
    /// Extraction confidence below which a single match is only presented.
    pub confirm_confidence: f64,
    /// How many conversation entries the extractor sees.
    pub recent_log_entries: usize,
    /// Result cap for proactive next-state suggestions.
    pub proactive_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            minimum_real_components: 1,
            turn_deadline: Duration::from_millis(30_000),
            llm_deadline: Duration::from_millis(10_000),
            graph_deadline: Duration::from_millis(3_000),
            auto_commit_confidence: 0.85,
            confirm_confidence: 0.5,
            recent_log_entries: 6,
            proactive_limit: 3,
        }
    }
}

/// One inbound user turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub session_id: Option<SessionId>,
    pub message: String,
    pub language: Option<LanguageTag>,
    pub reset: bool,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            session_id: None,
            message: message.into(),
            language: None,
            reset: false,
        }
    }

    pub fn with_session(mut self, id: SessionId) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn with_language(mut self, language: LanguageTag) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_reset(mut self) -> Self {
        self.reset = true;
        self
    }
}

/// The outcome of one turn.
#[derive(Debug, Clone)]
pub struct TurnResponse {
    pub session_id: SessionId,
    pub current_state: ConfiguratorState,
    pub message: String,
    /// Options presented this turn, ranked.
    pub options: Vec<Product>,
    pub master: MasterRecord,
    pub cart: Cart,
    pub completed: bool,
}

/// Categorized turn failures. Every variant renders as a normal user prompt
/// with session state unchanged.
enum TurnFailure {
    Extraction(ExtractionError),
    Repository(RepositoryError),
    Integrity(DomainError),
}

impl From<ExtractionError> for TurnFailure {
    fn from(err: ExtractionError) -> Self {
        TurnFailure::Extraction(err)
    }
}

impl From<RepositoryError> for TurnFailure {
    fn from(err: RepositoryError) -> Self {
        TurnFailure::Repository(err)
    }
}

impl From<DomainError> for TurnFailure {
    fn from(err: DomainError) -> Self {
        TurnFailure::Integrity(err)
    }
}

/// The sole mutator of session state.
pub struct Orchestrator {
    extractor: Arc<dyn ParameterExtractor>,
    repository: Arc<dyn ProductRepository>,
    store: SessionStore,
    applicability: Arc<ApplicabilityTable>,
    composer: MessageComposer,
    config: OrchestratorConfig,
    locks: SessionLocks,
}

impl Orchestrator {
    pub fn new(
        extractor: Arc<dyn ParameterExtractor>,
        repository: Arc<dyn ProductRepository>,
        store: SessionStore,
        applicability: Arc<ApplicabilityTable>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            extractor,
            repository,
            store,
            applicability,
            composer: MessageComposer::new(),
            config,
            locks: SessionLocks::new(),
        }
    }

    /// Handles one user turn end-to-end.
    ///
    /// Turns for the same session id are serialized; the whole turn runs
    /// under the configured deadline. Only infrastructure failures (the
    /// session cache itself being down) surface as errors.
    pub async fn handle_message(&self, request: TurnRequest) -> Result<TurnResponse, DomainError> {
        let id = request.session_id.unwrap_or_else(SessionId::new);
        let _guard = self.locks.acquire(id).await;

        match timeout(self.config.turn_deadline, self.run_turn(id, &request)).await {
            Ok(result) => result,
            Err(_) => {
                // The turn deadline maps to the nearest underlying error;
                // nothing was persisted.
                warn!(session_id = %id, "turn deadline exceeded");
                let state = self.load_or_create(id, &request).await?.0;
                Ok(self.respond(state, MessageIntent::ExtractionFallback))
            }
        }
    }

    async fn run_turn(
        &self,
        id: SessionId,
        request: &TurnRequest,
    ) -> Result<TurnResponse, DomainError> {
        // Explicit reset discards everything and greets afresh.
        if request.reset || TurnIntent::classify(&request.message) == TurnIntent::Reset {
            return self.reset_session(id, request).await;
        }

        let (mut state, expired) = self.load_or_create(id, request).await?;
        let pristine = state.clone();

        match self.execute_turn(&mut state, &request.message, expired).await {
            Ok(intents) => {
                let message = self.composer.render_all(&intents, state.language);
                state.add_message(ConversationRole::Assistant, &message);
                if let Err(err) = self.check_invariants(&state) {
                    // Fatal for the turn: abort without persisting anything.
                    error!(session_id = %id, error = %err, "integrity violation");
                    return Ok(self.respond(pristine, MessageIntent::GenericError));
                }
                self.store
                    .put(&state)
                    .await
                    .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?;

                if state.completed && !pristine.completed {
                    self.store.archive(&state).await;
                }

                Ok(self.finish(state, message))
            }
            Err(failure) => {
                // Session state is unchanged; render the failure as a prompt.
                let intent = match failure {
                    TurnFailure::Extraction(err) => {
                        warn!(session_id = %id, error = %err, "extraction failed");
                        MessageIntent::ExtractionFallback
                    }
                    TurnFailure::Repository(err) => {
                        warn!(session_id = %id, error = %err, "product graph failed");
                        MessageIntent::RepositoryUnavailable
                    }
                    TurnFailure::Integrity(err) => {
                        error!(session_id = %id, error = %err, "integrity violation");
                        MessageIntent::GenericError
                    }
                };
                Ok(self.respond(pristine, intent))
            }
        }
    }

    async fn reset_session(
        &self,
        id: SessionId,
        request: &TurnRequest,
    ) -> Result<TurnResponse, DomainError> {
        self.store
            .reset(id)
            .await
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?;

        let language = request.language.unwrap_or_default();
        let mut state = SessionState::new(id, language);
        let message = self
            .composer
            .render(&MessageIntent::Greeting { expired: false }, language);
        state.add_message(ConversationRole::Assistant, &message);
        self.store
            .put(&state)
            .await
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?;

        info!(session_id = %id, "session reset");
        Ok(self.finish(state, message))
    }

    async fn load_or_create(
        &self,
        id: SessionId,
        request: &TurnRequest,
    ) -> Result<(SessionState, bool), DomainError> {
        let loaded = self
            .store
            .get(id)
            .await
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?;

        let expired = loaded.is_none() && request.session_id.is_some();
        let mut state = loaded.unwrap_or_else(|| {
            debug!(session_id = %id, "creating fresh session");
            SessionState::new(id, request.language.unwrap_or_default())
        });
        if let Some(language) = request.language {
            state.language = language;
        }
        Ok((state, expired))
    }

    // ── Turn body ─────────────────────────────────────────────────────────

    async fn execute_turn(
        &self,
        state: &mut SessionState,
        message: &str,
        expired: bool,
    ) -> Result<Vec<MessageIntent>, TurnFailure> {
        let mut intents = Vec::new();
        if expired {
            intents.push(MessageIntent::Greeting { expired: true });
        }

        if state.completed {
            // Terminal sessions answer every further turn with the summary.
            intents.push(MessageIntent::FinalizationSummary {
                summary: ConfigurationSummary::from_cart(&state.cart),
            });
            return Ok(intents);
        }

        state.add_message(ConversationRole::User, message);

        match TurnIntent::classify(message) {
            TurnIntent::Skip => self.handle_skip(state, &mut intents).await?,
            TurnIntent::Finalize => self.handle_finalize(state, &mut intents),
            TurnIntent::Confirm => self.handle_confirm(state, &mut intents).await?,
            // Reset is intercepted in run_turn.
            TurnIntent::Reset | TurnIntent::Data => {
                self.handle_data(state, message, &mut intents).await?
            }
        }

        Ok(intents)
    }

    async fn handle_skip(
        &self,
        state: &mut SessionState,
        intents: &mut Vec<MessageIntent>,
    ) -> Result<(), TurnFailure> {
        match state.current_state {
            ConfiguratorState::PowerSourceSelection => {
                // Mandatory: no advance, no master mutation.
                intents.push(MessageIntent::RejectSkipOfPowerSource);
            }
            ConfiguratorState::Finalize => {
                intents.push(MessageIntent::FinalizePreview {
                    summary: ConfigurationSummary::from_cart(&state.cart),
                });
            }
            other => {
                let kind = other
                    .selection_kind()
                    .ok_or_else(|| DomainError::integrity("selection state without kind"))?;
                state.cart.skip(kind)?;
                state.presented_options.clear();
                intents.push(MessageIntent::SkipConfirmed { kind });
                state.advance();
                self.prompt_or_suggest(state, intents).await;
            }
        }
        Ok(())
    }

    fn handle_finalize(&self, state: &mut SessionState, intents: &mut Vec<MessageIntent>) {
        let current = state.real_component_count();
        let required = self.config.minimum_real_components;
        if current < required {
            // Stay put; finalization is refused below the threshold.
            intents.push(MessageIntent::ThresholdNotMet { current, required });
        } else {
            state.current_state = ConfiguratorState::Finalize;
            state.presented_options.clear();
            intents.push(MessageIntent::FinalizePreview {
                summary: ConfigurationSummary::from_cart(&state.cart),
            });
        }
    }

    async fn handle_confirm(
        &self,
        state: &mut SessionState,
        intents: &mut Vec<MessageIntent>,
    ) -> Result<(), TurnFailure> {
        if state.current_state == ConfiguratorState::Finalize {
            let current = state.real_component_count();
            let required = self.config.minimum_real_components;
            if current < required {
                intents.push(MessageIntent::ThresholdNotMet { current, required });
            } else {
                state.mark_completed();
                info!(session_id = %state.session_id, components = current, "configuration completed");
                intents.push(MessageIntent::FinalizationSummary {
                    summary: ConfigurationSummary::from_cart(&state.cart),
                });
            }
            return Ok(());
        }

        if let Some(product) = state.pending_single_option().cloned() {
            self.commit_selection(state, product, intents).await?;
        } else if let Some(kind) = state.current_state.selection_kind() {
            // A bare "yes" with nothing pending: ask again.
            intents.push(MessageIntent::PromptFor { kind });
        }
        Ok(())
    }

    async fn handle_data(
        &self,
        state: &mut SessionState,
        message: &str,
        intents: &mut Vec<MessageIntent>,
    ) -> Result<(), TurnFailure> {
        // A reply that picks one of the presented options commits directly,
        // by rank or by name, without an LLM round-trip.
        if let Some(product) = self.pick_presented_option(state, message) {
            return self.commit_selection(state, product, intents).await;
        }

        let extraction = self.extract(state, message).await?;

        if extraction.needs_clarification {
            intents.push(MessageIntent::Clarification {
                question: extraction.clarification_question.clone(),
            });
            return Ok(());
        }

        let deltas = extraction.component_deltas();
        for (kind, delta, mention) in &deltas {
            state.master.merge_component(*kind, delta, *mention);
        }
        state.touch();

        let focus = self.focus_kind(state, &deltas);
        let Some(focus) = focus else {
            // Data at S7 that updated nothing: show the preview again.
            intents.push(MessageIntent::FinalizePreview {
                summary: ConfigurationSummary::from_cart(&state.cart),
            });
            return Ok(());
        };

        self.resolve_selection(state, focus, &extraction, intents).await
    }

    /// Picks a presented option by rank ("2") or by unambiguous name.
    fn pick_presented_option(&self, state: &SessionState, message: &str) -> Option<Product> {
        let trimmed = message.trim();
        if let Ok(rank) = trimmed.parse::<usize>() {
            if rank >= 1 && rank <= state.presented_options.len() {
                return Some(state.presented_options[rank - 1].clone());
            }
            return None;
        }
        let matches: Vec<&Product> = state
            .presented_options
            .iter()
            .filter(|p| p.name_matches(trimmed))
            .collect();
        match matches.as_slice() {
            [only] => Some((*only).clone()),
            _ => None,
        }
    }

    /// Decides which component this turn is about: the earliest *upstream*
    /// kind the extraction touched (an override of an earlier step), else
    /// the current state's kind. Accessory focus narrows to the subkind
    /// named by the extracted `accessory_type`.
    fn focus_kind(
        &self,
        state: &SessionState,
        deltas: &[(ComponentKind, &std::collections::BTreeMap<String, String>, Option<&str>)],
    ) -> Option<ComponentKind> {
        let current_index = state.current_state.order_index();

        let upstream = deltas
            .iter()
            .map(|(kind, _, _)| *kind)
            .filter(|kind| ConfiguratorState::for_kind(*kind).order_index() < current_index)
            .min_by_key(|kind| ConfiguratorState::for_kind(*kind).order_index());

        let focus = upstream.or_else(|| state.current_state.selection_kind())?;

        if focus.is_accessory() {
            let subkind = state
                .master
                .bag(focus)
                .get("accessory_type")
                .map(AccessoryKind::from_token)
                .unwrap_or(AccessoryKind::General);
            return Some(ComponentKind::Accessory(subkind));
        }
        Some(focus)
    }

    /// Resolves a focus kind into options or a commit: direct mention lookup
    /// first, then attribute search, otherwise a prompt for parameters.
    async fn resolve_selection(
        &self,
        state: &mut SessionState,
        focus: ComponentKind,
        extraction: &Extraction,
        intents: &mut Vec<MessageIntent>,
    ) -> Result<(), TurnFailure> {
        let bag = state.master.bag(focus).clone();

        if let Some(mention) = bag.direct_product_mention.clone() {
            let candidates = self
                .graph_call(self.repository.lookup_by_name(focus, &mention))
                .await?;

            match candidates.as_slice() {
                [only] => {
                    let confidence = extraction.confidence_for(focus);
                    if confidence >= self.config.auto_commit_confidence {
                        let product = only.clone();
                        return self.commit_selection(state, product, intents).await;
                    }
                    let products = vec![only.clone()];
                    state.present_options(products.clone());
                    intents.push(MessageIntent::PresentOptions {
                        kind: focus,
                        products,
                        fallback: false,
                        compatibility_constrained: false,
                    });
                    return Ok(());
                }
                [_, ..] => {
                    state.present_options(candidates.clone());
                    intents.push(MessageIntent::PresentOptions {
                        kind: focus,
                        products: candidates,
                        fallback: false,
                        compatibility_constrained: false,
                    });
                    return Ok(());
                }
                // No name match: fall through to the attribute search.
                [] => {}
            }
        }

        if bag.is_searchable() {
            let predicate = anchors_for(focus, &state.cart);
            let outcome = self
                .graph_call(self.repository.search_with_fallback(focus, &bag, &predicate))
                .await?;

            state.present_options(outcome.products.clone());
            intents.push(MessageIntent::PresentOptions {
                kind: focus,
                products: outcome.products,
                fallback: outcome.fallback,
                compatibility_constrained: !predicate.is_unconstrained(),
            });
            return Ok(());
        }

        intents.push(MessageIntent::PromptFor { kind: focus });
        Ok(())
    }

    /// Commits a product into the cart, with locking, applicability loading
    /// at S1, the downstream-clear cascade on replacement, and state
    /// advancement.
    async fn commit_selection(
        &self,
        state: &mut SessionState,
        product: Product,
        intents: &mut Vec<MessageIntent>,
    ) -> Result<(), TurnFailure> {
        let kind = product.kind;
        let commit_state = ConfiguratorState::for_kind(kind);

        // Re-confirming the same product is a no-op commit.
        if !kind.is_accessory() {
            if let Some(existing) = state.cart.selected(kind) {
                if existing.gin == product.gin {
                    state.presented_options.clear();
                    intents.push(MessageIntent::Confirm { kind, product });
                    return Ok(());
                }
            }
        }

        let replacing = !kind.is_accessory() && state.cart.selected(kind).is_some();

        state.master.enrich_from_product(kind, &product);
        state.cart.select(product.clone())?;
        state.presented_options.clear();
        info!(
            session_id = %state.session_id,
            gin = %product.gin,
            kind = %kind.category(),
            replacing,
            "product selected"
        );
        intents.push(MessageIntent::Confirm { kind, product: product.clone() });

        if kind == ComponentKind::PowerSource {
            let applicability = self.applicability.lookup(&product.gin);
            let marked = state.apply_applicability(applicability);
            if !marked.is_empty() {
                intents.push(MessageIntent::NotApplicableNotice { kinds: marked });
            }
        }

        if replacing {
            state.cascade_downstream(commit_state);
        } else if kind.is_accessory() {
            // Accessories accumulate; S6 is only exited by "done".
            intents.push(MessageIntent::AccessoriesContinue);
        } else if state.current_state == commit_state {
            state.advance();
        }

        if !kind.is_accessory() {
            self.prompt_or_suggest(state, intents).await;
        }
        Ok(())
    }

    /// After a commit or skip: proactively suggest options for the new
    /// current state, falling back to a parameter prompt. Suggestion
    /// failures never fail the turn.
    async fn prompt_or_suggest(&self, state: &mut SessionState, intents: &mut Vec<MessageIntent>) {
        let Some(kind) = state.current_state.selection_kind() else {
            intents.push(MessageIntent::FinalizePreview {
                summary: ConfigurationSummary::from_cart(&state.cart),
            });
            return;
        };

        let bag = state.master.bag(kind).clone();
        let predicate = anchors_for(kind, &state.cart);

        let outcome = if bag.is_searchable() {
            self.graph_call(self.repository.search_with_fallback(kind, &bag, &predicate))
                .await
        } else {
            self.graph_call(self.repository.find_all_compatible(kind, &predicate))
                .await
                .map(|products| SearchOutcome { products, fallback: false })
        };

        match outcome {
            Ok(outcome) if !outcome.products.is_empty() => {
                let products: Vec<Product> = outcome
                    .products
                    .into_iter()
                    .take(self.config.proactive_limit)
                    .collect();
                state.present_options(products.clone());
                intents.push(MessageIntent::PresentOptions {
                    kind,
                    products,
                    fallback: outcome.fallback,
                    compatibility_constrained: !predicate.is_unconstrained(),
                });
            }
            Ok(_) => intents.push(MessageIntent::PromptFor { kind }),
            Err(_) => {
                debug!(session_id = %state.session_id, "proactive suggestion failed");
                intents.push(MessageIntent::PromptFor { kind });
            }
        }
    }

    // ── Port calls under sub-deadlines ────────────────────────────────────

    async fn extract(
        &self,
        state: &SessionState,
        message: &str,
    ) -> Result<Extraction, TurnFailure> {
        let request = ExtractionRequest::new(message, state.current_state)
            .with_master(state.master.clone())
            .with_recent_log(state.last_messages(self.config.recent_log_entries).to_vec());

        let extraction = match timeout(self.config.llm_deadline, self.extractor.extract(request))
            .await
        {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => {
                return Err(ExtractionError::Timeout {
                    timeout_ms: self.config.llm_deadline.as_millis() as u64,
                }
                .into())
            }
        };

        // Re-check the contract on receipt; violations degrade the turn.
        extraction.validate()?;
        Ok(extraction)
    }

    async fn graph_call<T>(
        &self,
        call: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, TurnFailure> {
        match timeout(self.config.graph_deadline, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(RepositoryError::Timeout {
                timeout_ms: self.config.graph_deadline.as_millis() as u64,
            }
            .into()),
        }
    }

    // ── Invariants and responses ──────────────────────────────────────────

    /// Invariant sweep before persisting. A breach aborts the turn without
    /// persisting anything.
    fn check_invariants(&self, state: &SessionState) -> Result<(), DomainError> {
        if !state.active_states().contains(&state.current_state) {
            return Err(DomainError::integrity(format!(
                "current state {} is not on the active path",
                state.current_state
            )));
        }

        if matches!(
            state.cart.entry(ComponentKind::PowerSource),
            Some(CartEntry::Skipped) | Some(CartEntry::NotApplicable)
        ) {
            return Err(DomainError::integrity("power source entry is not selectable"));
        }

        let applicability = state.applicability.unwrap_or_default();
        for kind in ComponentKind::single_valued() {
            if matches!(state.cart.entry(*kind), Some(CartEntry::NotApplicable))
                && applicability.is_applicable(*kind)
            {
                return Err(DomainError::integrity(format!(
                    "{} marked NotApplicable but applicability says Y",
                    kind.category()
                )));
            }
        }
        if state.cart.accessories.contains(&CartEntry::NotApplicable)
            && applicability.is_applicable(ComponentKind::Accessory(AccessoryKind::General))
        {
            return Err(DomainError::integrity(
                "accessories marked NotApplicable but applicability says Y",
            ));
        }

        Ok(())
    }

    fn respond(&self, state: SessionState, intent: MessageIntent) -> TurnResponse {
        let message = self.composer.render(&intent, state.language);
        self.finish(state, message)
    }

    fn finish(&self, state: SessionState, message: String) -> TurnResponse {
        TurnResponse {
            session_id: state.session_id,
            current_state: state.current_state,
            message,
            options: state.presented_options.clone(),
            master: state.master,
            cart: state.cart,
            completed: state.completed,
        }
    }
}
