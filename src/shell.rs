//! Console shell
//!
//! Owns everything a running console needs (API client, auth session,
//! context store, selection flow and menu tree) and exposes the user-level
//! operations a host drives: login, bootstrap, context changes, route
//! tracking and logout.

use std::sync::Arc;

use crate::api::{ApiClient, ApiOutcome, Navigator, Notifier};
use crate::config::ClientConfig;
use crate::context::{ContextCommit, ContextSelectionFlow, RefreshOutcome};
use crate::error::{ClientError, ErrorKind};
use crate::menu::{MenuItem, MenuTree};
use crate::models::{BranchId, FinancialYearId};
use crate::session::AuthSession;
use crate::storage::SharedStorage;
use crate::store::{Action, SessionContext, Writer};
use crate::transport::Transport;
use crate::validation::{LoginForm, SignUpForm};

/// Fetches that failed during [`ConsoleShell::bootstrap`] without ending
/// the session.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub failed: Vec<(&'static str, ClientError)>,
}

impl BootstrapReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ConsoleShell<T> {
    api: ApiClient<T>,
    session: AuthSession,
    store: SessionContext,
    flow: ContextSelectionFlow,
    menu: MenuTree,
    storage: SharedStorage,
    login_route: String,
    home_route: String,
}

impl<T: Transport> ConsoleShell<T> {
    /// Restore the session and store from `storage` and wire up the client.
    pub fn open(
        config: &ClientConfig,
        transport: T,
        storage: SharedStorage,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let session = AuthSession::load(storage.clone())?;
        let store = SessionContext::restore(storage.clone())?;
        let flow = ContextSelectionFlow::from_store(&store);
        let api = ApiClient::new(transport, notifier, navigator).with_login_route(&config.login_route);
        tracing::debug!(authenticated = session.is_authenticated(), "console opened");
        Ok(Self {
            api,
            session,
            store,
            flow,
            menu: MenuTree::default(),
            storage,
            login_route: config.login_route.clone(),
            home_route: config.home_route.clone(),
        })
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn store(&self) -> &SessionContext {
        &self.store
    }

    pub fn flow(&self) -> &ContextSelectionFlow {
        &self.flow
    }

    pub fn menu(&self) -> &MenuTree {
        &self.menu
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    // ── session lifecycle ────────────────────────────────────────

    pub async fn login(&mut self, form: &LoginForm) -> Result<BootstrapReport, ClientError> {
        form.validate().map_err(ClientError::Validation)?;

        let outcome = self.api.login(&mut self.session, form).await;
        let payload = self.settle(outcome)?;
        self.session.replace_primary(payload.token())?;
        if let Some(sub) = payload.subscription_token() {
            self.session.set_subscription(Some(sub.to_string()))?;
        }
        tracing::info!(user = ?self.session.user_id(), "logged in");

        self.api.navigator().navigate(&self.home_route);
        self.bootstrap().await
    }

    pub async fn signup(&mut self, form: &SignUpForm) -> Result<(), ClientError> {
        form.validate().map_err(ClientError::Validation)?;

        let outcome = self.api.register(&mut self.session, form).await;
        self.settle(outcome)?;
        tracing::info!(username = %form.username.trim(), "registered");
        self.api.navigator().navigate(&self.home_route);
        Ok(())
    }

    /// Wipe all client storage and return to the login screen.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.storage.clear()?;
        self.session.forget();
        self.reset_context()?;
        tracing::info!("logged out");
        self.api.navigator().navigate(&self.login_route);
        Ok(())
    }

    /// Load the per-session data: profile, company, branches, financial
    /// years and menu, applying branch / year defaults.
    ///
    /// A rejected session stops the bootstrap with `Unauthorized`; any other
    /// failed fetch is recorded in the report and the rest still run.
    pub async fn bootstrap(&mut self) -> Result<BootstrapReport, ClientError> {
        let Some(user_id) = self.session.user_id() else {
            tracing::debug!("no usable session token, skipping bootstrap");
            self.api.navigator().navigate(&self.login_route);
            return Err(ClientError::Unauthorized);
        };
        let mut report = BootstrapReport::default();

        self.store
            .dispatch(Writer::ProfileSync, Action::SetUserId(Some(user_id.clone())))?;

        let outcome = self.api.fetch_user_profile(&mut self.session, &user_id).await;
        if let Some(profile) = self.settle_step(&mut report, "user_profile", outcome)? {
            self.store
                .dispatch(Writer::ProfileSync, Action::SetUserDetails(Some(profile)))?;
        }

        let outcome = self.api.get_company_details(&mut self.session).await;
        if let Some(company) = self.settle_step(&mut report, "company_details", outcome)? {
            self.store
                .dispatch(Writer::ProfileSync, Action::SetCompanyDetails(Some(company)))?;
        }

        let outcome = self.api.load_location_list(&mut self.session).await;
        if let Some(locations) = self.settle_step(&mut report, "locations", outcome)? {
            self.flow.apply_locations(&mut self.store, locations)?;
        }

        let outcome = self.api.load_financial_year_list(&mut self.session).await;
        if let Some(years) = self.settle_step(&mut report, "financial_years", outcome)? {
            self.flow
                .apply_financial_years(&mut self.store, years, self.api.notifier().as_ref())?;
        }

        let outcome = self.api.fetch_sidebar_menu(&mut self.session).await;
        if let Some(menu) = self.settle_step(&mut report, "sidebar_menu", outcome)? {
            self.store.dispatch(
                Writer::Navigation,
                Action::SetSidebarChildMenu(menu.erp_child_menu_list.clone()),
            )?;
            self.menu = MenuTree::from(menu);
        }

        if !report.is_complete() {
            tracing::warn!(failed = report.failed.len(), "bootstrap finished with failures");
        }
        Ok(report)
    }

    // ── context selection ────────────────────────────────────────

    pub fn stage_branch(&mut self, branch: BranchId) {
        self.flow.stage_branch(branch);
    }

    pub fn stage_financial_year(&mut self, year: FinancialYearId) {
        self.flow.stage_financial_year(year);
    }

    pub fn cancel_staged(&mut self) {
        self.flow.cancel_staged();
    }

    pub async fn save_branch(&mut self) -> Result<ContextCommit, ClientError> {
        let commit = self
            .flow
            .save_branch(&mut self.store, &self.api, &mut self.session)
            .await?;
        self.after_commit(commit)
    }

    pub async fn save_financial_year(&mut self) -> Result<ContextCommit, ClientError> {
        let commit = self
            .flow
            .save_financial_year(&mut self.store, &self.api, &mut self.session)
            .await?;
        self.after_commit(commit)
    }

    pub async fn select_branch(&mut self, branch: BranchId) -> Result<ContextCommit, ClientError> {
        self.flow.stage_branch(branch);
        self.save_branch().await
    }

    pub async fn select_financial_year(
        &mut self,
        year: FinancialYearId,
    ) -> Result<ContextCommit, ClientError> {
        self.flow.stage_financial_year(year);
        self.save_financial_year().await
    }

    // ── navigation ───────────────────────────────────────────────

    /// Publish the menu entry for `pathname`, or clear the selection.
    pub fn route_changed(&mut self, pathname: &str) -> Result<(), ClientError> {
        let selected = self.menu.selection_for(pathname);
        tracing::trace!(pathname, found = selected.is_some(), "route changed");
        self.store
            .dispatch(Writer::Navigation, Action::SetSelectedMenu(selected))?;
        Ok(())
    }

    pub fn menu_clicked(&mut self, item: &MenuItem) -> Result<(), ClientError> {
        self.store
            .dispatch(Writer::Navigation, Action::SetSelectedMenu(Some(item.selection())))?;
        if !item.route.is_empty() {
            self.api.navigator().navigate(&item.route);
        }
        Ok(())
    }

    // ── internals ────────────────────────────────────────────────

    /// The API wrapper has already wiped the session on a 401; drop the
    /// in-memory context to match.
    fn settle<R>(&mut self, outcome: ApiOutcome<R>) -> Result<R, ClientError> {
        if outcome.is_unauthorized() {
            self.reset_context()?;
        }
        outcome.into_result()
    }

    fn settle_step<R>(
        &mut self,
        report: &mut BootstrapReport,
        step: &'static str,
        outcome: ApiOutcome<R>,
    ) -> Result<Option<R>, ClientError> {
        match self.settle(outcome) {
            Ok(data) => Ok(Some(data)),
            Err(ClientError::Unauthorized) => Err(ClientError::Unauthorized),
            Err(err) => {
                tracing::warn!(step, error = %err, "bootstrap step failed");
                report.failed.push((step, err));
                Ok(None)
            }
        }
    }

    fn after_commit(&mut self, commit: ContextCommit) -> Result<ContextCommit, ClientError> {
        if let RefreshOutcome::Failed(err) = &commit.refresh {
            if err.kind() == ErrorKind::Unauthorized {
                self.reset_context()?;
            }
        }
        Ok(commit)
    }

    fn reset_context(&mut self) -> Result<(), ClientError> {
        self.store.dispatch(Writer::SessionLifecycle, Action::Reset)?;
        self.flow = ContextSelectionFlow::new();
        self.menu = MenuTree::default();
        Ok(())
    }
}
