//! Branch / financial-year context selection
//!
//! Each dimension moves through `Unset → Defaulted → UserSelected`:
//!
//! ```text
//! Unset ──list fetched, nothing stored──▶ Defaulted ──user confirms──▶ UserSelected
//!                                                      ◀──user confirms──┘
//! ```
//!
//! A confirmed choice is committed to the store before anything else
//! happens. The session token is refreshed only when a dimension that
//! already held a value changes to a different one and both dimensions are
//! known; automatic defaults never refresh. A failed refresh leaves the
//! committed selection in place.

use crate::api::{ApiClient, Notifier};
use crate::error::{ClientError, ErrorKind};
use crate::models::{BranchId, DatePeriod, FinancialYear, FinancialYearId, Location};
use crate::session::AuthSession;
use crate::store::{Action, SessionContext, Writer};
use crate::transport::Transport;

pub const NO_FINANCIAL_YEAR_MESSAGE: &str = "No financial year is configured";
pub const BRANCH_PLACEHOLDER: &str = "Branch";
pub const FINANCIAL_YEAR_PLACEHOLDER: &str = "Financial Year";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<Id> {
    Unset,
    /// Chosen by the system: first fetch default, or restored from storage.
    Defaulted(Id),
    UserSelected(Id),
}

impl<Id> Default for Selection<Id> {
    fn default() -> Self {
        Selection::Unset
    }
}

impl<Id> Selection<Id> {
    pub fn value(&self) -> Option<&Id> {
        match self {
            Selection::Unset => None,
            Selection::Defaulted(id) | Selection::UserSelected(id) => Some(id),
        }
    }

    pub fn is_user_selected(&self) -> bool {
        matches!(self, Selection::UserSelected(_))
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    /// No refresh was due for this commit.
    NotNeeded,
    Refreshed,
    /// The refresh failed; the selection stays committed.
    Failed(ClientError),
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed)
    }
}

/// Result of confirming a selection.
#[derive(Debug)]
pub struct ContextCommit {
    /// False when nothing was staged or the staged value was already active.
    pub changed: bool,
    pub refresh: RefreshOutcome,
}

impl ContextCommit {
    fn unchanged() -> Self {
        Self {
            changed: false,
            refresh: RefreshOutcome::NotNeeded,
        }
    }
}

#[derive(Debug, Default)]
pub struct ContextSelectionFlow {
    branch: Selection<BranchId>,
    year: Selection<FinancialYearId>,
    locations: Vec<Location>,
    years: Vec<FinancialYear>,
    staged_branch: Option<BranchId>,
    staged_year: Option<FinancialYearId>,
}

impl ContextSelectionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt whatever context the store restored from a previous run.
    pub fn from_store(store: &SessionContext) -> Self {
        Self {
            branch: store.branch().cloned().map_or(Selection::Unset, Selection::Defaulted),
            year: store
                .financial_year()
                .cloned()
                .map_or(Selection::Unset, Selection::Defaulted),
            ..Self::default()
        }
    }

    pub fn branch(&self) -> &Selection<BranchId> {
        &self.branch
    }

    pub fn financial_year(&self) -> &Selection<FinancialYearId> {
        &self.year
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Branches offered in the selection dialog.
    pub fn active_locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter().filter(|l| l.is_active)
    }

    pub fn financial_years(&self) -> &[FinancialYear] {
        &self.years
    }

    // ── fetch completion ─────────────────────────────────────────

    /// Record the fetched branch list and default the branch if none is
    /// stored. Returns the defaulted branch, if one was chosen.
    pub fn apply_locations(
        &mut self,
        store: &mut SessionContext,
        locations: Vec<Location>,
    ) -> Result<Option<BranchId>, ClientError> {
        self.locations = locations;

        if let Some(current) = store.branch() {
            if self.branch == Selection::Unset {
                self.branch = Selection::Defaulted(current.clone());
            }
            return Ok(None);
        }

        let Some(default) = self
            .locations
            .iter()
            .find(|l| l.is_active)
            .or_else(|| self.locations.first())
            .map(|l| l.location_id.clone())
        else {
            return Ok(None);
        };

        store.dispatch(Writer::ContextSelection, Action::SetBranch(Some(default.clone())))?;
        self.branch = Selection::Defaulted(default.clone());
        tracing::info!(branch = %default, "branch defaulted");
        Ok(Some(default))
    }

    /// Record the fetched financial-year list and default the year if none
    /// is stored. An empty list warns and clears any restored year; branch
    /// context is untouched.
    pub fn apply_financial_years(
        &mut self,
        store: &mut SessionContext,
        years: Vec<FinancialYear>,
        notifier: &dyn Notifier,
    ) -> Result<Option<FinancialYearId>, ClientError> {
        self.years = years;

        if self.years.is_empty() {
            tracing::warn!("backend returned no financial years");
            notifier.warning(NO_FINANCIAL_YEAR_MESSAGE);
            if store.financial_year().is_some() || store.time_zone_id().is_some() {
                tracing::debug!("dropping restored financial year");
                store.dispatch(Writer::ContextSelection, Action::SetFinancialYear(None))?;
                store.dispatch(
                    Writer::ContextSelection,
                    Action::SetTimeZone { id: None, name: None },
                )?;
            }
            self.year = Selection::Unset;
            self.staged_year = None;
            return Ok(None);
        }

        if let Some(current) = store.financial_year() {
            if self.year == Selection::Unset {
                self.year = Selection::Defaulted(current.clone());
            }
            return Ok(None);
        }

        let Some(default) = self
            .years
            .iter()
            .find(|y| y.is_active)
            .or_else(|| self.years.first())
            .cloned()
        else {
            return Ok(None);
        };

        self.commit_year(store, &default)?;
        self.year = Selection::Defaulted(default.year_id.clone());
        tracing::info!(financial_year = %default.year_id, "financial year defaulted");
        Ok(Some(default.year_id))
    }

    // ── dialog staging ───────────────────────────────────────────

    pub fn stage_branch(&mut self, branch: BranchId) {
        self.staged_branch = Some(branch);
    }

    pub fn stage_financial_year(&mut self, year: FinancialYearId) {
        self.staged_year = Some(year);
    }

    pub fn staged_branch(&self) -> Option<&BranchId> {
        self.staged_branch.as_ref()
    }

    pub fn staged_financial_year(&self) -> Option<&FinancialYearId> {
        self.staged_year.as_ref()
    }

    /// Date range of the staged year, falling back to the committed one.
    pub fn staged_period(&self) -> Option<DatePeriod> {
        let id = self.staged_year.as_ref().or(self.year.value())?;
        self.find_year(id)?.period()
    }

    /// Dialog closed without saving.
    pub fn cancel_staged(&mut self) {
        self.staged_branch = None;
        self.staged_year = None;
    }

    // ── confirmation ─────────────────────────────────────────────

    /// Commit the staged branch, refreshing the token when due.
    pub async fn save_branch<T: Transport>(
        &mut self,
        store: &mut SessionContext,
        api: &ApiClient<T>,
        session: &mut AuthSession,
    ) -> Result<ContextCommit, ClientError> {
        let Some(branch) = self.staged_branch.take() else {
            return Ok(ContextCommit::unchanged());
        };
        if !self.active_locations().any(|l| l.location_id == branch) {
            return Err(ClientError::invalid(
                "branch",
                format!("Branch {branch} is not available"),
            ));
        }

        let previous = self.branch.value().cloned();
        if previous.as_ref() == Some(&branch) {
            self.branch = Selection::UserSelected(branch);
            return Ok(ContextCommit::unchanged());
        }

        store.dispatch(Writer::ContextSelection, Action::SetBranch(Some(branch.clone())))?;
        self.branch = Selection::UserSelected(branch.clone());
        tracing::info!(branch = %branch, previous = ?previous, "branch selected");

        let refresh = match (previous, store.financial_year().cloned()) {
            (Some(_), Some(year)) => self.refresh(api, session, &branch, &year).await,
            _ => RefreshOutcome::NotNeeded,
        };
        Ok(ContextCommit {
            changed: true,
            refresh,
        })
    }

    /// Commit the staged financial year (and its time zone), refreshing the
    /// token when due.
    pub async fn save_financial_year<T: Transport>(
        &mut self,
        store: &mut SessionContext,
        api: &ApiClient<T>,
        session: &mut AuthSession,
    ) -> Result<ContextCommit, ClientError> {
        let Some(year_id) = self.staged_year.take() else {
            return Ok(ContextCommit::unchanged());
        };
        let Some(year) = self.find_year(&year_id).cloned() else {
            return Err(ClientError::invalid(
                "financialYear",
                format!("Financial year {year_id} is not available"),
            ));
        };

        let previous = self.year.value().cloned();
        if previous.as_ref() == Some(&year_id) {
            self.year = Selection::UserSelected(year_id);
            return Ok(ContextCommit::unchanged());
        }

        self.commit_year(store, &year)?;
        self.year = Selection::UserSelected(year_id.clone());
        tracing::info!(financial_year = %year_id, previous = ?previous, "financial year selected");

        let refresh = match (previous, store.branch().cloned()) {
            (Some(_), Some(branch)) => self.refresh(api, session, &branch, &year_id).await,
            _ => RefreshOutcome::NotNeeded,
        };
        Ok(ContextCommit {
            changed: true,
            refresh,
        })
    }

    /// Stage and confirm in one step.
    pub async fn select_branch<T: Transport>(
        &mut self,
        branch: BranchId,
        store: &mut SessionContext,
        api: &ApiClient<T>,
        session: &mut AuthSession,
    ) -> Result<ContextCommit, ClientError> {
        self.stage_branch(branch);
        self.save_branch(store, api, session).await
    }

    /// Stage and confirm in one step.
    pub async fn select_financial_year<T: Transport>(
        &mut self,
        year: FinancialYearId,
        store: &mut SessionContext,
        api: &ApiClient<T>,
        session: &mut AuthSession,
    ) -> Result<ContextCommit, ClientError> {
        self.stage_financial_year(year);
        self.save_financial_year(store, api, session).await
    }

    // ── labels ───────────────────────────────────────────────────

    pub fn branch_label(&self) -> &str {
        self.branch
            .value()
            .and_then(|id| self.locations.iter().find(|l| &l.location_id == id))
            .map(|l| l.location_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(BRANCH_PLACEHOLDER)
    }

    pub fn financial_year_label(&self) -> &str {
        self.year
            .value()
            .and_then(|id| self.find_year(id))
            .map(|y| y.year_code.as_str())
            .filter(|code| !code.is_empty())
            .unwrap_or(FINANCIAL_YEAR_PLACEHOLDER)
    }

    pub fn selected_period(&self) -> Option<DatePeriod> {
        self.find_year(self.year.value()?)?.period()
    }

    // ── internals ────────────────────────────────────────────────

    fn find_year(&self, id: &FinancialYearId) -> Option<&FinancialYear> {
        self.years.iter().find(|y| &y.year_id == id)
    }

    fn commit_year(&self, store: &mut SessionContext, year: &FinancialYear) -> Result<(), ClientError> {
        store.dispatch(
            Writer::ContextSelection,
            Action::SetFinancialYear(Some(year.year_id.clone())),
        )?;
        store.dispatch(
            Writer::ContextSelection,
            Action::SetTimeZone {
                id: year.time_zone_id.clone(),
                name: year.display_name.clone(),
            },
        )?;
        Ok(())
    }

    async fn refresh<T: Transport>(
        &self,
        api: &ApiClient<T>,
        session: &mut AuthSession,
        branch: &BranchId,
        year: &FinancialYearId,
    ) -> RefreshOutcome {
        tracing::debug!(branch = %branch, financial_year = %year, "refreshing session token");
        let outcome = api.refresh_token(session, branch, year).await;
        let already_shown = outcome.notified;
        let payload = match outcome.into_result() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, kind = %err.kind(), "token refresh failed, keeping selection");
                // A 401 is handled by the session reset.
                if !already_shown && err.kind() != ErrorKind::Unauthorized {
                    api.notifier().error(&err.user_message());
                }
                return RefreshOutcome::Failed(err);
            }
        };

        if let Err(e) = session.replace_primary(payload.token()) {
            return RefreshOutcome::Failed(e.into());
        }
        if let Some(sub) = payload.subscription_token() {
            if let Err(e) = session.set_subscription(Some(sub.to_string())) {
                return RefreshOutcome::Failed(e.into());
            }
        }
        RefreshOutcome::Refreshed
    }
}
