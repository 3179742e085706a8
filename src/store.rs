//! Session context store
//!
//! Typed replacement for the console's global store. Fields are private and
//! change only through [`Action`]s; each action has exactly one owning
//! [`Writer`], and a dispatch from any other writer is rejected. Every
//! committed action is persisted so the context survives a reload.

use serde::{Deserialize, Serialize};

use crate::menu::{MenuItem, SelectedMenu};
use crate::models::{BranchId, CompanyDetails, FinancialYearId, UserId, UserProfile};
use crate::storage::{SharedStorage, StorageError, CACHED_PROFILE_KEY, PERSISTED_STATE_KEY};

/// The flows allowed to write to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Writer {
    /// Branch / financial-year selection (including time zone).
    ContextSelection,
    /// Profile, company and user-id fetch completion.
    ProfileSync,
    /// Sidebar route tracking.
    Navigation,
    /// Login / logout / forced expiry.
    SessionLifecycle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetUserId(Option<UserId>),
    SetBranch(Option<BranchId>),
    SetFinancialYear(Option<FinancialYearId>),
    SetTimeZone {
        id: Option<String>,
        name: Option<String>,
    },
    SetUserDetails(Option<UserProfile>),
    SetCompanyDetails(Option<CompanyDetails>),
    SetSelectedMenu(Option<SelectedMenu>),
    SetSidebarChildMenu(Vec<MenuItem>),
    Reset,
}

impl Action {
    pub fn owner(&self) -> Writer {
        match self {
            Action::SetBranch(_) | Action::SetFinancialYear(_) | Action::SetTimeZone { .. } => {
                Writer::ContextSelection
            }
            Action::SetUserId(_) | Action::SetUserDetails(_) | Action::SetCompanyDetails(_) => {
                Writer::ProfileSync
            }
            Action::SetSelectedMenu(_) | Action::SetSidebarChildMenu(_) => Writer::Navigation,
            Action::Reset => Writer::SessionLifecycle,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::SetUserId(_) => "set_user_id",
            Action::SetBranch(_) => "set_branch",
            Action::SetFinancialYear(_) => "set_financial_year",
            Action::SetTimeZone { .. } => "set_time_zone",
            Action::SetUserDetails(_) => "set_user_details",
            Action::SetCompanyDetails(_) => "set_company_details",
            Action::SetSelectedMenu(_) => "set_selected_menu",
            Action::SetSidebarChildMenu(_) => "set_sidebar_child_menu",
            Action::Reset => "reset",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{writer:?} may not dispatch {action} (owned by {owner:?})")]
    WrongWriter {
        action: &'static str,
        owner: Writer,
        writer: Writer,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Persisted shape of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextSnapshot {
    pub user_id: Option<UserId>,
    pub branch: Option<BranchId>,
    pub financial_year: Option<FinancialYearId>,
    pub time_zone_id: Option<String>,
    pub time_zone_name: Option<String>,
    pub user_details: Option<UserProfile>,
    pub company_details: Option<CompanyDetails>,
    pub selected_menu: Option<SelectedMenu>,
    pub sidebar_child_menu: Vec<MenuItem>,
}

#[derive(Default)]
pub struct SessionContext {
    state: ContextSnapshot,
    storage: Option<SharedStorage>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state)
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl SessionContext {
    /// In-memory store that persists nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the persisted snapshot, or start empty. A snapshot that no
    /// longer parses is discarded rather than failing start-up.
    pub fn restore(storage: SharedStorage) -> Result<Self, StoreError> {
        let state = match storage.get(PERSISTED_STATE_KEY)? {
            Some(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding unreadable persisted context");
                ContextSnapshot::default()
            }),
            None => ContextSnapshot::default(),
        };
        Ok(Self {
            state,
            storage: Some(storage),
        })
    }

    pub fn dispatch(&mut self, writer: Writer, action: Action) -> Result<(), StoreError> {
        let owner = action.owner();
        if owner != writer {
            return Err(StoreError::WrongWriter {
                action: action.name(),
                owner,
                writer,
            });
        }
        tracing::trace!(action = action.name(), "dispatch");

        let profile_changed = matches!(action, Action::SetUserDetails(_));
        match action {
            Action::SetUserId(id) => self.state.user_id = id,
            Action::SetBranch(id) => self.state.branch = id,
            Action::SetFinancialYear(id) => self.state.financial_year = id,
            Action::SetTimeZone { id, name } => {
                self.state.time_zone_id = id;
                self.state.time_zone_name = name;
            }
            Action::SetUserDetails(profile) => self.state.user_details = profile,
            Action::SetCompanyDetails(company) => self.state.company_details = company,
            Action::SetSelectedMenu(menu) => self.state.selected_menu = menu,
            Action::SetSidebarChildMenu(items) => self.state.sidebar_child_menu = items,
            Action::Reset => self.state = ContextSnapshot::default(),
        }

        self.persist(profile_changed)
    }

    fn persist(&self, profile_changed: bool) -> Result<(), StoreError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        if self.state == ContextSnapshot::default() {
            storage.remove(PERSISTED_STATE_KEY)?;
            storage.remove(CACHED_PROFILE_KEY)?;
            return Ok(());
        }

        let text = serde_json::to_string(&self.state).map_err(|source| StorageError::Encode {
            key: PERSISTED_STATE_KEY.to_string(),
            source,
        })?;
        storage.set(PERSISTED_STATE_KEY, &text)?;

        if profile_changed {
            match &self.state.user_details {
                Some(profile) => {
                    let text = serde_json::to_string(profile).map_err(|source| StorageError::Encode {
                        key: CACHED_PROFILE_KEY.to_string(),
                        source,
                    })?;
                    storage.set(CACHED_PROFILE_KEY, &text)?;
                }
                None => storage.remove(CACHED_PROFILE_KEY)?,
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.state
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.state.user_id.as_ref()
    }

    pub fn branch(&self) -> Option<&BranchId> {
        self.state.branch.as_ref()
    }

    pub fn financial_year(&self) -> Option<&FinancialYearId> {
        self.state.financial_year.as_ref()
    }

    pub fn time_zone_id(&self) -> Option<&str> {
        self.state.time_zone_id.as_deref()
    }

    pub fn time_zone_name(&self) -> Option<&str> {
        self.state.time_zone_name.as_deref()
    }

    pub fn user_details(&self) -> Option<&UserProfile> {
        self.state.user_details.as_ref()
    }

    pub fn company_details(&self) -> Option<&CompanyDetails> {
        self.state.company_details.as_ref()
    }

    pub fn selected_menu(&self) -> Option<&SelectedMenu> {
        self.state.selected_menu.as_ref()
    }

    pub fn sidebar_child_menu(&self) -> &[MenuItem] {
        &self.state.sidebar_child_menu
    }

    /// Document title: the user's name, else the product name.
    pub fn document_title(&self) -> &str {
        self.state
            .user_details
            .as_ref()
            .and_then(|u| u.user_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or("LogiVite")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ClientStorage, MemoryStorage};

    #[test]
    fn test_foreign_writer_is_rejected() {
        let mut store = SessionContext::new();
        let err = store
            .dispatch(Writer::Navigation, Action::SetBranch(Some(BranchId::new("b1"))))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::WrongWriter {
                owner: Writer::ContextSelection,
                writer: Writer::Navigation,
                ..
            }
        ));
        assert_eq!(store.branch(), None);
    }

    #[test]
    fn test_snapshot_survives_restore() {
        let storage = MemoryStorage::shared();
        let mut store = SessionContext::restore(storage.clone()).unwrap();
        store
            .dispatch(Writer::ContextSelection, Action::SetBranch(Some(BranchId::new("b1"))))
            .unwrap();
        store
            .dispatch(
                Writer::ContextSelection,
                Action::SetTimeZone {
                    id: Some("12".into()),
                    name: Some("IST".into()),
                },
            )
            .unwrap();
        store
            .dispatch(
                Writer::ProfileSync,
                Action::SetUserDetails(Some(UserProfile {
                    user_name: Some("asha".into()),
                    ..Default::default()
                })),
            )
            .unwrap();

        let restored = SessionContext::restore(storage.clone()).unwrap();
        assert_eq!(restored.branch(), Some(&BranchId::new("b1")));
        assert_eq!(restored.time_zone_name(), Some("IST"));
        assert_eq!(restored.document_title(), "asha");
        assert!(storage.get(CACHED_PROFILE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let storage = MemoryStorage::shared();
        let mut store = SessionContext::restore(storage.clone()).unwrap();
        store
            .dispatch(Writer::ContextSelection, Action::SetFinancialYear(Some("y1".into())))
            .unwrap();

        store.dispatch(Writer::SessionLifecycle, Action::Reset).unwrap();

        assert_eq!(store.snapshot(), &ContextSnapshot::default());
        assert!(storage.is_empty());
        assert_eq!(store.document_title(), "LogiVite");
    }

    #[test]
    fn test_unreadable_snapshot_is_discarded() {
        let storage = MemoryStorage::shared();
        storage.set(PERSISTED_STATE_KEY, "{broken").unwrap();
        let store = SessionContext::restore(storage).unwrap();
        assert_eq!(store.branch(), None);
    }
}
