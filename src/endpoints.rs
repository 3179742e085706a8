//! Backend endpoints consumed by the console.

use serde::Deserialize;
use serde_json::json;

use crate::api::{ApiClient, ApiOutcome, ApiRequest};
use crate::menu::SidebarMenu;
use crate::models::{BranchId, CompanyDetails, FinancialYear, FinancialYearId, Location, UserId, UserProfile};
use crate::session::AuthSession;
use crate::transport::Transport;
use crate::validation::{LoginForm, SignUpForm};

pub const LOGIN: &str = "/Account/Login";
pub const REGISTER: &str = "/Account/Register";
pub const REFRESH_TOKEN: &str = "/Account/RefreshToken";
pub const USER_PROFILE: &str = "/UserProfile/GetUserProfileDetails";
pub const LOCATION_LIST: &str = "/Dashboard/GetLocationList";
pub const FINANCIAL_YEAR_LIST: &str = "/Dashboard/GetFinancialYearList";
pub const COMPANY_DETAILS: &str = "/CompanyGSTMaster/GetCompanyDetails";
pub const SIDEBAR_MENU: &str = "/Menu/GetSidebarMenuList";

/// Token issued by login or refresh. Older endpoints return the bare string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TokenPayload {
    Bare(String),
    Wrapped {
        token: String,
        #[serde(default, rename = "subscriptionToken")]
        subscription_token: Option<String>,
    },
}

impl TokenPayload {
    pub fn token(&self) -> &str {
        match self {
            TokenPayload::Bare(token) => token,
            TokenPayload::Wrapped { token, .. } => token,
        }
    }

    pub fn subscription_token(&self) -> Option<&str> {
        match self {
            TokenPayload::Bare(_) => None,
            TokenPayload::Wrapped {
                subscription_token, ..
            } => subscription_token.as_deref(),
        }
    }
}

impl<T: Transport> ApiClient<T> {
    pub async fn login(&self, session: &mut AuthSession, form: &LoginForm) -> ApiOutcome<TokenPayload> {
        let request = ApiRequest::post(LOGIN)
            .json(json!({ "email": form.email.trim(), "password": form.password }));
        self.request(session, request).await
    }

    pub async fn register(
        &self,
        session: &mut AuthSession,
        form: &SignUpForm,
    ) -> ApiOutcome<serde_json::Value> {
        let request = ApiRequest::post(REGISTER).json(json!({
            "userName": form.username.trim(),
            "email": form.email.trim(),
            "password": form.password,
        }));
        self.request(session, request).await
    }

    /// Exchange the current session token for one scoped to a new context.
    pub async fn refresh_token(
        &self,
        session: &mut AuthSession,
        branch: &BranchId,
        year: &FinancialYearId,
    ) -> ApiOutcome<TokenPayload> {
        let current = session.primary_token().unwrap_or_default().to_string();
        let request = ApiRequest::post(REFRESH_TOKEN)
            .form([
                ("token", current),
                ("BranchId", branch.to_string()),
                ("FinancialYear", year.to_string()),
            ])
            .quiet();
        self.request(session, request).await
    }

    pub async fn fetch_user_profile(
        &self,
        session: &mut AuthSession,
        user_id: &UserId,
    ) -> ApiOutcome<UserProfile> {
        let path = format!("{USER_PROFILE}/{user_id}");
        self.request(session, ApiRequest::get(path).quiet()).await
    }

    pub async fn load_location_list(&self, session: &mut AuthSession) -> ApiOutcome<Vec<Location>> {
        self.request(session, ApiRequest::get(LOCATION_LIST).quiet()).await
    }

    pub async fn load_financial_year_list(
        &self,
        session: &mut AuthSession,
    ) -> ApiOutcome<Vec<FinancialYear>> {
        self.request(session, ApiRequest::get(FINANCIAL_YEAR_LIST).quiet()).await
    }

    pub async fn get_company_details(&self, session: &mut AuthSession) -> ApiOutcome<CompanyDetails> {
        self.request(session, ApiRequest::get(COMPANY_DETAILS).quiet()).await
    }

    pub async fn fetch_sidebar_menu(&self, session: &mut AuthSession) -> ApiOutcome<SidebarMenu> {
        self.request(session, ApiRequest::get(SIDEBAR_MENU).quiet()).await
    }
}
