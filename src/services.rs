//! Per-project services configuration
//!
//! Form state behind the services screen: one tab per service, each holding
//! a logo, an optional keyword CSV and editable keyword/link rows.

use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::validation::ValidationErrors;

const INITIAL_KEYWORD_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceKind {
    Blog,
    Backlink,
    GuestPosting,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [ServiceKind::Blog, ServiceKind::Backlink, ServiceKind::GuestPosting];

    pub fn title(&self) -> &'static str {
        match self {
            ServiceKind::Blog => "Blog Generation",
            ServiceKind::Backlink => "Backlink Management",
            ServiceKind::GuestPosting => "Guest Posting",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ServiceKind::Blog => "Configure your blog content generation settings",
            ServiceKind::Backlink => "Set up your backlink strategy and tracking",
            ServiceKind::GuestPosting => "Manage guest posting opportunities and settings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRow {
    pub id: Uuid,
    pub keyword: String,
    pub link: String,
}

impl KeywordRow {
    fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            keyword: String::new(),
            link: String::new(),
        }
    }

    fn is_blank(&self) -> bool {
        self.keyword.trim().is_empty() && self.link.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordField {
    Keyword,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceForm {
    /// Logo as a data URL.
    pub logo: Option<String>,
    pub csv_file: Option<String>,
    pub keywords: Vec<KeywordRow>,
}

impl Default for ServiceForm {
    fn default() -> Self {
        Self {
            logo: None,
            csv_file: None,
            keywords: (0..INITIAL_KEYWORD_ROWS).map(|_| KeywordRow::blank()).collect(),
        }
    }
}

impl ServiceForm {
    /// A filled row needs a keyword and an absolute http(s) link. Blank rows
    /// are ignored. Errors are keyed `keywords[i].keyword` / `.link`.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for (i, row) in self.keywords.iter().enumerate() {
            if row.is_blank() {
                continue;
            }
            if row.keyword.trim().is_empty() {
                errors.add(&format!("keywords[{i}].keyword"), "Keyword is required");
            }
            let link = row.link.trim();
            if link.is_empty() {
                errors.add(&format!("keywords[{i}].link"), "Link is required");
            } else if !is_http_url(link) {
                errors.add(&format!("keywords[{i}].link"), "Please enter a valid URL");
            }
        }
        errors.into_result()
    }

    pub fn filled_keywords(&self) -> impl Iterator<Item = &KeywordRow> {
        self.keywords.iter().filter(|row| !row.is_blank())
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Keyword rows ready to send to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    pub service: ServiceKind,
    pub logo: Option<String>,
    pub csv_file: Option<String>,
    pub keywords: Vec<KeywordRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicesConfig {
    active: ServiceKind,
    blog: ServiceForm,
    backlink: ServiceForm,
    guest_posting: ServiceForm,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            active: ServiceKind::Blog,
            blog: ServiceForm::default(),
            backlink: ServiceForm::default(),
            guest_posting: ServiceForm::default(),
        }
    }
}

impl ServicesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> ServiceKind {
        self.active
    }

    pub fn switch_to(&mut self, kind: ServiceKind) {
        self.active = kind;
    }

    pub fn form(&self, kind: ServiceKind) -> &ServiceForm {
        match kind {
            ServiceKind::Blog => &self.blog,
            ServiceKind::Backlink => &self.backlink,
            ServiceKind::GuestPosting => &self.guest_posting,
        }
    }

    pub fn active_form(&self) -> &ServiceForm {
        self.form(self.active)
    }

    fn active_form_mut(&mut self) -> &mut ServiceForm {
        match self.active {
            ServiceKind::Blog => &mut self.blog,
            ServiceKind::Backlink => &mut self.backlink,
            ServiceKind::GuestPosting => &mut self.guest_posting,
        }
    }

    pub fn set_logo(&mut self, data_url: impl Into<String>) {
        self.active_form_mut().logo = Some(data_url.into());
    }

    pub fn set_csv_file(&mut self, name: impl Into<String>) {
        self.active_form_mut().csv_file = Some(name.into());
    }

    pub fn add_keyword(&mut self) -> Uuid {
        let row = KeywordRow::blank();
        let id = row.id;
        self.active_form_mut().keywords.push(row);
        id
    }

    /// Returns false when no row has `id`.
    pub fn update_keyword(&mut self, id: Uuid, field: KeywordField, value: impl Into<String>) -> bool {
        let Some(row) = self.active_form_mut().keywords.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        match field {
            KeywordField::Keyword => row.keyword = value.into(),
            KeywordField::Link => row.link = value.into(),
        }
        true
    }

    /// Returns false when no row has `id`.
    pub fn remove_keyword(&mut self, id: Uuid) -> bool {
        let keywords = &mut self.active_form_mut().keywords;
        let before = keywords.len();
        keywords.retain(|r| r.id != id);
        keywords.len() != before
    }

    /// Validate the active tab and collect its filled rows.
    pub fn save_active(&self) -> Result<ServicePayload, ValidationErrors> {
        self.payload(self.active)
    }

    /// Validate every tab; the first failing tab's errors are returned.
    pub fn save_all(&self) -> Result<Vec<ServicePayload>, (ServiceKind, ValidationErrors)> {
        ServiceKind::ALL
            .iter()
            .map(|&kind| self.payload(kind).map_err(|e| (kind, e)))
            .collect()
    }

    fn payload(&self, kind: ServiceKind) -> Result<ServicePayload, ValidationErrors> {
        let form = self.form(kind);
        form.validate()?;
        Ok(ServicePayload {
            service: kind,
            logo: form.logo.clone(),
            csv_file: form.csv_file.clone(),
            keywords: form.filled_keywords().cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_tab_starts_with_five_blank_rows() {
        let config = ServicesConfig::new();
        for kind in ServiceKind::ALL {
            assert_eq!(config.form(kind).keywords.len(), 5);
        }
        assert_eq!(config.active().title(), "Blog Generation");
    }

    #[test]
    fn test_edits_only_touch_the_active_tab() {
        let mut config = ServicesConfig::new();
        config.switch_to(ServiceKind::Backlink);
        let id = config.add_keyword();
        assert!(config.update_keyword(id, KeywordField::Keyword, "rust consulting"));
        assert!(config.update_keyword(id, KeywordField::Link, "https://example.com/rust"));
        config.set_logo("data:image/png;base64,AAAA");

        assert_eq!(config.form(ServiceKind::Backlink).keywords.len(), 6);
        assert_eq!(config.form(ServiceKind::Blog).keywords.len(), 5);
        assert_eq!(config.form(ServiceKind::Blog).logo, None);

        let payload = config.save_active().unwrap();
        assert_eq!(payload.service, ServiceKind::Backlink);
        assert_eq!(payload.keywords.len(), 1);
        assert_eq!(payload.keywords[0].keyword, "rust consulting");
    }

    #[test]
    fn test_remove_unknown_row_is_reported() {
        let mut config = ServicesConfig::new();
        let first = config.active_form().keywords[0].id;
        assert!(config.remove_keyword(first));
        assert!(!config.remove_keyword(first));
        assert!(!config.update_keyword(first, KeywordField::Link, "x"));
        assert_eq!(config.active_form().keywords.len(), 4);
    }

    #[test]
    fn test_half_filled_rows_fail_validation() {
        let mut config = ServicesConfig::new();
        let id = config.active_form().keywords[1].id;
        config.update_keyword(id, KeywordField::Keyword, "seo");
        config.switch_to(ServiceKind::GuestPosting);
        let other = config.active_form().keywords[0].id;
        config.update_keyword(other, KeywordField::Link, "ftp://files.example.com");

        let (kind, errors) = config.save_all().unwrap_err();
        assert_eq!(kind, ServiceKind::Blog);
        assert_eq!(errors.get("keywords[1].link"), Some("Link is required"));

        let errors = config.save_active().unwrap_err();
        assert_eq!(errors.get("keywords[0].keyword"), Some("Keyword is required"));
        assert_eq!(errors.get("keywords[0].link"), Some("Please enter a valid URL"));
    }
}
