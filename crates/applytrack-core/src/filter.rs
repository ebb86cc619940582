//! Dashboard filtering: free-text search plus an optional stage filter.

use crate::types::{Application, ApplicationStage};

/// Query applied to a user's application list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationQuery {
    /// Case-insensitive substring matched against company and role.
    pub search: Option<String>,

    /// Only keep applications in this stage.
    pub stage: Option<ApplicationStage>,
}

impl ApplicationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = if text.trim().is_empty() { None } else { Some(text) };
        self
    }

    pub fn stage(mut self, stage: ApplicationStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Whether any filter is active.
    pub fn is_active(&self) -> bool {
        self.search.is_some() || self.stage.is_some()
    }

    /// Check a single application against the query.
    pub fn matches(&self, app: &Application) -> bool {
        let stage_ok = self.stage.map_or(true, |stage| app.stage == stage);
        let search_ok = match &self.search {
            Some(text) => {
                let needle = text.to_lowercase();
                app.company_name.to_lowercase().contains(&needle)
                    || app.role.to_lowercase().contains(&needle)
            }
            None => true,
        };
        stage_ok && search_ok
    }

    /// Filter a list, preserving its order.
    pub fn apply<'a>(&self, applications: &'a [Application]) -> Vec<&'a Application> {
        applications.iter().filter(|app| self.matches(app)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> Vec<Application> {
        let date = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        vec![
            Application::new("1", "Acme Corp", "Platform Engineer", ApplicationStage::Interview, date),
            Application::new("2", "Globex", "Data Analyst", ApplicationStage::Applied, date),
            Application::new("3", "Initech", "Staff ENGINEER", ApplicationStage::Rejected, date),
        ]
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let apps = sample();
        let query = ApplicationQuery::new().search("   ");
        assert!(!query.is_active());
        assert_eq!(query.apply(&apps).len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive_over_company_and_role() {
        let apps = sample();
        let ids: Vec<_> = ApplicationQuery::new()
            .search("engineer")
            .apply(&apps)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);

        assert_eq!(ApplicationQuery::new().search("GLOB").apply(&apps).len(), 1);
    }

    #[test]
    fn test_search_and_stage_combine() {
        let apps = sample();
        let hits = ApplicationQuery::new()
            .search("engineer")
            .stage(ApplicationStage::Rejected)
            .apply(&apps);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].company_name, "Initech");
    }
}
