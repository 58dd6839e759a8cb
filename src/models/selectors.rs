// src/models/selectors.rs

//! CSS selectors for scraping a job board result page.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping a job board result page.
///
/// Field selectors are evaluated inside each card and take the first
/// match in document order; a selector group (`a, b`) lists alternatives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingSelectors {
    /// Selector for each job card in the result list
    pub card_selector: String,

    /// Selector for the title element within a card
    pub title_selector: String,

    /// Selector for the company element within a card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_selector: Option<String>,

    /// Selector for the location element within a card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_selector: Option<String>,

    /// Selector for the salary element within a card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_selector: Option<String>,

    /// Selector for the summary/description element within a card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_selector: Option<String>,

    /// Optional selector for the link element (defaults to the first `a[href]`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_selector: Option<String>,

    /// Attribute on the card holding the source-specific identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_attr: Option<String>,

    /// Attribute holding the title text, when the element text is truncated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_attr: Option<String>,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            card_selector: "article".to_string(),
            title_selector: "h2".to_string(),
            company_selector: None,
            location_selector: None,
            salary_selector: None,
            description_selector: None,
            link_selector: None,
            id_attr: None,
            title_attr: None,
        }
    }
}

impl ListingSelectors {
    /// Selectors for Indeed search result pages.
    pub fn indeed() -> Self {
        Self {
            card_selector: "[data-jk]".to_string(),
            title_selector: "h2 a span[title], h2 a span".to_string(),
            company_selector: Some("[data-testid=\"company-name\"], .companyName".to_string()),
            location_selector: Some(
                "[data-testid=\"job-location\"], [data-testid=\"text-location\"], .companyLocation"
                    .to_string(),
            ),
            salary_selector: Some(
                "[data-testid=\"attribute_snippet_testid\"], .salary-snippet-container, .estimated-salary, .salaryText"
                    .to_string(),
            ),
            description_selector: Some("[data-testid=\"job-snippet\"], .job-snippet".to_string()),
            link_selector: Some("h2 a".to_string()),
            id_attr: Some("data-jk".to_string()),
            title_attr: Some("title".to_string()),
        }
    }

    /// Selectors for We Work Remotely search result pages.
    pub fn weworkremotely() -> Self {
        Self {
            card_selector: "li.feature".to_string(),
            title_selector: "span.title".to_string(),
            company_selector: Some("span.company".to_string()),
            location_selector: Some("span.region".to_string()),
            salary_selector: None,
            description_selector: None,
            link_selector: Some("a[href*=\"/remote-jobs/\"]".to_string()),
            id_attr: None,
            title_attr: None,
        }
    }

    /// Selectors for LinkedIn's public job search, current and legacy cards.
    pub fn linkedin() -> Self {
        Self {
            card_selector: "div.base-card, li.result-card".to_string(),
            title_selector: "h3.base-search-card__title, h3.result-card__title".to_string(),
            company_selector: Some(
                "h4.base-search-card__subtitle, h4.result-card__subtitle".to_string(),
            ),
            location_selector: Some(
                "span.job-search-card__location, span.result-card__location".to_string(),
            ),
            salary_selector: Some(
                ".job-search-card__salary-info, .result-card__salary, .job-details-salary, [data-test=\"job-salary\"]"
                    .to_string(),
            ),
            description_selector: Some(
                "p.job-search-card__snippet, p.result-card__snippet".to_string(),
            ),
            link_selector: Some("a.base-card__full-link, a.result-card__full-card-link".to_string()),
            id_attr: Some("data-entity-urn".to_string()),
            title_attr: None,
        }
    }

    /// Selectors for Glassdoor job listings.
    pub fn glassdoor() -> Self {
        Self {
            card_selector: "li[data-test=\"jobListing\"], div[data-test=\"jobListing\"], li.react-job-listing"
                .to_string(),
            title_selector: "a[data-test=\"job-title\"], a.jobLink".to_string(),
            company_selector: Some("span[data-test=\"employer-name\"], div.jobHeader".to_string()),
            location_selector: Some("span[data-test=\"job-location\"], span.loc".to_string()),
            salary_selector: Some("span[data-test=\"detailSalary\"]".to_string()),
            description_selector: None,
            link_selector: Some("a[data-test=\"job-title\"], a.jobLink".to_string()),
            id_attr: Some("data-id".to_string()),
            title_attr: None,
        }
    }

    /// Selectors for Dice search cards.
    pub fn dice() -> Self {
        Self {
            card_selector: "dhi-search-card, [data-cy=\"search-card\"]".to_string(),
            title_selector: "a.card-title-link, [data-cy=\"card-title-link\"]".to_string(),
            company_selector: Some("[data-cy=\"search-result-company-name\"]".to_string()),
            location_selector: Some("[data-cy=\"search-result-location\"]".to_string()),
            salary_selector: Some("[data-cy=\"search-result-compensation\"]".to_string()),
            description_selector: Some("[data-cy=\"card-summary\"]".to_string()),
            link_selector: Some("a.card-title-link, [data-cy=\"card-title-link\"]".to_string()),
            id_attr: Some("data-id".to_string()),
            title_attr: None,
        }
    }

    /// Every selector string, for validation.
    pub fn all(&self) -> Vec<&str> {
        let mut out = vec![self.card_selector.as_str(), self.title_selector.as_str()];
        out.extend(
            [
                &self.company_selector,
                &self.location_selector,
                &self.salary_selector,
                &self.description_selector,
                &self.link_selector,
            ]
            .into_iter()
            .filter_map(|s| s.as_deref()),
        );
        out
    }
}
