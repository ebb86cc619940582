//! Aggregate statistics over a user's applications.
//!
//! Rates are whole percentages, rounded half away from zero, and are 0 for
//! an empty list.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Application, ApplicationStage};

/// Number of trailing months reported by [`ApplicationStats::monthly`].
pub const MONTHLY_WINDOW: usize = 6;

/// Application count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    /// Short label such as "Mar 2025".
    pub label: String,
    pub applications: usize,
}

/// Stage counts and derived rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub by_stage: BTreeMap<ApplicationStage, usize>,
    /// Share that heard back at all (interview, offer or rejected).
    pub response_rate: u32,
    /// Share that reached an interview (interview or offer).
    pub interview_rate: u32,
    /// Share that reached an offer.
    pub success_rate: u32,
    /// Last months with at least one application, oldest first.
    pub monthly: Vec<MonthlyCount>,
}

impl ApplicationStats {
    pub fn from_applications(applications: &[Application]) -> Self {
        let total = applications.len();

        let mut by_stage: BTreeMap<ApplicationStage, usize> =
            ApplicationStage::ALL.iter().map(|s| (*s, 0)).collect();
        for app in applications {
            *by_stage.entry(app.stage).or_insert(0) += 1;
        }

        let count = |stage: ApplicationStage| by_stage.get(&stage).copied().unwrap_or(0);
        let interview = count(ApplicationStage::Interview);
        let offer = count(ApplicationStage::Offer);
        let rejected = count(ApplicationStage::Rejected);

        Self {
            total,
            response_rate: percent(interview + offer + rejected, total),
            interview_rate: percent(interview + offer, total),
            success_rate: percent(offer, total),
            monthly: monthly_counts(applications),
            by_stage,
        }
    }

    /// Count for one stage.
    pub fn stage_count(&self, stage: ApplicationStage) -> usize {
        self.by_stage.get(&stage).copied().unwrap_or(0)
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

fn monthly_counts(applications: &[Application]) -> Vec<MonthlyCount> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for app in applications {
        let date = app.application_date;
        *months.entry((date.year(), date.month())).or_insert(0) += 1;
    }

    let skip = months.len().saturating_sub(MONTHLY_WINDOW);
    months
        .into_iter()
        .skip(skip)
        .map(|((year, month), applications)| MonthlyCount {
            year,
            month,
            label: format!("{} {}", month_abbrev(month), year),
            applications,
        })
        .collect()
}

fn month_abbrev(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("???")
}
