// Hour totals over sets of imputations: monthly synthesis, manager
// workload and reporting rows

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::imputation::{Imputation, TimeCategory};
use super::project::Project;
use crate::domain::errors::{DomainError, DomainResult};

/// First and last day of a month
pub fn month_bounds(year: i32, month: u32) -> DomainResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::validation("Year and month must be valid numbers"))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let last = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| DomainError::validation("Year and month must be valid numbers"))?;
    Ok((first, last))
}

fn period_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} - {}", start, end)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectHours {
    pub hours: Decimal,
    pub project_id: Uuid,
    pub hourly_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// Keyed by project name
    pub summary: BTreeMap<String, ProjectHours>,
    pub total_hours: Decimal,
    pub total_value: Decimal,
    pub period: String,
}

/// Project hours of `entries` falling in `year`/`month`
///
/// Entries without a known project are left out.
pub fn monthly_summary(
    entries: &[Imputation],
    projects: &HashMap<Uuid, Project>,
    year: i32,
    month: u32,
) -> DomainResult<MonthlySummary> {
    let (start, end) = month_bounds(year, month)?;
    let mut summary: BTreeMap<String, ProjectHours> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.date >= start && e.date <= end) {
        let Some(project) = entry.project_id.and_then(|id| projects.get(&id)) else {
            continue;
        };
        summary
            .entry(project.name.clone())
            .or_insert_with(|| ProjectHours {
                hours: Decimal::ZERO,
                project_id: project.id,
                hourly_rate: project.hourly_rate,
            })
            .hours += entry.hours;
    }

    let total_hours = summary.values().map(|p| p.hours).sum();
    let total_value = summary.values().map(|p| p.hours * p.hourly_rate).sum();
    Ok(MonthlySummary {
        summary,
        total_hours,
        total_value,
        period: period_label(start, end),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectLoad {
    pub hours: Decimal,
    pub rate: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLoad {
    pub hours: Decimal,
    pub label: &'static str,
}

/// Team load over a period, as shown on the manager dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workload {
    pub by_project: BTreeMap<String, ProjectLoad>,
    /// Always lists every category, zero when unused
    pub by_category: BTreeMap<TimeCategory, CategoryLoad>,
    pub by_employee: BTreeMap<String, Decimal>,
    pub total_hours: Decimal,
}

pub fn workload(
    entries: &[Imputation],
    projects: &HashMap<Uuid, Project>,
    employee_names: &HashMap<Uuid, String>,
) -> Workload {
    let mut by_project: BTreeMap<String, ProjectLoad> = BTreeMap::new();
    let mut by_category: BTreeMap<TimeCategory, CategoryLoad> = TimeCategory::ALL
        .iter()
        .map(|c| {
            (
                *c,
                CategoryLoad {
                    hours: Decimal::ZERO,
                    label: c.label(),
                },
            )
        })
        .collect();
    let mut by_employee: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut total_hours = Decimal::ZERO;

    for entry in entries {
        total_hours += entry.hours;
        if let Some(load) = by_category.get_mut(&entry.category) {
            load.hours += entry.hours;
        }
        if let Some(project) = entry.project_id.and_then(|id| projects.get(&id)) {
            let load = by_project
                .entry(project.name.clone())
                .or_insert_with(|| ProjectLoad {
                    hours: Decimal::ZERO,
                    rate: project.hourly_rate,
                    value: Decimal::ZERO,
                });
            load.hours += entry.hours;
            load.value += project.value_of(entry.hours);
        }
        let name = employee_names
            .get(&entry.employee_id)
            .cloned()
            .unwrap_or_else(|| entry.employee_id.to_string());
        *by_employee.entry(name).or_insert(Decimal::ZERO) += entry.hours;
    }

    Workload {
        by_project,
        by_category,
        by_employee,
        total_hours,
    }
}

/// One line of the manager report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub employee: String,
    pub project: Option<String>,
    pub hours: Decimal,
    pub category: TimeCategory,
    pub value: Decimal,
}

/// Report rows sorted by date then employee
pub fn report_rows(
    entries: &[Imputation],
    projects: &HashMap<Uuid, Project>,
    employee_names: &HashMap<Uuid, String>,
) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = entries
        .iter()
        .map(|entry| {
            let project = entry.project_id.and_then(|id| projects.get(&id));
            ReportRow {
                date: entry.date,
                employee: employee_names
                    .get(&entry.employee_id)
                    .cloned()
                    .unwrap_or_default(),
                project: project.map(|p| p.name.clone()),
                hours: entry.hours,
                category: entry.category,
                value: project.map_or(Decimal::ZERO, |p| p.value_of(entry.hours)),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.employee.cmp(&b.employee)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timesheet::{ImputationDraft, ProjectCategory, ProjectDraft};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(name: &str, rate: Decimal) -> Project {
        Project::new(ProjectDraft {
            code: None,
            name: name.into(),
            description: String::new(),
            start_date: date(2025, 1, 1),
            end_date: date(2025, 12, 31),
            hourly_rate: rate,
            category: ProjectCategory::Client,
            team_id: None,
        })
        .unwrap()
    }

    fn entry(employee: Uuid, project: Option<&Project>, day: NaiveDate, hours: Decimal) -> Imputation {
        let category = if project.is_some() {
            TimeCategory::Project
        } else {
            TimeCategory::Other
        };
        Imputation::new(
            employee,
            ImputationDraft {
                project_id: project.map(|p| p.id),
                training_id: None,
                date: day,
                hours,
                category,
                description: String::new(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn month_bounds_cover_leap_february() {
        assert_eq!(
            month_bounds(2024, 2).unwrap(),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
        assert_eq!(
            month_bounds(2025, 12).unwrap(),
            (date(2025, 12, 1), date(2025, 12, 31))
        );
        assert!(month_bounds(2025, 13).is_err());
    }

    #[test]
    fn monthly_summary_groups_by_project() {
        let alpha = project("Alpha", dec!(50));
        let beta = project("Beta", dec!(100));
        let projects: HashMap<Uuid, Project> =
            [(alpha.id, alpha.clone()), (beta.id, beta.clone())].into_iter().collect();
        let me = Uuid::new_v4();
        let entries = vec![
            entry(me, Some(&alpha), date(2025, 3, 3), dec!(4)),
            entry(me, Some(&alpha), date(2025, 3, 4), dec!(3.5)),
            entry(me, Some(&beta), date(2025, 3, 4), dec!(2)),
            entry(me, None, date(2025, 3, 5), dec!(7)),
            entry(me, Some(&beta), date(2025, 4, 1), dec!(8)),
        ];

        let summary = monthly_summary(&entries, &projects, 2025, 3).unwrap();
        assert_eq!(summary.summary["Alpha"].hours, dec!(7.5));
        assert_eq!(summary.summary["Beta"].hours, dec!(2));
        assert_eq!(summary.total_hours, dec!(9.5));
        assert_eq!(summary.total_value, dec!(575));
        assert_eq!(summary.period, "2025-03-01 - 2025-03-31");
    }

    #[test]
    fn workload_lists_every_category() {
        let alpha = project("Alpha", dec!(10));
        let projects: HashMap<Uuid, Project> = [(alpha.id, alpha.clone())].into_iter().collect();
        let ana = Uuid::new_v4();
        let names: HashMap<Uuid, String> = [(ana, "Ana Lopez".to_string())].into_iter().collect();
        let entries = vec![
            entry(ana, Some(&alpha), date(2025, 3, 3), dec!(6)),
            entry(ana, None, date(2025, 3, 3), dec!(1.5)),
        ];

        let load = workload(&entries, &projects, &names);
        assert_eq!(load.by_category.len(), 4);
        assert_eq!(load.by_category[&TimeCategory::Project].hours, dec!(6));
        assert_eq!(load.by_category[&TimeCategory::Training].hours, dec!(0));
        assert_eq!(load.by_project["Alpha"].value, dec!(60));
        assert_eq!(load.by_employee["Ana Lopez"], dec!(7.5));
        assert_eq!(load.total_hours, dec!(7.5));
    }

    #[test]
    fn report_rows_are_sorted_and_valued() {
        let alpha = project("Alpha", dec!(20));
        let projects: HashMap<Uuid, Project> = [(alpha.id, alpha.clone())].into_iter().collect();
        let ana = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let names: HashMap<Uuid, String> =
            [(ana, "Ana".to_string()), (bob, "Bob".to_string())].into_iter().collect();
        let entries = vec![
            entry(bob, Some(&alpha), date(2025, 3, 4), dec!(2)),
            entry(ana, None, date(2025, 3, 4), dec!(1)),
            entry(bob, Some(&alpha), date(2025, 3, 3), dec!(3)),
        ];

        let rows = report_rows(&entries, &projects, &names);
        assert_eq!(rows[0].date, date(2025, 3, 3));
        assert_eq!(rows[0].value, dec!(60));
        assert_eq!(rows[1].employee, "Ana");
        assert_eq!(rows[1].project, None);
        assert_eq!(rows[1].value, dec!(0));
    }
}
