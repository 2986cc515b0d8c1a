pub mod aggregation;
pub mod imputation;
pub mod project;
pub mod training;
pub mod week;

pub use aggregation::{
    month_bounds, monthly_summary, report_rows, workload, CategoryLoad, MonthlySummary,
    ProjectHours, ProjectLoad, ReportRow, Workload,
};
pub use imputation::{ensure_daily_limit, Imputation, ImputationDraft, TimeCategory};
pub use project::{generate_project_code, Project, ProjectCategory, ProjectDraft};
pub use training::{Training, TrainingDraft, TrainingKind};
pub use week::{ensure_week_editable, IsoWeek, TimesheetWeek, WeekStatus};
