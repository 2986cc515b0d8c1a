// Leave domain module
// Leave requests, working-day counting, accrual policies and balances

pub mod balance;
pub mod days;
pub mod policy;
pub mod request;

pub use balance::{compute_balance, BalanceEntry, BalanceInputs, BalanceSummary};
pub use days::{leave_days, year_segments, YearSegment};
pub use policy::{AccrualPeriod, Entitlement, LeavePolicy, MemberLeaveRule, DEFAULT_ANNUAL_DAYS};
pub use request::{ensure_no_overlap, LeaveRequest, LeaveStatus, LeaveType};
