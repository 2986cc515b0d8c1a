use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::rules::GlobalRules;

/// Paid-leave days earned over a full year when no policy is configured
pub const DEFAULT_ANNUAL_DAYS: Decimal = dec!(18);

/// Nominal working days in a year before leave and holidays (52 weeks of 5 days)
const NOMINAL_WORKING_DAYS: i64 = 52 * 5;

/// Reference period of a member-specific leave allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "accrual_period", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccrualPeriod {
    Annual,
    Semiannual,
    Quarterly,
    Monthly,
}

impl AccrualPeriod {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            AccrualPeriod::Annual => 1,
            AccrualPeriod::Semiannual => 2,
            AccrualPeriod::Quarterly => 4,
            AccrualPeriod::Monthly => 12,
        }
    }
}

/// Team-level accrual rule
///
/// `annual_working_days == 0` means "derive from the calendar":
/// `52 * 5 - annual_days - public holidays of the year`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeavePolicy {
    pub team_id: Uuid,
    pub annual_days: Decimal,
    pub annual_working_days: u32,
    pub updated_at: DateTime<Utc>,
}

impl LeavePolicy {
    pub fn new(
        team_id: Uuid,
        annual_days: Decimal,
        annual_working_days: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_days(annual_days, "Annual leave days")?;
        if annual_working_days > 366 {
            return Err(DomainError::validation(
                "Annual working days cannot exceed 366",
            ));
        }
        Ok(Self {
            team_id,
            annual_days,
            annual_working_days,
            updated_at: now,
        })
    }
}

/// Per-member override of the team policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberLeaveRule {
    pub team_id: Uuid,
    pub member_id: Uuid,
    pub max_days: Decimal,
    pub period: AccrualPeriod,
    pub updated_at: DateTime<Utc>,
}

impl MemberLeaveRule {
    pub fn new(
        team_id: Uuid,
        member_id: Uuid,
        max_days: Decimal,
        period: AccrualPeriod,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_days(max_days, "Maximum days")?;
        Ok(Self {
            team_id,
            member_id,
            max_days,
            period,
            updated_at: now,
        })
    }

    /// Allowance scaled to a full year
    pub fn annual_days(&self) -> Decimal {
        self.max_days * Decimal::from(self.period.periods_per_year())
    }
}

fn validate_days(days: Decimal, label: &str) -> DomainResult<()> {
    if days <= Decimal::ZERO || days > Decimal::from(366) {
        return Err(DomainError::validation(format!(
            "{} must be between 0 and 366",
            label
        )));
    }
    Ok(())
}

/// Resolved yearly entitlement of one employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub annual_days: Decimal,
    pub annual_working_days: u32,
}

impl Entitlement {
    /// Combines team policy, member override and calendar for `year`
    ///
    /// The member override wins over the team allowance; without a policy
    /// the default of 18 days applies.
    pub fn resolve(
        policy: Option<&LeavePolicy>,
        member_rule: Option<&MemberLeaveRule>,
        rules: &GlobalRules,
        year: i32,
    ) -> Self {
        let annual_days = match (member_rule, policy) {
            (Some(rule), _) => rule.annual_days(),
            (None, Some(policy)) => policy.annual_days,
            (None, None) => DEFAULT_ANNUAL_DAYS,
        };
        let annual_working_days = match policy.map(|p| p.annual_working_days) {
            Some(days) if days > 0 => days,
            _ => derived_working_days(annual_days, rules.holidays_in_year(year)),
        };
        Self {
            annual_days,
            annual_working_days,
        }
    }

    /// Days earned after `worked_days` working days, capped at the
    /// annual allowance and rounded to two decimals
    pub fn accrued(&self, worked_days: u32) -> Decimal {
        if self.annual_working_days == 0 {
            return Decimal::ZERO;
        }
        let earned = Decimal::from(worked_days) * self.annual_days
            / Decimal::from(self.annual_working_days);
        earned
            .min(self.annual_days)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

fn derived_working_days(annual_days: Decimal, holidays: u32) -> u32 {
    let leave = annual_days.ceil().to_i64().unwrap_or(0);
    (NOMINAL_WORKING_DAYS - leave - i64::from(holidays)).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::Holiday;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn default_entitlement_uses_derived_working_days() {
        let ent = Entitlement::resolve(None, None, &GlobalRules::default(), 2025);
        assert_eq!(ent.annual_days, dec!(18));
        assert_eq!(ent.annual_working_days, 242);
    }

    #[test]
    fn holidays_reduce_working_days() {
        let mut rules = GlobalRules::default();
        rules.holidays = vec![
            Holiday {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                name: "New year".into(),
                fixed: false,
            },
            Holiday {
                date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                name: "Labour day".into(),
                fixed: false,
            },
        ];
        let ent = Entitlement::resolve(None, None, &rules, 2025);
        assert_eq!(ent.annual_working_days, 240);
    }

    #[test]
    fn explicit_working_days_override_derivation() {
        let policy = LeavePolicy::new(Uuid::new_v4(), dec!(25), 220, Utc::now()).unwrap();
        let ent = Entitlement::resolve(Some(&policy), None, &GlobalRules::default(), 2025);
        assert_eq!(ent.annual_days, dec!(25));
        assert_eq!(ent.annual_working_days, 220);
    }

    #[test]
    fn member_rule_wins_over_team_policy() {
        let team = Uuid::new_v4();
        let policy = LeavePolicy::new(team, dec!(25), 0, Utc::now()).unwrap();
        let rule =
            MemberLeaveRule::new(team, Uuid::new_v4(), dec!(2), AccrualPeriod::Monthly, Utc::now())
                .unwrap();
        let ent = Entitlement::resolve(Some(&policy), Some(&rule), &GlobalRules::default(), 2025);
        assert_eq!(ent.annual_days, dec!(24));
    }

    #[test]
    fn accrual_is_prorated_and_capped() {
        let ent = Entitlement {
            annual_days: dec!(18),
            annual_working_days: 240,
        };
        assert_eq!(ent.accrued(0), dec!(0));
        assert_eq!(ent.accrued(120), dec!(9));
        assert_eq!(ent.accrued(20), dec!(1.5));
        assert_eq!(ent.accrued(500), dec!(18));
    }

    #[test]
    fn accrual_rounds_to_hundredths() {
        let ent = Entitlement {
            annual_days: dec!(18),
            annual_working_days: 242,
        };
        // 10 * 18 / 242 = 0.7438...
        assert_eq!(ent.accrued(10), dec!(0.74));
    }

    #[test]
    fn invalid_policy_values_are_rejected() {
        assert!(LeavePolicy::new(Uuid::new_v4(), dec!(0), 0, Utc::now()).is_err());
        assert!(LeavePolicy::new(Uuid::new_v4(), dec!(18), 400, Utc::now()).is_err());
        assert!(MemberLeaveRule::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(-1),
            AccrualPeriod::Annual,
            Utc::now()
        )
        .is_err());
    }
}
