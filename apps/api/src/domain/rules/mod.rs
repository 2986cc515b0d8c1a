// Organisation-wide HR rules: working week, public holidays, working hours

pub mod global_rules;

pub use global_rules::{GlobalRules, Holiday};
