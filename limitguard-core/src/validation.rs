//! Definition Table Validation
//!
//! Pure load-time checks over complete definition tables. Every entry is
//! classified as good, bad or unused; the first bad entry and its reason are
//! kept for the report. Nothing here touches the engine, so table
//! collaborators can run the same checks before ever offering a table.
//!
//! Watchpoint entries are checked for data type, operator, message id and
//! float reference sanity. Actionpoint entries are checked for default
//! state, response id, fail threshold, notification severity and finally
//! the RPN equation.

use crate::{
    actionpoint::{Actionpoint, ActionpointDefinition},
    errors::{LcError, LcResult, Table, ValidationReason},
    events::{Notification, TableCounts},
    watchpoint::{Watchpoint, WatchpointDefinition},
};

/// Outcome of validating one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableReport {
    /// Good, bad and unused entry counts
    pub counts: TableCounts,
    /// First failing entry and why
    pub first_failure: Option<(u16, ValidationReason)>,
}

impl TableReport {
    /// True when no entry failed
    pub const fn is_valid(&self) -> bool {
        self.first_failure.is_none()
    }

    /// Counts on success, the first failure as an error otherwise
    pub fn into_result(self, table: Table) -> LcResult<TableCounts> {
        match self.first_failure {
            None => Ok(self.counts),
            Some((entry, reason)) => Err(LcError::Validation { table, entry, reason }),
        }
    }

    /// Notification announcing this report
    pub fn notification(&self, table: Table) -> Notification {
        match (table, self.first_failure) {
            (Table::Watchpoint, None) => Notification::WatchTableValidated(self.counts),
            (Table::Actionpoint, None) => Notification::ActionTableValidated(self.counts),
            (Table::Watchpoint, Some((entry, reason))) => Notification::WatchTableRejected {
                entry,
                reason,
                counts: self.counts,
            },
            (Table::Actionpoint, Some((entry, reason))) => Notification::ActionTableRejected {
                entry,
                reason,
                counts: self.counts,
            },
        }
    }

    fn tally<T>(&mut self, entry: usize, decoded: Result<Option<T>, ValidationReason>) {
        match decoded {
            Ok(Some(_)) => self.counts.good += 1,
            Ok(None) => self.counts.unused += 1,
            Err(reason) => {
                self.counts.bad += 1;
                if self.first_failure.is_none() {
                    self.first_failure = Some((entry as u16, reason));
                }
            }
        }
    }
}

/// Validate a watchpoint definition table
pub fn validate_watchpoints(table: &[WatchpointDefinition]) -> TableReport {
    let mut report = TableReport::default();
    for (entry, definition) in table.iter().enumerate() {
        report.tally(entry, Watchpoint::decode(definition));
    }
    report
}

/// Validate an actionpoint definition table
pub fn validate_actionpoints(table: &[ActionpointDefinition]) -> TableReport {
    let mut report = TableReport::default();
    for (entry, definition) in table.iter().enumerate() {
        report.tally(entry, Actionpoint::decode(definition));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actionpoint::ApState,
        constants::limits::{RPN_AND, RPN_EQUAL},
        watchpoint::{DataType, Operator},
    };

    #[test]
    fn counts_every_entry_and_keeps_first_failure() {
        let mut table = [WatchpointDefinition::UNUSED; 6];
        table[0] = WatchpointDefinition::new(DataType::U16Be, Operator::Gt, 0x0801, 12);
        table[2] = WatchpointDefinition { operator_id: 0x42, ..table[0] };
        table[3] = WatchpointDefinition::new(DataType::U8, Operator::Eq, 0x2000, 0);
        table[4] = WatchpointDefinition::new(DataType::F32Le, Operator::Lt, 0x0801, 0)
            .with_float_comparison(3.5);

        let report = validate_watchpoints(&table);
        assert_eq!(report.counts, TableCounts { good: 2, bad: 2, unused: 2 });
        assert_eq!(report.first_failure, Some((2, ValidationReason::Operator)));
        assert!(!report.is_valid());
        assert_eq!(
            report.into_result(Table::Watchpoint),
            Err(LcError::Validation {
                table: Table::Watchpoint,
                entry: 2,
                reason: ValidationReason::Operator,
            })
        );
    }

    #[test]
    fn float_reference_must_be_finite() {
        let table = [
            WatchpointDefinition::new(DataType::F32Be, Operator::Gt, 1, 0)
                .with_float_comparison(f32::INFINITY),
        ];
        let report = validate_watchpoints(&table);
        assert_eq!(report.first_failure, Some((0, ValidationReason::FloatInfinite)));
    }

    #[test]
    fn actionpoint_rpn_failure_reports_position() {
        let table = [
            ActionpointDefinition::new(ApState::Active, 1, 1, &[0, RPN_EQUAL]),
            ActionpointDefinition::unused(),
            ActionpointDefinition::new(ApState::Passive, 1, 1, &[0, RPN_AND, RPN_EQUAL]),
        ];
        let report = validate_actionpoints(&table);
        assert_eq!(report.counts, TableCounts { good: 1, bad: 1, unused: 1 });
        assert_eq!(
            report.first_failure,
            Some((2, ValidationReason::Rpn { index: 1, stack_depth: 1 }))
        );
        assert!(matches!(
            report.notification(Table::Actionpoint),
            Notification::ActionTableRejected { entry: 2, .. }
        ));
    }

    #[test]
    fn clean_table_announces_counts() {
        let table = [ActionpointDefinition::new(ApState::Disabled, 7, 3, &[0, RPN_EQUAL])];
        let report = validate_actionpoints(&table);
        assert!(report.is_valid());
        assert_eq!(
            report.notification(Table::Actionpoint),
            Notification::ActionTableValidated(TableCounts { good: 1, bad: 0, unused: 0 })
        );
    }
}
