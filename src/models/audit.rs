//! Audit trace models.
//!
//! Every computed pay record carries the sequence of decisions that produced
//! it, so a reviewer can see why each amount was applied.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate conditions that don't prevent calculation but should be
/// surfaced to the reviewer, such as net pay being clamped at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AuditTrace;
///
/// let mut trace = AuditTrace::default();
/// let n = trace.next_step_number();
/// assert_eq!(n, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTrace {
    /// The number the next pushed step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Appends a step, numbering it in sequence.
    pub fn push(
        &mut self,
        rule_id: &str,
        rule_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: String,
    ) {
        let step_number = self.next_step_number();
        self.steps.push(AuditStep {
            step_number,
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            input,
            output,
            reasoning,
        });
    }

    /// Appends a warning.
    pub fn warn(&mut self, code: &str, message: String) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_numbers_steps_sequentially() {
        let mut trace = AuditTrace::default();
        trace.push(
            "first",
            "First",
            serde_json::json!({}),
            serde_json::json!({}),
            "one".to_string(),
        );
        trace.push(
            "second",
            "Second",
            serde_json::json!({}),
            serde_json::json!({}),
            "two".to_string(),
        );

        assert_eq!(trace.steps[0].step_number, 1);
        assert_eq!(trace.steps[1].step_number, 2);
        assert_eq!(trace.steps[1].rule_id, "second");
    }

    #[test]
    fn test_warn_records_code() {
        let mut trace = AuditTrace::default();
        trace.warn("NEGATIVE_NET_CLAMPED", "net clamped".to_string());
        assert_eq!(trace.warnings.len(), 1);
        assert_eq!(trace.warnings[0].code, "NEGATIVE_NET_CLAMPED");
    }
}
