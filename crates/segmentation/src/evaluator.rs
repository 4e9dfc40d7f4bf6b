//! Rule-list evaluation with AND/OR fold semantics.

use audience_core::CandidateEntity;

use crate::predicates::{self, Rule, RuleLogic};

/// Returns `true` when the entity satisfies the rule list under the given
/// logic. AND short-circuits on the first failing rule, OR on the first
/// passing one; rule order never changes the boolean result.
///
/// An empty rule list matches every candidate under either logic — a
/// segment with no rules means "all contacts"/"all leads", not "nothing".
pub fn passes(entity: &CandidateEntity, rules: &[Rule], logic: RuleLogic) -> bool {
    if rules.is_empty() {
        return true;
    }
    match logic {
        RuleLogic::And => rules.iter().all(|rule| rule_passes(entity, rule)),
        RuleLogic::Or => rules.iter().any(|rule| rule_passes(entity, rule)),
    }
}

fn rule_passes(entity: &CandidateEntity, rule: &Rule) -> bool {
    let resolved = crate::resolver::resolve(entity, &rule.field);
    predicates::evaluate(resolved.as_ref(), rule.operator, rule.value.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::{RuleOperator, RuleValue};
    use audience_core::{EntityKind, FieldValue};
    use uuid::Uuid;

    fn contact(status: &str, revenue: f64) -> CandidateEntity {
        let mut entity = CandidateEntity::new(Uuid::new_v4(), EntityKind::Contact);
        entity.status = Some(status.to_string());
        entity.revenue = Some(revenue);
        entity
    }

    fn status_rule(value: &str) -> Rule {
        Rule {
            field: "status".into(),
            operator: RuleOperator::Equals,
            value: Some(RuleValue::scalar(value)),
        }
    }

    fn revenue_rule(min: i64) -> Rule {
        Rule {
            field: "revenue".into(),
            operator: RuleOperator::GreaterThan,
            value: Some(RuleValue::scalar(min)),
        }
    }

    #[test]
    fn test_and_requires_every_rule() {
        let entity = contact("active", 50_000.0);
        let rules = vec![status_rule("active"), revenue_rule(10_000)];
        assert!(passes(&entity, &rules, RuleLogic::And));

        let rules = vec![status_rule("active"), revenue_rule(90_000)];
        assert!(!passes(&entity, &rules, RuleLogic::And));
    }

    #[test]
    fn test_or_requires_any_rule() {
        let entity = contact("churned", 50_000.0);
        let rules = vec![status_rule("active"), revenue_rule(10_000)];
        assert!(passes(&entity, &rules, RuleLogic::Or));

        let rules = vec![status_rule("active"), revenue_rule(90_000)];
        assert!(!passes(&entity, &rules, RuleLogic::Or));
    }

    #[test]
    fn test_empty_rule_list_matches_everything() {
        let entity = contact("anything", 0.0);
        assert!(passes(&entity, &[], RuleLogic::And));
        assert!(passes(&entity, &[], RuleLogic::Or));
    }

    #[test]
    fn test_unknown_field_degrades_to_non_match() {
        let entity = contact("active", 1.0);
        let rules = vec![Rule {
            field: "deleted_column".into(),
            operator: RuleOperator::Equals,
            value: Some(RuleValue::Scalar(FieldValue::Bool(true))),
        }];
        assert!(!passes(&entity, &rules, RuleLogic::And));
        // Under OR the bad rule is ignored as long as another passes.
        let rules = vec![rules.into_iter().next().unwrap(), status_rule("active")];
        assert!(passes(&entity, &rules, RuleLogic::Or));
    }
}
