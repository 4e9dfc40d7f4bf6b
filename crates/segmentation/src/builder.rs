//! Segment builder — fluent API for constructing segment definitions.

use audience_core::{EntityKind, FieldValue};
use chrono::Utc;
use uuid::Uuid;

use crate::predicates::{Rule, RuleLogic, RuleOperator, RuleValue};
use crate::segment::Segment;

pub struct SegmentBuilder {
    org_id: Uuid,
    name: String,
    description: Option<String>,
    entity_kind: EntityKind,
    rules: Vec<Rule>,
    logic: RuleLogic,
}

impl SegmentBuilder {
    pub fn new(org_id: Uuid, name: impl Into<String>, entity_kind: EntityKind) -> Self {
        Self {
            org_id,
            name: name.into(),
            description: None,
            entity_kind,
            rules: Vec::new(),
            logic: RuleLogic::And,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_or(mut self) -> Self {
        self.logic = RuleLogic::Or;
        self
    }

    /// Escape hatch for operators without a dedicated helper.
    pub fn rule(
        mut self,
        field: impl Into<String>,
        operator: RuleOperator,
        value: Option<RuleValue>,
    ) -> Self {
        self.rules.push(Rule {
            field: field.into(),
            operator,
            value,
        });
        self
    }

    pub fn field_equals(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.rule(field, RuleOperator::Equals, Some(RuleValue::scalar(value)))
    }

    pub fn field_not_equals(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.rule(field, RuleOperator::NotEquals, Some(RuleValue::scalar(value)))
    }

    pub fn field_contains(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.rule(
            field,
            RuleOperator::Contains,
            Some(RuleValue::scalar(value.into())),
        )
    }

    pub fn field_gt(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.rule(
            field,
            RuleOperator::GreaterThan,
            Some(RuleValue::scalar(value)),
        )
    }

    pub fn field_lt(self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.rule(field, RuleOperator::LessThan, Some(RuleValue::scalar(value)))
    }

    pub fn field_in(self, field: impl Into<String>, values: Vec<FieldValue>) -> Self {
        self.rule(field, RuleOperator::In, Some(RuleValue::list(values)))
    }

    pub fn field_between(
        self,
        field: impl Into<String>,
        lower: impl Into<FieldValue>,
        upper: impl Into<FieldValue>,
    ) -> Self {
        self.rule(
            field,
            RuleOperator::Between,
            Some(RuleValue::list(vec![lower.into(), upper.into()])),
        )
    }

    pub fn field_is_set(self, field: impl Into<String>) -> Self {
        self.rule(field, RuleOperator::IsSet, None)
    }

    pub fn field_is_empty(self, field: impl Into<String>) -> Self {
        self.rule(field, RuleOperator::IsEmpty, None)
    }

    pub fn build(self) -> Segment {
        let now = Utc::now();
        Segment {
            id: Uuid::new_v4(),
            org_id: self.org_id,
            name: self.name,
            description: self.description,
            entity_kind: self.entity_kind,
            rules: self.rules,
            rule_logic: self.logic,
            member_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
