//! Downstream records and the aggregate summary.
//!
//! Every record type is `Default`; the default value is what a failed
//! downstream call degrades to.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// `GET {member-service}/api/members/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

/// One element of `GET {class-service}/api/classes/member/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub schedule: Option<NaiveDateTime>,
    pub max_capacity: Option<i32>,
    #[serde(default)]
    pub current_enrollment: i32,
    pub coach_id: Option<i64>,
    #[serde(default)]
    pub enrolled_members: Vec<i64>,
}

/// One element of `GET {payment-service}/api/payment/member/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Option<i64>,
    pub member_id: Option<i64>,
    pub amount: Option<f64>,
    pub payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub schedule: Option<NaiveDateTime>,
    pub max_capacity: Option<i32>,
    pub coach_id: Option<i64>,
    pub enrolled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub id: Option<i64>,
    pub member_id: Option<i64>,
    pub amount: Option<f64>,
    pub payment_date: Option<DateTime<Utc>>,
}

/// Cross-service view of one member.
///
/// Empty member fields mean the member lookup failed; empty class or payment
/// lists alone do not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub enrolled_classes: Vec<ClassSummary>,
    pub payments: Vec<PaymentSummary>,
    pub total_payments: f64,
    pub total_classes: usize,
}

impl MemberSummary {
    /// Whether the member lookup produced a member.
    pub fn has_member(&self) -> bool {
        self.id.is_some()
    }
}

impl From<ClassRecord> for ClassSummary {
    fn from(class: ClassRecord) -> Self {
        Self {
            id: class.id,
            name: class.name,
            schedule: class.schedule,
            max_capacity: class.max_capacity,
            coach_id: class.coach_id,
            // only the member's own enrolled classes are ever fetched
            enrolled: true,
        }
    }
}

impl From<PaymentRecord> for PaymentSummary {
    fn from(payment: PaymentRecord) -> Self {
        Self {
            id: payment.id,
            member_id: payment.member_id,
            amount: payment.amount,
            payment_date: payment.payment_date,
        }
    }
}

/// Merge the three partial results.
///
/// Member fields are copied only when the member record has an id. A payment
/// without an amount contributes nothing to the total.
pub fn build_summary(
    member: MemberRecord,
    classes: Vec<ClassRecord>,
    payments: Vec<PaymentRecord>,
) -> MemberSummary {
    let mut summary = MemberSummary::default();

    if member.id.is_some() {
        summary.id = member.id;
        summary.name = member.name;
        summary.email = member.email;
        summary.registration_date = member.registration_date;
    }

    summary.total_classes = classes.len();
    summary.total_payments = payments.iter().filter_map(|p| p.amount).sum();
    summary.enrolled_classes = classes.into_iter().map(ClassSummary::from).collect();
    summary.payments = payments.into_iter().map(PaymentSummary::from).collect();

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member() -> MemberRecord {
        MemberRecord {
            id: Some(1),
            name: Some("Ana López".into()),
            email: Some("ana.lopez@email.com".into()),
            registration_date: NaiveDate::from_ymd_opt(2024, 1, 15),
        }
    }

    fn payment(id: i64, amount: f64) -> PaymentRecord {
        PaymentRecord {
            id: Some(id),
            member_id: Some(1),
            amount: Some(amount),
            payment_date: None,
        }
    }

    fn class(id: i64) -> ClassRecord {
        ClassRecord {
            id: Some(id),
            name: Some(format!("Class {}", id)),
            ..ClassRecord::default()
        }
    }

    #[test]
    fn test_totals() {
        let summary = build_summary(
            member(),
            vec![class(1), class(2), class(3)],
            vec![payment(1, 50.00), payment(2, 25.50)],
        );
        assert_eq!(summary.total_payments, 75.50);
        assert_eq!(summary.total_classes, 3);
        assert_eq!(summary.payments.len(), 2);
        assert!(summary.enrolled_classes.iter().all(|c| c.enrolled));
    }

    #[test]
    fn test_absent_member_leaves_identity_empty() {
        let summary = build_summary(MemberRecord::default(), vec![class(1)], vec![payment(1, 10.0)]);
        assert!(!summary.has_member());
        assert_eq!(summary.name, None);
        assert_eq!(summary.total_classes, 1);
        assert_eq!(summary.total_payments, 10.0);
    }

    #[test]
    fn test_member_without_id_is_treated_as_absent() {
        let mut record = member();
        record.id = None;
        let summary = build_summary(record, vec![], vec![]);
        assert_eq!(summary, MemberSummary::default());
    }

    #[test]
    fn test_all_empty() {
        let summary = build_summary(MemberRecord::default(), vec![], vec![]);
        assert_eq!(summary.total_payments, 0.0);
        assert_eq!(summary.total_classes, 0);
        assert!(summary.enrolled_classes.is_empty());
        assert!(summary.payments.is_empty());
    }

    #[test]
    fn test_payment_without_amount_adds_nothing() {
        let mut missing = payment(3, 0.0);
        missing.amount = None;
        let summary = build_summary(member(), vec![], vec![payment(1, 20.0), missing]);
        assert_eq!(summary.total_payments, 20.0);
        assert_eq!(summary.payments.len(), 2);
    }

    #[test]
    fn test_wire_formats() {
        let class: ClassRecord = serde_json::from_value(json!({
            "id": 4,
            "name": "Yoga Matutino",
            "schedule": "2024-01-15T10:00:00",
            "maxCapacity": 20,
            "coachId": 9,
            "reservedEquipment": [1, 2]
        }))
        .unwrap();
        let payment: PaymentRecord = serde_json::from_value(json!({
            "id": 1, "memberId": 1, "amount": 50.0, "paymentDate": "2024-01-15T10:00:00Z"
        }))
        .unwrap();

        let summary = build_summary(member(), vec![class], vec![payment]);
        let body = serde_json::to_value(&summary).unwrap();

        assert_eq!(body["registrationDate"], "2024-01-15");
        assert_eq!(body["enrolledClasses"][0]["schedule"], "2024-01-15T10:00:00");
        assert_eq!(body["enrolledClasses"][0]["enrolled"], true);
        assert_eq!(body["payments"][0]["paymentDate"], "2024-01-15T10:00:00Z");
        assert_eq!(body["totalPayments"], 50.0);
        assert_eq!(body["totalClasses"], 1);
    }

    #[test]
    fn test_empty_summary_serializes_nulls() {
        let body = serde_json::to_value(MemberSummary::default()).unwrap();
        assert!(body["id"].is_null());
        assert!(body["name"].is_null());
        assert_eq!(body["enrolledClasses"], json!([]));
        assert_eq!(body["totalPayments"], 0.0);
    }
}
