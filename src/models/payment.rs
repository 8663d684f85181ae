use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::utils::period::{derive_period, next_month_start};

/// График платежа: ожидаемая и фактическая сумма за участок в месяце
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PaymentSchedule {
    pub id: Uuid,
    pub plot_id: Uuid,
    pub expected_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: NaiveDate,
    pub is_paid: bool,
    pub month: String,
    pub year: String,
    pub carried_over: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Статус платежа. Не хранится: выводится из полей записи в одном месте,
/// чтобы все ответы API считали его одинаково.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Overdue,
    Partial,
    Pending,
}

impl PaymentStatus {
    /// Приоритет: оплачен > просрочен > частично > ожидает.
    /// Частично оплаченный платёж с истёкшим сроком считается просроченным.
    pub fn derive(
        is_paid: bool,
        paid_amount: Decimal,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        if is_paid {
            PaymentStatus::Paid
        } else if due_date < today {
            PaymentStatus::Overdue
        } else if paid_amount > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

impl PaymentSchedule {
    pub fn status(&self, today: NaiveDate) -> PaymentStatus {
        PaymentStatus::derive(self.is_paid, self.paid_amount, self.due_date, today)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub plot_id: Uuid,
    pub expected_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: NaiveDate,
    pub is_paid: bool,
    pub month: String,
    pub year: String,
    pub carried_over: bool,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentResponse {
    pub fn from_schedule(schedule: PaymentSchedule, today: NaiveDate) -> Self {
        let status = schedule.status(today);
        Self {
            id: schedule.id,
            plot_id: schedule.plot_id,
            expected_amount: schedule.expected_amount,
            paid_amount: schedule.paid_amount,
            due_date: schedule.due_date,
            is_paid: schedule.is_paid,
            month: schedule.month,
            year: schedule.year,
            carried_over: schedule.carried_over,
            status,
            created_at: schedule.created_at,
            updated_at: schedule.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub plot_id: Uuid,
    pub expected_amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_amount: Option<Decimal>,
    pub is_paid: Option<bool>,
}

/// Частичное обновление: None — поле не трогаем, Some(0) / Some(false)
/// применяются как обычные значения.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub expected_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub is_paid: Option<bool>,
}

/// Результат наложения частичного обновления на существующую запись
#[derive(Debug, PartialEq, Eq)]
pub struct MergedPayment {
    pub expected_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: NaiveDate,
    pub is_paid: bool,
}

impl UpdatePaymentRequest {
    pub fn merge_with(&self, existing: &PaymentSchedule) -> MergedPayment {
        MergedPayment {
            expected_amount: self.expected_amount.unwrap_or(existing.expected_amount),
            paid_amount: self.paid_amount.unwrap_or(existing.paid_amount),
            due_date: self.due_date.unwrap_or(existing.due_date),
            is_paid: self.is_paid.unwrap_or(existing.is_paid),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlySummary {
    pub total_expected: Decimal,
    pub total_paid: Decimal,
    pub payment_count: i64,
    pub paid_count: i64,
}

impl MonthlySummary {
    /// Свёртка выбранных за месяц записей; пустой месяц даёт нулевую сводку
    pub fn from_schedules(schedules: &[PaymentSchedule]) -> Self {
        let mut summary = Self {
            total_expected: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            payment_count: 0,
            paid_count: 0,
        };

        for schedule in schedules {
            summary.total_expected += schedule.expected_amount;
            summary.total_paid += schedule.paid_amount;
            summary.payment_count += 1;
            if schedule.is_paid {
                summary.paid_count += 1;
            }
        }

        summary
    }
}

/// Заготовка переноса одной неоплаченной записи на следующий месяц.
/// Оплата новой записи всегда нулевая, исходная запись не меняется.
#[derive(Debug)]
pub struct RolloverDraft {
    pub plot_id: Uuid,
    pub expected_amount: Decimal,
    pub due_date: NaiveDate,
    pub month: String,
    pub year: String,
}

impl RolloverDraft {
    /// Все переносы получают общий срок: 1-е число месяца, следующего
    /// за текущей датой, независимо от сроков исходных записей
    pub fn plan(unpaid: &[PaymentSchedule], today: NaiveDate) -> Vec<RolloverDraft> {
        let due_date = next_month_start(today);
        let (month, year) = derive_period(due_date);

        unpaid
            .iter()
            .map(|source| RolloverDraft {
                plot_id: source.plot_id,
                expected_amount: source.expected_amount,
                due_date,
                month: month.clone(),
                year: year.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_status_paid_wins() {
        // is_paid выставлен вручную и имеет приоритет над сроком
        let status = PaymentStatus::derive(true, dec(0), date(2024, 1, 1), date(2024, 6, 1));
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn test_status_overdue_beats_partial() {
        let status = PaymentStatus::derive(false, dec(500), date(2024, 3, 15), date(2024, 4, 1));
        assert_eq!(status, PaymentStatus::Overdue);
    }

    #[test]
    fn test_status_partial() {
        let status = PaymentStatus::derive(false, dec(500), date(2024, 3, 15), date(2024, 3, 1));
        assert_eq!(status, PaymentStatus::Partial);
    }

    #[test]
    fn test_status_pending() {
        let status = PaymentStatus::derive(false, dec(0), date(2024, 3, 15), date(2024, 3, 1));
        assert_eq!(status, PaymentStatus::Pending);
    }

    #[test]
    fn test_status_due_today_is_not_overdue() {
        let status = PaymentStatus::derive(false, dec(0), date(2024, 3, 15), date(2024, 3, 15));
        assert_eq!(status, PaymentStatus::Pending);
    }

    fn schedule() -> PaymentSchedule {
        let now = Utc::now();
        PaymentSchedule {
            id: Uuid::new_v4(),
            plot_id: Uuid::new_v4(),
            expected_amount: dec(1000),
            paid_amount: dec(400),
            due_date: date(2024, 3, 15),
            is_paid: true,
            month: "March".to_string(),
            year: "2024".to_string(),
            carried_over: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_merge_keeps_missing_fields() {
        let request = UpdatePaymentRequest {
            expected_amount: None,
            paid_amount: None,
            due_date: None,
            is_paid: None,
        };
        let merged = request.merge_with(&schedule());
        assert_eq!(merged.expected_amount, dec(1000));
        assert_eq!(merged.paid_amount, dec(400));
        assert_eq!(merged.due_date, date(2024, 3, 15));
        assert!(merged.is_paid);
    }

    fn schedule_with(expected: i64, paid: i64, is_paid: bool) -> PaymentSchedule {
        PaymentSchedule {
            expected_amount: dec(expected),
            paid_amount: dec(paid),
            is_paid,
            ..schedule()
        }
    }

    #[test]
    fn test_summary_reduces_sums_and_counts() {
        let schedules = vec![
            schedule_with(1000, 1000, true),
            schedule_with(500, 200, false),
            schedule_with(300, 0, false),
        ];
        let summary = MonthlySummary::from_schedules(&schedules);

        assert_eq!(summary.total_expected, dec(1800));
        assert_eq!(summary.total_paid, dec(1200));
        assert_eq!(summary.payment_count, 3);
        assert_eq!(summary.paid_count, 1);
    }

    #[test]
    fn test_summary_of_empty_month_is_all_zero() {
        let summary = MonthlySummary::from_schedules(&[]);

        assert_eq!(summary.total_expected, Decimal::ZERO);
        assert_eq!(summary.total_paid, Decimal::ZERO);
        assert_eq!(summary.payment_count, 0);
        assert_eq!(summary.paid_count, 0);
    }

    #[test]
    fn test_rollover_plan_copies_each_unpaid_record() {
        let unpaid = vec![
            schedule_with(1000, 0, false),
            schedule_with(500, 200, false),
        ];
        let drafts = RolloverDraft::plan(&unpaid, date(2024, 3, 15));

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].expected_amount, dec(1000));
        assert_eq!(drafts[1].expected_amount, dec(500));
        for draft in &drafts {
            assert_eq!(draft.due_date, date(2024, 4, 1));
            assert_eq!(draft.month, "April");
            assert_eq!(draft.year, "2024");
        }
    }

    #[test]
    fn test_rollover_plan_of_nothing_is_empty() {
        // обработчик отклоняет пустой перенос до записи в базу
        assert!(RolloverDraft::plan(&[], date(2024, 3, 15)).is_empty());
    }

    #[test]
    fn test_rollover_plan_wraps_year() {
        let drafts = RolloverDraft::plan(&[schedule_with(100, 0, false)], date(2024, 12, 20));

        assert_eq!(drafts[0].due_date, date(2025, 1, 1));
        assert_eq!(drafts[0].month, "January");
        assert_eq!(drafts[0].year, "2025");
    }

    #[test]
    fn test_merge_applies_explicit_zero_and_false() {
        // ноль и false — полноценные значения, а не "поле не передано"
        let request = UpdatePaymentRequest {
            expected_amount: None,
            paid_amount: Some(dec(0)),
            due_date: None,
            is_paid: Some(false),
        };
        let merged = request.merge_with(&schedule());
        assert_eq!(merged.paid_amount, dec(0));
        assert!(!merged.is_paid);
    }
}
