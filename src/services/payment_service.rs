// src/services/payment_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        clock::Clock,
        db_utils::blank_to_none,
        decimal::money,
        error::{AppError, RuleViolation},
        period::Period,
    },
    db::{payment_repo::PaymentRecord, CustomerRepository, PaymentRepository},
    models::{
        finance::{PaymentFilter, PaymentList, PaymentPayload, PaymentView},
        page::PageRequest,
    },
    services::totals,
};

#[derive(Clone)]
pub struct PaymentService {
    repo: PaymentRepository,
    customers: CustomerRepository,
    clock: Arc<dyn Clock>,
}

impl PaymentService {
    pub fn new(repo: PaymentRepository, customers: CustomerRepository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, customers, clock }
    }

    pub async fn create_payment(&self, payload: PaymentPayload, created_by: Uuid) -> Result<PaymentView, AppError> {
        let amount = money(payload.amount);
        totals::validate_payment(amount, payload.payment_date, self.clock.today())?;

        let mut tx = self.repo.pool().begin().await?;
        self.ensure_customer_active(&mut *tx, payload.customer_id).await?;

        let memo = blank_to_none(payload.memo);
        let record = PaymentRecord {
            customer_id: payload.customer_id,
            payment_date: payload.payment_date,
            amount,
            method: payload.method,
            memo: memo.as_deref(),
        };
        let payment = self.repo.create(&mut *tx, &record, created_by).await?;
        tx.commit().await?;

        tracing::info!(
            "💰 Pagamento de R$ {} ({}) registrado para o cliente {}",
            payment.amount,
            payment.method.label(),
            payment.customer_id
        );
        self.get_payment(payment.id).await
    }

    /// A data continua limitada a hoje também na edição.
    pub async fn update_payment(&self, id: Uuid, payload: PaymentPayload) -> Result<PaymentView, AppError> {
        let amount = money(payload.amount);
        totals::validate_payment(amount, payload.payment_date, self.clock.today())?;

        let mut tx = self.repo.pool().begin().await?;
        let current = self
            .repo
            .find_view(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pagamento".into()))?;
        if current.payment.customer_id != payload.customer_id {
            self.ensure_customer_active(&mut *tx, payload.customer_id).await?;
        }

        let memo = blank_to_none(payload.memo);
        let record = PaymentRecord {
            customer_id: payload.customer_id,
            payment_date: payload.payment_date,
            amount,
            method: payload.method,
            memo: memo.as_deref(),
        };
        self.repo
            .update(&mut *tx, id, &record)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pagamento".into()))?;
        tx.commit().await?;

        tracing::info!("Pagamento {} atualizado", id);
        self.get_payment(id).await
    }

    pub async fn get_payment(&self, id: Uuid) -> Result<PaymentView, AppError> {
        self.repo
            .find_view(self.repo.pool(), id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Pagamento".into()))
    }

    pub async fn delete_payment(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(self.repo.pool(), id).await? {
            return Err(AppError::ResourceNotFound("Pagamento".into()));
        }
        tracing::info!("Pagamento {} excluído", id);
        Ok(())
    }

    pub async fn list_payments(&self, filter: &PaymentFilter) -> Result<PaymentList, AppError> {
        let period = Period::resolve(filter.month, filter.year, self.clock.today());
        let (start, end) = period.bounds();
        let page = PageRequest::new(filter.page, filter.per_page);

        let rows = self
            .repo
            .list(self.repo.pool(), start, end, filter.customer_id, page)
            .await?;
        let (total, total_amount) = rows
            .first()
            .map(|r| (r.total_count, r.period_amount))
            .unwrap_or((0, Decimal::ZERO));

        Ok(PaymentList {
            period,
            items: rows,
            total,
            page: page.page,
            per_page: page.per_page,
            total_amount,
        })
    }

    async fn ensure_customer_active(&self, conn: &mut sqlx::PgConnection, id: Uuid) -> Result<(), AppError> {
        let customer = self
            .customers
            .find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))?;
        if !customer.is_active {
            return Err(RuleViolation::InactiveCustomer.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::clock::FixedClock, models::finance::PaymentMethod};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use sqlx::postgres::PgPoolOptions;

    fn service(today: NaiveDate) -> PaymentService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/madeireira_test")
            .unwrap();
        PaymentService::new(
            PaymentRepository::new(pool.clone()),
            CustomerRepository::new(pool),
            Arc::new(FixedClock(today)),
        )
    }

    fn payload(amount: Decimal, date: NaiveDate) -> PaymentPayload {
        PaymentPayload {
            customer_id: Uuid::new_v4(),
            payment_date: date,
            amount,
            method: PaymentMethod::Pix,
            memo: None,
        }
    }

    // As regras rodam antes de qualquer acesso ao banco.
    #[tokio::test]
    async fn future_payment_is_rejected_before_touching_the_database() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let err = service(today)
            .create_payment(payload(dec!(10), tomorrow), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(RuleViolation::PaymentDateInFuture)));
    }

    #[tokio::test]
    async fn zero_amount_is_rejected_on_update() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let err = service(today)
            .update_payment(Uuid::new_v4(), payload(dec!(0.001), today))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(RuleViolation::PaymentAmountNotPositive)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn payment_moves_only_its_customer_balance(pool: sqlx::PgPool) {
        use crate::{config::AppState, models::registry::CustomerPayload};

        let state = AppState::for_tests(pool);
        let operator = state.test_operator().await;
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let mut ids = Vec::new();
        for name in ["Ana", "Bruno"] {
            let customer = state
                .registry_service
                .create_customer(CustomerPayload {
                    name: name.into(),
                    tax_id: None,
                    phone: None,
                    address: None,
                    is_active: true,
                })
                .await
                .unwrap();
            ids.push(customer.id);
        }
        let (payer, other) = (ids[0], ids[1]);

        let mut first = payload(dec!(12.34), today);
        first.customer_id = payer;
        let view = state.payment_service.create_payment(first, operator).await.unwrap();
        assert_eq!(view.payment.amount.to_string(), "12.34");

        let payer_balance = state.registry_service.get_customer(payer).await.unwrap().balance;
        assert_eq!(payer_balance.total_payments.to_string(), "12.34");
        assert_eq!(payer_balance.balance.to_string(), "12.34");

        let other_balance = state.registry_service.get_customer(other).await.unwrap().balance;
        assert_eq!(other_balance.total_payments.to_string(), "0.00");
        assert_eq!(other_balance.balance.to_string(), "0.00");
    }
}
