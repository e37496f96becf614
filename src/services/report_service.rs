// src/services/report_service.rs

use std::{collections::HashMap, sync::Arc};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, decimal::money, decimal::volume, error::AppError, period::Period},
    db::{CustomerRepository, ReportRepository},
    models::{
        page::PageRequest,
        registry::{BalanceFilter, CustomerBalance, CustomerFilter, CustomerSort},
        reports::{
            CashFlowMovement, CashFlowQuery, CashFlowReport, Dashboard, ItemReportRow, MovementKind,
            NotesReport, NotesReportQuery, PaymentMovementRow, PeriodQuery, SaleMovementRow, WoodReport,
            WoodReportQuery,
        },
    },
};

const TOP_DEBTORS: i64 = 5;
const TOP_BUYERS: i64 = 5;
const TOP_WOODS: i64 = 10;

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    customers: CustomerRepository,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(repo: ReportRepository, customers: CustomerRepository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, customers, clock }
    }

    /// Mês/ano pedidos, ou o mês corrente quando ausentes ou fora da faixa.
    pub fn period(&self, month: Option<u32>, year: Option<i32>) -> Period {
        Period::resolve(month, year, self.clock.today())
    }

    /// Ficha de romaneios: uma linha por romaneio.
    pub async fn notes_report(&self, query: &NotesReportQuery) -> Result<NotesReport, AppError> {
        let period = self.period(query.month, query.year);
        let rows = self.repo.notes(self.repo.pool(), period.bounds(), query).await?;

        let (total_volume, total_gross, total_net) = rows.iter().fold(
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            |(v, g, n), r| (v + r.total_volume, g + r.gross_value, n + r.net_value),
        );

        Ok(NotesReport {
            period,
            rows,
            total_volume: volume(total_volume),
            total_gross: money(total_gross),
            total_net: money(total_net),
        })
    }

    /// Itens dos romaneios da ficha, para o CSV (uma linha por item).
    pub async fn notes_report_items(&self, query: &NotesReportQuery) -> Result<(Period, Vec<ItemReportRow>), AppError> {
        let period = self.period(query.month, query.year);
        let rows = self
            .repo
            .note_items_for_export(self.repo.pool(), period.bounds(), query)
            .await?;
        Ok((period, rows))
    }

    /// Ficha de madeiras: uma linha por item.
    pub async fn wood_report(&self, query: &WoodReportQuery) -> Result<WoodReport, AppError> {
        let period = self.period(query.month, query.year);
        let rows = self.repo.items(self.repo.pool(), period.bounds(), query).await?;
        let (total_volume, total_value) = item_sums(&rows);

        Ok(WoodReport { period, rows, total_volume, total_value })
    }

    pub async fn cash_flow(&self, query: &CashFlowQuery) -> Result<CashFlowReport, AppError> {
        let period = self.period(query.month, query.year);
        let pool = self.repo.pool();
        let sales = self.repo.sales(pool, period.bounds(), query).await?;
        let payments = self.repo.payments(pool, period.bounds(), query).await?;

        let movements = build_cash_flow(sales, payments);
        let (total_sales, total_payments) =
            movements
                .iter()
                .fold((Decimal::ZERO, Decimal::ZERO), |(s, p), m| {
                    (s + m.debit.unwrap_or_default(), p + m.credit.unwrap_or_default())
                });

        Ok(CashFlowReport {
            period,
            movements,
            total_sales: money(total_sales),
            total_payments: money(total_payments),
            period_balance: money(total_payments - total_sales),
        })
    }

    /// Saldos de todos os clientes do filtro (sem paginação).
    pub async fn customer_balances(&self, filter: &CustomerFilter) -> Result<Vec<CustomerBalance>, AppError> {
        let rows = self
            .customers
            .list_with_balance(self.customers.pool(), filter, None)
            .await?;
        Ok(rows.into_iter().map(CustomerBalance::from).collect())
    }

    pub async fn dashboard(&self, query: &PeriodQuery) -> Result<Dashboard, AppError> {
        let period = self.period(query.month, query.year);
        let range = period.bounds();
        let pool = self.repo.pool();

        let totals = self.repo.period_totals(pool, range).await?;
        let total_receivable = self.repo.total_receivable(pool).await?;
        let top_buyers = self.repo.top_buyers(pool, range, TOP_BUYERS).await?;
        let top_woods = self.repo.top_woods(pool, range, TOP_WOODS).await?;

        let debtors_filter = CustomerFilter {
            balance_filter: BalanceFilter::Negative,
            sort: CustomerSort::Balance,
            ..Default::default()
        };
        let top_debtors = self
            .customers
            .list_with_balance(pool, &debtors_filter, Some(PageRequest::new(Some(1), Some(TOP_DEBTORS))))
            .await?
            .into_iter()
            .map(CustomerBalance::from)
            .collect();

        Ok(Dashboard {
            period,
            note_count: totals.note_count,
            total_volume: volume(totals.total_volume),
            total_net: money(totals.total_net),
            total_receivable: money(total_receivable),
            top_debtors,
            top_buyers,
            top_woods,
        })
    }
}

/// (m³, R$) somados de linhas de item.
pub fn item_sums(rows: &[ItemReportRow]) -> (Decimal, Decimal) {
    let (q, v) = rows
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(q, v), r| (q + r.quantity, v + r.subtotal));
    (volume(q), money(v))
}

/// Junta vendas e pagamentos em ordem (data, cliente, nº do romaneio) e calcula o saldo
/// corrente de cada cliente dentro do período, partindo de zero.
/// Venda debita o valor líquido; pagamento credita o valor pago.
pub fn build_cash_flow(sales: Vec<SaleMovementRow>, payments: Vec<PaymentMovementRow>) -> Vec<CashFlowMovement> {
    let mut movements: Vec<CashFlowMovement> = sales
        .into_iter()
        .map(|s| CashFlowMovement {
            date: s.note_date,
            kind: MovementKind::Sale,
            customer_id: s.customer_id,
            customer_name: s.customer_name,
            note_number: Some(s.number),
            volume: Some(s.total_volume),
            debit: Some(s.net_value),
            credit: None,
            running_balance: Decimal::ZERO,
        })
        .chain(payments.into_iter().map(|p| CashFlowMovement {
            date: p.payment_date,
            kind: MovementKind::Payment,
            customer_id: p.customer_id,
            customer_name: p.customer_name,
            note_number: None,
            volume: None,
            debit: None,
            credit: Some(p.amount),
            running_balance: Decimal::ZERO,
        }))
        .collect();

    movements.sort_by(|a, b| {
        (a.date, &a.customer_name, a.note_number.as_deref().unwrap_or(""))
            .cmp(&(b.date, &b.customer_name, b.note_number.as_deref().unwrap_or("")))
    });

    let mut balances: HashMap<Uuid, Decimal> = HashMap::new();
    for m in &mut movements {
        let balance = balances.entry(m.customer_id).or_insert(Decimal::ZERO);
        *balance = match m.kind {
            MovementKind::Sale => money(*balance - m.debit.unwrap_or_default()),
            MovementKind::Payment => money(*balance + m.credit.unwrap_or_default()),
        };
        m.running_balance = *balance;
    }
    movements
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn sale(d: u32, customer: Uuid, name: &str, number: &str, net: Decimal) -> SaleMovementRow {
        SaleMovementRow {
            note_date: day(d),
            customer_id: customer,
            customer_name: name.into(),
            number: number.into(),
            total_volume: dec!(1.000),
            net_value: net,
        }
    }

    fn payment(d: u32, customer: Uuid, name: &str, amount: Decimal) -> PaymentMovementRow {
        PaymentMovementRow {
            payment_date: day(d),
            customer_id: customer,
            customer_name: name.into(),
            amount,
        }
    }

    #[test]
    fn running_balance_is_kept_per_customer() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let movements = build_cash_flow(
            vec![
                sale(2, a, "ANA", "10", dec!(20.00)),
                sale(3, b, "BRUNO", "11", dec!(7.50)),
                sale(5, a, "ANA", "12", dec!(5.00)),
            ],
            vec![payment(4, a, "ANA", dec!(15.00)), payment(6, b, "BRUNO", dec!(10.00))],
        );

        let balances: Vec<_> = movements.iter().map(|m| (m.date, m.running_balance)).collect();
        assert_eq!(
            balances,
            vec![
                (day(2), dec!(-20.00)),
                (day(3), dec!(-7.50)),
                (day(4), dec!(-5.00)),
                (day(5), dec!(-10.00)),
                (day(6), dec!(2.50)),
            ]
        );
    }

    #[test]
    fn same_day_orders_by_customer_then_number() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let movements = build_cash_flow(
            vec![
                sale(1, b, "BRUNO", "2", dec!(1.00)),
                sale(1, a, "ANA", "9", dec!(1.00)),
                sale(1, a, "ANA", "10", dec!(1.00)),
            ],
            vec![payment(1, a, "ANA", dec!(3.00))],
        );

        let order: Vec<_> = movements
            .iter()
            .map(|m| (m.customer_name.as_str(), m.note_number.as_deref()))
            .collect();
        // Pagamento (sem número) vem antes das vendas do mesmo cliente no dia
        assert_eq!(
            order,
            vec![("ANA", None), ("ANA", Some("10")), ("ANA", Some("9")), ("BRUNO", Some("2"))]
        );
        assert_eq!(movements[0].running_balance, dec!(3.00));
        assert_eq!(movements[2].running_balance, dec!(1.00));
    }

    #[test]
    fn empty_period_has_no_movements() {
        assert!(build_cash_flow(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn item_sums_are_quantized() {
        let row = |q: Decimal, s: Decimal| ItemReportRow {
            item_id: Uuid::new_v4(),
            note_id: Uuid::new_v4(),
            number: "1".into(),
            note_date: day(1),
            customer_name: "ANA".into(),
            driver_name: None,
            wood_type_name: "EUCALIPTO".into(),
            freight_mode: Default::default(),
            weighing_mode: Default::default(),
            unit_price: dec!(10.00),
            quantity: q,
            subtotal: s,
        };
        let (q, v) = item_sums(&[row(dec!(1.125), dec!(11.25)), row(dec!(0.875), dec!(8.75))]);
        assert_eq!(q, dec!(2.000));
        assert_eq!(v, dec!(20.00));
    }
}
