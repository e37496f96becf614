// src/services/csv_export.rs

use chrono::NaiveDate;
use csv::WriterBuilder;
use rust_decimal::Decimal;

use crate::{
    common::{
        decimal::{money, volume},
        error::AppError,
        period::Period,
    },
    models::{
        registry::CustomerBalance,
        reports::{CashFlowReport, ItemReportRow, MovementKind, WoodReport},
    },
    services::report_service::item_sums,
};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const NOTES_HEADER: [&str; 10] = [
    "Modalidade",
    "Tipo Romaneio",
    "Nº Romaneio",
    "Data",
    "Cliente",
    "Motorista",
    "Espécie",
    "Qtd Item (m³)",
    "Valor Unit. (R$/m³)",
    "Total Item (R$)",
];

/// Nome de arquivo seguro para Content-Disposition.
pub fn safe_filename(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    if out.is_empty() { "arquivo".to_string() } else { out }
}

/// `relatorio_romaneios_03_2025.csv` etc.
pub fn period_filename(prefix: &str, period: &Period, ext: &str) -> String {
    safe_filename(&format!("{}_{:02}_{}.{}", prefix, period.month, period.year, ext))
}

fn br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn m3(value: Decimal) -> String {
    volume(value).to_string()
}

fn brl(value: Decimal) -> String {
    money(value).to_string()
}

fn writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_writer(Vec::new())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar o CSV: {}", e))?;
    Ok(bytes)
}

/// Ficha de romaneios: uma linha por item, linha em branco e linha de TOTAL.
pub fn notes_items_csv(rows: &[ItemReportRow]) -> Result<Vec<u8>, AppError> {
    let mut wtr = writer();
    wtr.write_record(NOTES_HEADER).map_err(anyhow::Error::from)?;

    for row in rows {
        wtr.write_record([
            row.weighing_mode.label().to_string(),
            row.freight_mode.label().to_string(),
            row.number.clone(),
            br_date(row.note_date),
            row.customer_name.clone(),
            row.driver_name.clone().unwrap_or_default(),
            row.wood_type_name.clone(),
            m3(row.quantity),
            brl(row.unit_price),
            brl(row.subtotal),
        ])
        .map_err(anyhow::Error::from)?;
    }

    let (total_m3, total_value) = item_sums(rows);
    let (total_m3, total_value) = (m3(total_m3), brl(total_value));
    wtr.write_record(None::<&str>).map_err(anyhow::Error::from)?;
    wtr.write_record(["", "", "", "", "", "", "TOTAL", total_m3.as_str(), "", total_value.as_str()])
        .map_err(anyhow::Error::from)?;
    finish(wtr)
}

/// Ficha de madeiras.
pub fn wood_report_csv(report: &WoodReport) -> Result<Vec<u8>, AppError> {
    let mut wtr = writer();
    wtr.write_record([
        "Data",
        "Nº Romaneio",
        "Cliente",
        "Espécie",
        "Tipo Romaneio",
        "Valor Unit. (R$/m³)",
        "Qtd (m³)",
        "Total (R$)",
    ])
    .map_err(anyhow::Error::from)?;

    for row in &report.rows {
        wtr.write_record([
            br_date(row.note_date),
            row.number.clone(),
            row.customer_name.clone(),
            row.wood_type_name.clone(),
            row.freight_mode.label().to_string(),
            brl(row.unit_price),
            m3(row.quantity),
            brl(row.subtotal),
        ])
        .map_err(anyhow::Error::from)?;
    }

    let (total_m3, total_value) = (m3(report.total_volume), brl(report.total_value));
    wtr.write_record(None::<&str>).map_err(anyhow::Error::from)?;
    wtr.write_record(["", "", "", "", "", "TOTAL", total_m3.as_str(), total_value.as_str()])
        .map_err(anyhow::Error::from)?;
    finish(wtr)
}

pub fn cash_flow_csv(report: &CashFlowReport) -> Result<Vec<u8>, AppError> {
    let mut wtr = writer();
    wtr.write_record([
        "Data",
        "Tipo",
        "Cliente",
        "Nº Romaneio",
        "m³",
        "Débito (R$)",
        "Crédito (R$)",
        "Saldo (R$)",
    ])
    .map_err(anyhow::Error::from)?;

    for m in &report.movements {
        let kind = match m.kind {
            MovementKind::Sale => "VENDA",
            MovementKind::Payment => "PAGAMENTO",
        };
        wtr.write_record([
            br_date(m.date),
            kind.to_string(),
            m.customer_name.clone(),
            m.note_number.clone().unwrap_or_default(),
            m.volume.map(m3).unwrap_or_default(),
            m.debit.map(brl).unwrap_or_default(),
            m.credit.map(brl).unwrap_or_default(),
            brl(m.running_balance),
        ])
        .map_err(anyhow::Error::from)?;
    }

    let totals = [
        brl(report.total_sales),
        brl(report.total_payments),
        brl(report.period_balance),
    ];
    wtr.write_record(None::<&str>).map_err(anyhow::Error::from)?;
    wtr.write_record(["", "", "", "", "TOTAL", totals[0].as_str(), totals[1].as_str(), totals[2].as_str()])
        .map_err(anyhow::Error::from)?;
    finish(wtr)
}

pub fn customer_balances_csv(rows: &[CustomerBalance]) -> Result<Vec<u8>, AppError> {
    let mut wtr = writer();
    wtr.write_record([
        "Cliente",
        "CPF/CNPJ",
        "Telefone",
        "Total Vendas (R$)",
        "Total Pagamentos (R$)",
        "Saldo (R$)",
        "Situação",
    ])
    .map_err(anyhow::Error::from)?;

    for c in rows {
        wtr.write_record([
            c.name.clone(),
            c.tax_id.clone().unwrap_or_default(),
            c.phone.clone().unwrap_or_default(),
            brl(c.summary.total_sales),
            brl(c.summary.total_payments),
            brl(c.summary.balance),
            c.summary.status.label().to_string(),
        ])
        .map_err(anyhow::Error::from)?;
    }
    finish(wtr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        delivery::{FreightMode, WeighingMode},
        registry::{BalanceStatus, BalanceSummary},
        reports::CashFlowMovement,
    };
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn item(number: &str, wood: &str, quantity: Decimal, price: Decimal) -> ItemReportRow {
        ItemReportRow {
            item_id: Uuid::new_v4(),
            note_id: Uuid::new_v4(),
            number: number.into(),
            note_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            customer_name: "MADEIREIRA SÃO JOÃO".into(),
            driver_name: None,
            wood_type_name: wood.into(),
            freight_mode: FreightMode::WithFreight,
            weighing_mode: WeighingMode::Detailed,
            unit_price: price,
            quantity,
            subtotal: money(quantity * price),
        }
    }

    fn lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn safe_filename_collapses_runs() {
        assert_eq!(safe_filename("romaneio_12/A B.pdf"), "romaneio_12_A_B.pdf");
        assert_eq!(safe_filename("  ação  "), "a_o");
        assert_eq!(safe_filename("   "), "arquivo");
        assert_eq!(safe_filename("relatorio_romaneios_03_2025.csv"), "relatorio_romaneios_03_2025.csv");
    }

    #[test]
    fn period_filename_pads_the_month() {
        let period = Period { month: 3, year: 2025 };
        assert_eq!(period_filename("relatorio_romaneios", &period, "csv"), "relatorio_romaneios_03_2025.csv");
    }

    #[test]
    fn notes_csv_has_one_line_per_item_and_a_total() {
        let rows = vec![
            item("101", "EUCALIPTO", dec!(1.5), dec!(10.00)),
            item("101", "PINUS", dec!(0.25), dec!(8.00)),
        ];
        let lines = lines(notes_items_csv(&rows).unwrap());

        assert_eq!(lines[0], NOTES_HEADER.join(";"));
        assert_eq!(
            lines[1],
            "DETALHADO;COM FRETE;101;07/03/2025;MADEIREIRA SÃO JOÃO;;EUCALIPTO;1.500;10.00;15.00"
        );
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], ";;;;;;TOTAL;1.750;;17.00");
    }

    #[test]
    fn empty_notes_csv_still_has_total() {
        let lines = lines(notes_items_csv(&[]).unwrap());
        assert_eq!(lines.last().unwrap(), ";;;;;;TOTAL;0.000;;0.00");
    }

    #[test]
    fn cash_flow_csv_marks_movement_kind() {
        let report = CashFlowReport {
            period: Period { month: 3, year: 2025 },
            movements: vec![CashFlowMovement {
                date: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
                kind: MovementKind::Payment,
                customer_id: Uuid::new_v4(),
                customer_name: "ANA".into(),
                note_number: None,
                volume: None,
                debit: None,
                credit: Some(dec!(5)),
                running_balance: dec!(5),
            }],
            total_sales: dec!(0),
            total_payments: dec!(5),
            period_balance: dec!(5),
        };
        let lines = lines(cash_flow_csv(&report).unwrap());
        assert_eq!(lines[1], "02/03/2025;PAGAMENTO;ANA;;;;5.00;5.00");
        assert_eq!(lines.last().unwrap(), ";;;;TOTAL;0.00;5.00;5.00");
    }

    #[test]
    fn balances_csv_shows_status() {
        let rows = vec![CustomerBalance {
            id: Uuid::new_v4(),
            name: "ANA".into(),
            tax_id: None,
            phone: Some("11 9999-0000".into()),
            is_active: true,
            summary: BalanceSummary {
                total_sales: dec!(20.00),
                total_payments: dec!(5.00),
                balance: dec!(-15.00),
                status: BalanceStatus::Debtor,
            },
        }];
        let lines = lines(customer_balances_csv(&rows).unwrap());
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("ANA;;11 9999-0000;20.00;5.00;-15.00;"));
    }
}
