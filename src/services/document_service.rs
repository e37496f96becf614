// src/services/document_service.rs

use genpdf::{elements, style, Alignment, Document, Element};
use rust_decimal::Decimal;

use crate::{
    common::{
        decimal::{money, volume},
        error::AppError,
    },
    models::{
        delivery::{NoteDetail, WeighingMode},
        reports::{CashFlowReport, MovementKind, NotesReport, WoodReport},
    },
};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

fn m3(value: Decimal) -> String {
    volume(value).to_string()
}

fn brl(value: Decimal) -> String {
    format!("R$ {}", money(value))
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

/// Monta uma tabela com cabeçalho em negrito.
struct Table {
    layout: elements::TableLayout,
}

impl Table {
    fn new(weights: Vec<usize>, header: &[&str]) -> Result<Self, AppError> {
        let mut layout = elements::TableLayout::new(weights);
        layout.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        let mut table = Self { layout };
        table.row_styled(header.iter().map(|h| h.to_string()), style::Style::new().bold())?;
        Ok(table)
    }

    fn row<I>(&mut self, cells: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = String>,
    {
        self.row_styled(cells, style::Style::new())
    }

    fn row_styled<I>(&mut self, cells: I, cell_style: style::Style) -> Result<(), AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut row = self.layout.row();
        for cell in cells {
            row.push_element(elements::Paragraph::new(cell).styled(cell_style));
        }
        row.push().map_err(pdf_error)
    }
}

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: String,
    font_family: String,
    company_name: String,
}

impl DocumentService {
    pub fn new(fonts_dir: String, font_family: String, company_name: String) -> Self {
        Self { fonts_dir, font_family, company_name }
    }

    fn document(&self, title: &str, subtitle: &str) -> Result<Document, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None).map_err(|_| {
            AppError::FontNotFound(format!(
                "Fonte '{}' não encontrada na pasta {}",
                self.font_family, self.fonts_dir
            ))
        })?;

        let mut doc = Document::new(font_family);
        doc.set_title(title);
        doc.set_font_size(9);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new(self.company_name.as_str())
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        doc.push(elements::Paragraph::new(title).styled(style::Style::new().bold().with_font_size(13)));
        doc.push(elements::Paragraph::new(subtitle));
        doc.push(elements::Break::new(1.5));
        Ok(doc)
    }

    fn render(doc: Document) -> Result<Vec<u8>, AppError> {
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }

    fn total_line(doc: &mut Document, text: String) {
        let mut paragraph = elements::Paragraph::new(text);
        paragraph.set_alignment(Alignment::Right);
        doc.push(paragraph.styled(style::Style::new().bold().with_font_size(11)));
    }

    /// Romaneio individual, com as toras quando DETALHADO.
    pub fn note_pdf(&self, note: &NoteDetail) -> Result<Vec<u8>, AppError> {
        let header = &note.note;
        let mut doc = self.document(
            &format!("ROMANEIO Nº {}", header.number),
            &format!(
                "Data: {}   Modalidade: {}   Tipo: {}",
                header.note_date.format("%d/%m/%Y"),
                header.weighing_mode.label(),
                header.freight_mode.label()
            ),
        )?;

        doc.push(elements::Paragraph::new(format!("Cliente: {}", note.customer_name)));
        doc.push(elements::Paragraph::new(format!(
            "Motorista: {}",
            note.driver_name.as_deref().unwrap_or("-")
        )));
        doc.push(elements::Break::new(1));

        let mut items = Table::new(vec![4, 2, 2, 2], &["Espécie", "Qtd (m³)", "Valor Unit.", "Total"])?;
        for item in &note.items {
            items.row([
                item.wood_type_name.clone(),
                m3(item.item.quantity),
                brl(item.item.unit_price),
                brl(item.item.subtotal),
            ])?;
        }
        doc.push(items.layout);

        if header.weighing_mode == WeighingMode::Detailed {
            doc.push(elements::Break::new(1.5));
            doc.push(elements::Paragraph::new("TORAS").styled(style::Style::new().bold()));
            let mut logs = Table::new(
                vec![3, 2, 2, 2, 2, 2],
                &["Espécie", "Comprimento", "Rodo", "Desc. 1", "Desc. 2", "m³"],
            )?;
            for item in &note.items {
                for log in &item.logs {
                    logs.row([
                        item.wood_type_name.clone(),
                        log.length.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
                        log.rodo.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
                        log.deduction_1.to_string(),
                        log.deduction_2.to_string(),
                        m3(log.quantity),
                    ])?;
                }
            }
            doc.push(logs.layout);
        }

        doc.push(elements::Break::new(1.5));
        Self::total_line(&mut doc, format!("TOTAL: {} m³", m3(header.total_volume)));
        Self::total_line(&mut doc, format!("VALOR LÍQUIDO: {}", brl(header.net_value)));

        Self::render(doc)
    }

    /// Ficha de romaneios do período.
    pub fn notes_report_pdf(&self, report: &NotesReport) -> Result<Vec<u8>, AppError> {
        let mut doc = self.document("FICHA DE ROMANEIOS", &format!("Período: {}", report.period.label()))?;

        let mut table = Table::new(
            vec![2, 2, 5, 2, 2, 2],
            &["Data", "Nº", "Cliente", "Tipo", "m³", "Valor"],
        )?;
        for row in &report.rows {
            table.row([
                row.note_date.format("%d/%m/%Y").to_string(),
                row.number.clone(),
                row.customer_name.clone(),
                row.freight_mode.label().to_string(),
                m3(row.total_volume),
                brl(row.net_value),
            ])?;
        }
        doc.push(table.layout);

        doc.push(elements::Break::new(1.5));
        Self::total_line(&mut doc, format!("TOTAL: {} m³", m3(report.total_volume)));
        Self::total_line(&mut doc, format!("VALOR: {}", brl(report.total_net)));

        Self::render(doc)
    }

    /// Ficha de madeiras do período (uma linha por item).
    pub fn wood_report_pdf(&self, report: &WoodReport) -> Result<Vec<u8>, AppError> {
        let mut doc = self.document("FICHA DE MADEIRAS", &format!("Período: {}", report.period.label()))?;

        let mut table = Table::new(
            vec![2, 2, 4, 3, 2, 2, 2],
            &["Data", "Nº", "Cliente", "Espécie", "Unit.", "m³", "Total"],
        )?;
        for row in &report.rows {
            table.row([
                row.note_date.format("%d/%m/%Y").to_string(),
                row.number.clone(),
                row.customer_name.clone(),
                row.wood_type_name.clone(),
                brl(row.unit_price),
                m3(row.quantity),
                brl(row.subtotal),
            ])?;
        }
        doc.push(table.layout);

        doc.push(elements::Break::new(1.5));
        Self::total_line(&mut doc, format!("TOTAL: {} m³", m3(report.total_volume)));
        Self::total_line(&mut doc, format!("VALOR: {}", brl(report.total_value)));

        Self::render(doc)
    }

    pub fn cash_flow_pdf(&self, report: &CashFlowReport) -> Result<Vec<u8>, AppError> {
        let mut doc = self.document("FLUXO FINANCEIRO", &format!("Período: {}", report.period.label()))?;

        let mut table = Table::new(
            vec![2, 2, 4, 2, 2, 2, 2],
            &["Data", "Tipo", "Cliente", "Nº", "Débito", "Crédito", "Saldo"],
        )?;
        for m in &report.movements {
            let kind = match m.kind {
                MovementKind::Sale => "VENDA",
                MovementKind::Payment => "PAGAMENTO",
            };
            table.row([
                m.date.format("%d/%m/%Y").to_string(),
                kind.to_string(),
                m.customer_name.clone(),
                m.note_number.clone().unwrap_or_default(),
                m.debit.map(brl).unwrap_or_default(),
                m.credit.map(brl).unwrap_or_default(),
                brl(m.running_balance),
            ])?;
        }
        doc.push(table.layout);

        doc.push(elements::Break::new(1.5));
        Self::total_line(&mut doc, format!("VENDAS: {}", brl(report.total_sales)));
        Self::total_line(&mut doc, format!("PAGAMENTOS: {}", brl(report.total_payments)));
        Self::total_line(&mut doc, format!("SALDO DO PERÍODO: {}", brl(report.period_balance)));

        Self::render(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::period::Period;

    #[test]
    fn missing_fonts_are_reported() {
        let service = DocumentService::new(
            "./nao-existe".into(),
            "Roboto".into(),
            "MADEIREIRA".into(),
        );
        let report = NotesReport {
            period: Period { month: 3, year: 2025 },
            rows: Vec::new(),
            total_volume: Decimal::ZERO,
            total_gross: Decimal::ZERO,
            total_net: Decimal::ZERO,
        };
        let err = service.notes_report_pdf(&report).unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }

    #[test]
    fn money_is_formatted_with_two_places() {
        assert_eq!(brl(Decimal::new(15, 0)), "R$ 15.00");
        assert_eq!(m3(Decimal::new(225, 3)), "0.225");
    }
}
