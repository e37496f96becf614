// src/services/delivery_service.rs

use std::{collections::HashMap, sync::Arc};

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        clock::Clock,
        error::{AppError, RuleViolation},
        period::Period,
    },
    db::{
        delivery_repo::{NoteHeader, NoteListFilter},
        CustomerRepository, DeliveryRepository, DriverRepository, WoodTypeRepository,
    },
    models::{
        delivery::{
            CreateNotePayload, DeliveryNote, ItemContext, ItemDetail, ItemPayload, LogPayload,
            LogUnit, Measure, NoteDetail, NoteFilter, NoteItem, NoteList, ResolvedLog, UpdateItemPayload,
            UpdateNotePayload, WeighingMode,
        },
        page::PageRequest,
        registry::WoodType,
    },
    services::totals::{self, ItemTotals, NoteTotals},
};

#[derive(Clone)]
pub struct DeliveryService {
    repo: DeliveryRepository,
    customers: CustomerRepository,
    woods: WoodTypeRepository,
    drivers: DriverRepository,
    clock: Arc<dyn Clock>,
}

impl DeliveryService {
    pub fn new(
        repo: DeliveryRepository,
        customers: CustomerRepository,
        woods: WoodTypeRepository,
        drivers: DriverRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, customers, woods, drivers, clock }
    }

    fn pool(&self) -> &PgPool {
        self.repo.pool()
    }

    // =========================================================================
    //  ROMANEIO
    // =========================================================================

    /// Cria o romaneio com todos os itens (e toras) numa única transação.
    pub async fn create_note(&self, payload: CreateNotePayload, created_by: Uuid) -> Result<NoteDetail, AppError> {
        if payload.items.is_empty() {
            return Err(RuleViolation::NoteWithoutItems.into());
        }
        totals::ensure_unique_wood_types(payload.items.iter().map(|i| i.wood_type_id))?;

        // Regras puras antes de abrir a transação
        let measures = payload
            .items
            .iter()
            .map(|item| totals::resolve_measure(payload.weighing_mode, item.quantity, &item.logs))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool().begin().await?;

        self.ensure_customer_active(&mut tx, payload.customer_id).await?;
        if let Some(driver_id) = payload.driver_id {
            self.ensure_driver_active(&mut tx, driver_id).await?;
        }

        let number = payload.number.trim();
        let header = NoteHeader {
            number,
            note_date: payload.note_date,
            customer_id: payload.customer_id,
            driver_id: payload.driver_id,
            freight_mode: payload.freight_mode,
            weighing_mode: payload.weighing_mode,
        };
        let note = self.repo.insert_note(&mut *tx, &header, created_by).await?;

        for (item, measure) in payload.items.iter().zip(measures) {
            let wood = self.active_wood(&mut tx, item.wood_type_id).await?;
            self.insert_item(&mut tx, &note, &wood, item.unit_price, measure).await?;
        }

        let note_totals = self.recompute_note(&mut tx, note.id).await?;
        tx.commit().await?;

        tracing::info!(
            "📄 Romaneio nº {} criado: {} item(ns), {} m³, R$ {}",
            note.number,
            payload.items.len(),
            note_totals.total_volume,
            note_totals.net_value
        );
        self.get_note(note.id).await
    }

    /// Altera o cabeçalho. Os valores unitários já gravados são mantidos.
    pub async fn update_note_header(&self, id: Uuid, payload: UpdateNotePayload) -> Result<NoteDetail, AppError> {
        let mut tx = self.pool().begin().await?;

        let current = self
            .repo
            .lock_note(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Romaneio".into()))?;

        if payload.weighing_mode != current.weighing_mode && self.repo.count_items(&mut *tx, id).await? > 0 {
            return Err(RuleViolation::WeighingModeLocked.into());
        }
        if payload.customer_id != current.customer_id {
            self.ensure_customer_active(&mut tx, payload.customer_id).await?;
        }
        if let Some(driver_id) = payload.driver_id.filter(|d| Some(*d) != current.driver_id) {
            self.ensure_driver_active(&mut tx, driver_id).await?;
        }

        let header = NoteHeader {
            number: payload.number.trim(),
            note_date: payload.note_date,
            customer_id: payload.customer_id,
            driver_id: payload.driver_id,
            freight_mode: payload.freight_mode,
            weighing_mode: payload.weighing_mode,
        };
        self.repo
            .update_header(&mut *tx, id, &header)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Romaneio".into()))?;

        tx.commit().await?;
        tracing::info!("Romaneio {} atualizado", id);
        self.get_note(id).await
    }

    pub async fn delete_note(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete_note(self.pool(), id).await? {
            return Err(AppError::ResourceNotFound("Romaneio".into()));
        }
        tracing::info!("🗑️ Romaneio {} excluído", id);
        Ok(())
    }

    pub async fn get_note(&self, id: Uuid) -> Result<NoteDetail, AppError> {
        let pool = self.pool();
        let header = self
            .repo
            .find_header(pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Romaneio".into()))?;

        let items = self.repo.list_items_with_names(pool, id).await?;
        let mut logs_by_item: HashMap<Uuid, Vec<LogUnit>> = HashMap::new();
        for log in self.repo.list_logs_for_note(pool, id).await? {
            logs_by_item.entry(log.item_id).or_default().push(log);
        }

        let items = items
            .into_iter()
            .map(|row| ItemDetail {
                logs: logs_by_item.remove(&row.item.id).unwrap_or_default(),
                item: row.item,
                wood_type_name: row.wood_type_name,
            })
            .collect();

        Ok(NoteDetail {
            note: header.note,
            customer_name: header.customer_name,
            driver_name: header.driver_name,
            items,
        })
    }

    pub async fn list_notes(&self, filter: &NoteFilter) -> Result<NoteList, AppError> {
        let period = Period::resolve(filter.month, filter.year, self.clock.today());
        let (start, end) = period.bounds();
        let page = PageRequest::new(filter.page, filter.per_page);

        let list_filter = NoteListFilter {
            start,
            end,
            customer_id: filter.customer_id,
            number: filter.number.as_deref(),
            weighing_mode: filter.weighing_mode,
        };
        let rows = self.repo.list_notes(self.pool(), &list_filter, page).await?;

        let (total, total_volume, total_value) = rows
            .first()
            .map(|r| (r.total_count, r.period_volume, r.period_value))
            .unwrap_or((0, Decimal::ZERO, Decimal::ZERO));

        Ok(NoteList {
            period,
            items: rows,
            total,
            page: page.page,
            per_page: page.per_page,
            total_volume,
            total_value,
        })
    }

    // =========================================================================
    //  ITENS
    // =========================================================================

    pub async fn add_item(&self, note_id: Uuid, payload: ItemPayload) -> Result<NoteDetail, AppError> {
        let mut tx = self.pool().begin().await?;

        let note = self
            .repo
            .lock_note(&mut *tx, note_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Romaneio".into()))?;

        let measure = totals::resolve_measure(note.weighing_mode, payload.quantity, &payload.logs)?;
        let wood = self.active_wood(&mut tx, payload.wood_type_id).await?;
        let item = self.insert_item(&mut tx, &note, &wood, payload.unit_price, measure).await?;

        self.recompute_note(&mut tx, note_id).await?;
        tx.commit().await?;

        tracing::info!("➕ Item {} ({}) adicionado ao romaneio nº {}", item.id, wood.name, note.number);
        self.get_note(note_id).await
    }

    /// Troca madeira, valor unitário ou (no modo SIMPLES) a quantidade do item.
    pub async fn update_item(&self, item_id: Uuid, payload: UpdateItemPayload) -> Result<NoteDetail, AppError> {
        let mut tx = self.pool().begin().await?;

        let item = self.item_context(&mut tx, item_id).await?;
        self.repo.lock_note(&mut *tx, item.note_id).await?;

        let wood = if payload.wood_type_id == item.wood_type_id {
            self.wood(&mut tx, payload.wood_type_id).await?
        } else {
            self.active_wood(&mut tx, payload.wood_type_id).await?
        };
        let unit_price = totals::resolve_unit_price(payload.unit_price, &wood, item.freight_mode)?;

        let measure = match item.weighing_mode {
            WeighingMode::Simple => Measure::Simple(totals::simple_quantity(payload.quantity)?),
            WeighingMode::Detailed => Measure::Detailed(self.stored_logs(&mut tx, item_id).await?),
        };
        let item_totals = totals::item_totals(&measure, unit_price)?;
        self.repo
            .update_item(&mut *tx, item_id, wood.id, unit_price, &item_totals)
            .await?;

        self.recompute_note(&mut tx, item.note_id).await?;
        tx.commit().await?;

        tracing::info!("Item {} atualizado: {} m³ x R$ {}", item_id, item_totals.quantity, unit_price);
        self.get_note(item.note_id).await
    }

    /// Remove o item; o último item do romaneio não pode sair.
    pub async fn delete_item(&self, item_id: Uuid) -> Result<NoteDetail, AppError> {
        let mut tx = self.pool().begin().await?;

        let item = self.item_context(&mut tx, item_id).await?;
        self.repo.lock_note(&mut *tx, item.note_id).await?;

        if self.repo.count_items(&mut *tx, item.note_id).await? <= 1 {
            return Err(RuleViolation::NoteWithoutItems.into());
        }
        self.repo.delete_item(&mut *tx, item_id).await?;

        self.recompute_note(&mut tx, item.note_id).await?;
        tx.commit().await?;

        tracing::info!("➖ Item {} removido do romaneio {}", item_id, item.note_id);
        self.get_note(item.note_id).await
    }

    // =========================================================================
    //  TORAS
    // =========================================================================

    pub async fn add_log(&self, item_id: Uuid, payload: LogPayload) -> Result<NoteDetail, AppError> {
        let log = totals::resolve_log(&payload)?;
        let mut tx = self.pool().begin().await?;

        let item = self.detailed_item(&mut tx, item_id).await?;
        self.repo.insert_log(&mut *tx, item_id, &log).await?;

        self.recompute_item(&mut tx, item_id).await?;
        self.recompute_note(&mut tx, item.note_id).await?;
        tx.commit().await?;

        tracing::debug!("Tora adicionada ao item {}: {} m³", item_id, log.quantity);
        self.get_note(item.note_id).await
    }

    pub async fn update_log(&self, log_id: Uuid, payload: LogPayload) -> Result<NoteDetail, AppError> {
        let log = totals::resolve_log(&payload)?;
        let mut tx = self.pool().begin().await?;

        let stored = self.stored_log(&mut tx, log_id).await?;
        let item = self.detailed_item(&mut tx, stored.item_id).await?;
        self.repo.update_log(&mut *tx, log_id, &log).await?;

        self.recompute_item(&mut tx, item.id).await?;
        self.recompute_note(&mut tx, item.note_id).await?;
        tx.commit().await?;

        tracing::debug!("Tora {} atualizada: {} m³", log_id, log.quantity);
        self.get_note(item.note_id).await
    }

    /// Remove a tora; a última tora do item não pode sair.
    pub async fn delete_log(&self, log_id: Uuid) -> Result<NoteDetail, AppError> {
        let mut tx = self.pool().begin().await?;

        let stored = self.stored_log(&mut tx, log_id).await?;
        let item = self.detailed_item(&mut tx, stored.item_id).await?;

        if self.repo.list_logs(&mut *tx, item.id).await?.len() <= 1 {
            return Err(RuleViolation::DetailedItemWithoutLogs.into());
        }
        self.repo.delete_log(&mut *tx, log_id).await?;

        self.recompute_item(&mut tx, item.id).await?;
        self.recompute_note(&mut tx, item.note_id).await?;
        tx.commit().await?;

        tracing::debug!("Tora {} removida do item {}", log_id, item.id);
        self.get_note(item.note_id).await
    }

    // =========================================================================
    //  RECÁLCULO (toras -> item -> romaneio)
    // =========================================================================

    /// Recalcula quantidade e subtotal do item a partir do que está gravado.
    pub async fn recompute_item(&self, conn: &mut PgConnection, item_id: Uuid) -> Result<ItemTotals, AppError> {
        let item = self.item_context(conn, item_id).await?;
        let measure = match item.weighing_mode {
            WeighingMode::Simple => Measure::Simple(item.quantity),
            WeighingMode::Detailed => Measure::Detailed(self.stored_logs(conn, item_id).await?),
        };
        let item_totals = totals::item_totals(&measure, item.unit_price)?;
        self.repo.store_item_totals(&mut *conn, item_id, &item_totals).await?;
        Ok(item_totals)
    }

    /// Recalcula os totais do romaneio a partir dos itens gravados. Idempotente.
    pub async fn recompute_note(&self, conn: &mut PgConnection, note_id: Uuid) -> Result<NoteTotals, AppError> {
        let items = self.repo.list_item_totals(&mut *conn, note_id).await?;
        let note_totals = totals::note_totals(items)?;
        self.repo.store_note_totals(&mut *conn, note_id, &note_totals).await?;
        tracing::debug!(
            "Romaneio {} recalculado: {} m³, R$ {}",
            note_id,
            note_totals.total_volume,
            note_totals.net_value
        );
        Ok(note_totals)
    }

    // =========================================================================
    //  AUXILIARES
    // =========================================================================

    async fn insert_item(
        &self,
        conn: &mut PgConnection,
        note: &DeliveryNote,
        wood: &WoodType,
        requested_price: Option<Decimal>,
        measure: Measure,
    ) -> Result<NoteItem, AppError> {
        let unit_price = totals::resolve_unit_price(requested_price, wood, note.freight_mode)?;
        let item_totals = totals::item_totals(&measure, unit_price)?;
        let item = self
            .repo
            .insert_item(&mut *conn, note.id, wood.id, unit_price, &item_totals)
            .await?;

        if let Measure::Detailed(logs) = &measure {
            for log in logs {
                self.repo.insert_log(&mut *conn, item.id, log).await?;
            }
        }
        Ok(item)
    }

    async fn item_context(&self, conn: &mut PgConnection, item_id: Uuid) -> Result<ItemContext, AppError> {
        self.repo
            .find_item_context(&mut *conn, item_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Item".into()))
    }

    async fn detailed_item(&self, conn: &mut PgConnection, item_id: Uuid) -> Result<ItemContext, AppError> {
        let item = self.item_context(conn, item_id).await?;
        if item.weighing_mode != WeighingMode::Detailed {
            return Err(RuleViolation::LogsRequireDetailedMode.into());
        }
        self.repo.lock_note(&mut *conn, item.note_id).await?;
        Ok(item)
    }

    async fn stored_log(&self, conn: &mut PgConnection, log_id: Uuid) -> Result<LogUnit, AppError> {
        self.repo
            .find_log(&mut *conn, log_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Tora".into()))
    }

    async fn stored_logs(&self, conn: &mut PgConnection, item_id: Uuid) -> Result<Vec<ResolvedLog>, AppError> {
        let logs = self.repo.list_logs(&mut *conn, item_id).await?;
        Ok(logs.iter().map(ResolvedLog::from).collect())
    }

    async fn wood(&self, conn: &mut PgConnection, id: Uuid) -> Result<WoodType, AppError> {
        self.woods
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Tipo de madeira".into()))
    }

    async fn active_wood(&self, conn: &mut PgConnection, id: Uuid) -> Result<WoodType, AppError> {
        let wood = self.wood(conn, id).await?;
        if !wood.is_active {
            return Err(RuleViolation::InactiveWoodType.into());
        }
        Ok(wood)
    }

    async fn ensure_customer_active(&self, conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        let customer = self
            .customers
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))?;
        if !customer.is_active {
            return Err(RuleViolation::InactiveCustomer.into());
        }
        Ok(())
    }

    async fn ensure_driver_active(&self, conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        let driver = self
            .drivers
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Motorista".into()))?;
        if !driver.is_active {
            return Err(RuleViolation::InactiveDriver.into());
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::{
        config::AppState,
        models::{
            delivery::FreightMode,
            registry::{CustomerPayload, WoodTypePayload},
        },
    };

    struct Fixture {
        state: AppState,
        operator: Uuid,
        customer_id: Uuid,
    }

    async fn fixture(pool: PgPool) -> Fixture {
        let state = AppState::for_tests(pool);
        let operator = state.test_operator().await;
        let customer_id = state
            .registry_service
            .create_customer(CustomerPayload {
                name: "Serraria Boa Vista".into(),
                tax_id: None,
                phone: None,
                address: None,
                is_active: true,
            })
            .await
            .unwrap()
            .id;
        Fixture { state, operator, customer_id }
    }

    async fn wood(state: &AppState, name: &str) -> Uuid {
        state
            .registry_service
            .create_wood_type(WoodTypePayload {
                name: name.into(),
                normal_price: dec!(10.00),
                freight_price: dec!(8.00),
                is_active: true,
            })
            .await
            .unwrap()
            .id
    }

    fn item(wood_type_id: Uuid, quantity: Option<Decimal>, logs: Vec<LogPayload>) -> ItemPayload {
        ItemPayload { wood_type_id, unit_price: None, quantity, logs }
    }

    fn note(f: &Fixture, number: &str, weighing_mode: WeighingMode, items: Vec<ItemPayload>) -> CreateNotePayload {
        CreateNotePayload {
            number: number.into(),
            note_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            customer_id: f.customer_id,
            driver_id: None,
            freight_mode: FreightMode::Normal,
            weighing_mode,
            items,
        }
    }

    fn manual_log(quantity: Decimal) -> LogPayload {
        LogPayload { quantity: Some(quantity), ..Default::default() }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_an_item_rewrites_the_stored_note_totals(pool: PgPool) {
        let f = fixture(pool).await;
        let pinus = wood(&f.state, "Pinus").await;
        let eucalipto = wood(&f.state, "Eucalipto").await;
        let service = &f.state.delivery_service;

        // R$ 10,00 + R$ 20,00
        let created = service
            .create_note(
                note(
                    &f,
                    "100",
                    WeighingMode::Simple,
                    vec![item(pinus, Some(dec!(1)), vec![]), item(eucalipto, Some(dec!(2)), vec![])],
                ),
                f.operator,
            )
            .await
            .unwrap();
        assert_eq!(created.note.net_value.to_string(), "30.00");
        assert_eq!(created.note.total_volume.to_string(), "3.000");

        let cheaper = created
            .items
            .iter()
            .find(|i| i.item.wood_type_id == pinus)
            .unwrap()
            .item
            .id;
        let after = service.delete_item(cheaper).await.unwrap();

        assert_eq!(after.items.len(), 1);
        assert_eq!(after.note.net_value.to_string(), "20.00");
        assert_eq!(after.note.gross_value, after.note.net_value);
        assert_eq!(after.note.total_volume.to_string(), "2.000");

        let last = after.items[0].item.id;
        let err = service.delete_item(last).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(RuleViolation::NoteWithoutItems)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn log_changes_flow_into_item_and_note(pool: PgPool) {
        let f = fixture(pool).await;
        let pinus = wood(&f.state, "Pinus").await;
        let service = &f.state.delivery_service;

        // (400/4)² × 5 / 10⁶ = 0.050 m³
        let formula_log = LogPayload {
            length: Some(dec!(5)),
            rodo: Some(dec!(400)),
            ..Default::default()
        };
        let created = service
            .create_note(
                note(&f, "200", WeighingMode::Detailed, vec![item(pinus, None, vec![formula_log])]),
                f.operator,
            )
            .await
            .unwrap();
        let item_id = created.items[0].item.id;
        let first_log = created.items[0].logs[0].id;
        assert_eq!(created.items[0].item.quantity, dec!(0.050));
        assert_eq!(created.note.net_value.to_string(), "0.50");

        let added = service.add_log(item_id, manual_log(dec!(0.25))).await.unwrap();
        assert_eq!(added.items[0].item.quantity.to_string(), "0.300");
        assert_eq!(added.items[0].item.subtotal.to_string(), "3.00");
        assert_eq!(added.note.total_volume.to_string(), "0.300");
        assert_eq!(added.note.net_value.to_string(), "3.00");

        let second_log = added.items[0].logs.iter().find(|l| l.id != first_log).unwrap().id;
        let updated = service.update_log(second_log, manual_log(dec!(1))).await.unwrap();
        assert_eq!(updated.items[0].item.quantity.to_string(), "1.050");
        assert_eq!(updated.items[0].item.subtotal.to_string(), "10.50");
        assert_eq!(updated.note.total_volume.to_string(), "1.050");
        assert_eq!(updated.note.net_value.to_string(), "10.50");

        let deleted = service.delete_log(first_log).await.unwrap();
        assert_eq!(deleted.items[0].logs.len(), 1);
        assert_eq!(deleted.items[0].item.quantity.to_string(), "1.000");
        assert_eq!(deleted.note.total_volume.to_string(), "1.000");
        assert_eq!(deleted.note.net_value.to_string(), "10.00");

        let err = service.delete_log(second_log).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(RuleViolation::DetailedItemWithoutLogs)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn oversized_log_is_rejected_without_touching_totals(pool: PgPool) {
        let f = fixture(pool).await;
        let pinus = wood(&f.state, "Pinus").await;
        let service = &f.state.delivery_service;

        let created = service
            .create_note(
                note(&f, "300", WeighingMode::Detailed, vec![item(pinus, None, vec![manual_log(dec!(1))])]),
                f.operator,
            )
            .await
            .unwrap();
        let item_id = created.items[0].item.id;

        let err = service
            .add_log(item_id, manual_log(dec!(9999999.999)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(RuleViolation::ValueOutOfRange)));

        let stored = service.get_note(created.note.id).await.unwrap();
        assert_eq!(stored.items[0].logs.len(), 1);
        assert_eq!(stored.note.net_value.to_string(), "10.00");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn recompute_note_is_idempotent(pool: PgPool) {
        let f = fixture(pool.clone()).await;
        let pinus = wood(&f.state, "Pinus").await;
        let service = &f.state.delivery_service;

        let created = service
            .create_note(
                note(&f, "400", WeighingMode::Simple, vec![item(pinus, Some(dec!(1.2345)), vec![])]),
                f.operator,
            )
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let first = service.recompute_note(&mut conn, created.note.id).await.unwrap();
        let second = service.recompute_note(&mut conn, created.note.id).await.unwrap();
        assert_eq!(first, second);

        let stored = service.get_note(created.note.id).await.unwrap().note;
        assert_eq!(stored.total_volume.to_string(), "1.235");
        assert_eq!(stored.net_value.to_string(), "12.35");
        assert_eq!(stored.total_volume, second.total_volume);
        assert_eq!(stored.net_value, second.net_value);
        assert_eq!(stored.net_value, created.note.net_value);
    }
}
