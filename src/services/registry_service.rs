// src/services/registry_service.rs

use uuid::Uuid;

use crate::{
    common::{
        db_utils::{blank_to_none, normalize_name},
        error::AppError,
    },
    db::{
        customer_repo::CustomerRecord, driver_repo::DriverRecord, CustomerRepository, DriverRepository,
        WoodTypeRepository,
    },
    models::{
        delivery::FreightMode,
        page::{Page, PageRequest},
        registry::{
            BalanceSummary, Customer, CustomerBalance, CustomerDetail, CustomerFilter,
            CustomerPayload, Driver, DriverPayload, PriceResponse, RegistryFilter, WoodPriceRule, WoodType,
            WoodTypePayload,
        },
    },
    services::totals,
};

/// Cadastros: clientes, tipos de madeira e motoristas.
#[derive(Clone)]
pub struct RegistryService {
    customers: CustomerRepository,
    woods: WoodTypeRepository,
    drivers: DriverRepository,
    price_rule: WoodPriceRule,
}

impl RegistryService {
    pub fn new(
        customers: CustomerRepository,
        woods: WoodTypeRepository,
        drivers: DriverRepository,
        price_rule: WoodPriceRule,
    ) -> Self {
        Self { customers, woods, drivers, price_rule }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn create_customer(&self, payload: CustomerPayload) -> Result<Customer, AppError> {
        let name = normalize_name(&payload.name);
        let tax_id = blank_to_none(payload.tax_id);
        let phone = blank_to_none(payload.phone);
        let address = blank_to_none(payload.address);
        let record = CustomerRecord {
            name: &name,
            tax_id: tax_id.as_deref(),
            phone: phone.as_deref(),
            address: address.as_deref(),
            is_active: payload.is_active,
        };

        let customer = self.customers.create(self.customers.pool(), &record).await?;
        tracing::info!("Cliente cadastrado: {}", customer.name);
        Ok(customer)
    }

    pub async fn update_customer(&self, id: Uuid, payload: CustomerPayload) -> Result<Customer, AppError> {
        let name = normalize_name(&payload.name);
        let tax_id = blank_to_none(payload.tax_id);
        let phone = blank_to_none(payload.phone);
        let address = blank_to_none(payload.address);
        let record = CustomerRecord {
            name: &name,
            tax_id: tax_id.as_deref(),
            phone: phone.as_deref(),
            address: address.as_deref(),
            is_active: payload.is_active,
        };

        self.customers
            .update(self.customers.pool(), id, &record)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    /// Cliente com o saldo calculado na hora (pagamentos - vendas).
    pub async fn get_customer(&self, id: Uuid) -> Result<CustomerDetail, AppError> {
        let pool = self.customers.pool();
        let customer = self
            .customers
            .find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))?;

        let (total_payments, total_sales) = self.customers.balance_of(pool, id).await?;

        Ok(CustomerDetail { customer, balance: BalanceSummary::from_totals(total_payments, total_sales) })
    }

    pub async fn list_customers(&self, filter: &CustomerFilter) -> Result<Page<CustomerBalance>, AppError> {
        let page = PageRequest::new(filter.page, filter.per_page);
        let rows = self
            .customers
            .list_with_balance(self.customers.pool(), filter, Some(page))
            .await?;
        let total = rows.first().map(|r| r.total_count).unwrap_or(0);
        Ok(page.wrap(rows.into_iter().map(CustomerBalance::from).collect(), total))
    }

    pub async fn delete_customer(&self, id: Uuid) -> Result<(), AppError> {
        if !self.customers.delete(self.customers.pool(), id).await? {
            return Err(AppError::ResourceNotFound("Cliente".into()));
        }
        tracing::info!("Cliente {} excluído", id);
        Ok(())
    }

    // =========================================================================
    //  TIPOS DE MADEIRA
    // =========================================================================

    pub async fn create_wood_type(&self, payload: WoodTypePayload) -> Result<WoodType, AppError> {
        totals::validate_wood_prices(self.price_rule, payload.normal_price, payload.freight_price)?;
        let name = normalize_name(&payload.name);

        let wood = self
            .woods
            .create(
                self.woods.pool(),
                &name,
                payload.normal_price,
                payload.freight_price,
                payload.is_active,
            )
            .await?;
        tracing::info!("Tipo de madeira cadastrado: {}", wood.name);
        Ok(wood)
    }

    pub async fn update_wood_type(&self, id: Uuid, payload: WoodTypePayload) -> Result<WoodType, AppError> {
        totals::validate_wood_prices(self.price_rule, payload.normal_price, payload.freight_price)?;
        let name = normalize_name(&payload.name);

        self.woods
            .update(
                self.woods.pool(),
                id,
                &name,
                payload.normal_price,
                payload.freight_price,
                payload.is_active,
            )
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Tipo de madeira".into()))
    }

    pub async fn get_wood_type(&self, id: Uuid) -> Result<WoodType, AppError> {
        self.woods
            .find_by_id(self.woods.pool(), id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Tipo de madeira".into()))
    }

    pub async fn list_wood_types(&self, filter: &RegistryFilter) -> Result<Vec<WoodType>, AppError> {
        self.woods.list(self.woods.pool(), filter).await
    }

    pub async fn delete_wood_type(&self, id: Uuid) -> Result<(), AppError> {
        if !self.woods.delete(self.woods.pool(), id).await? {
            return Err(AppError::ResourceNotFound("Tipo de madeira".into()));
        }
        tracing::info!("Tipo de madeira {} excluído", id);
        Ok(())
    }

    /// Preço de tabela da madeira na modalidade pedida.
    pub async fn price(&self, id: Uuid, freight_mode: FreightMode) -> Result<PriceResponse, AppError> {
        let wood = self.get_wood_type(id).await?;
        Ok(PriceResponse {
            wood_type_id: wood.id,
            freight_mode,
            unit_price: wood.price_for(freight_mode),
        })
    }

    // =========================================================================
    //  MOTORISTAS
    // =========================================================================

    pub async fn create_driver(&self, payload: DriverPayload) -> Result<Driver, AppError> {
        let name = normalize_name(&payload.name);
        let tax_id = blank_to_none(payload.tax_id);
        let phone = blank_to_none(payload.phone);
        let plate = blank_to_none(payload.plate).map(|p| p.to_uppercase());
        let record = DriverRecord {
            name: &name,
            tax_id: tax_id.as_deref(),
            phone: phone.as_deref(),
            plate: plate.as_deref(),
            is_active: payload.is_active,
        };

        let driver = self.drivers.create(self.drivers.pool(), &record).await?;
        tracing::info!("Motorista cadastrado: {}", driver.name);
        Ok(driver)
    }

    pub async fn update_driver(&self, id: Uuid, payload: DriverPayload) -> Result<Driver, AppError> {
        let name = normalize_name(&payload.name);
        let tax_id = blank_to_none(payload.tax_id);
        let phone = blank_to_none(payload.phone);
        let plate = blank_to_none(payload.plate).map(|p| p.to_uppercase());
        let record = DriverRecord {
            name: &name,
            tax_id: tax_id.as_deref(),
            phone: phone.as_deref(),
            plate: plate.as_deref(),
            is_active: payload.is_active,
        };

        self.drivers
            .update(self.drivers.pool(), id, &record)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Motorista".into()))
    }

    pub async fn get_driver(&self, id: Uuid) -> Result<Driver, AppError> {
        self.drivers
            .find_by_id(self.drivers.pool(), id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Motorista".into()))
    }

    pub async fn list_drivers(&self, filter: &RegistryFilter) -> Result<Vec<Driver>, AppError> {
        self.drivers.list(self.drivers.pool(), filter).await
    }

    pub async fn delete_driver(&self, id: Uuid) -> Result<(), AppError> {
        if !self.drivers.delete(self.drivers.pool(), id).await? {
            return Err(AppError::ResourceNotFound("Motorista".into()));
        }
        tracing::info!("Motorista {} excluído", id);
        Ok(())
    }
}
