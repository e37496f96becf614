// src/db.rs

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod wood_type_repo;
pub use wood_type_repo::WoodTypeRepository;
pub mod driver_repo;
pub use driver_repo::DriverRepository;
pub mod delivery_repo;
pub use delivery_repo::DeliveryRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
