pub mod alerts_repo;
pub mod audit_repo;
pub mod notifications_repo;
pub mod platforms_repo;
pub mod portfolios_repo;
pub mod trades_repo;
pub mod users_repo;

pub use alerts_repo::SqliteAlertRepository;
pub use audit_repo::SqliteAuditRepository;
pub use notifications_repo::SqliteNotificationRepository;
pub use platforms_repo::SqlitePlatformRepository;
pub use portfolios_repo::SqlitePortfolioRepository;
pub use trades_repo::SqliteTradeRepository;
pub use users_repo::SqliteUserRepository;
