pub mod backup_service;
pub mod health_service;
pub mod tenant_service;
