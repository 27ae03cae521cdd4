pub mod context;
pub mod registry;
pub mod seeder;

pub use context::TenantContext;
pub use registry::{RegistryError, Tenant, TenantRegistry};
