pub mod health;
pub mod landlord;
pub mod storefront;
