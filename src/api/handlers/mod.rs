pub mod admin;
pub mod bookings;
pub mod payments;
pub mod pricing;
pub mod root;
pub mod webhooks;
