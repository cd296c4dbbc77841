pub mod applications;
pub mod auth;
pub mod files;
pub mod health;
pub mod leads;
pub mod round_types;
pub mod rounds;
pub mod statuses;
pub mod transfer;
