pub mod application_service;
pub mod auth_service;
pub mod lead_service;

pub use application_service::{ApplicationInput, ApplicationService, RoundInput};
pub use auth_service::AuthService;
pub use lead_service::{LeadInput, LeadService};
