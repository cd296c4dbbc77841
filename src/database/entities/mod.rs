pub mod applications;
pub mod job_leads;
pub mod profiles;
pub mod round_media;
pub mod round_types;
pub mod rounds;
pub mod sessions;
pub mod status_events;
pub mod statuses;
pub mod users;
