mod service;

pub use service::{SetpointCommand, SetpointService};
