mod service;

pub use service::AccountService;
