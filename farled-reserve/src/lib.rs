pub mod order_id;
pub mod policy;
pub mod request;
pub mod service;
pub mod sweeper;

pub use policy::HoldPolicy;
pub use service::ReservationService;
pub use sweeper::ExpirySweeper;
