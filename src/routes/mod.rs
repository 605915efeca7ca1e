mod check;
mod health;

pub use check::check_update;
pub use health::health_check;
