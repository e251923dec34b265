pub mod error;
pub mod id;
pub mod time;
pub mod user;
pub mod vehicle;

pub use error::{CoreError, Result};
pub use id::{generate_id, validate_id};
pub use time::{current_year, now_utc, truncate_to_micros, unix_micros};
pub use user::{NewUser, Role, User, UserView, normalize_email, validate_name, validate_password};
pub use vehicle::{NewVehicle, Vehicle, VehicleFilter, VehiclePatch, listing_order};
