//! Key layout in the shared store.

pub const VEHICLE_INDEX: &str = "veiculos:index";
pub const USER_INDEX: &str = "users:index";

pub fn vehicle_data(id: &str) -> String {
    format!("veiculos:data:{id}")
}

pub fn user_data(email: &str) -> String {
    format!("users:data:{email}")
}

/// Pointer from a user id to the user's email.
pub fn user_id(id: &str) -> String {
    format!("users:id:{id}")
}
