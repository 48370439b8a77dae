// handlers/elevated/mod.rs - /api/admin/* handlers (admin profile required)

pub mod admin;
