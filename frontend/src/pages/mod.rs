//! One module per dashboard screen. Every screen is rendered inside the
//! route guard and the main layout.

pub mod bahan_pokok;
pub mod harga_bapok;
pub mod home;
pub mod pasar;
pub mod petugas;
