//! Build-time configuration: backend location, storage keys, endpoints.

/// REST backend root. Override at build time with `BAPOK_API_BASE=... trunk build`.
pub const API_BASE: &str = match option_env!("BAPOK_API_BASE") {
    Some(base) => base,
    None => "http://127.0.0.1:8000/api",
};

/* ---------------- durable storage keys ---------------- */
pub const TOKEN_KEY: &str = "authToken";
pub const ROLE_KEY: &str = "role";

/* ---------------- routing ---------------- */
pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/dashboards/home";

/* ---------------- tables ---------------- */
pub const PAGE_SIZES: [usize; 4] = [5, 10, 25, 50];
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_VISIBLE_PAGES: usize = 5;

/* ---------------- home dashboard ---------------- */
/// Latest prices above this amount (Rupiah) raise a warning.
pub const EXPENSIVE_THRESHOLD: f64 = 50_000.0;
pub const LATEST_PRICES_LIMIT: usize = 5;
pub const RECENT_UPDATES_LIMIT: usize = 4;
pub const CHART_MONTHS: usize = 6;
pub const REFRESH_INTERVAL_MS: u32 = 10_000;

/// Relative paths of every backend route the dashboard talks to.
pub struct Endpoints;

impl Endpoints {
    pub const LOGIN: &'static str = "/login";
    pub const LOGOUT: &'static str = "/logout";
    pub const USER: &'static str = "/user";
    pub const REGISTER: &'static str = "/register";
    pub const PETUGAS: &'static str = "/petugas-pasar";
    pub const PASAR: &'static str = "/pasar";
    pub const BAHAN_POKOK: &'static str = "/bahan-pokok";
    pub const HARGA_BAPOK: &'static str = "/harga-bapok";

    pub fn user(id: i64) -> String {
        format!("{}/{id}", Self::USER)
    }

    pub fn pasar(id: i64) -> String {
        format!("{}/{id}", Self::PASAR)
    }

    pub fn bahan_pokok(id: i64) -> String {
        format!("{}/{id}", Self::BAHAN_POKOK)
    }

    pub fn harga_bapok(id: i64) -> String {
        format!("{}/{id}", Self::HARGA_BAPOK)
    }

    pub fn harga_bapok_for_pasar(id_pasar: i64) -> String {
        format!("{}?id_pasar={id_pasar}", Self::HARGA_BAPOK)
    }
}
