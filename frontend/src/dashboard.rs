//! Data behind the home dashboard: one concurrent fetch of the four
//! resources, then plain derivations over the fetched rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Utc};

use crate::api::{ApiClient, ApiError};
use crate::config::{
    Endpoints, CHART_MONTHS, EXPENSIVE_THRESHOLD, LATEST_PRICES_LIMIT, RECENT_UPDATES_LIMIT,
};
use crate::format::rupiah;
use crate::models::{BahanPokok, HargaBapok, Pasar, Petugas};
use crate::widgets::NoticeKind;

const BULAN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/* -------------------------------------------------------------------------- */
/*                                   types                                    */
/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardData {
    pub harga: Vec<HargaBapok>,
    pub bahan_pokok: Vec<BahanPokok>,
    pub pasar: Vec<Pasar>,
    pub petugas: Vec<Petugas>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_pasar: usize,
    pub total_bahan_pokok: usize,
    pub update_hari_ini: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LatestPrice {
    pub nama: String,
    pub satuan: String,
    pub harga: f64,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecentUpdate {
    pub id: i64,
    pub pasar: String,
    pub petugas: String,
    pub waktu: String,
    pub item: String,
    pub harga: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartPoint {
    pub bulan: String,
    pub harga: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub kind: NoticeKind,
    pub message: String,
}

/* -------------------------------------------------------------------------- */
/*                                 chargement                                 */
/* -------------------------------------------------------------------------- */

pub async fn fetch_dashboard(client: &ApiClient) -> Result<DashboardData, ApiError> {
    if client.bearer().is_none() {
        return Err(ApiError::Unauthorized);
    }

    let (harga, bahan_pokok, pasar, petugas) = futures::join!(
        client.get_list::<HargaBapok>(Endpoints::HARGA_BAPOK),
        client.get_list::<BahanPokok>(Endpoints::BAHAN_POKOK),
        client.get_list::<Pasar>(Endpoints::PASAR),
        client.get_list::<Petugas>(Endpoints::PETUGAS),
    );

    Ok(DashboardData {
        harga: harga?,
        bahan_pokok: bahan_pokok?,
        pasar: pasar?,
        petugas: petugas?,
    })
}

/// Today's UTC date, the prefix the backend's ISO timestamps start with.
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Accepts RFC 3339 (`2025-03-01T08:00:00.000000Z`) and `2025-03-01 08:00:00`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/* -------------------------------------------------------------------------- */
/*                                 dérivations                                */
/* -------------------------------------------------------------------------- */

impl DashboardData {
    fn updated_today<'a>(&'a self, today: &'a str) -> impl Iterator<Item = &'a HargaBapok> + 'a {
        self.harga.iter().filter(move |h| h.updated_at.starts_with(today))
    }

    pub fn stats(&self, today: &str) -> Stats {
        Stats {
            total_pasar: self.pasar.len(),
            total_bahan_pokok: self.bahan_pokok.len(),
            update_hari_ini: self.updated_today(today).count(),
        }
    }

    /// Most recent price per commodity, in commodity order.
    pub fn latest_prices(&self) -> Vec<LatestPrice> {
        let commodities: HashMap<i64, &BahanPokok> =
            self.bahan_pokok.iter().map(|b| (b.id, b)).collect();

        let mut latest: HashMap<i64, &HargaBapok> = HashMap::new();
        for row in &self.harga {
            if !commodities.contains_key(&row.id_bahan_pokok) {
                continue;
            }
            let newer = match latest.get(&row.id_bahan_pokok) {
                None => true,
                Some(current) => parse_timestamp(&row.updated_at) > parse_timestamp(&current.updated_at),
            };
            if newer {
                latest.insert(row.id_bahan_pokok, row);
            }
        }

        let mut rows: Vec<(&BahanPokok, &HargaBapok)> = latest
            .into_iter()
            .filter_map(|(id, row)| commodities.get(&id).map(|b| (*b, row)))
            .collect();
        rows.sort_by(|(a, _), (b, _)| {
            (a.urutan.unwrap_or(i64::MAX), &a.nama).cmp(&(b.urutan.unwrap_or(i64::MAX), &b.nama))
        });

        rows.into_iter()
            .take(LATEST_PRICES_LIMIT)
            .map(|(bahan, row)| LatestPrice {
                nama: bahan.nama.clone(),
                satuan: bahan.satuan.clone(),
                harga: row.current_price(),
                updated_at: row.updated_at.clone(),
            })
            .collect()
    }

    /// Last few price entries, joined with market, officer and commodity names.
    pub fn recent_updates(&self, offset: &FixedOffset) -> Vec<RecentUpdate> {
        let mut rows: Vec<&HargaBapok> = self.harga.iter().collect();
        rows.sort_by(|a, b| parse_timestamp(&b.updated_at).cmp(&parse_timestamp(&a.updated_at)));

        rows.into_iter()
            .take(RECENT_UPDATES_LIMIT)
            .map(|row| {
                let pasar = self
                    .pasar
                    .iter()
                    .find(|p| p.id == row.id_pasar)
                    .map(|p| p.nama.clone())
                    .unwrap_or_else(|| "Unknown".into());
                let item = self
                    .bahan_pokok
                    .iter()
                    .find(|b| b.id == row.id_bahan_pokok)
                    .map(|b| b.nama.clone())
                    .unwrap_or_else(|| "Unknown".into());
                let petugas = self
                    .petugas
                    .iter()
                    .find(|p| p.name == row.created_by)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| row.created_by.clone());
                let waktu = parse_timestamp(&row.updated_at)
                    .map(|dt| dt.with_timezone(offset).format("%H:%M").to_string())
                    .unwrap_or_default();

                RecentUpdate {
                    id: row.id,
                    pasar,
                    petugas,
                    waktu,
                    item,
                    harga: row.current_price(),
                }
            })
            .collect()
    }

    /// Monthly average of `harga` by creation month, oldest first, last few months.
    pub fn chart(&self) -> Vec<ChartPoint> {
        let mut months: BTreeMap<(i32, u32), (f64, u32)> = BTreeMap::new();
        for row in &self.harga {
            let Some(created) = parse_timestamp(&row.created_at) else {
                continue;
            };
            let slot = months.entry((created.year(), created.month())).or_insert((0.0, 0));
            slot.0 += row.harga;
            slot.1 += 1;
        }

        let points: Vec<ChartPoint> = months
            .into_iter()
            .map(|((year, month), (total, count))| ChartPoint {
                bulan: format!("{} {:02}", BULAN[(month - 1) as usize], year.rem_euclid(100)),
                harga: (total / f64::from(count)).round() as i64,
            })
            .collect();

        let skip = points.len().saturating_sub(CHART_MONTHS);
        points.into_iter().skip(skip).collect()
    }

    pub fn alerts(&self, today: &str) -> Vec<Alert> {
        let mut alerts = Vec::new();

        let expensive = self
            .latest_prices()
            .iter()
            .filter(|p| p.harga > EXPENSIVE_THRESHOLD)
            .count();
        if expensive > 0 {
            alerts.push(Alert {
                kind: NoticeKind::Warning,
                message: format!(
                    "{expensive} bahan pokok memiliki harga > {}",
                    rupiah(EXPENSIVE_THRESHOLD)
                ),
            });
        }

        let reported: HashSet<&str> = self.updated_today(today).map(|h| h.created_by.as_str()).collect();
        let silent = self
            .petugas
            .iter()
            .filter(|p| p.is_petugas_pasar && !reported.contains(p.name.as_str()))
            .count();
        if silent > 0 {
            alerts.push(Alert {
                kind: NoticeKind::Info,
                message: format!("{silent} petugas belum melakukan update hari ini"),
            });
        }

        let updates = self.stats(today).update_hari_ini;
        if updates > 0 {
            alerts.push(Alert {
                kind: NoticeKind::Success,
                message: format!("{updates} update harga berhasil hari ini"),
            });
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: &str = "2025-03-10";

    fn harga(id: i64, pasar: i64, bahan: i64, harga: f64, by: &str, created: &str, updated: &str) -> HargaBapok {
        HargaBapok {
            id,
            id_pasar: pasar,
            id_bahan_pokok: bahan,
            harga,
            created_by: by.into(),
            created_at: created.into(),
            updated_at: updated.into(),
            status_integrasi: "pending".into(),
            ..Default::default()
        }
    }

    fn bahan(id: i64, urutan: i64, nama: &str, satuan: &str) -> BahanPokok {
        BahanPokok { id, urutan: Some(urutan), nama: nama.into(), satuan: satuan.into(), ..Default::default() }
    }

    fn petugas(name: &str, officer: bool) -> Petugas {
        Petugas { name: name.into(), is_petugas_pasar: officer, ..Default::default() }
    }

    fn sample() -> DashboardData {
        DashboardData {
            harga: vec![
                harga(1, 1, 1, 12000.0, "Sari", "2025-01-05T01:00:00Z", "2025-01-05T01:00:00Z"),
                harga(2, 1, 1, 13000.0, "Sari", "2025-02-05T01:00:00Z", "2025-03-10T02:30:00Z"),
                harga(3, 2, 2, 60000.0, "Budi", "2025-02-20T01:00:00Z", "2025-03-09T08:00:00Z"),
                harga(4, 2, 3, 9000.0, "Budi", "2025-03-01T01:00:00Z", "2025-03-10 04:15:00"),
                harga(5, 9, 99, 1.0, "Ghost", "not a date", "2025-01-01T00:00:00Z"),
            ],
            bahan_pokok: vec![
                bahan(1, 2, "Beras", "kg"),
                bahan(2, 1, "Daging Sapi", "kg"),
                bahan(3, 3, "Minyak Goreng", "liter"),
            ],
            pasar: vec![
                Pasar { id: 1, nama: "Pasar Bantul".into(), ..Default::default() },
                Pasar { id: 2, nama: "Pasar Niten".into(), ..Default::default() },
            ],
            petugas: vec![petugas("Sari", true), petugas("Budi", true), petugas("Wati", true), petugas("Admin", false)],
        }
    }

    #[test]
    fn stats_count_today_by_prefix() {
        let stats = sample().stats(TODAY);
        assert_eq!(stats, Stats { total_pasar: 2, total_bahan_pokok: 3, update_hari_ini: 2 });
    }

    #[test]
    fn latest_prices_keep_newest_entry_per_commodity() {
        let latest = sample().latest_prices();
        let names: Vec<&str> = latest.iter().map(|p| p.nama.as_str()).collect();
        assert_eq!(names, ["Daging Sapi", "Beras", "Minyak Goreng"]);
        assert_eq!(latest[1].harga, 13000.0);
        assert_eq!(latest[2].satuan, "liter");
    }

    #[test]
    fn new_price_replaces_old_one_when_present() {
        let mut data = sample();
        data.harga[1].harga_baru = Some(14500.0);
        let beras = data.latest_prices().into_iter().find(|p| p.nama == "Beras").unwrap();
        assert_eq!(beras.harga, 14500.0);
    }

    #[test]
    fn recent_updates_are_newest_first_with_fallbacks() {
        let wib = FixedOffset::east_opt(7 * 3600).unwrap();
        let recent = sample().recent_updates(&wib);

        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].id, 4);
        assert_eq!(recent[0].waktu, "11:15");
        assert_eq!(recent[0].pasar, "Pasar Niten");
        assert_eq!(recent[1].id, 2);
        assert_eq!(recent[1].item, "Beras");
        assert_eq!(recent[3].id, 1);
    }

    #[test]
    fn unknown_joins_fall_back() {
        let data = DashboardData {
            harga: vec![harga(7, 5, 5, 1000.0, "Tamu", "", "2025-03-10T00:00:00Z")],
            ..Default::default()
        };
        let wib = FixedOffset::east_opt(7 * 3600).unwrap();
        let recent = data.recent_updates(&wib);
        assert_eq!(recent[0].pasar, "Unknown");
        assert_eq!(recent[0].item, "Unknown");
        assert_eq!(recent[0].petugas, "Tamu");
    }

    #[test]
    fn chart_averages_by_month_in_order() {
        let chart = sample().chart();
        assert_eq!(
            chart,
            vec![
                ChartPoint { bulan: "Jan 25".into(), harga: 12000 },
                ChartPoint { bulan: "Feb 25".into(), harga: 36500 },
                ChartPoint { bulan: "Mar 25".into(), harga: 9000 },
            ]
        );
    }

    #[test]
    fn chart_keeps_only_the_last_months() {
        let data = DashboardData {
            harga: (1..=8)
                .map(|m| harga(m, 1, 1, 1000.0 * m as f64, "x", &format!("2024-{m:02}-01T00:00:00Z"), ""))
                .collect(),
            ..Default::default()
        };
        let chart = data.chart();
        assert_eq!(chart.len(), CHART_MONTHS);
        assert_eq!(chart[0].bulan, "Mar 24");
        assert_eq!(chart.last().unwrap().harga, 8000);
    }

    #[test]
    fn alerts_cover_expensive_silent_officers_and_updates() {
        let alerts = sample().alerts(TODAY);
        assert_eq!(
            alerts,
            vec![
                Alert { kind: NoticeKind::Warning, message: "1 bahan pokok memiliki harga > Rp 50.000".into() },
                Alert { kind: NoticeKind::Info, message: "1 petugas belum melakukan update hari ini".into() },
                Alert { kind: NoticeKind::Success, message: "2 update harga berhasil hari ini".into() },
            ]
        );
    }

    #[test]
    fn no_data_no_alerts() {
        assert!(DashboardData::default().alerts(TODAY).is_empty());
    }

    #[test]
    fn timestamps_in_both_backend_formats() {
        assert!(parse_timestamp("2025-03-01T08:00:00.000000Z").is_some());
        assert!(parse_timestamp("2025-03-01 08:00:00").is_some());
        assert!(parse_timestamp("kemarin").is_none());
    }
}
