use chrono::{DateTime, Local, Offset};
use gloo_timers::callback::Interval;
use log::{error, info};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{use_api, ApiError};
use crate::config::REFRESH_INTERVAL_MS;
use crate::dashboard::{fetch_dashboard, today, Alert, ChartPoint, DashboardData};
use crate::events::use_data_updates;
use crate::format::rupiah;
use crate::session::use_session;
use crate::widgets::{Notice, NoticeBar};

#[function_component(Home)]
pub fn home() -> Html {
    let client = use_api();
    let session = use_session();

    let data = use_state(DashboardData::default);
    let loading = use_state(|| true);
    let notice = use_state(|| None::<Notice>);
    let clock = use_state(Local::now);

    /* ---------------- rechargement ---------------- */
    let reload = {
        let client = client.clone();
        let data = data.clone();
        let loading = loading.clone();
        let notice = notice.clone();
        Callback::from(move |_: ()| {
            let client = client.clone();
            let data = data.clone();
            let loading = loading.clone();
            let notice = notice.clone();
            spawn_local(async move {
                let outcome = fetch_dashboard(&client).await;
                notice.set(refresh_notice(outcome.as_ref().err()));
                match outcome {
                    Ok(fresh) => {
                        info!("dashboard refreshed: {} price rows", fresh.harga.len());
                        data.set(fresh);
                    }
                    Err(e) => error!("dashboard refresh failed: {e}"),
                }
                loading.set(false);
            });
        })
    };

    {
        let reload = reload.clone();
        use_effect_with((), move |_| {
            reload.emit(());
            let refresh = Interval::new(REFRESH_INTERVAL_MS, move || reload.emit(()));
            move || drop(refresh)
        });
    }
    {
        let clock = clock.clone();
        use_effect_with((), move |_| {
            let tick = Interval::new(1_000, move || clock.set(Local::now()));
            move || drop(tick)
        });
    }
    use_data_updates(reload);

    let today = today();
    let stats = data.stats(&today);
    let offset = clock.offset().fix();

    let (name, role) = session
        .user
        .as_ref()
        .map(|u| (u.name.clone(), u.role_label()))
        .unwrap_or_default();

    html! {
        <div class="home">
            <div class="dashboard-header">
                <div>
                    <h1>{ format!("Selamat datang, {name}") }</h1>
                    <span class="role-badge">{ role }</span>
                </div>
                <div class="clock">{ clock_label(&clock) }</div>
            </div>

            <NoticeBar notice={notice.clone()} />

            if *loading {
                <p>{"Memuat data…"}</p>
            } else {
                <div class="stat-cards">
                    { stat_card("Total Pasar", stats.total_pasar) }
                    { stat_card("Total Bahan Pokok", stats.total_bahan_pokok) }
                    { stat_card("Update Hari Ini", stats.update_hari_ini) }
                </div>

                <div class="home-grid">
                    <section class="card">
                        <h3>{"Harga Terbaru"}</h3>
                        <table class="table">
                            <thead><tr><th>{"Bahan Pokok"}</th><th>{"Harga"}</th></tr></thead>
                            <tbody>
                                { for data.latest_prices().into_iter().map(|p| html! {
                                    <tr>
                                        <td>{ p.nama }</td>
                                        <td>{ format!("{} / {}", rupiah(p.harga), p.satuan) }</td>
                                    </tr>
                                }) }
                            </tbody>
                        </table>
                    </section>

                    <section class="card">
                        <h3>{"Update Terbaru"}</h3>
                        <ul class="recent-updates">
                            { for data.recent_updates(&offset).into_iter().map(|u| html! {
                                <li key={u.id}>
                                    <strong>{ u.item }</strong>
                                    <span>{ format!(" {} · {} · {}", rupiah(u.harga), u.pasar, u.petugas) }</span>
                                    <time>{ u.waktu }</time>
                                </li>
                            }) }
                        </ul>
                    </section>

                    <section class="card">
                        <h3>{"Rata-rata Harga Bulanan"}</h3>
                        { price_chart(&data.chart()) }
                    </section>

                    <section class="card">
                        <h3>{"Peringatan"}</h3>
                        { alerts(&data.alerts(&today)) }
                    </section>
                </div>
            }
        </div>
    }
}

const HARI: [&str; 7] = ["Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu"];

/// Banner after a refresh; a successful one clears any earlier failure.
fn refresh_notice(error: Option<&ApiError>) -> Option<Notice> {
    error.map(|e| Notice::error(e.to_string()))
}

fn clock_label(now: &DateTime<Local>) -> String {
    use chrono::Datelike;
    let day = HARI[now.weekday().num_days_from_monday() as usize];
    format!("{day}, {}", now.format("%d/%m/%Y %H:%M:%S"))
}

fn stat_card(label: &'static str, value: usize) -> Html {
    html! {
        <div class="stat-card">
            <span class="stat-label">{ label }</span>
            <span class="stat-value">{ value }</span>
        </div>
    }
}

/// Horizontal bars scaled to the highest month.
fn price_chart(points: &[ChartPoint]) -> Html {
    if points.is_empty() {
        return html!(<p class="muted">{"Belum ada data"}</p>);
    }
    let max = points.iter().map(|p| p.harga).max().unwrap_or(1).max(1);

    html! {
        <div class="bar-chart">
            { for points.iter().map(|p| {
                let width = format!("width: {}%", p.harga * 100 / max);
                html! {
                    <div class="bar-row">
                        <span class="bar-label">{ &p.bulan }</span>
                        <div class="bar" style={width}></div>
                        <span class="bar-value">{ rupiah(p.harga as f64) }</span>
                    </div>
                }
            }) }
        </div>
    }
}

fn alerts(alerts: &[Alert]) -> Html {
    if alerts.is_empty() {
        return html!(<p class="muted">{"Tidak ada peringatan"}</p>);
    }
    html! {
        <ul class="alerts">
            { for alerts.iter().map(|a| html! {
                <li class={format!("alert alert-{:?}", a.kind).to_lowercase()}>{ &a.message }</li>
            }) }
        </ul>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::NoticeKind;

    #[test]
    fn failed_refresh_raises_an_error_banner() {
        let notice = refresh_notice(Some(&ApiError::Unauthorized)).unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, ApiError::Unauthorized.to_string());
    }

    #[test]
    fn successful_refresh_clears_the_banner() {
        assert_eq!(refresh_notice(None), None);
    }
}
