//! Price entries ("input harga"): officers record prices for their own
//! market, admins see every market and approve pending entries.

use gloo_dialogs::confirm;
use gloo_net::http::Method;
use log::{error, info, warn};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{use_api, ApiClient, ApiError};
use crate::config::{Endpoints, DEFAULT_PAGE_SIZE};
use crate::dashboard::today;
use crate::events::notify_data_updated;
use crate::format::{parse_amount, percent_change, rupiah, thousands, unformat};
use crate::models::{
    BahanPokok, HargaBapok, HargaBapokPayload, Pasar, User, STATUS_APPROVED, STATUS_PENDING,
};
use crate::pagination::{clamp_page, paginate, total_pages, PageSizeSelect, Pagination};
use crate::session::use_session;
use crate::widgets::{input_value, select_value, Modal, Notice, NoticeBar};

/* -------------------------------------------------------------------------- */
/*                                  filtres                                   */
/* -------------------------------------------------------------------------- */

/// Rows the user may see: officers only their own market.
pub fn scope_rows(rows: Vec<HargaBapok>, user: Option<&User>) -> Vec<HargaBapok> {
    match user.and_then(User::assigned_pasar) {
        Some(id_pasar) => rows.into_iter().filter(|r| r.id_pasar == id_pasar).collect(),
        None => rows,
    }
}

pub fn filter_rows(rows: &[HargaBapok], pasar: Option<i64>, bahan: Option<i64>) -> Vec<HargaBapok> {
    rows.iter()
        .filter(|r| pasar.map_or(true, |id| id == r.id_pasar))
        .filter(|r| bahan.map_or(true, |id| id == r.id_bahan_pokok))
        .cloned()
        .collect()
}

pub fn find_existing(rows: &[HargaBapok], id_pasar: i64, id_bahan_pokok: i64) -> Option<&HargaBapok> {
    rows.iter()
        .find(|r| r.id_pasar == id_pasar && r.id_bahan_pokok == id_bahan_pokok)
}

fn pasar_name(row: &HargaBapok, pasar: &[Pasar]) -> String {
    row.pasar
        .as_ref()
        .map(|p| p.nama.clone())
        .or_else(|| pasar.iter().find(|p| p.id == row.id_pasar).map(|p| p.nama.clone()))
        .unwrap_or_else(|| "-".into())
}

fn bahan(row: &HargaBapok, bahan_pokok: &[BahanPokok]) -> Option<BahanPokok> {
    row.bahan_pokok
        .clone()
        .or_else(|| bahan_pokok.iter().find(|b| b.id == row.id_bahan_pokok).cloned())
}

/* -------------------------------------------------------------------------- */
/*                                  payloads                                  */
/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HargaForm {
    pub id_pasar: String,
    pub id_bahan_pokok: String,
    pub tanggal: String,
    pub harga: String,
    pub stok: String,
}

impl HargaForm {
    pub fn new(locked_pasar: Option<i64>, tanggal: String) -> Self {
        Self {
            id_pasar: locked_pasar.map(|id| id.to_string()).unwrap_or_default(),
            tanggal,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<HargaBapokPayload, String> {
        const INCOMPLETE: &str = "Pastikan semua data (Pasar, Bahan Pokok, Tanggal, Harga, Stok) terisi.";

        let id_pasar = self.id_pasar.trim().parse::<i64>().map_err(|_| INCOMPLETE.to_string())?;
        let id_bahan_pokok = self
            .id_bahan_pokok
            .trim()
            .parse::<i64>()
            .map_err(|_| INCOMPLETE.to_string())?;
        let tanggal = self.tanggal.trim();
        if tanggal.is_empty() {
            return Err(INCOMPLETE.into());
        }
        let harga = parse_amount(&self.harga).ok_or_else(|| INCOMPLETE.to_string())?;
        let stok = parse_amount(&self.stok).ok_or_else(|| INCOMPLETE.to_string())?;

        if harga <= 0 {
            return Err("Harga tidak boleh diisi 0".into());
        }
        if stok < 1 {
            return Err("Stok minimal 1".into());
        }

        Ok(HargaBapokPayload {
            id_pasar,
            id_bahan_pokok,
            tanggal: tanggal.to_string(),
            harga,
            harga_baru: None,
            stok,
            status_integrasi: STATUS_PENDING.into(),
        })
    }
}

fn payload_from(row: &HargaBapok) -> HargaBapokPayload {
    HargaBapokPayload {
        id_pasar: row.id_pasar,
        id_bahan_pokok: row.id_bahan_pokok,
        tanggal: row.tanggal.clone(),
        harga: row.harga.round() as i64,
        harga_baru: row.harga_baru.map(|p| p.round() as i64),
        stok: row.stok.unwrap_or_default(),
        status_integrasi: row.status_integrasi.clone(),
    }
}

/// New price for an existing entry, dated `tanggal`.
pub fn edit_payload(row: &HargaBapok, harga_baru: &str, tanggal: &str) -> Result<HargaBapokPayload, String> {
    match parse_amount(harga_baru) {
        Some(price) if price > 0 => Ok(HargaBapokPayload {
            harga_baru: Some(price),
            tanggal: tanggal.to_string(),
            ..payload_from(row)
        }),
        _ => Err("Harga baru harus lebih dari 0".into()),
    }
}

pub fn approve_payload(row: &HargaBapok) -> HargaBapokPayload {
    HargaBapokPayload {
        status_integrasi: STATUS_APPROVED.into(),
        ..payload_from(row)
    }
}

fn parse_filter(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/* -------------------------------------------------------------------------- */
/*                                 modales                                    */
/* -------------------------------------------------------------------------- */

#[derive(Properties, PartialEq)]
struct CreateModalProps {
    initial: HargaForm,
    locked: bool,
    pasar: Vec<Pasar>,
    bahan_pokok: Vec<BahanPokok>,
    on_submit: Callback<HargaBapokPayload>,
    on_close: Callback<()>,
}

#[function_component(CreateModal)]
fn create_modal(props: &CreateModalProps) -> Html {
    let form = use_state(|| props.initial.clone());
    let problem = use_state(|| None::<String>);

    let update = |apply: fn(&mut HargaForm, String)| {
        let form = form.clone();
        move |value: String| {
            let mut next = (*form).clone();
            apply(&mut next, value);
            form.set(next);
        }
    };
    let on_select = |apply: fn(&mut HargaForm, String)| {
        let set = update(apply);
        Callback::from(move |e: Event| set(select_value(&e)))
    };
    let on_input = |apply: fn(&mut HargaForm, String)| {
        let set = update(apply);
        Callback::from(move |e: InputEvent| set(input_value(&e)))
    };

    let onsubmit = {
        let form = form.clone();
        let problem = problem.clone();
        let on_submit = props.on_submit.clone();
        Callback::from(move |ev: SubmitEvent| {
            ev.prevent_default();
            match form.validate() {
                Ok(payload) => on_submit.emit(payload),
                Err(message) => problem.set(Some(message)),
            }
        })
    };

    let harga_display = parse_amount(&form.harga)
        .map(|n| thousands(n as f64))
        .unwrap_or_default();

    html! {
        <Modal title="Tambah Data Harga" on_close={props.on_close.clone()}>
            <form class="form" {onsubmit}>
                <label>{"Pasar"}
                    <select disabled={props.locked} onchange={on_select(|f, v| f.id_pasar = v)}>
                        <option value="" selected={form.id_pasar.is_empty()}>{"Pilih Pasar"}</option>
                        { for props.pasar.iter().map(|p| html! {
                            <option value={p.id.to_string()} selected={form.id_pasar == p.id.to_string()}>{ &p.nama }</option>
                        }) }
                    </select>
                </label>
                <label>{"Bahan Pokok"}
                    <select onchange={on_select(|f, v| f.id_bahan_pokok = v)}>
                        <option value="" selected={form.id_bahan_pokok.is_empty()}>{"Pilih Bahan Pokok"}</option>
                        { for props.bahan_pokok.iter().map(|b| html! {
                            <option value={b.id.to_string()} selected={form.id_bahan_pokok == b.id.to_string()}>{ &b.nama }</option>
                        }) }
                    </select>
                </label>
                <label>{"Tanggal"}
                    <input type="date" max={today()} value={form.tanggal.clone()} oninput={on_input(|f, v| f.tanggal = v)} />
                </label>
                <label>{"Harga (Rp)"}
                    <input placeholder="Masukkan harga" value={harga_display} oninput={on_input(|f, v| f.harga = unformat(&v))} />
                </label>
                <label>{"Stok"}
                    <input type="number" min="1" value={form.stok.clone()} oninput={on_input(|f, v| f.stok = unformat(&v))} />
                </label>
                if let Some(message) = (*problem).clone() {
                    <p class="field-error">{ message }</p>
                }
                <button type="submit">{"Tambah"}</button>
            </form>
        </Modal>
    }
}

#[derive(Properties, PartialEq)]
struct EditModalProps {
    row: HargaBapok,
    nama: AttrValue,
    on_submit: Callback<HargaBapokPayload>,
    on_close: Callback<()>,
}

#[function_component(EditModal)]
fn edit_modal(props: &EditModalProps) -> Html {
    let harga_baru = use_state(String::new);
    let problem = use_state(|| None::<String>);

    let oninput = {
        let harga_baru = harga_baru.clone();
        Callback::from(move |e: InputEvent| harga_baru.set(unformat(&input_value(&e))))
    };
    let onsubmit = {
        let harga_baru = harga_baru.clone();
        let problem = problem.clone();
        let row = props.row.clone();
        let on_submit = props.on_submit.clone();
        Callback::from(move |ev: SubmitEvent| {
            ev.prevent_default();
            match edit_payload(&row, &harga_baru, &today()) {
                Ok(payload) => on_submit.emit(payload),
                Err(message) => problem.set(Some(message)),
            }
        })
    };

    let display = parse_amount(&harga_baru)
        .map(|n| thousands(n as f64))
        .unwrap_or_default();

    html! {
        <Modal title="Edit Data Harga" on_close={props.on_close.clone()}>
            <form class="form" {onsubmit}>
                <p>{ format!("{} · harga sebelumnya {}", props.nama, rupiah(props.row.current_price())) }</p>
                <label>{"Harga Baru (Rp)"}
                    <input placeholder="Masukkan harga baru" value={display} {oninput} />
                </label>
                if let Some(message) = (*problem).clone() {
                    <p class="field-error">{ message }</p>
                }
                <button type="submit">{"Simpan"}</button>
            </form>
        </Modal>
    }
}

/* -------------------------------------------------------------------------- */
/*                                   page                                     */
/* -------------------------------------------------------------------------- */

#[derive(Clone, PartialEq)]
enum Editor {
    Closed,
    Create,
    Edit(HargaBapok),
}

#[derive(Clone, Default, PartialEq)]
struct References {
    pasar: Vec<Pasar>,
    bahan_pokok: Vec<BahanPokok>,
}

async fn load_rows(client: &ApiClient, user: Option<&User>) -> Result<Vec<HargaBapok>, ApiError> {
    let path = match user.and_then(User::assigned_pasar) {
        Some(id_pasar) => Endpoints::harga_bapok_for_pasar(id_pasar),
        None => Endpoints::HARGA_BAPOK.to_string(),
    };
    let rows = client.get_list::<HargaBapok>(&path).await?;
    Ok(scope_rows(rows, user))
}

async fn reload_harga(
    client: ApiClient,
    user: Option<User>,
    rows: UseStateHandle<Vec<HargaBapok>>,
    notice: UseStateHandle<Option<Notice>>,
) {
    match load_rows(&client, user.as_ref()).await {
        Ok(list) => rows.set(list),
        Err(e) => {
            error!("loading harga bapok failed: {e}");
            notice.set(Some(Notice::error(format!("Gagal memuat data harga: {e}"))));
        }
    }
}

#[function_component(InputHargaPage)]
pub fn input_harga_page() -> Html {
    let client = use_api();
    let session = use_session();
    let user = session.user.clone();
    let admin = session.is_admin();
    let locked_pasar = user.as_ref().and_then(User::assigned_pasar);

    let rows = use_state(Vec::<HargaBapok>::new);
    let refs = use_state(References::default);
    let notice = use_state(|| None::<Notice>);
    let editor = use_state(|| Editor::Closed);
    let pasar_filter = use_state(|| None::<i64>);
    let bahan_filter = use_state(|| None::<i64>);
    let page = use_state(|| 1usize);
    let per_page = use_state(|| DEFAULT_PAGE_SIZE);

    {
        let client = client.clone();
        let user = user.clone();
        let rows = rows.clone();
        let refs = refs.clone();
        let notice = notice.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let (pasar, bahan_pokok) = futures::join!(
                    client.get_list::<Pasar>(Endpoints::PASAR),
                    client.get_list::<BahanPokok>(Endpoints::BAHAN_POKOK),
                );
                match (pasar, bahan_pokok) {
                    (Ok(pasar), Ok(bahan_pokok)) => refs.set(References { pasar, bahan_pokok }),
                    (Err(e), _) | (_, Err(e)) => warn!("loading reference lists failed: {e}"),
                }
                reload_harga(client, user, rows, notice).await;
            });
            || ()
        });
    }

    /* ---------------- écritures ---------------- */

    let write = {
        let client = client.clone();
        let user = user.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        let editor = editor.clone();
        move |method: Method, path: String, payload: HargaBapokPayload, done: &'static str| {
            let client = client.clone();
            let user = user.clone();
            let rows = rows.clone();
            let notice = notice.clone();
            let editor = editor.clone();
            spawn_local(async move {
                match client.fetch_empty(method, &path, Some(&payload)).await {
                    Ok(()) => {
                        info!("{path} saved");
                        editor.set(Editor::Closed);
                        notice.set(Some(Notice::success(done)));
                        notify_data_updated();
                        reload_harga(client, user, rows, notice).await;
                    }
                    Err(e) => {
                        error!("writing {path} failed: {e}");
                        notice.set(Some(Notice::error(e.to_string())));
                    }
                }
            });
        }
    };

    let on_create = {
        let write = write.clone();
        let rows = rows.clone();
        let editor = editor.clone();
        Callback::from(move |payload: HargaBapokPayload| {
            if let Some(existing) = find_existing(rows.as_slice(), payload.id_pasar, payload.id_bahan_pokok) {
                let edit = confirm(
                    "Data untuk bahan pokok ini di pasar ini sudah ada.\n\nApakah Anda ingin mengedit data yang sudah ada?",
                );
                editor.set(if edit { Editor::Edit(existing.clone()) } else { Editor::Closed });
                return;
            }
            write(Method::POST, Endpoints::HARGA_BAPOK.to_string(), payload, "Data berhasil ditambahkan!");
        })
    };

    let on_edit = {
        let write = write.clone();
        let editor = editor.clone();
        Callback::from(move |payload: HargaBapokPayload| {
            if let Editor::Edit(row) = &*editor {
                write(Method::PUT, Endpoints::harga_bapok(row.id), payload, "Data berhasil diperbarui!");
            }
        })
    };

    let on_approve = {
        let write = write.clone();
        Callback::from(move |row: HargaBapok| {
            if confirm("Setujui data harga ini?") {
                write(Method::PUT, Endpoints::harga_bapok(row.id), approve_payload(&row), "Data telah disetujui.");
            }
        })
    };

    let on_delete = {
        let client = client.clone();
        let user = user.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        Callback::from(move |row: HargaBapok| {
            if !confirm("Apakah Anda yakin? Data yang dihapus tidak dapat dikembalikan!") {
                return;
            }
            let client = client.clone();
            let user = user.clone();
            let rows = rows.clone();
            let notice = notice.clone();
            spawn_local(async move {
                match client
                    .fetch_empty::<()>(Method::DELETE, &Endpoints::harga_bapok(row.id), None)
                    .await
                {
                    Ok(()) => {
                        info!("harga bapok {} deleted", row.id);
                        notice.set(Some(Notice::success("Data berhasil dihapus.")));
                        notify_data_updated();
                        reload_harga(client, user, rows, notice).await;
                    }
                    Err(e) => {
                        error!("deleting harga bapok {} failed: {e}", row.id);
                        notice.set(Some(Notice::error(format!("Gagal menghapus data: {e}"))));
                    }
                }
            });
        })
    };

    /* ---------------- rendu ---------------- */

    let visible = filter_rows(rows.as_slice(), *pasar_filter, *bahan_filter);
    let pages = total_pages(visible.len(), *per_page);
    let current = clamp_page(*page, pages);
    let offset = (current - 1) * *per_page;

    let on_filter = |target: UseStateHandle<Option<i64>>| {
        let page = page.clone();
        Callback::from(move |e: Event| {
            target.set(parse_filter(&select_value(&e)));
            page.set(1);
        })
    };
    let open_create = {
        let editor = editor.clone();
        Callback::from(move |_: MouseEvent| editor.set(Editor::Create))
    };
    let close = {
        let editor = editor.clone();
        Callback::from(move |_| editor.set(Editor::Closed))
    };
    let on_page = {
        let page = page.clone();
        Callback::from(move |p| page.set(p))
    };
    let on_size = {
        let page = page.clone();
        let per_page = per_page.clone();
        Callback::from(move |size| {
            per_page.set(size);
            page.set(1);
        })
    };

    html! {
        <div class="page">
            <div class="page-header">
                <h2>{"Input Harga Bahan Pokok"}</h2>
                <button class="btn-primary" onclick={open_create}>{"+ Tambah Data"}</button>
            </div>

            <NoticeBar notice={notice.clone()} />

            <div class="toolbar">
                if locked_pasar.is_none() {
                    <select onchange={on_filter(pasar_filter.clone())}>
                        <option value="">{"Semua Pasar"}</option>
                        { for refs.pasar.iter().map(|p| html! {
                            <option value={p.id.to_string()} selected={*pasar_filter == Some(p.id)}>{ &p.nama }</option>
                        }) }
                    </select>
                }
                <select onchange={on_filter(bahan_filter.clone())}>
                    <option value="">{"Semua Bahan Pokok"}</option>
                    { for refs.bahan_pokok.iter().map(|b| html! {
                        <option value={b.id.to_string()} selected={*bahan_filter == Some(b.id)}>{ &b.nama }</option>
                    }) }
                </select>
                <PageSizeSelect value={*per_page} on_change={on_size} />
            </div>

            <table class="table">
                <thead>
                    <tr>
                        <th>{"No"}</th><th>{"Pasar"}</th><th>{"Bahan Pokok"}</th><th>{"Harga Lama"}</th>
                        <th>{"Harga Baru"}</th><th>{"Perubahan"}</th><th>{"Stok"}</th><th>{"Status"}</th><th>{"Aksi"}</th>
                    </tr>
                </thead>
                <tbody>
                    if visible.is_empty() {
                        <tr><td colspan="9">{"Belum ada data harga"}</td></tr>
                    }
                    { for paginate(&visible, current, *per_page).iter().enumerate().map(|(i, row)| {
                        let item = bahan(row, &refs.bahan_pokok);
                        let (nama, satuan) = item
                            .map(|b| (b.nama, b.satuan))
                            .unwrap_or_else(|| ("-".into(), String::new()));
                        let emit = |cb: &Callback<HargaBapok>| {
                            let cb = cb.clone();
                            let row = row.clone();
                            Callback::from(move |_: MouseEvent| cb.emit(row.clone()))
                        };
                        let edit = {
                            let editor = editor.clone();
                            let row = row.clone();
                            Callback::from(move |_: MouseEvent| editor.set(Editor::Edit(row.clone())))
                        };
                        let (badge, label) = match row.status_integrasi.as_str() {
                            STATUS_APPROVED => ("badge badge-success", "Disetujui".to_string()),
                            STATUS_PENDING => ("badge badge-warning", "Pending".to_string()),
                            other => ("badge", other.to_string()),
                        };
                        html! {
                            <tr key={row.id}>
                                <td>{ offset + i + 1 }</td>
                                <td>{ pasar_name(row, &refs.pasar) }</td>
                                <td>{ nama }</td>
                                <td>{ rupiah(row.harga) }</td>
                                <td>{ row.harga_baru.map(rupiah).unwrap_or_else(|| "-".into()) }</td>
                                <td>{ percent_change(row.harga, row.harga_baru) }</td>
                                <td>{ format!("{} {satuan}", row.stok.unwrap_or_default()) }</td>
                                <td><span class={badge}>{ label }</span></td>
                                <td class="actions">
                                    <button onclick={edit}>{"Edit"}</button>
                                    if admin && row.is_pending() {
                                        <button class="btn-success" onclick={emit(&on_approve)}>{"Setujui"}</button>
                                    }
                                    <button class="btn-danger" onclick={emit(&on_delete)}>{"Hapus"}</button>
                                </td>
                            </tr>
                        }
                    }) }
                </tbody>
            </table>

            <Pagination current={current} total={pages} on_change={on_page} />

            {
                match &*editor {
                    Editor::Closed => Html::default(),
                    Editor::Create => html! {
                        <CreateModal
                            initial={HargaForm::new(locked_pasar, today())}
                            locked={locked_pasar.is_some()}
                            pasar={refs.pasar.clone()}
                            bahan_pokok={refs.bahan_pokok.clone()}
                            on_submit={on_create}
                            on_close={close}
                        />
                    },
                    Editor::Edit(row) => {
                        let nama = bahan(row, &refs.bahan_pokok).map(|b| b.nama).unwrap_or_default();
                        html! {
                            <EditModal row={row.clone()} nama={nama} on_submit={on_edit} on_close={close} />
                        }
                    }
                }
            }
        </div>
    }
}
