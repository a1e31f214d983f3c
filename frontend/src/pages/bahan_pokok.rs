use gloo_dialogs::confirm;
use gloo_net::http::Method;
use log::{error, info};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{use_api, ApiClient};
use crate::config::{Endpoints, DEFAULT_PAGE_SIZE};
use crate::events::notify_data_updated;
use crate::models::{BahanPokok, BahanPokokPayload};
use crate::pagination::{clamp_page, paginate, total_pages, PageSizeSelect, Pagination};
use crate::session::use_session;
use crate::widgets::{input_value, Modal, Notice, NoticeBar};

/// Rows matching `query` on name or unit (case-insensitive), ordered by
/// `urutan` then name; rows without `urutan` go last.
pub fn search(rows: &[BahanPokok], query: &str) -> Vec<BahanPokok> {
    let needle = query.trim().to_lowercase();
    let mut hits: Vec<BahanPokok> = rows
        .iter()
        .filter(|b| {
            needle.is_empty()
                || b.nama.to_lowercase().contains(&needle)
                || b.satuan.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();
    hits.sort_by(|a, b| {
        (a.urutan.unwrap_or(i64::MAX), &a.nama).cmp(&(b.urutan.unwrap_or(i64::MAX), &b.nama))
    });
    hits
}

/* ---------------- formulaire ---------------- */

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BahanPokokForm {
    pub urutan: String,
    pub nama: String,
    pub satuan: String,
    pub stok_wajib: String,
    pub up_stok: String,
}

impl From<&BahanPokok> for BahanPokokForm {
    fn from(b: &BahanPokok) -> Self {
        let text = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            urutan: text(b.urutan),
            nama: b.nama.clone(),
            satuan: b.satuan.clone(),
            stok_wajib: text(b.stok_wajib),
            up_stok: text(b.up_stok),
        }
    }
}

fn count(raw: &str, label: &str) -> Result<Option<i64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(Some(n)),
        _ => Err(format!("{label} harus berupa bilangan bulat positif")),
    }
}

impl BahanPokokForm {
    pub fn validate(&self) -> Result<BahanPokokPayload, String> {
        let nama = self.nama.trim();
        let satuan = self.satuan.trim();
        if nama.is_empty() {
            return Err("Nama bahan pokok wajib diisi".into());
        }
        if satuan.is_empty() {
            return Err("Satuan wajib diisi".into());
        }
        Ok(BahanPokokPayload {
            urutan: count(&self.urutan, "Urutan")?,
            nama: nama.to_string(),
            satuan: satuan.to_string(),
            stok_wajib: count(&self.stok_wajib, "Stok wajib")?,
            up_stok: count(&self.up_stok, "Up stok")?,
        })
    }
}

#[derive(Properties, PartialEq)]
struct BahanPokokModalProps {
    title: AttrValue,
    initial: BahanPokokForm,
    on_submit: Callback<BahanPokokPayload>,
    on_close: Callback<()>,
}

#[function_component(BahanPokokModal)]
fn bahan_pokok_modal(props: &BahanPokokModalProps) -> Html {
    let form = use_state(|| props.initial.clone());
    let problem = use_state(|| None::<String>);

    let field = |apply: fn(&mut BahanPokokForm, String)| {
        let form = form.clone();
        Callback::from(move |e: InputEvent| {
            let mut next = (*form).clone();
            apply(&mut next, input_value(&e));
            form.set(next);
        })
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

    html! {
        <Modal title={props.title.clone()} on_close={props.on_close.clone()}>
            <form class="form" {onsubmit}>
                <label>{"Urutan"}
                    <input type="number" min="0" value={form.urutan.clone()} oninput={field(|f, v| f.urutan = v)} />
                </label>
                <label>{"Nama"}
                    <input value={form.nama.clone()} oninput={field(|f, v| f.nama = v)} />
                </label>
                <label>{"Satuan"}
                    <input value={form.satuan.clone()} oninput={field(|f, v| f.satuan = v)} />
                </label>
                <label>{"Stok Wajib"}
                    <input type="number" min="0" value={form.stok_wajib.clone()} oninput={field(|f, v| f.stok_wajib = v)} />
                </label>
                <label>{"Up Stok"}
                    <input type="number" min="0" value={form.up_stok.clone()} oninput={field(|f, v| f.up_stok = v)} />
                </label>
                if let Some(message) = (*problem).clone() {
                    <p class="field-error">{ message }</p>
                }
                <button type="submit">{"Simpan"}</button>
            </form>
        </Modal>
    }
}

/* ---------------- page ---------------- */

#[derive(Clone, PartialEq)]
enum Editor {
    Closed,
    Create,
    Edit(BahanPokok),
}

async fn reload_bahan_pokok(
    client: ApiClient,
    rows: UseStateHandle<Vec<BahanPokok>>,
    notice: UseStateHandle<Option<Notice>>,
) {
    match client.get_list::<BahanPokok>(Endpoints::BAHAN_POKOK).await {
        Ok(list) => rows.set(list),
        Err(e) => {
            error!("loading bahan pokok failed: {e}");
            notice.set(Some(Notice::error(format!("Gagal memuat bahan pokok: {e}"))));
        }
    }
}

#[function_component(BahanPokokPage)]
pub fn bahan_pokok_page() -> Html {
    let client = use_api();
    let session = use_session();
    let admin = session.is_admin();

    let rows = use_state(Vec::<BahanPokok>::new);
    let notice = use_state(|| None::<Notice>);
    let editor = use_state(|| Editor::Closed);
    let query = use_state(String::new);
    let page = use_state(|| 1usize);
    let per_page = use_state(|| DEFAULT_PAGE_SIZE);

    {
        let client = client.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        use_effect_with((), move |_| {
            spawn_local(reload_bahan_pokok(client, rows, notice));
            || ()
        });
    }

    let on_save = {
        let client = client.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        let editor = editor.clone();
        Callback::from(move |payload: BahanPokokPayload| {
            let (method, path) = match &*editor {
                Editor::Edit(b) => (Method::PUT, Endpoints::bahan_pokok(b.id)),
                _ => (Method::POST, Endpoints::BAHAN_POKOK.to_string()),
            };
            let client = client.clone();
            let rows = rows.clone();
            let notice = notice.clone();
            let editor = editor.clone();
            spawn_local(async move {
                match client.fetch_empty(method, &path, Some(&payload)).await {
                    Ok(()) => {
                        info!("bahan pokok saved: {}", payload.nama);
                        editor.set(Editor::Closed);
                        notice.set(Some(Notice::success("Data bahan pokok berhasil disimpan.")));
                        notify_data_updated();
                        reload_bahan_pokok(client, rows, notice).await;
                    }
                    Err(e) => {
                        error!("saving bahan pokok failed: {e}");
                        notice.set(Some(Notice::error(e.to_string())));
                    }
                }
            });
        })
    };

    let on_delete = {
        let client = client.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        Callback::from(move |item: BahanPokok| {
            if !confirm(&format!("Hapus bahan pokok \"{}\"?", item.nama)) {
                return;
            }
            let client = client.clone();
            let rows = rows.clone();
            let notice = notice.clone();
            spawn_local(async move {
                match client
                    .fetch_empty::<()>(Method::DELETE, &Endpoints::bahan_pokok(item.id), None)
                    .await
                {
                    Ok(()) => {
                        info!("bahan pokok {} deleted", item.id);
                        notice.set(Some(Notice::success("Data bahan pokok berhasil dihapus.")));
                        notify_data_updated();
                        reload_bahan_pokok(client, rows, notice).await;
                    }
                    Err(e) => {
                        error!("deleting bahan pokok {} failed: {e}", item.id);
                        notice.set(Some(Notice::error(e.to_string())));
                    }
                }
            });
        })
    };

    let visible = search(rows.as_slice(), query.as_str());
    let pages = total_pages(visible.len(), *per_page);
    let current = clamp_page(*page, pages);
    let offset = (current - 1) * *per_page;

    let set_editor = |next: Editor| {
        let editor = editor.clone();
        Callback::from(move |_: MouseEvent| editor.set(next.clone()))
    };
    let close = {
        let editor = editor.clone();
        Callback::from(move |_| editor.set(Editor::Closed))
    };
    let on_search = {
        let query = query.clone();
        let page = page.clone();
        Callback::from(move |e: InputEvent| {
            query.set(input_value(&e));
            page.set(1);
        })
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
                <h2>{"Bahan Pokok"}</h2>
                if admin {
                    <button class="btn-primary" onclick={set_editor(Editor::Create)}>{"+ Tambah Bahan Pokok"}</button>
                }
            </div>

            <NoticeBar notice={notice.clone()} />

            <div class="toolbar">
                <input class="search" placeholder="Cari nama atau satuan…" value={(*query).clone()} oninput={on_search} />
                <PageSizeSelect value={*per_page} on_change={on_size} />
            </div>

            <table class="table">
                <thead>
                    <tr>
                        <th>{"No"}</th><th>{"Nama"}</th><th>{"Satuan"}</th><th>{"Stok Wajib"}</th><th>{"Up Stok"}</th>
                        if admin { <th>{"Aksi"}</th> }
                    </tr>
                </thead>
                <tbody>
                    if visible.is_empty() {
                        <tr><td colspan="6">{"Data tidak ditemukan"}</td></tr>
                    }
                    { for paginate(&visible, current, *per_page).iter().enumerate().map(|(i, b)| {
                        let delete = {
                            let on_delete = on_delete.clone();
                            let b = b.clone();
                            Callback::from(move |_: MouseEvent| on_delete.emit(b.clone()))
                        };
                        let number = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
                        html! {
                            <tr key={b.id}>
                                <td>{ offset + i + 1 }</td>
                                <td>{ &b.nama }</td>
                                <td>{ &b.satuan }</td>
                                <td>{ number(b.stok_wajib) }</td>
                                <td>{ number(b.up_stok) }</td>
                                if admin {
                                    <td class="actions">
                                        <button onclick={set_editor(Editor::Edit(b.clone()))}>{"Edit"}</button>
                                        <button class="btn-danger" onclick={delete}>{"Hapus"}</button>
                                    </td>
                                }
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
                        <BahanPokokModal title="Tambah Bahan Pokok" initial={BahanPokokForm::default()} on_submit={on_save} on_close={close} />
                    },
                    Editor::Edit(b) => html! {
                        <BahanPokokModal title="Edit Bahan Pokok" initial={BahanPokokForm::from(b)} on_submit={on_save} on_close={close} />
                    },
                }
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, urutan: Option<i64>, nama: &str, satuan: &str) -> BahanPokok {
        BahanPokok { id, urutan, nama: nama.into(), satuan: satuan.into(), ..Default::default() }
    }

    fn rows() -> Vec<BahanPokok> {
        vec![
            item(1, Some(3), "Minyak Goreng", "liter"),
            item(2, None, "Garam", "kg"),
            item(3, Some(1), "Beras Premium", "kg"),
            item(4, Some(2), "Beras Medium", "kg"),
        ]
    }

    #[test]
    fn empty_query_lists_everything_by_order() {
        let ids: Vec<i64> = search(&rows(), "  ").iter().map(|b| b.id).collect();
        assert_eq!(ids, [3, 4, 1, 2]);
    }

    #[test]
    fn search_matches_name_or_unit_ignoring_case() {
        let ids: Vec<i64> = search(&rows(), "BERAS").iter().map(|b| b.id).collect();
        assert_eq!(ids, [3, 4]);
        let ids: Vec<i64> = search(&rows(), "liter").iter().map(|b| b.id).collect();
        assert_eq!(ids, [1]);
    }

    #[test]
    fn form_requires_name_and_unit() {
        let mut form = BahanPokokForm { nama: "Gula".into(), ..Default::default() };
        assert_eq!(form.validate().unwrap_err(), "Satuan wajib diisi");
        form.satuan = "kg".into();
        let payload = form.validate().unwrap();
        assert_eq!(payload.urutan, None);
        assert_eq!(payload.stok_wajib, None);
    }

    #[test]
    fn counts_must_be_non_negative_integers() {
        let form = BahanPokokForm {
            nama: "Gula".into(),
            satuan: "kg".into(),
            urutan: "4".into(),
            stok_wajib: "-1".into(),
            ..Default::default()
        };
        assert!(form.validate().is_err());

        let form = BahanPokokForm { stok_wajib: "20".into(), ..form };
        let payload = form.validate().unwrap();
        assert_eq!(payload.urutan, Some(4));
        assert_eq!(payload.stok_wajib, Some(20));
    }
}
