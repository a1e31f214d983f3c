use gloo_dialogs::confirm;
use gloo_net::http::Method;
use log::{error, info};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{use_api, ApiClient};
use crate::config::{Endpoints, DEFAULT_PAGE_SIZE};
use crate::events::notify_data_updated;
use crate::models::{Pasar, PasarPayload};
use crate::pagination::{clamp_page, paginate, total_pages, PageSizeSelect, Pagination};
use crate::session::use_session;
use crate::widgets::{input_value, Modal, Notice, NoticeBar};

/* -------------------------------------------------------------------------- */
/*                                 formulaire                                 */
/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PasarForm {
    pub nama: String,
    pub alamat: String,
    pub latitude: String,
    pub longitude: String,
}

impl From<&Pasar> for PasarForm {
    fn from(p: &Pasar) -> Self {
        Self {
            nama: p.nama.clone(),
            alamat: p.alamat.clone(),
            latitude: p.latitude.map(|v| v.to_string()).unwrap_or_default(),
            longitude: p.longitude.map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

fn coordinate(raw: &str, bound: f64, label: &str) -> Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.replace(',', ".").parse::<f64>() {
        Ok(v) if v.abs() <= bound => Ok(Some(v)),
        Ok(_) => Err(format!("{label} harus di antara -{bound} dan {bound}")),
        Err(_) => Err(format!("{label} harus berupa angka")),
    }
}

impl PasarForm {
    pub fn validate(&self) -> Result<PasarPayload, String> {
        let nama = self.nama.trim();
        let alamat = self.alamat.trim();
        if nama.is_empty() {
            return Err("Nama pasar wajib diisi".into());
        }
        if alamat.is_empty() {
            return Err("Alamat wajib diisi".into());
        }
        Ok(PasarPayload {
            nama: nama.to_string(),
            alamat: alamat.to_string(),
            latitude: coordinate(&self.latitude, 90.0, "Latitude")?,
            longitude: coordinate(&self.longitude, 180.0, "Longitude")?,
        })
    }
}

#[derive(Properties, PartialEq)]
struct PasarModalProps {
    title: AttrValue,
    initial: PasarForm,
    on_submit: Callback<PasarPayload>,
    on_close: Callback<()>,
}

#[function_component(PasarModal)]
fn pasar_modal(props: &PasarModalProps) -> Html {
    let form = use_state(|| props.initial.clone());
    let problem = use_state(|| None::<String>);

    let field = |apply: fn(&mut PasarForm, String)| {
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
                <label>{"Nama Pasar"}
                    <input value={form.nama.clone()} oninput={field(|f, v| f.nama = v)} />
                </label>
                <label>{"Alamat"}
                    <input value={form.alamat.clone()} oninput={field(|f, v| f.alamat = v)} />
                </label>
                <label>{"Latitude"}
                    <input value={form.latitude.clone()} oninput={field(|f, v| f.latitude = v)} />
                </label>
                <label>{"Longitude"}
                    <input value={form.longitude.clone()} oninput={field(|f, v| f.longitude = v)} />
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
    Edit(Pasar),
}

async fn reload_pasar(client: ApiClient, rows: UseStateHandle<Vec<Pasar>>, notice: UseStateHandle<Option<Notice>>) {
    match client.get_list::<Pasar>(Endpoints::PASAR).await {
        Ok(list) => rows.set(list),
        Err(e) => {
            error!("loading pasar failed: {e}");
            notice.set(Some(Notice::error(format!("Gagal memuat data pasar: {e}"))));
        }
    }
}

#[function_component(PasarPage)]
pub fn pasar_page() -> Html {
    let client = use_api();
    let session = use_session();
    let admin = session.is_admin();

    let rows = use_state(Vec::<Pasar>::new);
    let notice = use_state(|| None::<Notice>);
    let editor = use_state(|| Editor::Closed);
    let page = use_state(|| 1usize);
    let per_page = use_state(|| DEFAULT_PAGE_SIZE);

    {
        let client = client.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        use_effect_with((), move |_| {
            spawn_local(reload_pasar(client, rows, notice));
            || ()
        });
    }

    let on_save = {
        let client = client.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        let editor = editor.clone();
        Callback::from(move |payload: PasarPayload| {
            let (method, path, done) = match &*editor {
                Editor::Edit(p) => (Method::PUT, Endpoints::pasar(p.id), "Pasar berhasil diperbarui"),
                _ => (Method::POST, Endpoints::PASAR.to_string(), "Pasar berhasil ditambahkan"),
            };
            let client = client.clone();
            let rows = rows.clone();
            let notice = notice.clone();
            let editor = editor.clone();
            spawn_local(async move {
                match client.fetch_empty(method, &path, Some(&payload)).await {
                    Ok(()) => {
                        info!("pasar saved: {}", payload.nama);
                        editor.set(Editor::Closed);
                        notice.set(Some(Notice::success(done)));
                        notify_data_updated();
                        reload_pasar(client, rows, notice).await;
                    }
                    Err(e) => {
                        error!("saving pasar failed: {e}");
                        notice.set(Some(Notice::error(format!("Gagal menyimpan: {e}"))));
                    }
                }
            });
        })
    };

    let on_delete = {
        let client = client.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        Callback::from(move |pasar: Pasar| {
            if !confirm(&format!("Hapus pasar \"{}\"? Tindakan ini tidak dapat dibatalkan.", pasar.nama)) {
                return;
            }
            let client = client.clone();
            let rows = rows.clone();
            let notice = notice.clone();
            spawn_local(async move {
                match client.fetch_empty::<()>(Method::DELETE, &Endpoints::pasar(pasar.id), None).await {
                    Ok(()) => {
                        info!("pasar {} deleted", pasar.id);
                        notice.set(Some(Notice::success("Pasar berhasil dihapus")));
                        notify_data_updated();
                        reload_pasar(client, rows, notice).await;
                    }
                    Err(e) => {
                        error!("deleting pasar {} failed: {e}", pasar.id);
                        notice.set(Some(Notice::error(format!("Gagal menghapus: {e}"))));
                    }
                }
            });
        })
    };

    let pages = total_pages(rows.len(), *per_page);
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
                <h2>{"Data Pasar"}</h2>
                if admin {
                    <button class="btn-primary" onclick={set_editor(Editor::Create)}>{"+ Tambah Pasar"}</button>
                }
            </div>

            <NoticeBar notice={notice.clone()} />
            <PageSizeSelect value={*per_page} on_change={on_size} />

            <table class="table">
                <thead>
                    <tr>
                        <th>{"No"}</th><th>{"Nama Pasar"}</th><th>{"Alamat"}</th><th>{"Koordinat"}</th>
                        if admin { <th>{"Aksi"}</th> }
                    </tr>
                </thead>
                <tbody>
                    { for paginate(rows.as_slice(), current, *per_page).iter().enumerate().map(|(i, p)| {
                        let coords = match (p.latitude, p.longitude) {
                            (Some(lat), Some(lng)) => format!("{lat}, {lng}"),
                            _ => "-".to_string(),
                        };
                        let delete = {
                            let on_delete = on_delete.clone();
                            let p = p.clone();
                            Callback::from(move |_: MouseEvent| on_delete.emit(p.clone()))
                        };
                        html! {
                            <tr key={p.id}>
                                <td>{ offset + i + 1 }</td>
                                <td>{ &p.nama }</td>
                                <td>{ &p.alamat }</td>
                                <td>{ coords }</td>
                                if admin {
                                    <td class="actions">
                                        <button onclick={set_editor(Editor::Edit(p.clone()))}>{"Edit"}</button>
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
                        <PasarModal title="Tambah Pasar" initial={PasarForm::default()} on_submit={on_save} on_close={close} />
                    },
                    Editor::Edit(p) => html! {
                        <PasarModal title="Edit Pasar" initial={PasarForm::from(p)} on_submit={on_save} on_close={close} />
                    },
                }
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(nama: &str, alamat: &str, lat: &str, lng: &str) -> PasarForm {
        PasarForm { nama: nama.into(), alamat: alamat.into(), latitude: lat.into(), longitude: lng.into() }
    }

    #[test]
    fn name_and_address_are_required() {
        assert_eq!(form(" ", "Jl. Bantul", "", "").validate().unwrap_err(), "Nama pasar wajib diisi");
        assert_eq!(form("Pasar Niten", "", "", "").validate().unwrap_err(), "Alamat wajib diisi");
    }

    #[test]
    fn coordinates_are_optional_and_range_checked() {
        let payload = form("Pasar Niten", "Jl. Bantul", "", "").validate().unwrap();
        assert_eq!(payload.latitude, None);

        let payload = form("Pasar Niten", "Jl. Bantul", "-7,8881", "110.33").validate().unwrap();
        assert_eq!(payload.latitude, Some(-7.8881));
        assert_eq!(payload.longitude, Some(110.33));

        assert!(form("P", "A", "95", "").validate().is_err());
        assert!(form("P", "A", "", "utara").validate().is_err());
    }

    #[test]
    fn editing_prefills_from_the_row() {
        let pasar = Pasar { id: 3, nama: "Pasar Bantul".into(), alamat: "Jl. Jend. Sudirman".into(), latitude: Some(-7.89), longitude: None };
        let f = PasarForm::from(&pasar);
        assert_eq!(f.latitude, "-7.89");
        assert_eq!(f.longitude, "");
    }
}
