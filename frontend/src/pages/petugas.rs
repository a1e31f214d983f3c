use gloo_dialogs::confirm;
use gloo_net::http::Method;
use log::{error, info, warn};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{use_api, ApiClient};
use crate::config::{Endpoints, DEFAULT_PAGE_SIZE};
use crate::events::notify_data_updated;
use crate::models::{Pasar, Petugas, PetugasPayload};
use crate::pagination::{clamp_page, paginate, total_pages, PageSizeSelect, Pagination};
use crate::validation::is_valid_email;
use crate::widgets::{input_value, select_value, Modal, Notice, NoticeBar};

const MIN_PASSWORD: usize = 8;

pub fn search(rows: &[Petugas], query: &str) -> Vec<Petugas> {
    let needle = query.trim().to_lowercase();
    rows.iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.email.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/* ---------------- formulaire ---------------- */

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PetugasForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub id_pasar: String,
}

impl From<&Petugas> for PetugasForm {
    fn from(p: &Petugas) -> Self {
        Self {
            name: p.name.clone(),
            email: p.email.clone(),
            id_pasar: p.id_pasar.map(|id| id.to_string()).unwrap_or_default(),
            ..Default::default()
        }
    }
}

impl PetugasForm {
    /// `creating` makes the password mandatory; on edit it is never sent.
    pub fn validate(&self, creating: bool) -> Result<PetugasPayload, String> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() {
            return Err("Nama wajib diisi".into());
        }
        if email.is_empty() {
            return Err("Email wajib diisi".into());
        }
        if !is_valid_email(email) {
            return Err("Email tidak valid".into());
        }
        let id_pasar = self.id_pasar.trim().parse::<i64>().ok();
        if id_pasar.is_none() {
            return Err("Pasar wajib dipilih".into());
        }

        let (password, password_confirmation) = if creating {
            if self.password.chars().count() < MIN_PASSWORD {
                return Err(format!("Password minimal {MIN_PASSWORD} karakter"));
            }
            if self.password != self.password_confirmation {
                return Err("Konfirmasi password tidak cocok".into());
            }
            (Some(self.password.clone()), Some(self.password_confirmation.clone()))
        } else {
            (None, None)
        };

        Ok(PetugasPayload {
            name: name.to_string(),
            email: email.to_string(),
            password,
            password_confirmation,
            id_pasar,
            is_petugas_pasar: 1,
        })
    }
}

#[derive(Properties, PartialEq)]
struct PetugasModalProps {
    creating: bool,
    initial: PetugasForm,
    pasar: Vec<Pasar>,
    on_submit: Callback<PetugasPayload>,
    on_close: Callback<()>,
}

#[function_component(PetugasModal)]
fn petugas_modal(props: &PetugasModalProps) -> Html {
    let form = use_state(|| props.initial.clone());
    let problem = use_state(|| None::<String>);

    let field = |apply: fn(&mut PetugasForm, String)| {
        let form = form.clone();
        Callback::from(move |e: InputEvent| {
            let mut next = (*form).clone();
            apply(&mut next, input_value(&e));
            form.set(next);
        })
    };
    let on_pasar = {
        let form = form.clone();
        Callback::from(move |e: Event| {
            let mut next = (*form).clone();
            next.id_pasar = select_value(&e);
            form.set(next);
        })
    };

    let onsubmit = {
        let form = form.clone();
        let problem = problem.clone();
        let creating = props.creating;
        let on_submit = props.on_submit.clone();
        Callback::from(move |ev: SubmitEvent| {
            ev.prevent_default();
            match form.validate(creating) {
                Ok(payload) => on_submit.emit(payload),
                Err(message) => problem.set(Some(message)),
            }
        })
    };

    let title = if props.creating { "Tambah Petugas" } else { "Edit Petugas" };

    html! {
        <Modal {title} on_close={props.on_close.clone()}>
            <form class="form" {onsubmit}>
                <label>{"Nama"}
                    <input value={form.name.clone()} oninput={field(|f, v| f.name = v)} />
                </label>
                <label>{"Email"}
                    <input type="email" value={form.email.clone()} oninput={field(|f, v| f.email = v)} />
                </label>
                if props.creating {
                    <label>{"Password"}
                        <input type="password" value={form.password.clone()} oninput={field(|f, v| f.password = v)} />
                    </label>
                    <label>{"Konfirmasi Password"}
                        <input type="password" value={form.password_confirmation.clone()} oninput={field(|f, v| f.password_confirmation = v)} />
                    </label>
                }
                <label>{"Pasar"}
                    <select onchange={on_pasar}>
                        <option value="" selected={form.id_pasar.is_empty()}>{"Pilih Pasar"}</option>
                        { for props.pasar.iter().map(|p| html! {
                            <option value={p.id.to_string()} selected={form.id_pasar == p.id.to_string()}>{ &p.nama }</option>
                        }) }
                    </select>
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
    Edit(Petugas),
}

async fn reload_petugas(
    client: ApiClient,
    rows: UseStateHandle<Vec<Petugas>>,
    notice: UseStateHandle<Option<Notice>>,
) {
    match client.get_list::<Petugas>(Endpoints::PETUGAS).await {
        Ok(list) => rows.set(list),
        Err(e) => {
            error!("loading petugas failed: {e}");
            notice.set(Some(Notice::error(format!("Gagal memuat data petugas: {e}"))));
        }
    }
}

#[function_component(DaftarPetugasPage)]
pub fn daftar_petugas_page() -> Html {
    let client = use_api();

    let rows = use_state(Vec::<Petugas>::new);
    let pasar = use_state(Vec::<Pasar>::new);
    let notice = use_state(|| None::<Notice>);
    let editor = use_state(|| Editor::Closed);
    let query = use_state(String::new);
    let page = use_state(|| 1usize);
    let per_page = use_state(|| DEFAULT_PAGE_SIZE);

    {
        let client = client.clone();
        let rows = rows.clone();
        let pasar = pasar.clone();
        let notice = notice.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match client.get_list::<Pasar>(Endpoints::PASAR).await {
                    Ok(list) => pasar.set(list),
                    Err(e) => warn!("loading pasar list failed: {e}"),
                }
                reload_petugas(client, rows, notice).await;
            });
            || ()
        });
    }

    let on_save = {
        let client = client.clone();
        let rows = rows.clone();
        let notice = notice.clone();
        let editor = editor.clone();
        Callback::from(move |payload: PetugasPayload| {
            let (method, path, done) = match &*editor {
                Editor::Edit(p) => (Method::PUT, Endpoints::user(p.id), "Data berhasil diperbarui."),
                _ => (Method::POST, Endpoints::REGISTER.to_string(), "Petugas berhasil ditambahkan."),
            };
            let client = client.clone();
            let rows = rows.clone();
            let notice = notice.clone();
            let editor = editor.clone();
            spawn_local(async move {
                match client.fetch_empty(method, &path, Some(&payload)).await {
                    Ok(()) => {
                        info!("petugas saved: {}", payload.email);
                        editor.set(Editor::Closed);
                        notice.set(Some(Notice::success(done)));
                        notify_data_updated();
                        reload_petugas(client, rows, notice).await;
                    }
                    Err(e) => {
                        error!("saving petugas failed: {e}");
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
        Callback::from(move |petugas: Petugas| {
            if !confirm(&format!("Hapus petugas \"{}\"?", petugas.name)) {
                return;
            }
            let client = client.clone();
            let rows = rows.clone();
            let notice = notice.clone();
            spawn_local(async move {
                match client
                    .fetch_empty::<()>(Method::DELETE, &Endpoints::user(petugas.id), None)
                    .await
                {
                    Ok(()) => {
                        info!("petugas {} deleted", petugas.id);
                        notice.set(Some(Notice::success("Data berhasil dihapus.")));
                        notify_data_updated();
                        reload_petugas(client, rows, notice).await;
                    }
                    Err(e) => {
                        error!("deleting petugas {} failed: {e}", petugas.id);
                        notice.set(Some(Notice::error(format!("Gagal menghapus user: {e}"))));
                    }
                }
            });
        })
    };

    let visible = search(rows.as_slice(), query.as_str());
    let pages = total_pages(visible.len(), *per_page);
    let current = clamp_page(*page, pages);
    let offset = (current - 1) * *per_page;

    let pasar_name = |id: Option<i64>| {
        id.and_then(|id| pasar.iter().find(|p| p.id == id))
            .map(|p| p.nama.clone())
            .unwrap_or_else(|| "-".into())
    };
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
                <h2>{"Daftar Petugas"}</h2>
                <button class="btn-primary" onclick={set_editor(Editor::Create)}>{"+ Tambah Petugas"}</button>
            </div>

            <NoticeBar notice={notice.clone()} />

            <div class="toolbar">
                <input class="search" placeholder="Cari nama atau email…" value={(*query).clone()} oninput={on_search} />
                <PageSizeSelect value={*per_page} on_change={on_size} />
            </div>

            <table class="table">
                <thead>
                    <tr><th>{"No"}</th><th>{"Nama"}</th><th>{"Email"}</th><th>{"Pasar"}</th><th>{"Aksi"}</th></tr>
                </thead>
                <tbody>
                    if visible.is_empty() {
                        <tr><td colspan="5">{"Data tidak ditemukan"}</td></tr>
                    }
                    { for paginate(&visible, current, *per_page).iter().enumerate().map(|(i, p)| {
                        let delete = {
                            let on_delete = on_delete.clone();
                            let p = p.clone();
                            Callback::from(move |_: MouseEvent| on_delete.emit(p.clone()))
                        };
                        html! {
                            <tr key={p.id}>
                                <td>{ offset + i + 1 }</td>
                                <td>{ &p.name }</td>
                                <td>{ &p.email }</td>
                                <td>{ pasar_name(p.id_pasar) }</td>
                                <td class="actions">
                                    <button onclick={set_editor(Editor::Edit(p.clone()))}>{"Edit"}</button>
                                    <button class="btn-danger" onclick={delete}>{"Hapus"}</button>
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
                        <PetugasModal creating=true initial={PetugasForm::default()} pasar={(*pasar).clone()} on_submit={on_save} on_close={close} />
                    },
                    Editor::Edit(p) => html! {
                        <PetugasModal creating=false initial={PetugasForm::from(p)} pasar={(*pasar).clone()} on_submit={on_save} on_close={close} />
                    },
                }
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn petugas(id: i64, name: &str, email: &str) -> Petugas {
        Petugas { id, name: name.into(), email: email.into(), is_petugas_pasar: true, ..Default::default() }
    }

    fn filled() -> PetugasForm {
        PetugasForm {
            name: "Sari Wulandari".into(),
            email: "sari@bantulkab.go.id".into(),
            password: "rahasia123".into(),
            password_confirmation: "rahasia123".into(),
            id_pasar: "2".into(),
        }
    }

    #[test]
    fn search_by_name_or_email() {
        let rows = vec![petugas(1, "Sari", "sari@pasar.id"), petugas(2, "Budi", "budi@niten.id")];
        assert_eq!(search(&rows, "").len(), 2);
        assert_eq!(search(&rows, "NITEN")[0].id, 2);
        assert!(search(&rows, "wati").is_empty());
    }

    #[test]
    fn registration_payload_flags_an_officer() {
        let payload = filled().validate(true).unwrap();
        assert_eq!(payload.is_petugas_pasar, 1);
        assert_eq!(payload.id_pasar, Some(2));
        assert_eq!(payload.password.as_deref(), Some("rahasia123"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["password_confirmation"], "rahasia123");
    }

    #[test]
    fn passwords_are_checked_only_on_create() {
        let form = PetugasForm { password_confirmation: "lain".into(), ..filled() };
        assert_eq!(form.validate(true).unwrap_err(), "Konfirmasi password tidak cocok");

        let payload = form.validate(false).unwrap();
        assert_eq!(payload.password, None);
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("password").is_none());

        let short = PetugasForm { password: "123".into(), password_confirmation: "123".into(), ..filled() };
        assert!(short.validate(true).is_err());
    }

    #[test]
    fn identity_fields_are_required() {
        assert_eq!(PetugasForm { email: "x".into(), ..filled() }.validate(false).unwrap_err(), "Email tidak valid");
        assert_eq!(PetugasForm { name: " ".into(), ..filled() }.validate(false).unwrap_err(), "Nama wajib diisi");
        assert_eq!(PetugasForm { id_pasar: "".into(), ..filled() }.validate(false).unwrap_err(), "Pasar wajib dipilih");
    }

    #[test]
    fn editing_prefills_without_passwords() {
        let mut p = petugas(4, "Budi", "budi@niten.id");
        p.id_pasar = Some(3);
        let form = PetugasForm::from(&p);
        assert_eq!(form.id_pasar, "3");
        assert!(form.password.is_empty());
    }
}
