use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/* -------------------------------------------------------------------------- */
/*          lenient decoders: the backend mixes numbers, strings, 0/1          */
/* -------------------------------------------------------------------------- */

pub(crate) mod lenient {
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn to_i64(v: &Value) -> Option<i64> {
        match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            }
            _ => None,
        }
    }

    pub fn to_f64(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn to_flag(v: &Value) -> bool {
        match v {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => matches!(s.trim(), "1" | "true" | "TRUE" | "True"),
            _ => false,
        }
    }

    pub fn i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let v = Value::deserialize(d)?;
        to_i64(&v).ok_or_else(|| D::Error::custom(format!("expected an integer, got {v}")))
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(to_i64(&Value::deserialize(d)?))
    }

    pub fn f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let v = Value::deserialize(d)?;
        to_f64(&v).ok_or_else(|| D::Error::custom(format!("expected a number, got {v}")))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(to_f64(&Value::deserialize(d)?))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(to_flag(&Value::deserialize(d)?))
    }

    /// `null` becomes an empty string, numbers are stringified.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

/* -------------------------------------------------------------------------- */
/*                                   user                                     */
/* -------------------------------------------------------------------------- */

/// Profile returned by `/login` and `/user`. Unknown fields are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id_pasar: Option<i64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_admin: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_petugas_pasar: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl User {
    /// Role string cached next to the token.
    pub fn role_key(&self) -> String {
        match &self.role {
            Some(role) if !role.is_empty() => role.clone(),
            _ if self.is_admin => "admin".into(),
            _ if self.is_petugas_pasar => "petugas".into(),
            _ => "user".into(),
        }
    }

    pub fn role_label(&self) -> &'static str {
        if self.is_admin {
            "Administrator"
        } else if self.is_petugas_pasar {
            "Petugas Pasar"
        } else {
            "Pengguna"
        }
    }

    /// Market an officer is bound to; admins see every market.
    pub fn assigned_pasar(&self) -> Option<i64> {
        if self.is_petugas_pasar && !self.is_admin {
            self.id_pasar
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/* -------------------------------------------------------------------------- */
/*                                 resources                                  */
/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pasar {
    #[serde(default, deserialize_with = "lenient::i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub nama: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub alamat: String,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BahanPokok {
    #[serde(default, deserialize_with = "lenient::i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub urutan: Option<i64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub nama: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub satuan: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub stok_wajib: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub up_stok: Option<i64>,
}

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approve";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HargaBapok {
    #[serde(default, deserialize_with = "lenient::i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub id_pasar: i64,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub id_bahan_pokok: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tanggal: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub harga: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub harga_baru: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub stok: Option<i64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status_integrasi: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub created_by: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub updated_at: String,
    #[serde(default)]
    pub pasar: Option<Pasar>,
    #[serde(default)]
    pub bahan_pokok: Option<BahanPokok>,
}

impl HargaBapok {
    pub fn is_pending(&self) -> bool {
        self.status_integrasi == STATUS_PENDING
    }

    /// Price shown as "current": the new price when one was entered.
    pub fn current_price(&self) -> f64 {
        self.harga_baru.filter(|p| *p > 0.0).unwrap_or(self.harga)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Petugas {
    #[serde(default, alias = "user_id", deserialize_with = "lenient::i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id_pasar: Option<i64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_petugas_pasar: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_admin: bool,
}

/* -------------------------------------------------------------------------- */
/*                              write payloads                                */
/* -------------------------------------------------------------------------- */

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PasarPayload {
    pub nama: String,
    pub alamat: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BahanPokokPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urutan: Option<i64>,
    pub nama: String,
    pub satuan: String,
    pub stok_wajib: Option<i64>,
    pub up_stok: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HargaBapokPayload {
    pub id_pasar: i64,
    pub id_bahan_pokok: i64,
    pub tanggal: String,
    pub harga: i64,
    pub harga_baru: Option<i64>,
    pub stok: i64,
    pub status_integrasi: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PetugasPayload {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    pub id_pasar: Option<i64>,
    pub is_petugas_pasar: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_accepts_numeric_flags_and_keeps_unknown_fields() {
        let user: User = serde_json::from_value(json!({
            "id": "7",
            "name": "Sari",
            "email": "sari@bantulkab.go.id",
            "id_pasar": 3,
            "is_admin": 0,
            "is_petugas_pasar": 1,
            "phone": "0812"
        }))
        .unwrap();

        assert_eq!(user.id, Some(7));
        assert_eq!(user.id_pasar, Some(3));
        assert!(!user.is_admin);
        assert!(user.is_petugas_pasar);
        assert_eq!(user.extra.get("phone"), Some(&json!("0812")));
        assert_eq!(user.role_key(), "petugas");
        assert_eq!(user.assigned_pasar(), Some(3));
    }

    #[test]
    fn explicit_role_wins_over_flags() {
        let user: User =
            serde_json::from_value(json!({ "is_admin": true, "role": "superadmin" })).unwrap();
        assert_eq!(user.role_key(), "superadmin");
        assert_eq!(user.assigned_pasar(), None);
    }

    #[test]
    fn harga_decodes_decimal_strings_and_nested_relations() {
        let row: HargaBapok = serde_json::from_value(json!({
            "id": 1,
            "id_pasar": "2",
            "id_bahan_pokok": 4,
            "tanggal": "2025-03-01",
            "harga": "15000.00",
            "harga_baru": null,
            "stok": "12",
            "status_integrasi": "pending",
            "created_by": "Sari",
            "updated_at": "2025-03-01T08:00:00.000000Z",
            "bahan_pokok": { "id": 4, "nama": "Beras", "satuan": "kg" }
        }))
        .unwrap();

        assert_eq!(row.id_pasar, 2);
        assert_eq!(row.harga, 15000.0);
        assert_eq!(row.harga_baru, None);
        assert_eq!(row.stok, Some(12));
        assert!(row.is_pending());
        assert_eq!(row.current_price(), 15000.0);
        assert_eq!(row.bahan_pokok.unwrap().satuan, "kg");
    }

    #[test]
    fn petugas_accepts_user_id_alias() {
        let p: Petugas =
            serde_json::from_value(json!({ "user_id": 9, "name": null, "email": "a@b.id" })).unwrap();
        assert_eq!(p.id, 9);
        assert_eq!(p.name, "");
    }
}
