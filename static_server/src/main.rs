use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use log::{info, warn};
use rustls::{
    pki_types::{CertificateDer, PrivateKeyDer},
    server::ServerConfig as TlsConfig,
};
use rustls_pemfile::{certs, private_key};
use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

/* ---------- configuration ----------------------------------------------- */

const DEFAULT_BIND: &str = "0.0.0.0:8444";
const DEFAULT_DIST: &str = "../frontend/dist";
const DEFAULT_CERT: &str = "certs/dev-cert.pem";
const DEFAULT_KEY: &str = "certs/dev-key.pem";

#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    bind: String,
    dist: PathBuf,
    cert: PathBuf,
    key: PathBuf,
}

impl ServerConfig {
    /// Reads `BAPOK_*` variables through `lookup`, falling back to the dev defaults.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let dist = lookup("BAPOK_DIST")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DIST));

        Self {
            bind: var("BAPOK_BIND", DEFAULT_BIND),
            dist,
            cert: PathBuf::from(var("BAPOK_TLS_CERT", DEFAULT_CERT)),
            key: PathBuf::from(var("BAPOK_TLS_KEY", DEFAULT_KEY)),
        }
    }

    fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn tls_available(&self) -> bool {
        self.cert.is_file() && self.key.is_file()
    }
}

/* ---------- TLS ---------------------------------------------------------- */

fn build_tls_config(cert_path: &Path, key_path: &Path) -> Result<TlsConfig> {
    let mut r = BufReader::new(
        File::open(cert_path).with_context(|| format!("open cert {}", cert_path.display()))?,
    );
    let chain: Vec<CertificateDer<'static>> = certs(&mut r)
        .collect::<Result<_, _>>()
        .with_context(|| format!("parse cert {}", cert_path.display()))?;
    if chain.is_empty() {
        anyhow::bail!("no certificate found in {}", cert_path.display());
    }

    let mut r = BufReader::new(
        File::open(key_path).with_context(|| format!("open key {}", key_path.display()))?,
    );
    let key: PrivateKeyDer<'static> = private_key(&mut r)
        .with_context(|| format!("parse key {}", key_path.display()))?
        .with_context(|| format!("no private key found in {}", key_path.display()))?;

    TlsConfig::builder()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .context("TLS config")
}

/* ---------- SPA fallback (index.html) ------------------------------------ */

async fn spa_fallback(req: HttpRequest, dist: web::Data<PathBuf>) -> actix_web::Result<HttpResponse> {
    Ok(NamedFile::open(dist.join("index.html"))?.into_response(&req))
}

/* ---------- main --------------------------------------------------------- */

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = ServerConfig::from_env();
    info!("serving static files from {}", cfg.dist.display());

    let dist = cfg.dist.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(dist.clone()))
            .service(Files::new("/", &dist).index_file("index.html"))
            .default_service(web::to(spa_fallback))
    });

    let server = if cfg.tls_available() {
        let tls = build_tls_config(&cfg.cert, &cfg.key)?;
        info!("listening on https://{}", cfg.bind);
        server.bind_rustls_0_23(cfg.bind.as_str(), tls)?
    } else {
        warn!(
            "TLS material not found ({} / {}), falling back to plain HTTP",
            cfg.cert.display(),
            cfg.key.display()
        );
        info!("listening on http://{}", cfg.bind);
        server.bind(cfg.bind.as_str())?
    };

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = ServerConfig::from_lookup(|_| None);
        assert_eq!(cfg.bind, DEFAULT_BIND);
        assert_eq!(cfg.cert, PathBuf::from(DEFAULT_CERT));
        assert_eq!(cfg.key, PathBuf::from(DEFAULT_KEY));
        assert!(cfg.dist.ends_with(DEFAULT_DIST));
    }

    #[test]
    fn env_values_override_defaults_and_blank_values_are_ignored() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("BAPOK_BIND", "127.0.0.1:9000"),
            ("BAPOK_DIST", "/srv/bapok"),
            ("BAPOK_TLS_CERT", "  "),
        ]));
        assert_eq!(cfg.bind, "127.0.0.1:9000");
        assert_eq!(cfg.dist, PathBuf::from("/srv/bapok"));
        assert_eq!(cfg.cert, PathBuf::from(DEFAULT_CERT));
    }

    #[test]
    fn tls_is_unavailable_without_files() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("BAPOK_TLS_CERT", "/nonexistent/cert.pem"),
            ("BAPOK_TLS_KEY", "/nonexistent/key.pem"),
        ]));
        assert!(!cfg.tls_available());
    }

    #[test]
    fn missing_cert_is_reported_with_its_path() {
        let err = build_tls_config(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/cert.pem"));
    }

    #[test]
    fn empty_cert_file_is_rejected() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        writeln!(cert, "not a pem").unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();

        let err = build_tls_config(cert.path(), key.path()).unwrap_err();
        assert!(err.to_string().contains("no certificate found"));
    }
}
