mod config;
mod tls;

use std::path::PathBuf;

use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{App, Error, HttpServer};
use anyhow::Context;

use crate::config::ServerConfig;

/* ---------- static files + SPA fallback ---------------------------------- */

/// Client-side routes (`/duties`, `/reports`, ...) all get the app shell.
fn app(
    dist: PathBuf,
) -> App<impl ServiceFactory<ServiceRequest, Config = (), Response = ServiceResponse, Error = Error, InitError = ()>> {
    let shell = dist.join("index.html");
    let fallback = fn_service(move |req: ServiceRequest| {
        let shell = shell.clone();
        async move {
            let (req, _) = req.into_parts();
            let res = NamedFile::open_async(&shell).await?.into_response(&req);
            Ok::<_, Error>(ServiceResponse::new(req, res))
        }
    });
    App::new().service(Files::new("/", &dist).index_file("index.html").default_handler(fallback))
}

/* ---------- main ---------------------------------------------------------- */

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info,actix_web=info")).init();

    let cfg = ServerConfig::from_env()?;
    log::info!("serving {} on {}:{}", cfg.dist.display(), cfg.bind.0, cfg.bind.1);
    if !cfg.dist.join("index.html").exists() {
        log::warn!("{} has no index.html; run `trunk build` in frontend/", cfg.dist.display());
    }

    let dist = cfg.dist.clone();
    let server = HttpServer::new(move || app(dist.clone()).wrap(Logger::default()));
    let server = match &cfg.tls {
        Some(files) => {
            let tls = tls::rustls_config(files)?;
            server.bind_rustls_0_23(cfg.bind.clone(), tls)
        }
        None => {
            log::warn!("TLS not configured, serving plain HTTP");
            server.bind(cfg.bind.clone())
        }
    }
    .with_context(|| format!("bind {}:{}", cfg.bind.0, cfg.bind.1))?;

    server.run().await.context("server stopped")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use actix_web::http::StatusCode;
    use actix_web::test;

    use super::*;

    fn dist() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html>shell</html>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        dir
    }

    #[actix_web::test]
    async fn assets_are_served_as_files() {
        let dir = dist();
        let srv = test::init_service(app(dir.path().to_path_buf())).await;
        let resp = test::call_service(&srv, test::TestRequest::get().uri("/app.js").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "console.log(1)");
    }

    #[actix_web::test]
    async fn unknown_paths_get_the_app_shell() {
        let dir = dist();
        let srv = test::init_service(app(dir.path().to_path_buf())).await;
        for uri in ["/", "/duties", "/reports/attendance"] {
            let resp = test::call_service(&srv, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(test::read_body(resp).await, "<html>shell</html>");
        }
    }
}
