use std::fs::File;
use std::io::BufReader;

use anyhow::{anyhow, Context, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use rustls_pemfile::{certs, pkcs8_private_keys};

use crate::config::TlsFiles;

pub fn rustls_config(files: &TlsFiles) -> Result<ServerConfig> {
    let mut r = BufReader::new(File::open(&files.cert).with_context(|| format!("open {}", files.cert.display()))?);
    let chain: Vec<CertificateDer<'static>> =
        certs(&mut r).collect::<Result<_, _>>().context("parse certificate chain")?;
    if chain.is_empty() {
        return Err(anyhow!("no certificate in {}", files.cert.display()));
    }

    let mut r = BufReader::new(File::open(&files.key).with_context(|| format!("open {}", files.key.display()))?);
    let key = pkcs8_private_keys(&mut r)
        .next()
        .ok_or_else(|| anyhow!("no PKCS#8 key in {}", files.key.display()))?
        .context("parse private key")?;

    ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(chain, PrivateKeyDer::Pkcs8(key))
        .context("build TLS config")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_or_empty_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let files = TlsFiles { cert: dir.path().join("cert.pem"), key: dir.path().join("key.pem") };
        assert!(rustls_config(&files).is_err());

        let mut f = File::create(&files.cert).unwrap();
        writeln!(f, "not a pem").unwrap();
        let err = rustls_config(&files).unwrap_err();
        assert!(err.to_string().contains("no certificate"));
    }
}
