//! Exchanges over rustls with a self-signed certificate

use std::io;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

use h2_oneshot::{tls, Client, ConnectionError, ExchangeConfig, Request, Response, Server, ServerConfig, TlsFiles};

use super::support::payload;

fn self_signed() -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());
    (CertificateDer::from(cert.cert), PrivateKeyDer::from(key))
}

fn tls_server(cert: CertificateDer<'static>, key: PrivateKeyDer<'static>) -> Server {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let config = tls::server_config(vec![cert], key).unwrap();
    Server::from_parts(listener, Some(config), ExchangeConfig::default())
}

fn deadline() -> Option<Instant> {
    Some(Instant::now() + Duration::from_secs(10))
}

#[test]
fn test_tls_exchange() {
    let (cert, key) = self_signed();
    let server = tls_server(cert.clone(), key);
    let addr = server.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut handler = |_: &Request| -> io::Result<Response> { Ok(Response::ok("image/png", payload())) };
        server.accept_one(&mut handler)
    });

    let client_config = tls::client_config(&[cert]).unwrap();
    let response = Client::connect_tls(addr, client_config, "localhost")
        .unwrap()
        .post(
            &format!("localhost:{}", addr.port()),
            "/",
            "application/json",
            br#"{"message":"hello"}"#,
            deadline(),
        )
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, payload());

    let request = handle.join().unwrap().unwrap();
    assert_eq!(request.body, br#"{"message":"hello"}"#);
    assert!(request.headers.iter().any(|f| f.name == ":scheme" && f.value == "https"));
}

#[test]
fn test_missing_alpn_is_rejected() {
    let (cert, key) = self_signed();
    let server = tls_server(cert.clone(), key);
    let addr = server.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut handler = |_: &Request| -> io::Result<Response> { Ok(Response::ok("image/png", payload())) };
        server.accept_one(&mut handler)
    });

    let mut client_config = (*tls::client_config(&[cert]).unwrap()).clone();
    client_config.alpn_protocols.clear();
    let outcome = Client::connect_tls(addr, Arc::new(client_config), "localhost")
        .and_then(|client| client.post("localhost", "/", "application/json", b"{}", deadline()));
    assert!(outcome.is_err());

    let result = handle.join().unwrap();
    assert!(matches!(result, Err(ConnectionError::Alpn(None))));
}

#[test]
fn test_bind_loads_pem_files() {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let dir = std::env::temp_dir().join(format!("h2-oneshot-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    std::fs::write(&cert_path, cert.cert.pem()).unwrap();
    std::fs::write(&key_path, cert.key_pair.serialize_pem()).unwrap();

    let config = ServerConfig {
        listen: "127.0.0.1:0".parse().unwrap(),
        tls: Some(TlsFiles {
            cert: cert_path.clone(),
            key: key_path.clone(),
        }),
        ..ServerConfig::default()
    };
    let server = Server::bind(&config).unwrap();
    assert_ne!(server.local_addr().unwrap().port(), 0);

    let swapped = ServerConfig {
        tls: Some(TlsFiles {
            cert: key_path,
            key: cert_path,
        }),
        ..config
    };
    assert!(Server::bind(&swapped).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}
