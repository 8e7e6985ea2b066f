#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};

    use tcv3::generator::{output_path, GenKind, GeneratorConfig};
    use tcv3::schema::{ObjectType, SchemaSource};

    /// Directory of the checked-in schema documents.
    pub fn schema_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas")
    }

    /// Create empty generation targets for `object_type` below `root`.
    pub fn create_targets(root: &Path, object_type: ObjectType, kinds: &[GenKind]) -> Vec<PathBuf> {
        kinds
            .iter()
            .map(|kind| {
                let path = output_path(root, object_type, *kind);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, "").unwrap();
                path
            })
            .collect()
    }

    pub fn config(root: &Path) -> GeneratorConfig {
        GeneratorConfig {
            root: root.to_path_buf(),
            schema_source: SchemaSource::Directory(schema_dir()),
            format: false,
        }
    }
}

pub mod mock_api {
    use std::io::Read;
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;

    use tiny_http::{Header, Response, Server};

    /// A request as the mock server saw it.
    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub method: String,
        pub url: String,
        pub body: String,
    }

    /// Serve the responses built by `responses` in order, one per request,
    /// recording each request. `responses` gets the server origin
    /// (`http://127.0.0.1:<port>`) so bodies can link back to it.
    ///
    /// Returns the API base url, the request log and the server thread, which
    /// exits after the last response.
    pub fn serve(
        responses: impl FnOnce(&str) -> Vec<(u16, String)>,
    ) -> (String, Arc<Mutex<Vec<Recorded>>>, JoinHandle<()>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let origin = format!("http://{}", server.server_addr());
        let responses = responses(&origin);
        let base = format!("{origin}/api");
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&log);
        let handle = std::thread::spawn(move || {
            for (status, body) in responses {
                let mut request = match server.recv() {
                    Ok(r) => r,
                    Err(_) => return,
                };
                let mut content = String::new();
                request.as_reader().read_to_string(&mut content).unwrap();
                seen.lock().unwrap().push(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body: content,
                });
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response = Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                request.respond(response).unwrap();
            }
        });
        (base, log, handle)
    }
}

pub mod log_capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink for `tcv3::logging::build_subscriber`.
    #[derive(Clone, Default)]
    pub struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
