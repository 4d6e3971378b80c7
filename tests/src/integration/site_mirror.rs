//! # Site Mirror Flow
//!
//! Runs a page against a mirror directory laid out the way the relay web
//! server serves it, with responses in the relay's callback form.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;

    use dw_04_render::Document;
    use page_runtime::{EventLoop, FileScriptLoader, Page, PageConfig, ServiceProvider};
    use shared_crypto::{Account, DimLibrary};
    use shared_types::{LibrarySlot, Payload};

    const INDEX: &str = r#"
<!-- home page -->
<div id="headlines"></div>
<div id="messages"></div>
<script id="headline_template" type="text/html">
<li class="headline">${msg.sender}</li>
</script>
<script id="message_template" type="text/html">
<div class="msg"><a did="${sender}">${title}</a></div>
</script>
"#;

    fn write_response(root: &Path, path: &str, payload: &Payload) {
        let file = root.join(path.trim_start_matches('/'));
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        let body = format!("dim.js.respond({payload},{{\"path\":\"{path}\"}});");
        std::fs::write(file, body).unwrap();
    }

    #[tokio::test]
    async fn test_home_page_from_mirror() {
        let site = tempfile::tempdir().unwrap();
        std::fs::write(site.path().join("index.html"), INDEX).unwrap();
        std::fs::write(
            site.path().join("gsp.json"),
            r#"{"ID": "gsp@pZG9dRgqerAS26J6CoxBnAf4wwvMj9brpC", "name": "Test GSP", "URL": "https://dim.chat/"}"#,
        )
        .unwrap();

        let moky = Account::generate("moky");
        let address = moky.identity().address().to_string();
        let message = moky.post("from the mirror", 1_560_000_000);
        write_response(
            site.path(),
            "/channel/moky.js",
            &json!({"channel": {"item": [{"msg": message}]}}),
        );
        write_response(site.path(), &format!("/meta/{address}.js"), &moky.meta_payload());
        write_response(
            site.path(),
            &format!("/profile/{address}.js"),
            &json!({"code": 404, "name": "Not Found", "message": "profile not found"}),
        );

        let mut config = PageConfig {
            site_dir: site.path().to_path_buf(),
            gsp_config: Some(site.path().join("gsp.json")),
            ..PageConfig::default()
        };
        let provider = ServiceProvider::load(config.gsp_config.as_deref().unwrap()).unwrap();
        config.apply_provider(&provider);
        config.validate().unwrap();
        config.validate_site().unwrap();
        assert_eq!(config.base_url, "https://dim.chat/");

        let markup = std::fs::read_to_string(config.index_path()).unwrap();
        let mut event_loop = EventLoop::new(
            config.base_url.clone(),
            Arc::new(FileScriptLoader::new(&config.site_dir)),
        );
        let page = Page::new(
            &config,
            LibrarySlot::ready(Arc::new(DimLibrary::new())),
            Document::parse(&markup).unwrap(),
            Arc::new(event_loop.requester()),
        )
        .unwrap();

        page.on_load();
        page.open_channel("moky");
        // channel and meta; the profile answers with a relay error
        assert_eq!(event_loop.run_until_idle(&page).await, 2);

        let html = page.html();
        assert!(html.contains(&format!(r#"<li class="headline">{}</li>"#, moky.identity())));
        assert!(html.contains(">from the mirror</a>"));
        assert!(html.contains(&format!(r#"href="https://dim.chat/user/{address}""#)));
        assert_eq!(page.pipeline().pending_len(), 0);
        assert_eq!(page.shutdown(), 5);
    }
}
